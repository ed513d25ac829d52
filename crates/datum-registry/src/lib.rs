//! Dataset metadata model and registry access.
//!
//! A registry stores one JSON document per published dataset version.
//! The local registry is a directory tree
//! (`<root>/<publisher>/<namespace>/<dataset>/<version>.json`); the
//! remote registry exposes the same logical operations over HTTP.
//! Both are wrapped by [`Registry`], which callers select from the
//! `--registry` location string.

pub use self::error::{RegistryError, Result};
pub use self::ident::parse_identifier;
pub use self::local::LocalRegistry;
pub use self::model::{DataPackage, Issue, PublisherInfo, Source, is_valid_id};
pub use self::remote::RemoteRegistry;

mod error;
mod ident;
mod local;
mod model;
mod remote;
mod suggest;

/// A registry selected from a location string: an `http(s)://` URL is
/// remote, anything else is a local directory root.
pub enum Registry {
    Local(LocalRegistry),
    Remote(RemoteRegistry),
}

impl Registry {
    pub fn local(root: impl Into<std::path::PathBuf>) -> Self {
        Registry::Local(LocalRegistry::new(root))
    }

    pub fn remote(url: &str, token: Option<String>) -> Result<Self> {
        Ok(Registry::Remote(RemoteRegistry::new(url, token)?))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Registry::Remote(_))
    }

    /// Human-readable location, for messages.
    pub fn location(&self) -> String {
        match self {
            Registry::Local(local) => local.root().display().to_string(),
            Registry::Remote(remote) => remote.url().to_string(),
        }
    }

    pub async fn get(&self, id: &str, version: &str) -> Result<Option<DataPackage>> {
        match self {
            Registry::Local(local) => Ok(local.get(id, version)),
            Registry::Remote(remote) => remote.get(id, version).await,
        }
    }

    pub async fn latest(&self, id: &str) -> Result<Option<DataPackage>> {
        match self {
            Registry::Local(local) => Ok(local.latest(id)),
            Registry::Remote(remote) => remote.latest(id).await,
        }
    }

    pub async fn list(&self, query: Option<&str>) -> Result<Vec<DataPackage>> {
        match self {
            Registry::Local(local) => Ok(local.list()),
            Registry::Remote(remote) => remote.list(query).await,
        }
    }

    pub async fn versions(&self, id: &str) -> Result<Vec<String>> {
        match self {
            Registry::Local(local) => Ok(local.versions(id)),
            Registry::Remote(remote) => remote.versions(id).await,
        }
    }

    /// Close-matching dataset ids, for "did you mean" output only.
    pub async fn suggest(&self, id: &str) -> Vec<String> {
        match self {
            Registry::Local(local) => local.suggest(id),
            Registry::Remote(remote) => remote.suggest(id).await,
        }
    }

    pub async fn publish(&self, pkg: &DataPackage, overwrite: bool) -> Result<Option<std::path::PathBuf>> {
        match self {
            Registry::Local(local) => local.publish(pkg, overwrite).map(Some),
            Registry::Remote(remote) => {
                remote.publish(pkg, overwrite).await?;
                Ok(None)
            }
        }
    }

    pub async fn unpublish(&self, id: &str, version: &str) -> Result<bool> {
        match self {
            Registry::Local(local) => Ok(local.unpublish(id, version)),
            Registry::Remote(remote) => remote.unpublish(id, version).await,
        }
    }
}
