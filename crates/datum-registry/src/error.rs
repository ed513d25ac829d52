use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry unreachable: {url}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("registry request failed with status {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("not authenticated — run `datum login` first")]
    Unauthorized,

    #[error("{id}@{version} already exists in the registry")]
    Conflict { id: String, version: String },

    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("invalid metadata returned by the registry")]
    Decode(#[source] reqwest::Error),

    #[error("invalid metadata in {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Fs(#[from] datum_fs::Error),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

impl RegistryError {
    /// Network-level failures map to the network exit class; everything
    /// else is a user-facing error.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            RegistryError::Unreachable { .. }
                | RegistryError::Status { .. }
                | RegistryError::Decode(..)
                | RegistryError::Client(..)
        )
    }
}
