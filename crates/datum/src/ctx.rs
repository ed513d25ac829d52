use std::path::{Path, PathBuf};

use datum_core::{OutputMode, Reporter};
use datum_registry::{Registry, RegistryError};

use crate::config::Config;

/// Per-invocation context assembled from the global flags.
///
/// Threaded explicitly into every command so nothing reads process-wide
/// state. `DATUM_HOME` overrides the default `~/.datum` root, which
/// keeps the cache, registry, and config relocatable for tests.
pub struct Ctx {
    pub output: OutputMode,
    pub quiet: bool,
    pub verbose: bool,
    registry_flag: Option<String>,
    home: PathBuf,
}

impl Ctx {
    pub fn new(registry_flag: Option<String>, output: OutputMode, quiet: bool, verbose: bool) -> Self {
        let home = std::env::var_os("DATUM_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                home::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".datum")
            });
        Self {
            output,
            quiet,
            verbose,
            registry_flag,
            home,
        }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn cache_root(&self) -> PathBuf {
        self.home.join("cache")
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.join("config.json")
    }

    pub fn default_registry_root(&self) -> PathBuf {
        self.home.join("registry")
    }

    /// The registry location after precedence: flag (or env via clap),
    /// then config, then the default local tree.
    pub fn registry_location(&self, cfg: &Config) -> Option<String> {
        self.registry_flag
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| cfg.get_str("registry"))
    }

    pub fn registry_is_remote(&self, cfg: &Config) -> bool {
        self.registry_location(cfg)
            .is_some_and(|loc| is_remote_location(&loc))
    }

    pub fn open_registry(&self, cfg: &Config) -> Result<Registry, RegistryError> {
        match self.registry_location(cfg) {
            Some(loc) if is_remote_location(&loc) => {
                let token = cfg.token(&host_of(&loc));
                Registry::remote(&loc, token)
            }
            Some(loc) => Ok(Registry::local(expand_tilde(&loc))),
            None => Ok(Registry::local(self.default_registry_root())),
        }
    }

    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.output, self.quiet)
    }
}

pub fn is_remote_location(loc: &str) -> bool {
    loc.starts_with("http://") || loc.starts_with("https://")
}

/// Host (and port, when present) of a registry URL, used as the key for
/// stored credentials.
pub fn host_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str().map(|host| match u.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| url.to_string())
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = home::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://datumhub.org"), "datumhub.org");
        assert_eq!(host_of("http://localhost:8080/api"), "localhost:8080");
        assert_eq!(host_of("not a url"), "not a url");
    }

    #[test]
    fn test_remote_location() {
        assert!(is_remote_location("https://datumhub.org"));
        assert!(is_remote_location("http://localhost:8080"));
        assert!(!is_remote_location("/var/lib/registry"));
        assert!(!is_remote_location("~/registry"));
    }
}
