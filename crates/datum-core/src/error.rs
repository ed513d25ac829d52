use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PullError {
    #[error("network error downloading {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    Checksum {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("invalid checksum token {token:?} for {file}")]
    InvalidChecksum { file: String, token: String },

    #[error("failed to write {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("transfer task failed unexpectedly")]
    TaskPanic,

    #[error(transparent)]
    Staging(#[from] datum_fs::Error),
}

impl PullError {
    /// Network failures get their own exit class; integrity and
    /// metadata problems are user-facing errors.
    pub fn is_network(&self) -> bool {
        matches!(self, PullError::Network { .. })
    }
}
