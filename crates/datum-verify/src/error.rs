use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("checksum mismatch: expected {expected}, got {actual}")]
    Mismatch { expected: String, actual: String },

    #[error("malformed checksum token {token:?}")]
    MalformedToken { token: String },

    #[error("unsupported checksum algorithm {algorithm:?}")]
    UnknownAlgorithm { algorithm: String },

    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, VerificationError>;
