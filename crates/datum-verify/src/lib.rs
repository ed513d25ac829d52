//! Content verification primitives for downloaded dataset files.
//!
//! A checksum token has the shape `<algorithm>:<hex-digest>` with
//! algorithm one of `sha256`, `sha512`, or `md5`. Verification is
//! incremental: bytes are fed to a [`ChecksumVerifier`] as they stream
//! through, so a file is hashed in the same pass that writes it. The
//! same verifier is used to re-validate already-cached files, keeping a
//! single definition of "correct" for both paths.
//!
//! # Example
//!
//! ```
//! use datum_verify::{Checksum, ChecksumVerifier};
//!
//! let token = "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9";
//! let checksum: Checksum = token.parse().unwrap();
//!
//! let mut verifier = ChecksumVerifier::new(&checksum);
//! verifier.update(b"hello world");
//! verifier.finish().unwrap();
//! ```

pub use self::checksum::{Algorithm, Checksum, ChecksumVerifier, verify_file};
pub use self::error::{Result, VerificationError};
pub use self::hasher::{DigestHasher, Hasher};

mod checksum;
mod error;
mod hasher;
