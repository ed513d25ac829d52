use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, VerificationError};
use crate::hasher::{DigestHasher, Hasher};

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    Sha256,
    Sha512,
    Md5,
}

impl Algorithm {
    pub fn hasher(&self) -> Box<dyn Hasher> {
        match self {
            Algorithm::Sha256 => Box::new(DigestHasher::<sha2::Sha256>::new()),
            Algorithm::Sha512 => Box::new(DigestHasher::<sha2::Sha512>::new()),
            Algorithm::Md5 => Box::new(DigestHasher::<md5::Md5>::new()),
        }
    }
}

impl FromStr for Algorithm {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sha256" => Ok(Algorithm::Sha256),
            "sha512" => Ok(Algorithm::Sha512),
            "md5" => Ok(Algorithm::Md5),
            other => Err(VerificationError::UnknownAlgorithm {
                algorithm: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Sha256 => write!(f, "sha256"),
            Algorithm::Sha512 => write!(f, "sha512"),
            Algorithm::Md5 => write!(f, "md5"),
        }
    }
}

/// A parsed `<algorithm>:<hex-digest>` token.
///
/// The digest is stored lowercase; comparison against a computed digest
/// is case-insensitive either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksum {
    algorithm: Algorithm,
    digest: String,
}

impl Checksum {
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl FromStr for Checksum {
    type Err = VerificationError;

    fn from_str(token: &str) -> Result<Self> {
        let (algorithm, digest) =
            token
                .split_once(':')
                .ok_or_else(|| VerificationError::MalformedToken {
                    token: token.to_string(),
                })?;

        if digest.is_empty() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VerificationError::MalformedToken {
                token: token.to_string(),
            });
        }

        Ok(Self {
            algorithm: algorithm.parse()?,
            digest: digest.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}

/// Incremental digest computation against an expected checksum.
pub struct ChecksumVerifier {
    expected: Checksum,
    hasher: Box<dyn Hasher>,
}

impl ChecksumVerifier {
    pub fn new(expected: &Checksum) -> Self {
        Self {
            expected: expected.clone(),
            hasher: expected.algorithm().hasher(),
        }
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Compare the accumulated digest against the expected one.
    pub fn finish(self) -> Result<()> {
        let actual = hex::encode(self.hasher.finalize());
        if actual.eq_ignore_ascii_case(self.expected.digest()) {
            Ok(())
        } else {
            Err(VerificationError::Mismatch {
                expected: self.expected.digest().to_string(),
                actual,
            })
        }
    }
}

/// Re-validate a file on disk against its checksum token.
///
/// Reads in fixed-size chunks so memory stays constant for large files.
pub fn verify_file(path: impl AsRef<Path>, expected: &Checksum) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| VerificationError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut verifier = ChecksumVerifier::new(expected);
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).map_err(|e| VerificationError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        verifier.update(&buf[..n]);
    }

    verifier.finish()
}
