use std::path::Path;

use datum_registry::Source;
use datum_verify::{Checksum, ChecksumVerifier, VerificationError};
use indicatif::ProgressBar;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::error::PullError;

/// Stream one source into its cache file, hashing as bytes arrive.
///
/// The response body is consumed chunk by chunk so memory stays
/// constant regardless of file size. On a digest mismatch the cache
/// file is deleted before the error is returned; on a network failure
/// the partial file is left behind for inspection.
pub(crate) async fn fetch_source(
    client: &Client,
    source: &Source,
    filename: &str,
    cache_file: &Path,
    bar: Option<ProgressBar>,
) -> Result<(), PullError> {
    let mut verifier = match &source.checksum {
        Some(token) => {
            let checksum: Checksum =
                token
                    .parse()
                    .map_err(|_| PullError::InvalidChecksum {
                        file: filename.to_string(),
                        token: token.clone(),
                    })?;
            Some(ChecksumVerifier::new(&checksum))
        }
        None => None,
    };

    if let Some(parent) = cache_file.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PullError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    let resp = client.get(&source.url).send().await.map_err(|e| {
        PullError::Network {
            url: source.url.clone(),
            source: e,
        }
    })?;
    let mut resp = resp.error_for_status().map_err(|e| PullError::Network {
        url: source.url.clone(),
        source: e,
    })?;

    let mut file = tokio::fs::File::create(cache_file)
        .await
        .map_err(|e| PullError::Io {
            path: cache_file.to_path_buf(),
            source: e,
        })?;

    while let Some(chunk) = resp.chunk().await.map_err(|e| PullError::Network {
        url: source.url.clone(),
        source: e,
    })? {
        file.write_all(&chunk).await.map_err(|e| PullError::Io {
            path: cache_file.to_path_buf(),
            source: e,
        })?;
        if let Some(v) = verifier.as_mut() {
            v.update(&chunk);
        }
        if let Some(bar) = &bar {
            bar.inc(chunk.len() as u64);
        }
    }

    file.flush().await.map_err(|e| PullError::Io {
        path: cache_file.to_path_buf(),
        source: e,
    })?;
    drop(file);

    if let Some(bar) = &bar {
        bar.finish();
    }

    if let Some(verifier) = verifier {
        if let Err(err) = verifier.finish() {
            // never leave a corrupt file masquerading as valid
            let _ = std::fs::remove_file(cache_file);
            return Err(match err {
                VerificationError::Mismatch { expected, actual } => PullError::Checksum {
                    file: filename.to_string(),
                    expected,
                    actual,
                },
                other => PullError::InvalidChecksum {
                    file: filename.to_string(),
                    token: other.to_string(),
                },
            });
        }
    }

    Ok(())
}
