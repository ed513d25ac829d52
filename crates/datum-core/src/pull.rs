use std::path::{Path, PathBuf};
use std::sync::Arc;

use datum_fs::{DirLock, Staging};
use datum_registry::{DataPackage, Source};
use datum_verify::{Checksum, VerificationError, verify_file};
use reqwest::Client;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::PullError;
use crate::fetch::fetch_source;
use crate::layout::CacheLayout;
use crate::ui::Reporter;

/// Upper bound on concurrent transfers within one pull.
pub const MAX_PARALLELISM: usize = 8;

/// One pull operation over a resolved package.
pub struct PullRequest<'a> {
    pub package: &'a DataPackage,
    pub cache: &'a CacheLayout,
    /// Final directory for this dataset's files.
    pub dest_dir: &'a Path,
    /// Re-obtain every file even when destination or cache already has it.
    pub force: bool,
    /// Concurrent transfer bound, clamped to `[1, MAX_PARALLELISM]`.
    pub parallelism: usize,
}

/// How one file was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Already present in the destination directory.
    Destination,
    /// Copied out of the version cache.
    Cache,
    /// Freshly transferred from the network.
    Network,
}

#[derive(Debug, Clone)]
pub struct PulledFile {
    pub name: String,
    pub path: PathBuf,
    pub provenance: Provenance,
}

#[derive(Debug, Clone)]
pub struct PullOutcome {
    pub id: String,
    pub version: String,
    pub files: Vec<PulledFile>,
}

/// Target filename for a source: the last non-empty URL path segment,
/// or a synthesized `source_<index>.<format>` when the URL has none.
pub fn target_filename(source: &Source, index: usize) -> String {
    if let Ok(parsed) = url::Url::parse(&source.url) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(name) = segments.filter(|s| !s.is_empty()).next_back() {
                return name.to_string();
            }
        }
    }
    format!("source_{index}.{}", source.format)
}

struct Transfer {
    source: Source,
    filename: String,
    cache_file: PathBuf,
}

/// Pull every source of a resolved dataset version.
///
/// Resolution tiers per file: destination hit (skip entirely), cache
/// hit (re-verified against its checksum, self-healing on corruption),
/// network fetch. All obtained files are staged and committed into the
/// destination as one set; a failure anywhere leaves the destination
/// exactly as it was.
pub async fn pull(
    client: &Client,
    request: PullRequest<'_>,
    reporter: &Reporter,
) -> Result<PullOutcome, PullError> {
    let pkg = request.package;
    let parallelism = request.parallelism.clamp(1, MAX_PARALLELISM);
    let version_dir = request.cache.version_dir(&pkg.id, &pkg.version);

    // Two pulls of the same version may not race on the same cache
    // files. Advisory only; see the lock file placement in CacheLayout.
    let _lock = DirLock::acquire(request.cache.lock_path(&pkg.id, &pkg.version))?;

    let staging = Staging::create(request.cache.staging_parent())?;

    let mut files: Vec<PulledFile> = Vec::with_capacity(pkg.sources.len());
    let mut transfers: Vec<Transfer> = Vec::new();

    // Tier 1/2 resolution is local I/O plus digest work, done up front
    // on the control thread; only tier-3 sources reach the network.
    for (index, source) in pkg.sources.iter().enumerate() {
        let filename = target_filename(source, index);
        let dest_file = request.dest_dir.join(&filename);
        let cache_file = version_dir.join(&filename);

        if !request.force && dest_file.exists() {
            reporter.file_skipped(&filename);
            files.push(PulledFile {
                name: filename,
                path: dest_file,
                provenance: Provenance::Destination,
            });
            continue;
        }

        if !request.force && cache_file.exists() {
            match revalidate(&cache_file, source, &filename)? {
                CacheState::Valid => {
                    stage_copy(&staging, &cache_file, &filename)?;
                    reporter.file_cached(&filename);
                    files.push(PulledFile {
                        name: filename,
                        path: dest_file,
                        provenance: Provenance::Cache,
                    });
                    continue;
                }
                // stale entries self-heal: drop the file, fetch fresh
                CacheState::Corrupt => {
                    let _ = std::fs::remove_file(&cache_file);
                }
            }
        }

        files.push(PulledFile {
            name: filename.clone(),
            path: dest_file,
            provenance: Provenance::Network,
        });
        transfers.push(Transfer {
            source: source.clone(),
            filename,
            cache_file,
        });
    }

    if parallelism <= 1 {
        run_serial(client, &transfers, reporter).await?;
    } else {
        run_parallel(client, &transfers, parallelism, reporter).await?;
    }

    for transfer in &transfers {
        stage_copy(&staging, &transfer.cache_file, &transfer.filename)?;
    }

    staging.commit_into(request.dest_dir)?;

    Ok(PullOutcome {
        id: pkg.id.clone(),
        version: pkg.version.clone(),
        files,
    })
}

enum CacheState {
    Valid,
    Corrupt,
}

/// Re-check a cache hit against its declared checksum. Sources without
/// a checksum are trusted as-is.
fn revalidate(cache_file: &Path, source: &Source, filename: &str) -> Result<CacheState, PullError> {
    let Some(token) = &source.checksum else {
        return Ok(CacheState::Valid);
    };
    let checksum: Checksum = token.parse().map_err(|_| PullError::InvalidChecksum {
        file: filename.to_string(),
        token: token.clone(),
    })?;
    match verify_file(cache_file, &checksum) {
        Ok(()) => Ok(CacheState::Valid),
        Err(VerificationError::Mismatch { .. }) => Ok(CacheState::Corrupt),
        // unreadable cache entries heal the same way corrupt ones do
        Err(_) => Ok(CacheState::Corrupt),
    }
}

fn stage_copy(staging: &Staging, cache_file: &Path, filename: &str) -> Result<(), PullError> {
    std::fs::copy(cache_file, staging.file(filename)).map_err(|e| PullError::Io {
        path: staging.file(filename),
        source: e,
    })?;
    Ok(())
}

/// Transfer files one at a time, in the package's declared order.
async fn run_serial(
    client: &Client,
    transfers: &[Transfer],
    reporter: &Reporter,
) -> Result<(), PullError> {
    for transfer in transfers {
        let bar = reporter.transfer_bar(&transfer.filename, transfer.source.size);
        fetch_source(
            client,
            &transfer.source,
            &transfer.filename,
            &transfer.cache_file,
            Some(bar),
        )
        .await?;
    }
    Ok(())
}

/// Transfer files concurrently under a counting semaphore, sharing one
/// client. Completion order is unspecified; the first failure aborts
/// the remaining transfers and is surfaced for the whole pull.
async fn run_parallel(
    client: &Client,
    transfers: &[Transfer],
    parallelism: usize,
    reporter: &Reporter,
) -> Result<(), PullError> {
    let semaphore = Arc::new(Semaphore::new(parallelism));
    let mut set: JoinSet<Result<(), PullError>> = JoinSet::new();

    for transfer in transfers {
        let client = client.clone();
        let source = transfer.source.clone();
        let filename = transfer.filename.clone();
        let cache_file = transfer.cache_file.clone();
        let bar = reporter.transfer_bar(&filename, source.size);
        let semaphore = Arc::clone(&semaphore);

        set.spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| PullError::TaskPanic)?;
            fetch_source(&client, &source, &filename, &cache_file, Some(bar)).await
        });
    }

    let mut first_error: Option<PullError> = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if first_error.is_none() {
                    first_error = Some(err);
                    set.abort_all();
                }
            }
            Err(join_err) => {
                if !join_err.is_cancelled() && first_error.is_none() {
                    first_error = Some(PullError::TaskPanic);
                    set.abort_all();
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
