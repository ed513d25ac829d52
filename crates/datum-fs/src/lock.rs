use std::fs::File;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, Result};

/// Advisory exclusive lock backed by a lock file.
///
/// Blocks until the lock is available; released when the guard drops.
/// Advisory only: it coordinates cooperating processes, it does not
/// stop anything that ignores the lock file.
pub struct DirLock {
    file: File,
    path: PathBuf,
}

impl DirLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Create {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let file = File::options()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| Error::Lock {
                path: path.clone(),
                source: e,
            })?;

        file.lock_exclusive().map_err(|e| Error::Lock {
            path: path.clone(),
            source: e,
        })?;

        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
