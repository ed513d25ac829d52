//! Atomic filesystem primitives.
//!
//! Three building blocks with guaranteed-release semantics:
//!
//! - [`Staging`]: a scoped scratch directory that either commits its
//!   whole file set into a destination or vanishes on drop.
//! - [`atomic_write`]: temp-file-then-rename writes for metadata files.
//! - [`DirLock`]: an advisory exclusive file lock, released on drop.

pub use self::error::{Error, Result};
pub use self::lock::DirLock;
pub use self::staging::Staging;

mod error;
mod lock;
mod staging;

use std::fs;
use std::io;
use std::path::Path;

/// Write `content` to `path` atomically: write a uniquely-named sibling
/// temp file, then rename over the target.
pub fn atomic_write(path: impl AsRef<Path>, content: &[u8]) -> Result<()> {
    let path = path.as_ref();
    let parent = path.parent().ok_or_else(|| Error::Write {
        path: path.to_path_buf(),
        source: io::Error::other("no parent directory"),
    })?;

    let tmp_path = parent.join(format!(".tmp.{}.datum", uuid::Uuid::new_v4()));

    fs::write(&tmp_path, content).map_err(|e| Error::Write {
        path: tmp_path.clone(),
        source: e,
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        Error::Rename {
            from: tmp_path.clone(),
            to: path.to_path_buf(),
            source: e,
        }
    })?;

    Ok(())
}

/// Move a file, falling back to copy-then-remove when the rename
/// crosses a filesystem boundary.
pub fn move_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> Result<()> {
    let from = from.as_ref();
    let to = to.as_ref();

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            fs::copy(from, to).map_err(|e| Error::Write {
                path: to.to_path_buf(),
                source: e,
            })?;
            fs::remove_file(from).map_err(|e| Error::Remove {
                path: from.to_path_buf(),
                source: e,
            })?;
            Ok(())
        }
        Err(e) => Err(Error::Rename {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: e,
        }),
    }
}
