use std::fs;
use std::path::{Path, PathBuf};

use crate::{Error, Result, move_file};

/// A scratch directory scoped to one operation.
///
/// Files are written under [`path`](Staging::path); nothing reaches the
/// destination until [`commit_into`](Staging::commit_into) moves the
/// complete set. The directory is removed on every exit path (commit,
/// error, or panic), so no partial state survives outside it.
pub struct Staging {
    root: PathBuf,
    committed: bool,
}

impl Staging {
    /// Create a uniquely-named staging directory under `parent`.
    pub fn create(parent: impl AsRef<Path>) -> Result<Self> {
        let root = parent
            .as_ref()
            .join(format!("pull-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&root).map_err(|e| Error::Create {
            path: root.clone(),
            source: e,
        })?;
        Ok(Self {
            root,
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Path for a staged file with the given name.
    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Move every staged file into `dest`, creating it if absent.
    ///
    /// Only called once the complete file set is present; a failure
    /// mid-move surfaces the error and the drop guard still removes
    /// whatever remains staged.
    pub fn commit_into(mut self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest).map_err(|e| Error::Create {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let entries = fs::read_dir(&self.root).map_err(|e| Error::Read {
            path: self.root.clone(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| Error::Read {
                path: self.root.clone(),
                source: e,
            })?;
            move_file(entry.path(), dest.join(entry.file_name()))?;
        }

        self.committed = true;
        let _ = fs::remove_dir_all(&self.root);
        Ok(())
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_dir_all(&self.root);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commit_moves_all_files() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");

        let staging = Staging::create(dir.path().join("scratch")).unwrap();
        fs::write(staging.file("a.csv"), b"aaa").unwrap();
        fs::write(staging.file("b.csv"), b"bbb").unwrap();
        let staged_root = staging.path().to_path_buf();

        staging.commit_into(&dest).unwrap();

        assert_eq!(fs::read(dest.join("a.csv")).unwrap(), b"aaa");
        assert_eq!(fs::read(dest.join("b.csv")).unwrap(), b"bbb");
        assert!(!staged_root.exists());
    }

    #[test]
    fn test_drop_removes_uncommitted_staging() {
        let dir = tempdir().unwrap();
        let staged_root;
        {
            let staging = Staging::create(dir.path().join("scratch")).unwrap();
            fs::write(staging.file("a.csv"), b"aaa").unwrap();
            staged_root = staging.path().to_path_buf();
            assert!(staged_root.exists());
        }
        assert!(!staged_root.exists());
    }

    #[test]
    fn test_commit_creates_destination() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nested").join("dest");

        let staging = Staging::create(dir.path().join("scratch")).unwrap();
        fs::write(staging.file("a.csv"), b"aaa").unwrap();
        staging.commit_into(&dest).unwrap();

        assert!(dest.join("a.csv").exists());
    }

    #[test]
    fn test_commit_preserves_existing_destination_files() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("old.csv"), b"old").unwrap();

        let staging = Staging::create(dir.path().join("scratch")).unwrap();
        fs::write(staging.file("new.csv"), b"new").unwrap();
        staging.commit_into(&dest).unwrap();

        assert_eq!(fs::read(dest.join("old.csv")).unwrap(), b"old");
        assert_eq!(fs::read(dest.join("new.csv")).unwrap(), b"new");
    }

    #[test]
    fn test_two_stagings_do_not_collide() {
        let dir = tempdir().unwrap();
        let a = Staging::create(dir.path().join("scratch")).unwrap();
        let b = Staging::create(dir.path().join("scratch")).unwrap();
        assert_ne!(a.path(), b.path());
    }
}
