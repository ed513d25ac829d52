use std::fs;
use std::path::{Path, PathBuf};

/// Path schema for the shared download cache:
/// `<root>/<publisher>/<namespace>/<dataset>/<version>/<filename>`.
///
/// The layout is stable on disk; existing caches must keep working
/// across releases.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dataset_dir(&self, id: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in id.split('/') {
            path.push(part);
        }
        path
    }

    pub fn version_dir(&self, id: &str, version: &str) -> PathBuf {
        self.dataset_dir(id).join(version)
    }

    /// Lock file guarding one cached version. Lives next to the version
    /// directory, not inside it, so cache scans never see it as data.
    pub fn lock_path(&self, id: &str, version: &str) -> PathBuf {
        self.dataset_dir(id).join(format!(".{version}.lock"))
    }

    /// Parent for staging directories: a sibling of the cache tree.
    pub fn staging_parent(&self) -> PathBuf {
        match self.root.parent() {
            Some(parent) => parent.join(".staging"),
            None => self.root.join(".staging"),
        }
    }

    /// One entry per cached dataset version, in path order.
    pub fn scan(&self) -> Vec<CacheEntry> {
        let mut entries = Vec::new();
        for pub_dir in sorted_subdirs(&self.root) {
            for ns_dir in sorted_subdirs(&pub_dir) {
                for ds_dir in sorted_subdirs(&ns_dir) {
                    for ver_dir in sorted_subdirs(&ds_dir) {
                        let files = sorted_files(&ver_dir);
                        let id = format!(
                            "{}/{}/{}",
                            file_name(&pub_dir),
                            file_name(&ns_dir),
                            file_name(&ds_dir)
                        );
                        let size = files
                            .iter()
                            .filter_map(|f| fs::metadata(f).ok())
                            .map(|m| m.len())
                            .sum();
                        entries.push(CacheEntry {
                            id,
                            version: file_name(&ver_dir),
                            files,
                            size,
                        });
                    }
                }
            }
        }
        entries
    }

    /// Remove the whole cache tree.
    pub fn clear(&self) -> std::io::Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root)?;
        }
        Ok(())
    }
}

/// The cached files for one exact dataset version.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub id: String,
    pub version: String,
    pub files: Vec<PathBuf>,
    pub size: u64,
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn sorted_subdirs(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

fn sorted_files(path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(path) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    files
}

/// Human-readable byte count, e.g. "1.4 MB".
pub fn format_size(n: u64) -> String {
    let mut value = n as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if value < 1024.0 {
            return if unit == "B" {
                format!("{n} B")
            } else {
                format!("{value:.1} {unit}")
            };
        }
        value /= 1024.0;
    }
    format!("{value:.1} TB")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_version_dir_layout() {
        let layout = CacheLayout::new("/cache");
        assert_eq!(
            layout.version_dir("met.no/weather/oslo-hourly", "0.1.0"),
            PathBuf::from("/cache/met.no/weather/oslo-hourly/0.1.0")
        );
    }

    #[test]
    fn test_lock_path_is_outside_version_dir() {
        let layout = CacheLayout::new("/cache");
        assert_eq!(
            layout.lock_path("a/b/c", "0.1.0"),
            PathBuf::from("/cache/a/b/c/.0.1.0.lock")
        );
    }

    #[test]
    fn test_staging_parent_is_cache_sibling() {
        let layout = CacheLayout::new("/home/user/.datum/cache");
        assert_eq!(
            layout.staging_parent(),
            PathBuf::from("/home/user/.datum/.staging")
        );
    }

    #[test]
    fn test_scan_finds_entries() {
        let dir = tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        let ver = layout.version_dir("a/b/c", "0.1.0");
        fs::create_dir_all(&ver).unwrap();
        fs::write(ver.join("data.csv"), b"12345").unwrap();

        let entries = layout.scan();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "a/b/c");
        assert_eq!(entries[0].version, "0.1.0");
        assert_eq!(entries[0].size, 5);
    }

    #[test]
    fn test_scan_ignores_lock_files() {
        let dir = tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        let ver = layout.version_dir("a/b/c", "0.1.0");
        fs::create_dir_all(&ver).unwrap();
        fs::write(ver.join("data.csv"), b"12345").unwrap();
        fs::write(layout.lock_path("a/b/c", "0.1.0"), b"").unwrap();

        let entries = layout.scan();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].files.len(), 1);
    }

    #[test]
    fn test_scan_empty_root() {
        let layout = CacheLayout::new("/nonexistent/cache/root");
        assert!(layout.scan().is_empty());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1_500_000), "1.4 MB");
    }
}
