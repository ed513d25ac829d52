use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};
use crate::model::DataPackage;
use crate::suggest::suggest_ids;

/// Filesystem registry: one JSON document per published version at
/// `<root>/<publisher>/<namespace>/<dataset>/<version>.json`.
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn package_path(&self, id: &str, version: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in id.split('/') {
            path.push(part);
        }
        path.join(format!("{version}.json"))
    }

    fn dataset_dir(&self, id: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in id.split('/') {
            path.push(part);
        }
        path
    }

    /// Write a package into the registry tree.
    ///
    /// Refuses to overwrite an existing version unless asked.
    pub fn publish(&self, pkg: &DataPackage, overwrite: bool) -> Result<PathBuf> {
        let path = self.package_path(&pkg.id, &pkg.version);
        if path.exists() && !overwrite {
            return Err(RegistryError::Conflict {
                id: pkg.id.clone(),
                version: pkg.version.clone(),
            });
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| datum_fs::Error::Create {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let body = serde_json::to_vec_pretty(pkg).map_err(|e| RegistryError::Parse {
            path: path.clone(),
            source: e,
        })?;
        datum_fs::atomic_write(&path, &body)?;
        Ok(path)
    }

    /// Every package in the registry, unparseable documents skipped.
    pub fn list(&self) -> Vec<DataPackage> {
        let mut results = Vec::new();
        for ds_dir in self.dataset_dirs() {
            let Ok(entries) = fs::read_dir(&ds_dir) else {
                continue;
            };
            let mut files: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            files.sort();
            for file in files {
                if let Some(pkg) = read_package(&file) {
                    results.push(pkg);
                }
            }
        }
        results.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.version.cmp(&b.version)));
        results
    }

    pub fn get(&self, id: &str, version: &str) -> Option<DataPackage> {
        read_package(&self.package_path(id, version))
    }

    /// The newest published version by the version comparator.
    pub fn latest(&self, id: &str) -> Option<DataPackage> {
        let mut versions = self.versions(id);
        // newest first; skip over documents that fail to parse
        versions.reverse();
        versions.into_iter().find_map(|v| self.get(id, &v))
    }

    /// All published versions for one id, sorted ascending.
    pub fn versions(&self, id: &str) -> Vec<String> {
        let dir = self.dataset_dir(id);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let raw: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        datum_version::sorted(raw)
    }

    /// Remove one published version. Returns whether anything existed.
    pub fn unpublish(&self, id: &str, version: &str) -> bool {
        let path = self.package_path(id, version);
        if !path.exists() {
            return false;
        }
        fs::remove_file(&path).is_ok()
    }

    pub fn suggest(&self, id: &str) -> Vec<String> {
        let mut all_ids: Vec<String> = self.list().into_iter().map(|p| p.id).collect();
        all_ids.dedup();
        suggest_ids(id, &all_ids)
    }

    fn dataset_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for pub_dir in sorted_subdirs(&self.root) {
            for ns_dir in sorted_subdirs(&pub_dir) {
                for ds_dir in sorted_subdirs(&ns_dir) {
                    dirs.push(ds_dir);
                }
            }
        }
        dirs
    }
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

fn read_package(path: &Path) -> Option<DataPackage> {
    let raw = fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}
