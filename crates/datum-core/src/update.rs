use std::path::Path;

use datum_registry::{DataPackage, Registry, RegistryError};

use crate::layout::CacheLayout;

/// One dataset's update status: the resolved latest package, the
/// highest cached version, and whether a pull is due.
#[derive(Debug)]
pub struct UpdateCheck {
    pub package: DataPackage,
    pub current: Option<String>,
    pub needs_update: bool,
}

impl UpdateCheck {
    pub fn id(&self) -> &str {
        &self.package.id
    }

    pub fn latest(&self) -> &str {
        &self.package.version
    }
}

/// Every unique dataset id with at least one cached version.
pub fn cached_dataset_ids(cache_root: &Path) -> Vec<String> {
    let layout = CacheLayout::new(cache_root);
    let mut ids: Vec<String> = layout.scan().into_iter().map(|e| e.id).collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Cached versions for one dataset id, sorted ascending by the version
/// comparator. The newest cached version is the last element, never
/// the most recently written directory.
pub fn cached_versions(cache_root: &Path, id: &str) -> Vec<String> {
    let layout = CacheLayout::new(cache_root);
    let versions: Vec<String> = layout
        .scan()
        .into_iter()
        .filter(|e| e.id == id)
        .map(|e| e.version)
        .collect();
    datum_version::sorted(versions)
}

/// Check the given dataset ids against the registry's latest versions.
///
/// Datasets the registry no longer lists are skipped silently; an
/// unpublished dataset is not an error for the scan. A dataset needs an
/// update when forced or when the registry's latest version is absent
/// from the cache.
pub async fn scan_updates(
    registry: &Registry,
    cache_root: &Path,
    ids: &[String],
    force: bool,
) -> Result<Vec<UpdateCheck>, RegistryError> {
    let mut checks = Vec::new();
    for id in ids {
        let Some(latest) = registry.latest(id).await? else {
            continue;
        };
        let cached = cached_versions(cache_root, id);
        let needs_update = force || !cached.iter().any(|v| v == &latest.version);
        let current = cached.last().cloned();
        checks.push(UpdateCheck {
            package: latest,
            current,
            needs_update,
        });
    }
    Ok(checks)
}
