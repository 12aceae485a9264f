use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use indicatif::HumanCount;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Content hash -> paths sharing that hash, in scan order.
///
/// Hash keys are kept sorted so persisted reports come out the same on every
/// run over an unchanged tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HashIndex {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, hash: String, path: PathBuf) {
        self.groups.entry(hash).or_default().push(path);
    }

    /// Number of distinct hashes.
    pub fn unique_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of paths across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, hash: &str) -> Option<&[PathBuf]> {
        self.groups.get(hash).map(Vec::as_slice)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups
            .iter()
            .map(|(hash, paths)| (hash.as_str(), paths.as_slice()))
    }

    /// Groups holding at least two paths.
    pub fn duplicate_groups(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.groups().filter(|(_, paths)| paths.len() > 1)
    }

    /// A copy of the index restricted to duplicate groups.
    pub fn duplicates_only(&self) -> HashIndex {
        let groups = self
            .groups
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(hash, paths)| (hash.clone(), paths.clone()))
            .collect();
        HashIndex { groups }
    }

    /// `(path, hash)` pairs, one per file, group by group.
    pub fn rows(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.groups.iter().flat_map(|(hash, paths)| {
            paths.iter().map(move |path| (path.as_path(), hash.as_str()))
        })
    }
}

impl FromIterator<(String, PathBuf)> for HashIndex {
    fn from_iter<T: IntoIterator<Item = (String, PathBuf)>>(iter: T) -> Self {
        let mut index = HashIndex::new();
        for (hash, path) in iter {
            index.insert(hash, path);
        }
        index
    }
}

/// Logs every duplicate group at debug level, largest groups first.
pub fn log_duplicate_groups(index: &HashIndex) {
    let mut groups: Vec<_> = index.duplicate_groups().collect();
    if groups.is_empty() {
        info!("No duplicate files found");
        return;
    }
    groups.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

    info!(
        "Found {} duplicate groups",
        HumanCount(groups.len() as u64)
    );
    for (hash, paths) in groups {
        debug!("Duplicate group {} ({} files):", hash, paths.len());
        for path in paths {
            debug!("  {}", path.display());
        }
    }
}
