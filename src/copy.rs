use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::{HumanBytes, HumanCount};
use log::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyStats {
    pub directories: u64,
    pub files: u64,
    pub bytes: u64,
}

fn is_link_to_file(path: &Path) -> bool {
    path.metadata().is_ok_and(|metadata| metadata.is_file())
}

/// Recursively copies `src` into `dst`.
///
/// Fails if `src` does not exist, or if `dst` exists and `exists_ok` is not
/// set. With `exists_ok`, files already in `dst` are overwritten and extra
/// files are left alone. Symlinks to files are copied as the file contents;
/// symlinked directories and dangling links are skipped.
pub fn copy_tree(src: &Path, dst: &Path, exists_ok: bool) -> Result<CopyStats> {
    if !src.exists() {
        bail!("Source folder not found: {}", src.display());
    }
    if !src.is_dir() {
        bail!("Source is not a directory: {}", src.display());
    }
    if dst.exists() && !exists_ok {
        bail!("Destination folder already exists: {}", dst.display());
    }

    info!("Copying {} to {}", src.display(), dst.display());
    let mut stats = CopyStats::default();

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .with_context(|| format!("Entry outside source: {}", entry.path().display()))?;
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
            stats.directories += 1;
        } else if file_type.is_file() || is_link_to_file(entry.path()) {
            let bytes = fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            debug!("Copied {} ({})", relative.display(), HumanBytes(bytes));
            stats.files += 1;
            stats.bytes += bytes;
        } else {
            warn!("Skipping non-regular entry: {}", entry.path().display());
        }
    }

    info!(
        "Copied {} files in {} directories ({})",
        HumanCount(stats.files),
        HumanCount(stats.directories),
        HumanBytes(stats.bytes)
    );
    Ok(stats)
}
