use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use indicatif::{HumanBytes, HumanCount, ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use walkdir::WalkDir;

use crate::duplicates::HashIndex;
use crate::filter::{ExtensionSet, SkipReason, classify};
use crate::hasher::calculate_file_hash;
use crate::report::ReportFormat;
use crate::utils::format_size;

/// Matched files between two progress log lines.
pub const PROGRESS_INTERVAL: usize = 1000;

/// Everything one `analyze` run needs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub extensions: ExtensionSet,
    pub output: Option<PathBuf>,
    pub only_duplicates: bool,
    pub format: ReportFormat,
    pub show_progress: bool,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: ExtensionSet::default(),
            output: None,
            only_duplicates: false,
            format: ReportFormat::Json,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub path: PathBuf,
    pub size: u64,
    pub hash: String,
}

/// Result of looking at a single directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Matched(FileRecord),
    Skipped { path: PathBuf, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub total_images: usize,
    pub total_unique: usize,
    pub total_size: u64,
}

impl ScanSummary {
    pub fn total_duplicates(&self) -> usize {
        self.total_images - self.total_unique
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub summary: ScanSummary,
    pub index: HashIndex,
}

impl ScanResult {
    /// Folds one matched file into the index and the running totals.
    fn record(&mut self, file: FileRecord) {
        self.summary.total_images += 1;
        self.summary.total_size += file.size;
        self.index.insert(file.hash, file.path);
        self.summary.total_unique = self.index.unique_count();
    }

    /// Applies one per-file outcome. Skips are logged and leave the totals
    /// untouched. Returns whether the file was counted.
    pub fn apply(&mut self, outcome: FileOutcome) -> bool {
        match outcome {
            FileOutcome::Matched(file) => {
                debug!(
                    "Image: {}, size: {}, hash: {}",
                    file.path.display(),
                    file.size,
                    file.hash
                );
                self.record(file);
                true
            }
            FileOutcome::Skipped { path, reason } if reason.is_warning() => {
                warn!("Skipping file: {} ({})", path.display(), reason);
                false
            }
            FileOutcome::Skipped { path, reason } => {
                debug!("Skipping file: {} ({})", path.display(), reason);
                false
            }
        }
    }
}

/// Filters and hashes a single entry.
pub fn process_file(path: &Path, extensions: &ExtensionSet) -> FileOutcome {
    let skipped = |reason| FileOutcome::Skipped {
        path: path.to_path_buf(),
        reason,
    };

    if let Err(reason) = classify(path, extensions) {
        return skipped(reason);
    }
    // Reports store paths as text; a lossy name would not read back.
    if path.to_str().is_none() {
        return skipped(SkipReason::NonUtf8Path);
    }
    let size = match path.metadata() {
        Ok(metadata) => metadata.len(),
        Err(e) => return skipped(SkipReason::Unreadable(e.to_string())),
    };
    match calculate_file_hash(path) {
        Ok(hash) => FileOutcome::Matched(FileRecord {
            path: path.to_path_buf(),
            size,
            hash,
        }),
        Err(e) => skipped(SkipReason::Unreadable(format!("{:#}", e))),
    }
}

/// Walks `config.root` and builds the hash index.
///
/// Symlinked directories are not descended into. Entries are visited in file
/// name order within each directory. Per-entry problems are logged and
/// skipped; only a missing or non-directory root fails the scan.
pub fn scan_directory(config: &ScanConfig) -> Result<ScanResult> {
    let root = &config.root;
    if !root.exists() {
        bail!("Directory not found: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Path is not a directory: {}", root.display());
    }

    info!("Analyzing directory: {}", root.display());
    info!("Including extensions: {:?}", config.extensions.to_vec());

    let pb = if config.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Scanning files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut result = ScanResult::default();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                pb.suspend(|| warn!("Failed to read directory entry: {}", e));
                continue;
            }
        };
        let path = entry.path();
        debug!("Analyzing file: {}", path.display());

        let outcome = process_file(path, &config.extensions);
        let warns = matches!(&outcome, FileOutcome::Skipped { reason, .. } if reason.is_warning());
        let matched = if warns {
            pb.suspend(|| result.apply(outcome))
        } else {
            result.apply(outcome)
        };
        if !matched {
            continue;
        }

        let summary = &result.summary;
        pb.set_message(format!(
            "Scanned {} files ({})",
            HumanCount(summary.total_images as u64),
            HumanBytes(summary.total_size)
        ));
        if summary.total_images % PROGRESS_INTERVAL == 0 {
            pb.suspend(|| {
                info!(
                    "  Total: {} images, unique: {} images, total size: {}",
                    summary.total_images,
                    summary.total_unique,
                    format_size(summary.total_size)
                )
            });
        }
    }
    pb.finish_and_clear();

    let summary = &result.summary;
    info!("Total images: {}", HumanCount(summary.total_images as u64));
    info!("Unique images: {}", HumanCount(summary.total_unique as u64));
    info!("Duplicates: {}", HumanCount(summary.total_duplicates() as u64));
    info!("Total size: {}", format_size(summary.total_size));

    Ok(result)
}
