pub mod analyze;
pub mod cli;
pub mod copy;
pub mod duplicates;
pub mod filter;
pub mod hasher;
pub mod report;
pub mod scanner;
pub mod utils;

pub use analyze::analyze;
pub use cli::{AnalyzeArgs, Cli, Commands};
pub use copy::{CopyStats, copy_tree};
pub use duplicates::HashIndex;
pub use filter::{ExtensionSet, SkipReason};
pub use hasher::calculate_file_hash;
pub use report::{ConsoleSummary, ReportFormat, ScanReport, read_report, write_report};
pub use scanner::{FileOutcome, FileRecord, ScanConfig, ScanResult, ScanSummary, scan_directory};
pub use utils::{format_human_elapsed, format_size};
