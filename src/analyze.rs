use anyhow::Result;
use log::info;

use crate::duplicates::log_duplicate_groups;
use crate::report::{ScanReport, write_report};
use crate::scanner::{ScanConfig, ScanResult, scan_directory};

/// Scans `config.root` and, when an output path is configured, persists the
/// report. A failed write fails the whole run.
pub fn analyze(config: &ScanConfig) -> Result<ScanResult> {
    if let Some(output) = &config.output {
        info!("Saving file index to: {}", output.display());
        if config.only_duplicates {
            info!("  Only dumping duplicates to the output file, not the full analysis");
        }
    }

    let result = scan_directory(config)?;
    log_duplicate_groups(&result.index);

    if let Some(output) = &config.output {
        let report = ScanReport::new(config, &result);
        write_report(output, config.format, &report)?;
    }
    Ok(result)
}
