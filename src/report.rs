//! Summary and persisted reports for `analyze`.
//!
//! A report is serialized by one of two [`ReportCodec`]s:
//!
//! - [`JsonReport`]: a [`ScanReport`] document with scan metadata and the
//!   `files_by_hash` mapping.
//! - [`CsvReport`]: a flat `path,hash` table, one row per file.
//!
//! Both read back into the same [`HashIndex`]. Output paths ending in `.zst`
//! are zstd-compressed on top of either format.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use clap::ValueEnum;
use indicatif::HumanBytes;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use zstd::stream::{Encoder, decode_all};

use crate::duplicates::HashIndex;
use crate::scanner::{ScanConfig, ScanResult, ScanSummary};
use crate::utils::format_size;

const ZSTD_LEVEL: i32 = 9;
const CSV_HEADER: [&str; 2] = ["path", "hash"];

/// Summary printed on stdout after a successful scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSummary {
    pub total_images: usize,
    pub total_unique: usize,
    pub total_duplicates: usize,
    pub total_size: String,
}

impl From<&ScanSummary> for ConsoleSummary {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            total_images: summary.total_images,
            total_unique: summary.total_unique,
            total_duplicates: summary.total_duplicates(),
            total_size: format_size(summary.total_size),
        }
    }
}

/// The structured report document.
///
/// Totals always describe the whole scan; `files_by_hash` is narrowed to
/// duplicate groups when only duplicates were requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    pub directory: String,
    pub extensions: Vec<String>,
    pub total_images: usize,
    pub total_unique: usize,
    pub duplicates: usize,
    pub total_size: String,
    pub files_by_hash: HashIndex,
}

impl ScanReport {
    pub fn new(config: &ScanConfig, result: &ScanResult) -> Self {
        let summary = &result.summary;
        let files_by_hash = if config.only_duplicates {
            result.index.duplicates_only()
        } else {
            result.index.clone()
        };
        Self {
            directory: config.root.display().to_string(),
            extensions: config.extensions.to_vec(),
            total_images: summary.total_images,
            total_unique: summary.total_unique,
            duplicates: summary.total_duplicates(),
            total_size: format_size(summary.total_size),
            files_by_hash,
        }
    }
}

/// Serialization strategy for persisted reports.
pub trait ReportCodec {
    fn encode(&self, report: &ScanReport) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<HashIndex>;
}

pub struct JsonReport;

impl ReportCodec for JsonReport {
    fn encode(&self, report: &ScanReport) -> Result<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec_pretty(report).context("Failed to serialize JSON report")?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> Result<HashIndex> {
        let report: ScanReport =
            serde_json::from_slice(bytes).context("Failed to parse JSON report")?;
        Ok(report.files_by_hash)
    }
}

pub struct CsvReport;

#[derive(Debug, Deserialize)]
struct CsvRow {
    path: PathBuf,
    hash: String,
}

impl ReportCodec for CsvReport {
    fn encode(&self, report: &ScanReport) -> Result<Vec<u8>> {
        // The header is written by hand so an empty index still yields one.
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        writer.write_record(CSV_HEADER)?;
        for (path, hash) in report.files_by_hash.rows() {
            let Some(path) = path.to_str() else {
                bail!("Cannot write non UTF-8 path to CSV report: {}", path.display());
            };
            writer.write_record([path, hash])?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV report: {}", e.error()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<HashIndex> {
        let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
        let headers = reader.headers()?;
        if headers.iter().ne(CSV_HEADER) {
            bail!("Unexpected CSV header: {:?}", headers);
        }
        let mut index = HashIndex::new();
        for row in reader.deserialize() {
            let row: CsvRow = row.context("Failed to parse CSV row")?;
            index.insert(row.hash, row.path);
        }
        Ok(index)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Structured document with scan metadata
    #[default]
    Json,
    /// Flat `path,hash` rows
    Csv,
}

impl ReportFormat {
    pub fn codec(self) -> &'static dyn ReportCodec {
        match self {
            ReportFormat::Json => &JsonReport,
            ReportFormat::Csv => &CsvReport,
        }
    }
}

fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

/// Serializes `report` and writes it to `path`.
///
/// The report is fully encoded before the file is created. If writing fails
/// the partial file is removed.
pub fn write_report(path: &Path, format: ReportFormat, report: &ScanReport) -> Result<()> {
    let mut bytes = format.codec().encode(report)?;
    if is_compressed(path) {
        let mut encoder = Encoder::new(Vec::new(), ZSTD_LEVEL)?;
        encoder.write_all(&bytes)?;
        bytes = encoder.finish()?;
    }

    if let Err(e) = fs::write(path, &bytes) {
        if path.is_file() {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(
                    "Failed to remove partial report '{}': {}",
                    path.display(),
                    cleanup
                );
            }
        }
        return Err(e).with_context(|| format!("Error saving file index to '{}'", path.display()));
    }

    info!(
        "File index saved to {} ({})",
        path.display(),
        HumanBytes(bytes.len() as u64)
    );
    Ok(())
}

/// Reads a report written by [`write_report`] back into its hash grouping.
pub fn read_report(path: &Path, format: ReportFormat) -> Result<HashIndex> {
    let mut bytes =
        fs::read(path).with_context(|| format!("Failed to read report '{}'", path.display()))?;
    if is_compressed(path) {
        bytes = decode_all(&bytes[..])
            .with_context(|| format!("Failed to decompress report '{}'", path.display()))?;
    }
    format.codec().decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ExtensionSet;
    use tempfile::tempdir;

    fn sample_result() -> ScanResult {
        let index: HashIndex = [("h1", "root/a.jpg"), ("h1", "root/b.jpg"), ("h2", "root/c.jpg")]
            .into_iter()
            .map(|(hash, path)| (hash.to_string(), PathBuf::from(path)))
            .collect();
        ScanResult {
            summary: ScanSummary {
                total_images: 3,
                total_unique: 2,
                total_size: 2048,
            },
            index,
        }
    }

    fn sample_config() -> ScanConfig {
        let mut config = ScanConfig::new("root");
        config.extensions = ExtensionSet::new([".JPG"]);
        config
    }

    #[test]
    fn console_summary_fields() {
        let summary = ConsoleSummary::from(&sample_result().summary);
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            serde_json::json!({
                "total_images": 3,
                "total_unique": 2,
                "total_duplicates": 1,
                "total_size": "2.00 KB",
            })
        );
    }

    #[test]
    fn json_document_has_metadata_keys() {
        let report = ScanReport::new(&sample_config(), &sample_result());
        let value: serde_json::Value =
            serde_json::from_slice(&JsonReport.encode(&report).unwrap()).unwrap();
        assert_eq!(value["directory"], "root");
        assert_eq!(value["extensions"], serde_json::json!(["jpg"]));
        assert_eq!(value["total_images"], 3);
        assert_eq!(value["total_unique"], 2);
        assert_eq!(value["duplicates"], 1);
        assert_eq!(value["total_size"], "2.00 KB");
        assert_eq!(
            value["files_by_hash"]["h1"],
            serde_json::json!(["root/a.jpg", "root/b.jpg"])
        );
    }

    #[test]
    fn only_duplicates_keeps_totals() {
        let mut config = sample_config();
        config.only_duplicates = true;
        let report = ScanReport::new(&config, &sample_result());
        assert_eq!(report.total_images, 3);
        assert_eq!(report.files_by_hash.unique_count(), 1);
        assert!(report.files_by_hash.get("h2").is_none());
    }

    #[test]
    fn csv_rows_and_header() {
        let report = ScanReport::new(&sample_config(), &sample_result());
        let text = String::from_utf8(CsvReport.encode(&report).unwrap()).unwrap();
        assert_eq!(
            text,
            "path,hash\nroot/a.jpg,h1\nroot/b.jpg,h1\nroot/c.jpg,h2\n"
        );
    }

    #[test]
    fn empty_csv_still_has_header() {
        let report = ScanReport::new(&sample_config(), &ScanResult::default());
        let bytes = CsvReport.encode(&report).unwrap();
        assert_eq!(bytes, b"path,hash\n");
        assert!(CsvReport.decode(&bytes).unwrap().is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_paths_are_refused_not_mangled() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let mut result = sample_result();
        result
            .index
            .insert("h3".into(), Path::new("root").join(OsStr::from_bytes(b"bad\xff.jpg")));
        let report = ScanReport::new(&sample_config(), &result);

        let err = CsvReport.encode(&report).unwrap_err();
        assert!(err.to_string().contains("non UTF-8 path"));
        assert!(JsonReport.encode(&report).is_err());
    }

    #[test]
    fn csv_with_wrong_header_is_rejected() {
        assert!(CsvReport.decode(b"file,digest\na.jpg,h1\n").is_err());
    }

    #[test]
    fn reports_read_back_to_same_grouping() {
        let dir = tempdir().unwrap();
        let result = sample_result();
        let report = ScanReport::new(&sample_config(), &result);

        for (name, format) in [
            ("index.json", ReportFormat::Json),
            ("index.csv", ReportFormat::Csv),
            ("index.json.zst", ReportFormat::Json),
            ("index.csv.zst", ReportFormat::Csv),
        ] {
            let path = dir.path().join(name);
            write_report(&path, format, &report).unwrap();
            assert_eq!(read_report(&path, format).unwrap(), result.index, "{}", name);
        }
    }

    #[test]
    fn compressed_reports_are_zstd_frames() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.json.zst");
        let report = ScanReport::new(&sample_config(), &sample_result());
        write_report(&path, ReportFormat::Json, &report).unwrap();

        let raw = fs::read(&path).unwrap();
        assert_eq!(&raw[..4], &[0x28u8, 0xb5, 0x2f, 0xfd]);
    }

    #[test]
    fn unwritable_path_fails_without_leaving_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("index.json");
        let report = ScanReport::new(&sample_config(), &sample_result());

        let err = write_report(&path, ReportFormat::Json, &report).unwrap_err();
        assert!(err.to_string().contains("Error saving file index"));
        assert!(!path.exists());
    }
}
