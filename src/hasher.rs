use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use log::trace;
use sha2::{Digest, Sha256};

const CHUNK_SIZE: usize = 8192;

/// Streams `file_path` through SHA-256 and returns the lowercase hex digest.
pub fn calculate_file_hash(file_path: &Path) -> Result<String> {
    let file = File::open(file_path)
        .with_context(|| format!("Failed to open file: '{}'", file_path.display()))?;

    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = [0; CHUNK_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: '{}'", file_path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        total_bytes += bytes_read as u64;
    }

    let hash = hex::encode(hasher.finalize());
    trace!(
        "Hash calculated for '{}': {} ({} bytes)",
        file_path.display(),
        hash,
        total_bytes
    );
    Ok(hash)
}
