use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use crate::error::RemasterError;

/// Verify a file against an expected SHA-256 digest (hex, case-insensitive).
pub fn verify_sha256(path: &Path, expected: &str) -> Result<()> {
    info!("Verifying checksum for {}", path.display());

    let actual = sha256_digest(path)?;
    if actual.eq_ignore_ascii_case(expected) {
        info!("✓ Checksum verification passed");
        Ok(())
    } else {
        Err(RemasterError::ChecksumMismatch {
            path: path.to_path_buf(),
            expected: expected.to_lowercase(),
            actual,
        }
        .into())
    }
}

pub fn sha256_digest(path: &Path) -> Result<String> {
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];

    loop {
        let n = reader.read(&mut buffer).context("Failed to read file data")?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}
