use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Base names the mastering tool regenerates itself. Stale copies carried
/// over from the source image would conflict with or shadow the new ones.
const MASTERING_ARTIFACTS: &[&str] = &["TRANS.TBL", "boot.cat", "boot.catalog"];

/// Delete leftover mastering artifacts anywhere under `root`.
///
/// Deletions are independent and delete-if-present; running this on an
/// already-clean tree is a no-op.
pub fn remove_mastering_artifacts(root: &Path) -> Result<()> {
    for entry in WalkDir::new(root) {
        let entry = entry.context("Failed to walk extracted tree")?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if MASTERING_ARTIFACTS.contains(&name.as_ref()) {
            debug!("Removing stale artifact {}", entry.path().display());
            std::fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
        }
    }

    Ok(())
}
