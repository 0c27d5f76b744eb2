use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Fatal failure kinds of the remastering pipeline.
///
/// Every external operation (mount, copy, substitution, mastering) maps onto
/// one of these so callers can branch on what actually went wrong. Non-fatal
/// conditions (unreadable volume label, unmount failure after a successful
/// copy) are logged, not represented here.
#[derive(Debug, Error)]
pub enum RemasterError {
    #[error("Missing required host tool: {tool} (install: {package})")]
    MissingTool { tool: String, package: String },

    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("Failed to mount {image}: {detail}")]
    Mount { image: PathBuf, detail: String },

    #[error("Failed to copy image contents into {dest}: {detail}")]
    Copy { dest: PathBuf, detail: String },

    #[error("Failed to substitute {path}: {detail}")]
    Template { path: PathBuf, detail: String },

    #[error("Image mastering failed: xorriso exited with {status}")]
    Build { status: ExitStatus },
}
