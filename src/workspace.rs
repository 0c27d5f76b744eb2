use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Scratch directory owned by a single remastering run.
///
/// Holds the transient mount point and the extracted working tree, the only
/// tree the pipeline ever mutates. The backing `TempDir` removes everything
/// when the run ends, whether it succeeded or failed.
pub struct Workspace {
    root: TempDir,
    mount: PathBuf,
    extracted: PathBuf,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        let root = tempfile::Builder::new()
            .prefix("mkbootiso-")
            .tempdir()
            .context("Failed to create scratch directory")?;

        let mount = root.path().join("mount");
        let extracted = root.path().join("extracted");
        std::fs::create_dir(&mount).context("Failed to create mount point")?;
        std::fs::create_dir(&extracted).context("Failed to create extraction directory")?;

        debug!("Workspace at {}", root.path().display());
        Ok(Self {
            root,
            mount,
            extracted,
        })
    }

    /// Where the source image gets loop-mounted. Transient; empty outside
    /// the extraction stage.
    pub fn mount_point(&self) -> &Path {
        &self.mount
    }

    /// The working copy of the image's file tree.
    pub fn extracted(&self) -> &Path {
        &self.extracted
    }
}
