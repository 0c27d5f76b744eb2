use anyhow::Result;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use crate::error::RemasterError;

/// Read-only loop mount of the source image, released on drop.
///
/// The copy stage can fail anywhere; dropping the guard guarantees the mount
/// goes away on every exit path. An unmount failure after the tree has been
/// copied out does not invalidate the copied data, so it is logged and
/// otherwise ignored.
struct MountGuard {
    mountpoint: PathBuf,
}

impl MountGuard {
    fn mount(image: &Path, mountpoint: &Path) -> Result<Self, RemasterError> {
        let output = Command::new("mount")
            .args(["-o", "loop,ro"])
            .arg(image)
            .arg(mountpoint)
            .output()
            .map_err(|e| RemasterError::Mount {
                image: image.to_path_buf(),
                detail: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RemasterError::Mount {
                image: image.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("Mounted {} at {}", image.display(), mountpoint.display());
        Ok(Self {
            mountpoint: mountpoint.to_path_buf(),
        })
    }
}

impl Drop for MountGuard {
    fn drop(&mut self) {
        match Command::new("umount").arg(&self.mountpoint).output() {
            Ok(o) if o.status.success() => debug!("Unmounted {}", self.mountpoint.display()),
            Ok(o) => warn!(
                "Failed to unmount {}: {}",
                self.mountpoint.display(),
                String::from_utf8_lossy(&o.stderr).trim()
            ),
            Err(e) => warn!("Failed to unmount {}: {}", self.mountpoint.display(), e),
        }
    }
}

/// Copy the full file tree of a bootable image into `dest`.
///
/// The image is loop-mounted read-only at `mountpoint`, copied with
/// structure and permissions preserved, then unmounted. The source image is
/// never written to.
pub fn extract_tree(image: &Path, mountpoint: &Path, dest: &Path) -> Result<()> {
    info!("Extracting {} into {}", image.display(), dest.display());

    let _guard = MountGuard::mount(image, mountpoint)?;

    // `mount/.` rather than `mount/*`: no shell involved, and dotfiles at
    // the image root ride along.
    let output = Command::new("cp")
        .arg("-a")
        .arg(mountpoint.join("."))
        .arg(dest)
        .output()
        .map_err(|e| RemasterError::Copy {
            dest: dest.to_path_buf(),
            detail: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(RemasterError::Copy {
            dest: dest.to_path_buf(),
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }
        .into());
    }

    Ok(())
}
