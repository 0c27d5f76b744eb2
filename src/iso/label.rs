use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::warn;

const SECTOR_SIZE: u64 = 2048;
const DESCRIPTOR_AREA_START: u64 = 16;
const VD_PRIMARY: u8 = 1;
const VD_TERMINATOR: u8 = 255;

/// Read the volume label from an ISO9660 image.
///
/// Scans the volume descriptor area for the primary descriptor and returns
/// its volume identifier with padding trimmed. Unreadable or malformed
/// metadata degrades to an empty label instead of failing the run; the
/// remastered image then carries an empty label too. The image is opened
/// read-only and released before returning.
pub fn read_volume_label(image: &Path) -> String {
    match try_read_volume_label(image) {
        Ok(label) => label,
        Err(e) => {
            warn!(
                "Could not read volume label from {}: {}",
                image.display(),
                e
            );
            String::new()
        }
    }
}

fn try_read_volume_label(image: &Path) -> std::io::Result<String> {
    let mut file = File::open(image)?;
    let mut sector = [0u8; SECTOR_SIZE as usize];

    for lba in DESCRIPTOR_AREA_START.. {
        file.seek(SeekFrom::Start(lba * SECTOR_SIZE))?;
        file.read_exact(&mut sector)?;

        if &sector[1..6] != b"CD001" {
            break;
        }
        match sector[0] {
            // Volume identifier occupies bytes 40..72, space padded.
            VD_PRIMARY => return Ok(String::from_utf8_lossy(&sector[40..72]).trim().to_string()),
            VD_TERMINATOR => break,
            _ => continue,
        }
    }

    Ok(String::new())
}
