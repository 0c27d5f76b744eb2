use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info};

use crate::error::RemasterError;

/// BIOS El Torito boot image inside the tree; loaded with no emulation and
/// patched with a boot-info-table so the loader can locate itself.
const BIOS_BOOT_IMAGE: &str = "isolinux/isolinux.bin";
/// Boot catalog the mastering tool writes; the sanitizer removed any stale
/// copy beforehand.
const BIOS_BOOT_CATALOG: &str = "isolinux/boot.cat";
/// FAT-formatted EFI system partition image carried as a file in the tree.
const UEFI_BOOT_IMAGE: &str = "images/efiboot.img";
/// Syslinux hybrid MBR template. Optional; when installed on the building
/// host the output also boots raw-written to a USB device.
const ISOHYBRID_MBR: &str = "/usr/share/syslinux/isohdpfx.bin";

/// Assemble the remastered hybrid image from the sanitized, substituted tree.
///
/// The output is an ISO9660 filesystem with Rock Ridge and Joliet extensions
/// and two El Torito entries: the BIOS loader, and the ESP image flagged as a
/// GPT basic-data partition so UEFI firmware finds it on block devices too.
/// The volume label is carried over from the source image verbatim.
pub fn build_hybrid_iso(tree: &Path, label: &str, output: &Path, verbose: bool) -> Result<()> {
    info!("Mastering {} (label {:?})", output.display(), label);

    let hybrid_mbr = Path::new(ISOHYBRID_MBR);
    let args = mastering_args(
        tree,
        label,
        output,
        hybrid_mbr.exists().then_some(hybrid_mbr),
    );

    let mut cmd = Command::new("xorriso");
    cmd.args(&args);

    if verbose {
        debug!("Running xorriso {:?}", args);
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let status = cmd.status().context("Failed to run xorriso")?;
    if !status.success() {
        return Err(RemasterError::Build { status }.into());
    }

    Ok(())
}

/// The fixed `xorriso -as mkisofs` argument list. Order matters: flags after
/// `-eltorito-alt-boot` describe the UEFI entry, not the BIOS one.
fn mastering_args(
    tree: &Path,
    label: &str,
    output: &Path,
    hybrid_mbr: Option<&Path>,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-as".into(), "mkisofs".into()];

    args.push("-o".into());
    args.push(output.into());

    args.push("-V".into());
    args.push(label.into());

    // Rock Ridge + Joliet for cross-platform filename fidelity
    args.push("-R".into());
    args.push("-J".into());

    args.extend(
        [
            "-b",
            BIOS_BOOT_IMAGE,
            "-c",
            BIOS_BOOT_CATALOG,
            "-no-emul-boot",
            "-boot-load-size",
            "4",
            "-boot-info-table",
            "-eltorito-alt-boot",
            "-e",
            UEFI_BOOT_IMAGE,
            "-no-emul-boot",
            "-isohybrid-gpt-basdat",
        ]
        .map(OsString::from),
    );

    if let Some(mbr) = hybrid_mbr {
        args.push("-isohybrid-mbr".into());
        args.push(mbr.into());
    }

    args.push(tree.into());
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(label: &str, mbr: Option<&Path>) -> Vec<String> {
        mastering_args(Path::new("/work/extracted"), label, Path::new("out.iso"), mbr)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    fn position(args: &[String], flag: &str) -> usize {
        args.iter().position(|a| a == flag).unwrap()
    }

    #[test]
    fn label_is_carried_verbatim() {
        let args = args("EDGE-1.0", None);
        assert_eq!(args[position(&args, "-V") + 1], "EDGE-1.0");

        let empty = self::args("", None);
        assert_eq!(empty[position(&empty, "-V") + 1], "");
    }

    #[test]
    fn bios_entry_precedes_uefi_alt_boot() {
        let args = args("X", None);

        let bios = position(&args, "-b");
        let info_table = position(&args, "-boot-info-table");
        let alt = position(&args, "-eltorito-alt-boot");
        let uefi = position(&args, "-e");
        let gpt = position(&args, "-isohybrid-gpt-basdat");

        assert!(bios < info_table && info_table < alt && alt < uefi && uefi < gpt);
        assert_eq!(args[bios + 1], "isolinux/isolinux.bin");
        assert_eq!(args[position(&args, "-c") + 1], "isolinux/boot.cat");
        assert_eq!(args[uefi + 1], "images/efiboot.img");
    }

    #[test]
    fn both_boot_entries_use_no_emulation() {
        let args = args("X", None);
        let alt = position(&args, "-eltorito-alt-boot");
        let occurrences: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "-no-emul-boot")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(occurrences.len(), 2);
        assert!(occurrences[0] < alt && alt < occurrences[1]);
    }

    #[test]
    fn hybrid_mbr_is_embedded_only_when_present() {
        let plain = args("X", None);
        assert!(!plain.iter().any(|a| a == "-isohybrid-mbr"));

        let mbr = Path::new("/usr/share/syslinux/isohdpfx.bin");
        let hybrid = args("X", Some(mbr));
        let flag = position(&hybrid, "-isohybrid-mbr");
        assert_eq!(hybrid[flag + 1], mbr.to_string_lossy());
    }

    #[test]
    fn tree_is_the_final_argument() {
        let args = args("X", None);
        assert_eq!(args.last().unwrap(), "/work/extracted");
    }
}
