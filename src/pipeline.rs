use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::checksum;
use crate::cli::Cli;
use crate::error::RemasterError;
use crate::iso::{build, extract, label, sanitize};
use crate::preflight;
use crate::template::{SubstitutionContext, TemplateEngine};
use crate::workspace::Workspace;

/// Boot-loader configs substituted in place inside the extracted tree.
const BIOS_BOOT_CONFIG: &str = "isolinux/isolinux.cfg";
const UEFI_BOOT_CONFIG: &str = "EFI/BOOT/grub.cfg";

/// One remastering run: extract the source image, drop stale mastering
/// artifacts, substitute the boot configs and answer file, and reassemble a
/// hybrid-bootable image under the source's volume label.
///
/// Stages run strictly in sequence and the first failure aborts the run; the
/// workspace tears itself down either way.
pub struct Remaster {
    source: PathBuf,
    output: PathBuf,
    kickstart: String,
    kargs: Vec<String>,
    checksum: Option<String>,
    verbose: bool,
}

impl Remaster {
    pub fn new(cli: Cli) -> Self {
        Self {
            source: cli.iso,
            output: cli.output,
            kickstart: cli.kickstart,
            kargs: cli.kargs,
            checksum: cli.checksum,
            verbose: cli.verbose,
        }
    }

    pub fn run(&self) -> Result<PathBuf> {
        preflight::check_required_tools(preflight::REQUIRED_TOOLS)?;

        if !self.source.is_file() {
            return Err(anyhow!(
                "Source image does not exist: {}",
                self.source.display()
            ));
        }
        if let Some(expected) = &self.checksum {
            checksum::verify_sha256(&self.source, expected)?;
        }

        let workspace = Workspace::new()?;

        let volume_label = label::read_volume_label(&self.source);
        if volume_label.is_empty() {
            warn!("Source image has no readable volume label, continuing with an empty one");
        } else {
            info!("Source volume label: {}", volume_label);
        }

        extract::extract_tree(&self.source, workspace.mount_point(), workspace.extracted())?;

        sanitize::remove_mastering_artifacts(workspace.extracted())?;

        let context =
            SubstitutionContext::new(volume_label.clone(), self.kickstart_name(), &self.kargs);
        self.substitute_boot_configs(workspace.extracted(), &context)?;

        build::build_hybrid_iso(
            workspace.extracted(),
            &volume_label,
            &self.output,
            self.verbose,
        )?;

        Ok(self.output.clone())
    }

    /// Name the answer file goes by inside the image, and in the boot
    /// configs that reference it.
    fn kickstart_name(&self) -> String {
        Path::new(&self.kickstart)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.kickstart.clone())
    }

    /// Place the answer file at the tree root. A copy on the invoking host
    /// wins over one carried by the source image; having neither is fatal.
    fn stage_kickstart(&self, tree: &Path) -> Result<PathBuf, RemasterError> {
        let dest = tree.join(self.kickstart_name());

        let host_copy = Path::new(&self.kickstart);
        if host_copy.is_file() {
            debug!("Staging {} into the image root", host_copy.display());
            std::fs::copy(host_copy, &dest).map_err(|e| RemasterError::Template {
                path: host_copy.to_path_buf(),
                detail: e.to_string(),
            })?;
        }

        if !dest.is_file() {
            return Err(RemasterError::Template {
                path: dest,
                detail: "answer file found neither on the host nor in the image".to_string(),
            });
        }

        Ok(dest)
    }

    /// Run the template engine over all three files with the shared context,
    /// so label, answer-file name and kernel arguments agree everywhere.
    fn substitute_boot_configs(&self, tree: &Path, context: &SubstitutionContext) -> Result<()> {
        let engine = TemplateEngine::new();
        let kickstart = self.stage_kickstart(tree)?;

        let bios = tree.join(BIOS_BOOT_CONFIG);
        let uefi = tree.join(UEFI_BOOT_CONFIG);
        for config in [&bios, &uefi, &kickstart] {
            engine.render_file(config, config, context)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn remaster(kickstart: &str) -> Remaster {
        Remaster {
            source: PathBuf::from("src.iso"),
            output: PathBuf::from("out.iso"),
            kickstart: kickstart.to_string(),
            kargs: vec!["foo".to_string(), "bar".to_string()],
            checksum: None,
            verbose: false,
        }
    }

    fn populate_tree(root: &Path) {
        fs::create_dir_all(root.join("isolinux")).unwrap();
        fs::create_dir_all(root.join("EFI/BOOT")).unwrap();
        fs::write(
            root.join(BIOS_BOOT_CONFIG),
            "append initrd=initrd.img inst.ks=hd:LABEL=${label}:/${kickstart} ${kargs}\n",
        )
        .unwrap();
        fs::write(
            root.join(UEFI_BOOT_CONFIG),
            "linuxefi /images/pxeboot/vmlinuz inst.ks=hd:LABEL=${label}:/${kickstart} ${kargs}\n",
        )
        .unwrap();
    }

    #[test]
    fn substitutes_all_three_files_with_one_context() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path();
        populate_tree(tree);
        fs::write(tree.join("edge.ks"), "bootloader --append=\"${kargs}\"\n").unwrap();

        let remaster = remaster("edge.ks");
        let context = SubstitutionContext::new(
            "EDGE-1.0".to_string(),
            remaster.kickstart_name(),
            &remaster.kargs,
        );
        remaster.substitute_boot_configs(tree, &context).unwrap();

        let bios = fs::read_to_string(tree.join(BIOS_BOOT_CONFIG)).unwrap();
        let uefi = fs::read_to_string(tree.join(UEFI_BOOT_CONFIG)).unwrap();
        let ks = fs::read_to_string(tree.join("edge.ks")).unwrap();

        assert!(bios.contains("inst.ks=hd:LABEL=EDGE-1.0:/edge.ks quiet foo bar"));
        assert!(uefi.contains("inst.ks=hd:LABEL=EDGE-1.0:/edge.ks quiet foo bar"));
        assert!(ks.contains("--append=\"quiet foo bar\""));
        assert!(!bios.contains("${") && !uefi.contains("${") && !ks.contains("${"));
    }

    #[test]
    fn host_kickstart_wins_over_in_image_copy() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir(&tree).unwrap();
        fs::write(tree.join("edge.ks"), "from image").unwrap();

        let host = dir.path().join("edge.ks");
        fs::write(&host, "from host").unwrap();

        let remaster = remaster(host.to_str().unwrap());
        remaster.stage_kickstart(&tree).unwrap();

        assert_eq!(
            fs::read_to_string(tree.join("edge.ks")).unwrap(),
            "from host"
        );
    }

    #[test]
    fn missing_answer_file_fails_before_mastering() {
        let dir = tempfile::tempdir().unwrap();
        let remaster = remaster("nowhere.ks");
        let err = remaster.stage_kickstart(dir.path()).unwrap_err();
        assert!(matches!(err, RemasterError::Template { .. }));
    }

    #[test]
    fn unknown_placeholder_aborts_substitution() {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path();
        populate_tree(tree);
        fs::write(tree.join("edge.ks"), "network --device=${device}\n").unwrap();

        let remaster = remaster("edge.ks");
        let context =
            SubstitutionContext::new("X".to_string(), remaster.kickstart_name(), &[]);
        let err = remaster
            .substitute_boot_configs(tree, &context)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RemasterError>(),
            Some(RemasterError::Template { .. })
        ));
    }

    #[test]
    fn kickstart_name_strips_host_directories() {
        assert_eq!(remaster("configs/edge.ks").kickstart_name(), "edge.ks");
        assert_eq!(remaster("edge.ks").kickstart_name(), "edge.ks");
    }
}
