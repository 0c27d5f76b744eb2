use anyhow::Result;
use std::process::Command;

use crate::error::RemasterError;

/// Host commands every run shells out to, with the package providing each.
pub const REQUIRED_TOOLS: &[(&str, &str)] = &[
    ("xorriso", "xorriso"),
    ("mount", "util-linux"),
    ("umount", "util-linux"),
    ("cp", "coreutils"),
];

/// Check whether a command can be located in PATH.
pub fn command_exists(cmd: &str) -> bool {
    Command::new("which")
        .arg(cmd)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Fail early, with the tool named, instead of hitting "command not found"
/// halfway through the pipeline.
pub fn check_required_tools(tools: &[(&str, &str)]) -> Result<()> {
    for (tool, package) in tools {
        if !command_exists(tool) {
            return Err(RemasterError::MissingTool {
                tool: tool.to_string(),
                package: package.to_string(),
            }
            .into());
        }
    }
    Ok(())
}
