use handlebars::Handlebars;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::RemasterError;

/// The closed variable set every boot-loader config and answer file is
/// rendered against. Built once per run; all three files share it so the
/// BIOS config, the UEFI config and the kickstart agree on label, answer
/// file name and kernel arguments.
#[derive(Debug, Clone, Serialize)]
pub struct SubstitutionContext {
    pub label: String,
    pub kickstart: String,
    pub kargs: String,
}

impl SubstitutionContext {
    /// The kernel argument string always leads with `quiet`; extra tokens
    /// are appended in the order they were supplied.
    pub fn new(label: String, kickstart: String, extra_kargs: &[String]) -> Self {
        let kargs = std::iter::once("quiet")
            .chain(extra_kargs.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            label,
            kickstart,
            kargs,
        }
    }
}

/// Substitutes `${label}`, `${kickstart}` and `${kargs}` tokens in boot
/// configs and answer files.
///
/// Tokens are rewritten to Handlebars form and rendered in strict mode: a
/// token naming anything outside the context fails the run rather than
/// surviving into a boot config that "builds" but cannot boot.
pub struct TemplateEngine {
    handlebars: Handlebars<'static>,
    token: Regex,
}

impl TemplateEngine {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        // Boot configs are not HTML.
        handlebars.register_escape_fn(handlebars::no_escape);

        Self {
            handlebars,
            token: Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap(),
        }
    }

    pub fn render_string(
        &self,
        template: &str,
        context: &SubstitutionContext,
    ) -> Result<String, handlebars::RenderError> {
        // Convert ${name} tokens to {{name}}
        let converted = self.token.replace_all(template, "{{$1}}");
        self.handlebars.render_template(&converted, context)
    }

    /// Substitute `src` into `dest`, creating or overwriting it. `src` and
    /// `dest` may be the same path.
    pub fn render_file(
        &self,
        src: &Path,
        dest: &Path,
        context: &SubstitutionContext,
    ) -> Result<(), RemasterError> {
        debug!("Substituting {}", src.display());

        let template = std::fs::read_to_string(src).map_err(|e| RemasterError::Template {
            path: src.to_path_buf(),
            detail: e.to_string(),
        })?;

        let rendered = self
            .render_string(&template, context)
            .map_err(|e| RemasterError::Template {
                path: src.to_path_buf(),
                detail: e.to_string(),
            })?;

        std::fs::write(dest, rendered).map_err(|e| RemasterError::Template {
            path: dest.to_path_buf(),
            detail: e.to_string(),
        })?;

        Ok(())
    }
}
