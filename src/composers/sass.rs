//! Compose CSS from Sass files (`.scss` or `.sass`).
//!
//! Sass is an external tool, so the executable is resolved once at
//! construction and a missing install aborts before any file work starts.

use super::{ComposeContext, Composer, needs_update};
use crate::error::{AbortError, Result};
use crate::log;
use std::{
    path::{Path, PathBuf},
    process::Command,
};

pub struct SassComposer {
    sass: PathBuf,
}

impl SassComposer {
    /// Resolve the sass executable, optionally from an explicit path
    /// (tests point this at a stub).
    pub fn new(executable: Option<PathBuf>) -> Result<Self> {
        let sass = match executable {
            Some(path) => path,
            None => which::which("sass")
                .map_err(|_| AbortError::msg("sass is not installed"))?,
        };
        Ok(Self { sass })
    }

    fn build_command(&self, source_file: &Path, output_file: &Path) -> Command {
        let mut command = Command::new(&self.sass);
        command
            .arg("--style")
            .arg("compressed")
            .arg(source_file)
            .arg(output_file);
        command
    }
}

impl Composer for SassComposer {
    fn compose(
        &self,
        ctx: &mut ComposeContext<'_>,
        source_file: &Path,
        out_dir: &Path,
    ) -> Result<()> {
        let output_file = out_dir.join(self.output_name(source_file));
        if !needs_update(ctx.config.force, None, source_file, &output_file)? {
            return Ok(());
        }

        log!("build"; "generating CSS for {} ...", source_file.display());
        let output = self
            .build_command(source_file, &output_file)
            .output()
            .map_err(AbortError::io(&self.sass))?;

        if !output.status.success() {
            return Err(AbortError::msg(format!(
                "sass failed to generate CSS:\n{}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }
        Ok(())
    }

    fn output_extension(&self, _source_file: &Path) -> String {
        ".css".to_string()
    }
}
