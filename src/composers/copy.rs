//! The copy fallback for unrecognized file types.
//!
//! A file already present in the output is compared by content and only
//! rewritten when it differs, so untouched assets never churn mtimes.

use super::{ComposeContext, Composer};
use crate::error::{AbortError, Result};
use crate::log;
use std::{fs, path::Path};

pub struct CopyComposer;

impl Composer for CopyComposer {
    fn compose(
        &self,
        ctx: &mut ComposeContext<'_>,
        source_file: &Path,
        out_dir: &Path,
    ) -> Result<()> {
        let destination = out_dir.join(self.output_name(source_file));

        if !ctx.config.force && destination.exists() {
            let source = fs::read(source_file).map_err(AbortError::io(source_file))?;
            let existing = fs::read(&destination).map_err(AbortError::io(&destination))?;
            if source == existing {
                return Ok(());
            }
        }

        log!("build"; "copying {} ...", source_file.display());
        fs::copy(source_file, &destination).map_err(AbortError::io(source_file))?;
        Ok(())
    }

    fn output_extension(&self, source_file: &Path) -> String {
        match source_file.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::compose_context;

    #[test]
    fn test_extension_is_preserved() {
        assert_eq!(CopyComposer.output_extension(Path::new("logo.png")), ".png");
        assert_eq!(CopyComposer.output_extension(Path::new("LICENSE")), "");
        assert_eq!(CopyComposer.output_name(Path::new("logo.png")), "logo.png");
    }

    #[test]
    fn test_copies_new_file() {
        let mut fixture = compose_context();
        let source = fixture.site.join("logo.png");
        fs::write(&source, b"png bytes").unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| CopyComposer.compose(ctx, &source, &outdir))
            .unwrap();
        assert_eq!(fs::read(outdir.join("logo.png")).unwrap(), b"png bytes");
    }

    #[test]
    fn test_identical_file_is_not_rewritten() {
        let mut fixture = compose_context();
        let source = fixture.site.join("logo.png");
        let destination = fixture.outdir.join("logo.png");
        fs::write(&source, b"same").unwrap();
        fs::write(&destination, b"same").unwrap();
        let before = fs::metadata(&destination).unwrap().modified().unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| CopyComposer.compose(ctx, &source, &outdir))
            .unwrap();
        let after = fs::metadata(&destination).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_changed_file_is_replaced() {
        let mut fixture = compose_context();
        let source = fixture.site.join("notes.txt");
        let destination = fixture.outdir.join("notes.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&destination, b"old").unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| CopyComposer.compose(ctx, &source, &outdir))
            .unwrap();
        assert_eq!(fs::read(&destination).unwrap(), b"new");
    }
}
