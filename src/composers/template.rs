//! Compose any content from a template source file (`.tpl`).
//!
//! A `.tpl` file renders itself: its content is run through placeholder
//! substitution against its own frontmatter, and the output name is the
//! source name with the final `.tpl` stripped — `style.css.tpl` becomes
//! `style.css`, so the output extension is re-derived from what remains.

use super::{ComposeContext, Composer, needs_update, write_artifact};
use crate::error::Result;
use crate::frontmatter;
use crate::log;
use crate::template::engine;
use std::path::Path;

pub struct TemplateComposer;

impl TemplateComposer {
    /// The source name with the trailing `.tpl` removed.
    fn stripped_name(&self, source_file: &Path) -> String {
        source_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl Composer for TemplateComposer {
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

        log!("build"; "generating {} ...", output_file.display());
        let (mut data, content) = frontmatter::extract_untitled(source_file)?;
        ctx.fire_frontmatter_loaded(source_file, &mut data)?;
        data.insert("domain".into(), ctx.config.site.domain.clone().into());

        write_artifact(&output_file, &engine::substitute(&content, &data))
    }

    fn output_extension(&self, source_file: &Path) -> String {
        match Path::new(&self.stripped_name(source_file)).extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy()),
            None => String::new(),
        }
    }

    fn output_name(&self, source_file: &Path) -> String {
        self.stripped_name(source_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composers::PROVENANCE_MARKER;
    use crate::test_support::compose_context;
    use std::fs;

    #[test]
    fn test_strips_final_suffix() {
        assert_eq!(
            TemplateComposer.output_name(Path::new("style.css.tpl")),
            "style.css"
        );
        assert_eq!(
            TemplateComposer.output_extension(Path::new("style.css.tpl")),
            ".css"
        );
        assert_eq!(TemplateComposer.output_name(Path::new("bare.tpl")), "bare");
        assert_eq!(TemplateComposer.output_extension(Path::new("bare.tpl")), "");
    }

    #[test]
    fn test_renders_with_own_frontmatter() {
        let mut fixture = compose_context();
        let source = fixture.site.join("greeting.txt.tpl");
        fs::write(&source, "---\nname = \"world\"\n---\nhello ${name}\n").unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| TemplateComposer.compose(ctx, &source, &outdir))
            .unwrap();

        let written = fs::read_to_string(outdir.join("greeting.txt")).unwrap();
        assert_eq!(written, format!("hello world\n{PROVENANCE_MARKER}"));
    }

    #[test]
    fn test_domain_available_to_templates() {
        let mut fixture = compose_context();
        fixture.config.site.domain = "https://example.com".to_string();
        let source = fixture.site.join("robots.txt.tpl");
        fs::write(&source, "Sitemap: ${domain}/sitemap.txt\n").unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| TemplateComposer.compose(ctx, &source, &outdir))
            .unwrap();

        let written = fs::read_to_string(outdir.join("robots.txt")).unwrap();
        assert!(written.starts_with("Sitemap: https://example.com/sitemap.txt"));
    }
}
