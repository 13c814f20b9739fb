//! Compose HTML from Markdown files (`.md`).

use super::{ComposeContext, Composer, compose_page};
use crate::error::Result;
use pulldown_cmark::{Options, Parser, html};
use std::path::Path;

/// Converts Markdown content and merges it with a catalog template.
///
/// Fenced code blocks, tables and strikethrough are enabled; the rendered
/// fragment is passed to the template as `${content}`.
pub struct MarkdownComposer {
    options: Options,
}

impl MarkdownComposer {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        Self { options }
    }

    fn generate_content(&self, source: &str) -> String {
        let parser = Parser::new_ext(source, self.options);
        let mut output = String::with_capacity(source.len() * 2);
        html::push_html(&mut output, parser);
        output.trim_end().to_string()
    }
}

impl Default for MarkdownComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer for MarkdownComposer {
    fn compose(
        &self,
        ctx: &mut ComposeContext<'_>,
        source_file: &Path,
        out_dir: &Path,
    ) -> Result<()> {
        let output_name = self.output_name(source_file);
        compose_page(ctx, source_file, out_dir, &output_name, &|source| {
            self.generate_content(source)
        })
    }

    fn output_extension(&self, _source_file: &Path) -> String {
        ".html".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraph_rendering() {
        let composer = MarkdownComposer::new();
        assert_eq!(composer.generate_content("Hello"), "<p>Hello</p>");
    }

    #[test]
    fn test_fenced_code() {
        let composer = MarkdownComposer::new();
        let rendered = composer.generate_content("```\nlet x = 1;\n```");
        assert!(rendered.starts_with("<pre><code>"));
    }

    #[test]
    fn test_output_name() {
        let composer = MarkdownComposer::new();
        assert_eq!(composer.output_name(Path::new("posts/a.md")), "a.html");
    }
}
