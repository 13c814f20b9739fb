//! Compose an Atom feed from a feed metadata file (`.atom`).
//!
//! The source is a JSON document naming the feed and its entries; the
//! output is `<name>.xml` next to the site's other artifacts. Entry dates
//! use the `2014-06-13T11:39:30` layout.

use super::{ComposeContext, Composer, needs_update, write_artifact};
use crate::error::{AbortError, Result};
use crate::feed::FeedDocument;
use crate::log;
use std::{fs, path::Path};

pub struct AtomComposer;

impl AtomComposer {
    fn parse_feed(&self, source_file: &Path) -> Result<FeedDocument> {
        let metadata = fs::read_to_string(source_file).map_err(AbortError::io(source_file))?;
        serde_json::from_str(&metadata).map_err(|err| {
            AbortError::msg(format!("invalid feed {}: {err}", source_file.display()))
        })
    }
}

impl Composer for AtomComposer {
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

        log!("build"; "generating Atom XML for {} ...", source_file.display());
        let feed = self.parse_feed(source_file)?.into_feed(source_file)?;
        write_artifact(&output_file, &feed.to_xml())
    }

    fn output_extension(&self, _source_file: &Path) -> String {
        ".xml".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composers::PROVENANCE_MARKER;
    use crate::test_support::compose_context;

    const SAMPLE: &str = r#"{
        "title": "Example",
        "url": "https://example.com/feed.atom",
        "author": "Nikka",
        "entries": [
            {"title": "hello", "url": "https://example.com/hello.html",
             "updated": "2025-03-04T09:30:00"}
        ]
    }"#;

    #[test]
    fn test_composes_feed_document() {
        let mut fixture = compose_context();
        let source = fixture.site.join("feed.atom");
        fs::write(&source, SAMPLE).unwrap();

        let outdir = fixture.outdir.clone();
        fixture
            .with_ctx(|ctx| AtomComposer.compose(ctx, &source, &outdir))
            .unwrap();

        let written = fs::read_to_string(outdir.join("feed.xml")).unwrap();
        assert!(written.contains("<title>Example</title>"));
        assert!(written.contains("<updated>2025-03-04T09:30:00Z</updated>"));
        assert!(written.ends_with(PROVENANCE_MARKER));
    }

    #[test]
    fn test_invalid_json_aborts_naming_file() {
        let mut fixture = compose_context();
        let source = fixture.site.join("feed.atom");
        fs::write(&source, "{not json").unwrap();

        let outdir = fixture.outdir.clone();
        let err = fixture
            .with_ctx(|ctx| AtomComposer.compose(ctx, &source, &outdir))
            .unwrap_err();
        assert!(format!("{err}").contains("feed.atom"));
    }

    #[test]
    fn test_output_name() {
        assert_eq!(AtomComposer.output_name(Path::new("feed.atom")), "feed.xml");
    }
}
