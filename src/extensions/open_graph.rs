//! Inject Open Graph metadata into the template context of blog entries.
//!
//! The fragment lands under the `open_graph_metadata` key so templates can
//! place it with `${open_graph_metadata}`. Non-entries get an empty string,
//! keeping the key safe to reference on every page.

use super::{is_blog_entry, resolve_image_url};
use crate::error::{AbortError, Result};
use crate::frontmatter::Frontmatter;
use crate::signals::{Extension, SiteView};
use std::path::Path;

pub const CONTEXT_KEY: &str = "open_graph_metadata";

#[derive(Default)]
pub struct OpenGraphExtension {
    default_image: String,
}

impl OpenGraphExtension {
    pub fn new() -> Self {
        Self::default()
    }

    fn blog_metadata(
        &self,
        source_file: &Path,
        frontmatter: &Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<String> {
        let url = view.resolver().as_url(source_file)?;
        let mut metadata = vec![
            "<meta property=\"og:type\" content=\"article\" />".to_string(),
            format!("<meta property=\"og:url\" content=\"{url}\" />"),
        ];

        let image = resolve_image_url(
            &view.config.site.domain,
            &url,
            frontmatter.get("image").and_then(|value| value.as_str()),
            &self.default_image,
        );
        metadata.push(format!("<meta property=\"og:image\" content=\"{image}\" />"));

        let title = quoteless(frontmatter, "title");
        metadata.push(format!("<meta property=\"og:title\" content=\"{title}\" />"));

        if frontmatter.contains_key("summary") {
            let summary = quoteless(frontmatter, "summary");
            metadata.push(format!(
                "<meta property=\"og:description\" content=\"{summary}\" />"
            ));
        }
        Ok(metadata.join("\n"))
    }
}

impl Extension for OpenGraphExtension {
    fn on_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if !view.config.has_section("open_graph") {
            return Err(AbortError::msg(
                "an [open_graph] section is missing in the configuration file",
            ));
        }

        self.default_image = view
            .config
            .option("open_graph", "default_image")
            .ok_or_else(|| {
                AbortError::msg("a default image URL is missing in the configuration file")
            })?
            .to_string();
        Ok(())
    }

    fn on_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        frontmatter: &mut Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<()> {
        let fragment = if is_blog_entry(frontmatter)? {
            self.blog_metadata(source_file, frontmatter, view)?
        } else {
            String::new()
        };
        frontmatter.insert(CONTEXT_KEY.into(), fragment.into());
        Ok(())
    }
}

/// A frontmatter string with double quotes downgraded so the fragment
/// stays well formed inside an attribute value.
fn quoteless(frontmatter: &Frontmatter, key: &str) -> String {
    frontmatter
        .get(key)
        .and_then(|value| value.as_str())
        .unwrap_or("")
        .replace('"', "'")
}
