//! Inject Twitter card metadata into the template context of blog entries.
//!
//! Mirrors the open graph injector: the fragment lands under the
//! `twitter_metadata` key, and non-entries get an empty string.

use super::{is_blog_entry, resolve_image_url};
use crate::error::{AbortError, Result};
use crate::frontmatter::Frontmatter;
use crate::signals::{Extension, SiteView};
use std::path::Path;

pub const CONTEXT_KEY: &str = "twitter_metadata";

#[derive(Default)]
pub struct TwitterExtension {
    default_image: String,
    site_username: String,
}

impl TwitterExtension {
    pub fn new() -> Self {
        Self::default()
    }

    fn card_metadata(
        &self,
        source_file: &Path,
        frontmatter: &Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<String> {
        let mut metadata = vec![
            "<meta name=\"twitter:card\" content=\"summary\" />".to_string(),
            format!(
                "<meta name=\"twitter:site\" content=\"{}\" />",
                self.site_username
            ),
        ];

        let url = view.resolver().as_url(source_file)?;
        let image = resolve_image_url(
            &view.config.site.domain,
            &url,
            frontmatter.get("image").and_then(|value| value.as_str()),
            &self.default_image,
        );
        metadata.push(format!("<meta name=\"twitter:image\" content=\"{image}\" />"));

        let title = quoteless(frontmatter, "title");
        metadata.push(format!("<meta name=\"twitter:title\" content=\"{title}\" />"));

        if frontmatter.contains_key("summary") {
            let summary = quoteless(frontmatter, "summary");
            metadata.push(format!(
                "<meta name=\"twitter:description\" content=\"{summary}\" />"
            ));
        }
        Ok(metadata.join("\n"))
    }
}

impl Extension for TwitterExtension {
    fn on_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if !view.config.has_section("twitter") {
            return Err(AbortError::msg(
                "a [twitter] section is missing in the configuration file",
            ));
        }

        self.default_image = view
            .config
            .option("twitter", "default_image")
            .ok_or_else(|| {
                AbortError::msg("a default image URL is missing in the configuration file")
            })?
            .to_string();
        self.site_username = view
            .config
            .option("twitter", "site_username")
            .ok_or_else(|| {
                AbortError::msg("a site username is missing in the configuration file")
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
            self.card_metadata(source_file, frontmatter, view)?
        } else {
            String::new()
        };
        frontmatter.insert(CONTEXT_KEY.into(), fragment.into());
        Ok(())
    }
}

fn quoteless(frontmatter: &Frontmatter, key: &str) -> String {
    frontmatter
        .get(key)
        .and_then(|value| value.as_str())
        .unwrap_or("")
        .replace('"', "'")
}
