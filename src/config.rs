//! Site configuration management for `sitewright.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                         |
//! |----------------|-------------------------------------------------|
//! | `[site]`       | Domain, output directory, active extensions     |
//! | `[blog]`       | Feed metadata consumed by the blog extension    |
//! | `[open_graph]` | Options for the open-graph metadata injector    |
//! | `[twitter]`    | Options for the twitter-card metadata injector  |
//!
//! # Example
//!
//! ```toml
//! [site]
//! domain = "https://example.com"
//! extensions = ["blog", "sitemap"]
//!
//! [blog]
//! author = "Nikka"
//! title = "Example feed"
//! url = "https://example.com/feed.atom"
//! feed = "feed.atom"
//! ```
//!
//! Extension sections are kept as raw TOML tables and read through
//! [`Configuration::option`], so extensions validate their own keys on
//! `pre-composition` instead of the loader knowing about every extension.

use crate::cli::BuildArgs;
use crate::error::{AbortError, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Name of the site configuration file, always skipped during the walk.
pub const FILENAME: &str = "sitewright.toml";

fn default_domain() -> String {
    "http://localhost".to_string()
}

/// `[site]` section of `sitewright.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Domain prepended to routes when resolving URLs.
    pub domain: String,

    /// Output directory override, relative to the site root.
    pub outdir: Option<PathBuf>,

    /// Extensions to activate, in subscription order.
    pub extensions: Vec<String>,

    /// Extra directory names pruned from the walk at every level.
    pub skip_directories: Vec<String>,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            outdir: None,
            extensions: Vec::new(),
            skip_directories: Vec::new(),
        }
    }
}

/// Configuration data for one build or watch session.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    /// Parsed `[site]` section.
    pub site: SiteSection,

    /// Force every composer to report stale.
    pub force: bool,

    /// Report elapsed time per composed file.
    pub timing: bool,

    /// Resolved absolute output directory override, if any.
    pub outdir: Option<PathBuf>,

    /// The raw configuration file table, for named option lookup.
    sections: toml::Table,
}

impl Configuration {
    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        let sections: toml::Table = content
            .parse()
            .map_err(|err| AbortError::msg(format!("invalid configuration file: {err}")))?;

        let site = match sections.get("site") {
            Some(value) => SiteSection::deserialize(value.clone()).map_err(|err| {
                AbortError::msg(format!("invalid [site] configuration: {err}"))
            })?,
            None => SiteSection::default(),
        };

        Ok(Self {
            site,
            sections,
            ..Self::default()
        })
    }

    /// Load the configuration file from the site root, if present.
    pub fn load(site_path: &Path) -> Result<Self> {
        let config_path = site_path.join(FILENAME);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(&config_path).map_err(AbortError::io(&config_path))?;
        let mut config = Self::from_str(&content)?;

        // An outdir from the file is anchored at the site root.
        if let Some(outdir) = &config.site.outdir {
            config.outdir = Some(absolute_under(site_path, outdir));
        }
        Ok(config)
    }

    /// Overlay command line arguments. Arguments have the highest
    /// precedence and overwrite any file-provided value.
    pub fn update_with_cli(&mut self, args: &BuildArgs) {
        self.force = args.force;
        self.timing = args.timing;
        if let Some(outdir) = &args.outdir {
            self.outdir = Some(std::path::absolute(outdir).unwrap_or_else(|_| outdir.clone()));
        }
    }

    /// Check whether a named section exists in the configuration file.
    pub fn has_section(&self, section: &str) -> bool {
        matches!(self.sections.get(section), Some(toml::Value::Table(_)))
    }

    /// Look up a string option inside a named section.
    pub fn option(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)?
            .as_table()?
            .get(key)?
            .as_str()
    }
}

/// Resolve `path` against `root` unless it is already absolute.
fn absolute_under(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[site]
domain = "https://example.com"
extensions = ["blog", "sitemap"]

[blog]
author = "Nikka"
feed = "feed.atom"
"#;

    #[test]
    fn test_site_section_parsed() {
        let config = Configuration::from_str(SAMPLE).unwrap();
        assert_eq!(config.site.domain, "https://example.com");
        assert_eq!(config.site.extensions, vec!["blog", "sitemap"]);
    }

    #[test]
    fn test_option_lookup() {
        let config = Configuration::from_str(SAMPLE).unwrap();
        assert!(config.has_section("blog"));
        assert_eq!(config.option("blog", "author"), Some("Nikka"));
        assert_eq!(config.option("blog", "missing"), None);
        assert!(!config.has_section("open_graph"));
    }

    #[test]
    fn test_defaults_without_site_section() {
        let config = Configuration::from_str("[blog]\nauthor = \"n\"\n").unwrap();
        assert_eq!(config.site.domain, "http://localhost");
        assert!(config.site.extensions.is_empty());
    }

    #[test]
    fn test_invalid_toml_aborts() {
        let err = Configuration::from_str("not [ toml").unwrap_err();
        assert!(format!("{err}").contains("invalid configuration file"));
    }

    #[test]
    fn test_file_outdir_anchored_at_site_root() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(FILENAME),
            "[site]\noutdir = \"published\"\n",
        )
        .unwrap();
        let config = Configuration::load(dir.path()).unwrap();
        assert_eq!(config.outdir, Some(dir.path().join("published")));
    }
}
