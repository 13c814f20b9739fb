//! Collect the URL of every HTML page and emit `sitemap.txt`.

use crate::error::{AbortError, Result};
use crate::frontmatter::Frontmatter;
use crate::log;
use crate::signals::{Extension, SiteView};
use std::{collections::BTreeSet, fs, path::Path};

pub const FILENAME: &str = "sitemap.txt";

pub struct SitemapExtension {
    urls: BTreeSet<String>,
    dirty: bool,
    hydrated: bool,
}

impl SitemapExtension {
    pub fn new() -> Self {
        Self {
            urls: BTreeSet::new(),
            dirty: false,
            hydrated: false,
        }
    }
}

impl Extension for SitemapExtension {
    /// Carry the previous session's URLs forward so a build that only
    /// recomposes a few stale files never shrinks the sitemap.
    fn on_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if self.hydrated {
            return Ok(());
        }
        match fs::read_to_string(view.outdir.join(FILENAME)) {
            Ok(existing) => self.urls.extend(existing.lines().map(str::to_string)),
            // Nothing on disk yet: the first post-composition writes it.
            Err(_) => self.dirty = true,
        }
        self.hydrated = true;
        Ok(())
    }

    fn on_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        _frontmatter: &mut Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<()> {
        if view.composers.output_extension(source_file)? != ".html" {
            return Ok(());
        }

        let url = view.resolver().as_url(source_file)?;
        if self.urls.insert(url) {
            self.dirty = true;
        }
        Ok(())
    }

    fn on_post_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        log!("sitemap"; "generating sitemap ...");
        let mut sitemap = String::new();
        for url in &self.urls {
            sitemap.push_str(url);
            sitemap.push('\n');
        }

        let output_file = view.outdir.join(FILENAME);
        fs::write(&output_file, sitemap).map_err(AbortError::io(&output_file))?;
        self.dirty = false;
        Ok(())
    }
}
