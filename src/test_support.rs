//! Shared fixtures for composer and extension tests.

use crate::composers::{ComposeContext, Composers};
use crate::config::Configuration;
use crate::signals::{SignalBus, SiteView};
use crate::template::TemplateCatalog;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// A throwaway site with an output directory and every collaborator a
/// composer needs.
pub struct ComposeFixture {
    _tempdir: TempDir,
    pub site: PathBuf,
    pub outdir: PathBuf,
    pub config: Configuration,
    pub catalog: TemplateCatalog,
    pub composers: Composers,
    pub bus: SignalBus,
}

impl ComposeFixture {
    /// Run a closure with a fully wired [`ComposeContext`].
    pub fn with_ctx<T>(&mut self, f: impl FnOnce(&mut ComposeContext<'_>) -> T) -> T {
        let mut ctx = ComposeContext {
            config: &self.config,
            catalog: &self.catalog,
            composers: &self.composers,
            bus: &mut self.bus,
            site_path: &self.site,
            outdir: &self.outdir,
        };
        f(&mut ctx)
    }

    /// Run a closure with the listener-facing [`SiteView`].
    pub fn with_view<T>(&self, f: impl FnOnce(&SiteView<'_>) -> T) -> T {
        let view = SiteView {
            config: &self.config,
            composers: &self.composers,
            catalog: &self.catalog,
            site_path: &self.site,
            outdir: &self.outdir,
        };
        f(&view)
    }

    /// Write a default `template.html` so template-driven composers work.
    pub fn with_default_template(self, content: &str) -> Self {
        fs::write(self.site.join("template.html"), content).unwrap();
        self
    }
}

/// Build a fixture with empty configuration and a fresh site/output pair.
pub fn compose_context() -> ComposeFixture {
    compose_context_with(Configuration::default())
}

/// Build a fixture around a specific configuration.
pub fn compose_context_with(config: Configuration) -> ComposeFixture {
    let tempdir = tempfile::tempdir().unwrap();
    let site = tempdir.path().join("site");
    let outdir = tempdir.path().join("site").join("output");
    fs::create_dir_all(&outdir).unwrap();
    let catalog = TemplateCatalog::new(&site);
    ComposeFixture {
        _tempdir: tempdir,
        site,
        outdir,
        config,
        catalog,
        composers: Composers::new(),
        bus: SignalBus::new(),
    }
}
