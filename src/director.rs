//! The orchestrator: walks the source tree and delegates every file to a
//! composer.
//!
//! A Director serves one build or one watch session. Both entry styles —
//! the full `produce` walk and the single-path incremental calls fed by
//! the filesystem watcher — fire the same lifecycle signals, so
//! extensions observe an identical build shape no matter what triggered
//! the work.

use crate::composers::{ComposeContext, Composers};
use crate::config::{self, Configuration};
use crate::error::{AbortError, Result};
use crate::extensions;
use crate::log;
use crate::signals::{SignalBus, SiteView};
use crate::site::Site;
use crate::template::{DEFAULT_TEMPLATE, TEMPLATES_DIR, TemplateCatalog};
use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use walkdir::WalkDir;

/// Editor swap and lock file suffixes, never composed.
/// Vim writes a literal `4913` file to probe the file system.
const SKIP_SUFFIXES: &[&str] = &["~", ".swo", ".swp", ".swpx", ".swx", "4913"];

/// Directory names pruned from the walk at every depth.
const SKIP_DIRECTORIES: &[&str] = &[".sass-cache"];

pub struct Director {
    config: Configuration,
    site: Site,
    catalog: TemplateCatalog,
    composers: Composers,
    bus: SignalBus,
}

impl Director {
    /// Wire up a Director with every configured extension subscribed.
    pub fn new(config: Configuration, site: Site) -> Result<Self> {
        let mut bus = SignalBus::new();
        for extension in extensions::load(&config)? {
            bus.subscribe(extension);
        }

        Ok(Self {
            catalog: TemplateCatalog::new(&site.path),
            composers: Composers::new(),
            config,
            site,
            bus,
        })
    }

    /// Absolute site root this Director builds from.
    pub fn site_path(&self) -> &Path {
        &self.site.path
    }

    /// The output location: the configured override or `<site>/output`.
    pub fn outdir(&self) -> PathBuf {
        match &self.config.outdir {
            Some(outdir) => outdir.clone(),
            None => self.site.output_root(),
        }
    }

    // ========================================================================
    // Full build
    // ========================================================================

    /// Walk the site tree and generate the output.
    pub fn produce(&mut self) -> Result<()> {
        let outdir = self.outdir();
        if outdir.exists() {
            log!("build"; "updating {} ...", outdir.display());
        } else {
            log!("build"; "creating {} ...", outdir.display());
            fs::create_dir_all(&outdir).map_err(AbortError::io(&outdir))?;
        }

        self.fire_pre_composition(&outdir)?;

        // The walker closure cannot borrow self, so it captures owned
        // copies of everything it prunes on.
        let site_path = self.site.path.clone();
        let templates_path = site_path.join(TEMPLATES_DIR);
        let default_template = site_path.join(DEFAULT_TEMPLATE);
        let skip_directories = skip_directory_names(&self.config);
        let outdir_for_filter = outdir.clone();

        let walker = WalkDir::new(&self.site.path)
            .follow_links(false)
            .into_iter()
            .filter_entry(move |entry| {
                let path = entry.path();
                if in_output_path(path, &outdir_for_filter, &site_path) {
                    return false;
                }
                if path == templates_path || path == default_template {
                    return false;
                }
                if entry.file_type().is_dir()
                    && let Some(name) = path.file_name().and_then(|name| name.to_str())
                    && skip_directories.contains(name)
                {
                    return false;
                }
                true
            });

        for entry in walker {
            let entry = entry.map_err(|err| AbortError::msg(format!("walk failed: {err}")))?;
            let path = entry.path();

            if entry.file_type().is_dir() {
                let output_dirpath = self.output_dirpath(path, &outdir)?;
                fs::create_dir_all(&output_dirpath)
                    .map_err(AbortError::io(&output_dirpath))?;
            } else {
                let parent = path.parent().unwrap_or(path);
                let output_dirpath = self.output_dirpath(parent, &outdir)?;
                self.compose_file(path, &output_dirpath, &outdir)?;
            }
        }

        self.fire_post_composition(&outdir)
    }

    // ========================================================================
    // Incremental builds (watcher entry points)
    // ========================================================================

    /// Recompose one source file in response to a change event.
    pub fn process_file(&mut self, path: &Path) -> Result<()> {
        let outdir = self.outdir();
        if in_output_path(path, &outdir, &self.site.path) {
            return Ok(());
        }
        // Template edits invalidate pages through the staleness check on
        // their next composition; the template itself is never content.
        if self.catalog.is_template(path) {
            return Ok(());
        }

        let output_dirpath = self.output_dirpath(path.parent().unwrap_or(path), &outdir)?;
        fs::create_dir_all(&output_dirpath).map_err(AbortError::io(&output_dirpath))?;

        self.fire_pre_composition(&outdir)?;
        self.compose_file(path, &output_dirpath, &outdir)?;
        self.fire_post_composition(&outdir)
    }

    /// Mirror a new source directory into the output tree.
    pub fn process_directory(&mut self, path: &Path) -> Result<()> {
        let outdir = self.outdir();
        if in_output_path(path, &outdir, &self.site.path) {
            return Ok(());
        }
        if self.catalog.is_template(path) {
            return Ok(());
        }

        let output_dirpath = self.output_dirpath(path, &outdir)?;
        self.fire_pre_composition(&outdir)?;
        fs::create_dir_all(&output_dirpath).map_err(AbortError::io(&output_dirpath))?;
        self.fire_post_composition(&outdir)
    }

    // ========================================================================
    // Shared plumbing
    // ========================================================================

    /// The output directory mirroring a source path.
    fn output_dirpath(&self, source_dir: &Path, outdir: &Path) -> Result<PathBuf> {
        let relative = source_dir.strip_prefix(&self.site.path).map_err(|_| {
            AbortError::msg(format!(
                "{} is outside the site at {}",
                source_dir.display(),
                self.site.path.display()
            ))
        })?;
        Ok(outdir.join(relative))
    }

    fn compose_file(&mut self, source_file: &Path, out_dir: &Path, outdir: &Path) -> Result<()> {
        let filename = source_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if should_skip(&filename) {
            return Ok(());
        }

        let start = self.config.timing.then(Instant::now);

        let composer = self.composers.select_composer_for(source_file)?;
        let mut ctx = ComposeContext {
            config: &self.config,
            catalog: &self.catalog,
            composers: &self.composers,
            bus: &mut self.bus,
            site_path: &self.site.path,
            outdir,
        };
        composer.compose(&mut ctx, source_file, out_dir)?;

        if let Some(start) = start {
            log!("build"; "[{:.3}s] {}", start.elapsed().as_secs_f64(), source_file.display());
        }
        Ok(())
    }

    fn fire_pre_composition(&mut self, outdir: &Path) -> Result<()> {
        let view = SiteView {
            config: &self.config,
            composers: &self.composers,
            catalog: &self.catalog,
            site_path: &self.site.path,
            outdir,
        };
        self.bus.fire_pre_composition(&view)
    }

    fn fire_post_composition(&mut self, outdir: &Path) -> Result<()> {
        let view = SiteView {
            config: &self.config,
            composers: &self.composers,
            catalog: &self.catalog,
            site_path: &self.site.path,
            outdir,
        };
        self.bus.fire_post_composition(&view)
    }
}

/// Directory names pruned from traversal, built-in plus configured.
pub(crate) fn skip_directory_names(config: &Configuration) -> HashSet<String> {
    SKIP_DIRECTORIES
        .iter()
        .map(|name| name.to_string())
        .chain(config.site.skip_directories.iter().cloned())
        .collect()
}

/// Should this file name be skipped entirely?
pub(crate) fn should_skip(filename: &str) -> bool {
    SKIP_SUFFIXES
        .iter()
        .any(|suffix| filename.ends_with(suffix))
        || filename == config::FILENAME
}

/// Is `path` inside the output location? When the site itself lives inside
/// the output location, paths that are also inside the site do not count —
/// otherwise the whole site would be unreachable.
pub(crate) fn in_output_path(path: &Path, outdir: &Path, site_path: &Path) -> bool {
    if !path.starts_with(outdir) {
        return false;
    }
    if site_path.starts_with(outdir) && path.starts_with(site_path) {
        return false;
    }
    true
}
