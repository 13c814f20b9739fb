//! Composer selection and the shared composition contract.
//!
//! A composer converts one source file into one output artifact. The
//! registry maps file suffixes to composer instances, constructing each
//! lazily on first use (the sass composer probes for its executable at
//! construction, which must not happen for sites that never use sass).
//!
//! Staleness, frontmatter handling and output writing are shared policy
//! implemented here once and called explicitly by each variant.

mod atom;
mod copy;
mod markdown;
mod sass;
mod template;

pub use atom::AtomComposer;
pub use copy::CopyComposer;
pub use markdown::MarkdownComposer;
pub use sass::SassComposer;
pub use template::TemplateComposer;

use crate::config::Configuration;
use crate::error::{AbortError, Result};
use crate::frontmatter::{self, Frontmatter};
use crate::log;
use crate::signals::{SignalBus, SiteView};
use crate::template::{Template, TemplateCatalog};
use std::{
    cell::RefCell,
    collections::HashMap,
    fs,
    path::Path,
    rc::Rc,
    time::SystemTime,
};

/// Trailing provenance stamp appended to every composed artifact,
/// byte-identical across composer types.
pub const PROVENANCE_MARKER: &str = "<!-- pressed into shape by sitewright -->\n";

/// Everything a composer may touch while composing one file. The signal
/// bus is reachable only through [`ComposeContext::fire_frontmatter_loaded`],
/// which builds the listener-facing view from the same borrows.
pub struct ComposeContext<'a> {
    pub config: &'a Configuration,
    pub catalog: &'a TemplateCatalog,
    pub composers: &'a Composers,
    pub bus: &'a mut SignalBus,
    pub site_path: &'a Path,
    pub outdir: &'a Path,
}

impl ComposeContext<'_> {
    /// Deliver `frontmatter-loaded` to every listener, in order. Listeners
    /// mutate the frontmatter in place before the composer consumes it.
    pub fn fire_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        data: &mut Frontmatter,
    ) -> Result<()> {
        let view = SiteView {
            config: self.config,
            composers: self.composers,
            catalog: self.catalog,
            site_path: self.site_path,
            outdir: self.outdir,
        };
        self.bus.fire_frontmatter_loaded(source_file, data, &view)
    }
}

/// A component converting one source file into one output artifact.
pub trait Composer {
    /// Compose the source file into the output directory, skipping the
    /// work entirely when the artifact is already fresh.
    fn compose(&self, ctx: &mut ComposeContext<'_>, source_file: &Path, out_dir: &Path)
    -> Result<()>;

    /// The extension the output artifact will carry, without composing.
    fn output_extension(&self, source_file: &Path) -> String;

    /// The output file name for a source file: stem plus output extension
    /// unless a variant overrides the whole name.
    fn output_name(&self, source_file: &Path) -> String {
        let stem = source_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}{}", self.output_extension(source_file))
    }
}

/// Suffix-keyed composer registry with a copy fallback.
pub struct Composers {
    cache: RefCell<HashMap<&'static str, Rc<dyn Composer>>>,
}

impl Default for Composers {
    fn default() -> Self {
        Self::new()
    }
}

impl Composers {
    pub fn new() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Return the composer registered for the file's suffix, or the copy
    /// fallback when nothing matches. Instances are cached per registry.
    pub fn select_composer_for(&self, source_file: &Path) -> Result<Rc<dyn Composer>> {
        let key = registry_key(source_file);
        if let Some(composer) = self.cache.borrow().get(key) {
            return Ok(Rc::clone(composer));
        }

        let composer: Rc<dyn Composer> = match key {
            "md" => Rc::new(MarkdownComposer::new()),
            "sass" => Rc::new(SassComposer::new(None)?),
            "atom" => Rc::new(AtomComposer),
            "tpl" => Rc::new(TemplateComposer),
            _ => Rc::new(CopyComposer),
        };
        self.cache.borrow_mut().insert(key, Rc::clone(&composer));
        Ok(composer)
    }

    /// What the selected composer would produce, without composing.
    pub fn output_extension(&self, source_file: &Path) -> Result<String> {
        Ok(self
            .select_composer_for(source_file)?
            .output_extension(source_file))
    }

    /// Output file name the selected composer would write.
    pub fn output_name(&self, source_file: &Path) -> Result<String> {
        Ok(self
            .select_composer_for(source_file)?
            .output_name(source_file))
    }
}

/// Map a file name to its registry slot. `.scss` and `.sass` share the
/// sass composer; everything unrecognized falls through to copy.
fn registry_key(source_file: &Path) -> &'static str {
    match source_file
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
    {
        "md" => "md",
        "scss" | "sass" => "sass",
        "atom" => "atom",
        "tpl" => "tpl",
        _ => "copy",
    }
}

/// Shared staleness policy: the output needs regeneration if a force flag
/// is set, the output is missing, the source is newer, or the template
/// chain is newer.
pub fn needs_update(
    force: bool,
    template_modified: Option<SystemTime>,
    source_file: &Path,
    output_file: &Path,
) -> Result<bool> {
    if force {
        return Ok(true);
    }

    let output_modified = match fs::metadata(output_file).and_then(|meta| meta.modified()) {
        Ok(modified) => modified,
        // The output does not exist, so it definitely needs an "update".
        Err(_) => return Ok(true),
    };

    let source_modified = fs::metadata(source_file)
        .and_then(|meta| meta.modified())
        .map_err(AbortError::io(source_file))?;
    if source_modified > output_modified {
        return Ok(true);
    }

    if let Some(template_modified) = template_modified
        && template_modified > output_modified
    {
        return Ok(true);
    }

    Ok(false)
}

/// Write a composed artifact in one buffer, provenance marker included.
pub fn write_artifact(output_file: &Path, rendered: &str) -> Result<()> {
    let mut buffer = String::with_capacity(rendered.len() + PROVENANCE_MARKER.len());
    buffer.push_str(rendered);
    buffer.push_str(PROVENANCE_MARKER);
    fs::write(output_file, buffer).map_err(AbortError::io(output_file))
}

/// Select a template from the catalog based on the source file's data.
pub fn select_template(
    catalog: &TemplateCatalog,
    data: &Frontmatter,
) -> Result<Rc<Template>> {
    match data.get("template").and_then(|value| value.as_str()) {
        Some(name) => catalog.get_template(name),
        None => catalog.default(),
    }
}

/// The shared template-driven composition flow: extract frontmatter,
/// select the template, bail while fresh, fire `frontmatter-loaded`,
/// render the content into the template and write the artifact.
pub(crate) fn compose_page(
    ctx: &mut ComposeContext<'_>,
    source_file: &Path,
    out_dir: &Path,
    output_name: &str,
    generate_content: &dyn Fn(&str) -> String,
) -> Result<()> {
    let (mut data, content) = frontmatter::extract(source_file)?;
    let template = select_template(ctx.catalog, &data)?;
    let output_file = out_dir.join(output_name);

    let template_modified = ctx.catalog.last_modified(&template)?;
    if !needs_update(
        ctx.config.force,
        Some(template_modified),
        source_file,
        &output_file,
    )? {
        return Ok(());
    }

    log!("build"; "generating HTML for {} ...", source_file.display());
    ctx.fire_frontmatter_loaded(source_file, &mut data)?;
    data.insert("content".into(), generate_content(&content).into());

    let rendered = template.render(&data, ctx.catalog)?;
    write_artifact(&output_file, &rendered)
}
