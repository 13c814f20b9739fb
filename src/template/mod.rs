//! The catalog of available templates.
//!
//! `template.html` at the site root is the default template; named
//! templates live under `templates/`. Built templates are cached by name
//! for the lifetime of one Director and never invalidated within a run —
//! a new Director is created per build or watch session.

pub mod engine;

pub use engine::Template;

use crate::error::{AbortError, Result};
use std::{
    cell::RefCell,
    collections::HashMap,
    path::{Path, PathBuf},
    rc::Rc,
    time::SystemTime,
};

/// The default site template, at the site root.
pub const DEFAULT_TEMPLATE: &str = "template.html";

/// Directory of named templates, at the site root.
pub const TEMPLATES_DIR: &str = "templates";

pub struct TemplateCatalog {
    default_path: PathBuf,
    templates_path: PathBuf,
    default: RefCell<Option<Rc<Template>>>,
    templates: RefCell<HashMap<String, Rc<Template>>>,
    /// Memoized transitive last-modified times, keyed by template name.
    modified: RefCell<HashMap<String, SystemTime>>,
}

impl TemplateCatalog {
    pub fn new(site_path: &Path) -> Self {
        Self {
            default_path: site_path.join(DEFAULT_TEMPLATE),
            templates_path: site_path.join(TEMPLATES_DIR),
            default: RefCell::new(None),
            templates: RefCell::new(HashMap::new()),
            modified: RefCell::new(HashMap::new()),
        }
    }

    /// Get the default site template. Abort if it does not exist.
    pub fn default(&self) -> Result<Rc<Template>> {
        if let Some(template) = self.default.borrow().as_ref() {
            return Ok(Rc::clone(template));
        }

        self.abort_if_missing(&self.default_path)?;
        let template = Rc::new(Template::load(&self.default_path)?);
        *self.default.borrow_mut() = Some(Rc::clone(&template));
        Ok(template)
    }

    /// Get the named template from `templates/`. Abort if not found.
    pub fn get_template(&self, name: &str) -> Result<Rc<Template>> {
        if let Some(template) = self.templates.borrow().get(name) {
            return Ok(Rc::clone(template));
        }

        let path = self.templates_path.join(name);
        self.abort_if_missing(&path)?;
        let template = Rc::new(Template::load(&path)?);
        self.templates
            .borrow_mut()
            .insert(name.to_string(), Rc::clone(&template));
        Ok(template)
    }

    /// Transitive last-modified time: the maximum of the template's own
    /// mtime and, recursively, every template it structurally references.
    /// Unresolvable references (dynamic includes) are skipped; a reference
    /// cycle is an abort.
    pub fn last_modified(&self, template: &Template) -> Result<SystemTime> {
        let mut newest = template.mtime();
        let mut stack = Vec::new();
        for name in template.references() {
            if let Some(modified) = self.reference_modified(name, &mut stack)? {
                newest = newest.max(modified);
            }
        }
        Ok(newest)
    }

    /// Check if the path provided looks like a template.
    pub fn is_template(&self, path: &Path) -> bool {
        path == self.default_path || path.starts_with(&self.templates_path)
    }

    fn reference_modified(
        &self,
        name: &str,
        stack: &mut Vec<String>,
    ) -> Result<Option<SystemTime>> {
        if let Some(modified) = self.modified.borrow().get(name) {
            return Ok(Some(*modified));
        }
        if stack.iter().any(|seen| seen == name) {
            return Err(AbortError::msg(format!(
                "template reference cycle involving {name}"
            )));
        }
        if !self.templates_path.join(name).exists() {
            // Dynamic or optional include; it cannot age the page.
            return Ok(None);
        }

        stack.push(name.to_string());
        let template = self.get_template(name)?;
        let mut newest = template.mtime();
        for reference in template.references() {
            if let Some(modified) = self.reference_modified(reference, stack)? {
                newest = newest.max(modified);
            }
        }
        stack.pop();

        self.modified.borrow_mut().insert(name.to_string(), newest);
        Ok(Some(newest))
    }

    fn abort_if_missing(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(AbortError::msg(format!(
                "no template found at {}",
                path.display()
            )));
        }
        Ok(())
    }
}
