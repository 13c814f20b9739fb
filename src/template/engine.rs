//! The minimal template language.
//!
//! Templates are plain text with three constructs:
//!
//! - `${name}` — substitute a context value; unknown names are left
//!   untouched (safe-substitute semantics).
//! - `{% include "name" %}` — splice another catalog template, rendered
//!   with the same context.
//! - `{% extends "name" %}` — render this template's body first, then
//!   render the named parent with the body bound to `${content}`.
//!
//! The referenced-template names double as the structural dependency set
//! that drives transitive staleness in the catalog.

use crate::error::{AbortError, Result};
use crate::frontmatter::Frontmatter;
use crate::template::TemplateCatalog;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::SystemTime,
};

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%\s*(extends|include)\s+"([^"]+)"\s*%\}\n?"#).unwrap()
});

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// A parsed template with its structural references and source mtime.
#[derive(Debug)]
pub struct Template {
    path: PathBuf,
    /// Source text with any `extends` directive stripped.
    body: String,
    /// Parent template name from the first `extends` directive.
    parent: Option<String>,
    /// Every referenced template name, parents and includes alike.
    references: Vec<String>,
    mtime: SystemTime,
}

impl Template {
    /// Load and parse a template file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path).map_err(AbortError::io(path))?;
        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(AbortError::io(path))?;

        let mut parent = None;
        let mut references = Vec::new();
        for capture in DIRECTIVE.captures_iter(&source) {
            let name = capture[2].to_string();
            if &capture[1] == "extends" && parent.is_none() {
                parent = Some(name.clone());
            }
            references.push(name);
        }

        // The extends directive is a declaration, not content.
        let body = DIRECTIVE
            .replace_all(&source, |capture: &regex::Captures| {
                if &capture[1] == "extends" {
                    String::new()
                } else {
                    capture[0].to_string()
                }
            })
            .into_owned();

        Ok(Self {
            path: path.to_path_buf(),
            body,
            parent,
            references,
            mtime,
        })
    }

    /// Modification time of this template's own source file.
    pub fn mtime(&self) -> SystemTime {
        self.mtime
    }

    /// Names of every template this one structurally references.
    pub fn references(&self) -> &[String] {
        &self.references
    }

    /// Render the template against a context, resolving includes and the
    /// inheritance chain through the catalog.
    pub fn render(&self, context: &Frontmatter, catalog: &TemplateCatalog) -> Result<String> {
        let spliced = self.splice_includes(context, catalog)?;
        let rendered = substitute(&spliced, context);

        match &self.parent {
            Some(parent) => {
                let mut wrapped = context.clone();
                wrapped.insert("content".into(), rendered.into());
                catalog.get_template(parent)?.render(&wrapped, catalog)
            }
            None => Ok(rendered),
        }
    }

    /// Replace every include directive with the rendered target template.
    fn splice_includes(&self, context: &Frontmatter, catalog: &TemplateCatalog) -> Result<String> {
        if !self.body.contains("{%") {
            return Ok(self.body.clone());
        }

        let mut out = String::with_capacity(self.body.len());
        let mut cursor = 0;
        for capture in DIRECTIVE.captures_iter(&self.body) {
            let whole = capture.get(0).unwrap();
            out.push_str(&self.body[cursor..whole.start()]);
            let included = catalog.get_template(&capture[2]).map_err(|err| {
                AbortError::msg(format!(
                    "{} (included from {})",
                    err,
                    self.path.display()
                ))
            })?;
            out.push_str(&included.render(context, catalog)?);
            cursor = whole.end();
        }
        out.push_str(&self.body[cursor..]);
        Ok(out)
    }
}

/// Substitute `${name}` placeholders from the context, leaving unknown
/// placeholders as-is.
pub fn substitute(text: &str, context: &Frontmatter) -> String {
    PLACEHOLDER
        .replace_all(text, |capture: &regex::Captures| {
            match context.get(&capture[1]) {
                Some(value) => value_to_string(value),
                None => capture[0].to_string(),
            }
        })
        .into_owned()
}

/// Render a context value as template text.
fn value_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> Frontmatter {
        let mut table = Frontmatter::new();
        for (key, value) in pairs {
            table.insert((*key).into(), (*value).into());
        }
        table
    }

    #[test]
    fn test_substitute_known_and_unknown() {
        let ctx = context(&[("title", "Hi")]);
        assert_eq!(substitute("<h1>${title}</h1>${x}", &ctx), "<h1>Hi</h1>${x}");
    }

    #[test]
    fn test_substitute_non_string_values() {
        let mut ctx = Frontmatter::new();
        ctx.insert("count".into(), 3.into());
        assert_eq!(substitute("n=${count}", &ctx), "n=3");
    }

    #[test]
    fn test_load_collects_references() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "{% extends \"base.html\" %}\n{% include \"nav.html\" %}\n${title}",
        )
        .unwrap();
        let template = Template::load(&path).unwrap();
        assert_eq!(template.parent.as_deref(), Some("base.html"));
        assert_eq!(template.references(), ["base.html", "nav.html"]);
        assert!(!template.body.contains("extends"));
        assert!(template.body.contains("include"));
    }

    #[test]
    fn test_directive_whitespace_variants() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        // Tight braces and tab separators are both accepted.
        fs::write(
            &path,
            "{%include \"nav.html\"%}\n{%\tinclude\t\"footer.html\" %}\n",
        )
        .unwrap();
        let template = Template::load(&path).unwrap();
        assert_eq!(template.references(), ["nav.html", "footer.html"]);
    }
}
