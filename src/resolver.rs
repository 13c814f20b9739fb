//! Resolve source files to their eventual route and URL, without
//! composing anything.

use crate::composers::Composers;
use crate::error::Result;
use std::path::{Component, Path};

/// Maps a source path to its site-relative route (leading slash, output
/// extension swapped in) and its fully qualified URL.
pub struct FileResolver<'a> {
    site_path: &'a Path,
    composers: &'a Composers,
    domain: &'a str,
}

impl<'a> FileResolver<'a> {
    pub fn new(site_path: &'a Path, composers: &'a Composers, domain: &'a str) -> Self {
        Self {
            site_path,
            composers,
            domain,
        }
    }

    /// Site-relative route: `/` + relative path with the composer's
    /// output name, forward slashes regardless of host convention.
    pub fn route(&self, source_path: &Path) -> Result<String> {
        let relative = source_path
            .strip_prefix(self.site_path)
            .unwrap_or(source_path);
        let output_name = self.composers.output_name(source_path)?;

        let mut route = String::from("/");
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                if let Component::Normal(part) = component {
                    route.push_str(&part.to_string_lossy());
                    route.push('/');
                }
            }
        }
        route.push_str(&output_name);
        Ok(route)
    }

    /// Resolve the output URL of the provided source path.
    pub fn as_url(&self, source_path: &Path) -> Result<String> {
        Ok(format!(
            "{}{}",
            self.domain.trim_end_matches('/'),
            self.route(source_path)?
        ))
    }
}
