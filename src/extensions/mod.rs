//! Stateful build observers, activated from configuration.
//!
//! The registry is closed and statically known: a configuration-declared
//! name maps to a constructor here, in declaration order, which is also
//! the signal delivery order. There is no runtime plugin discovery.

mod blog;
mod open_graph;
mod sitemap;
mod twitter;

pub use blog::BlogExtension;
pub use open_graph::OpenGraphExtension;
pub use sitemap::SitemapExtension;
pub use twitter::TwitterExtension;

use crate::config::Configuration;
use crate::error::{AbortError, Result};
use crate::frontmatter::Frontmatter;
use crate::signals::Extension;

/// Construct every extension named in `[site] extensions`, in order.
pub fn load(config: &Configuration) -> Result<Vec<Box<dyn Extension>>> {
    let mut extensions: Vec<Box<dyn Extension>> = Vec::new();
    for name in &config.site.extensions {
        let extension: Box<dyn Extension> = match name.as_str() {
            "blog" => Box::new(BlogExtension::new()),
            "open_graph" => Box::new(OpenGraphExtension::new()),
            "sitemap" => Box::new(SitemapExtension::new()),
            "twitter" => Box::new(TwitterExtension::new()),
            unknown => {
                return Err(AbortError::msg(format!(
                    "unknown extension '{unknown}' in configuration"
                )));
            }
        };
        extensions.push(extension);
    }
    Ok(extensions)
}

/// Read the `blog` marker from frontmatter. Absent means false; any
/// non-boolean value is a configuration mistake worth stopping for.
pub(crate) fn is_blog_entry(frontmatter: &Frontmatter) -> Result<bool> {
    match frontmatter.get("blog") {
        None => Ok(false),
        Some(toml::Value::Boolean(flag)) => Ok(*flag),
        Some(other) => Err(AbortError::msg(format!(
            "invalid blog frontmatter (expects true or false): {other}"
        ))),
    }
}

/// Resolve the image URL for a metadata fragment: an absolute path hangs
/// off the domain, a relative path is a sibling of the page URL, and
/// neither falls back to the configured default.
pub(crate) fn resolve_image_url(
    domain: &str,
    page_url: &str,
    image: Option<&str>,
    default_image: &str,
) -> String {
    match image {
        Some(path) if path.starts_with('/') => {
            format!("{}{path}", domain.trim_end_matches('/'))
        }
        Some(path) => {
            let mut parts: Vec<&str> = page_url.split('/').collect();
            if let Some(last) = parts.last_mut() {
                *last = path;
            }
            parts.join("/")
        }
        None => default_image.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_unknown_extension_aborts() {
        let mut config = Configuration::default();
        config.site.extensions = vec!["nope".to_string()];
        let Err(err) = load(&config) else {
            panic!("an unknown extension name must abort");
        };
        assert!(format!("{err}").contains("unknown extension 'nope'"));
    }

    #[test]
    fn test_load_in_declared_order() {
        let mut config = Configuration::default();
        config.site.extensions = vec!["sitemap".to_string(), "blog".to_string()];
        assert_eq!(load(&config).unwrap().len(), 2);
    }

    #[test]
    fn test_blog_marker_validation() {
        let mut frontmatter = Frontmatter::new();
        assert!(!is_blog_entry(&frontmatter).unwrap());

        frontmatter.insert("blog".into(), true.into());
        assert!(is_blog_entry(&frontmatter).unwrap());

        frontmatter.insert("blog".into(), "yes".into());
        let err = is_blog_entry(&frontmatter).unwrap_err();
        assert!(format!("{err}").contains("expects true or false"));
    }

    #[test]
    fn test_image_resolution() {
        let domain = "https://example.com";
        let page = "https://example.com/posts/hi.html";
        assert_eq!(
            resolve_image_url(domain, page, Some("/img/a.png"), "d.png"),
            "https://example.com/img/a.png"
        );
        assert_eq!(
            resolve_image_url(domain, page, Some("a.png"), "d.png"),
            "https://example.com/posts/a.png"
        );
        assert_eq!(resolve_image_url(domain, page, None, "d.png"), "d.png");
    }
}
