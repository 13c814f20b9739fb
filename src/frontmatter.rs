//! Shared frontmatter extraction.
//!
//! A source file may open with a TOML frontmatter block:
//!
//! ```text
//! %TOML 1.0
//! ---
//! title = "A post"
//! blog = true
//! ---
//! The content starts here.
//! ```
//!
//! The leading directive line is optional; a bare `---` pair works too.
//! Every composer that handles structured sources calls [`extract`], as
//! does the feed path, so the marker convention lives in exactly one place.

use crate::error::{AbortError, Result};
use std::{fs, path::Path};

/// Parsed frontmatter: string keys mapped to TOML values, mutated in place
/// by every `frontmatter-loaded` listener before the composer consumes it.
pub type Frontmatter = toml::Table;

/// A frontmatter block is delimited by marker lines of three dashes.
const MARKER: &str = "---\n";

/// Read a source file, returning its frontmatter and remaining content.
///
/// Without a frontmatter block the first line becomes the HTML-escaped
/// `title` and the rest of the file is the content (degraded mode for
/// plain files).
pub fn extract(source_file: &Path) -> Result<(Frontmatter, String)> {
    read_split(source_file, true)
}

/// Like [`extract`], but a file without frontmatter is passed through
/// whole: no title guessing, the full text is the content.
pub fn extract_untitled(source_file: &Path) -> Result<(Frontmatter, String)> {
    read_split(source_file, false)
}

/// Check whether the first line announces a frontmatter block. Only TOML
/// frontmatter is supported.
pub fn has_frontmatter(first_line: &str) -> bool {
    first_line.starts_with("%TOML") || first_line.starts_with("---")
}

fn read_split(source_file: &Path, guess_title: bool) -> Result<(Frontmatter, String)> {
    let text = fs::read_to_string(source_file).map_err(AbortError::io(source_file))?;

    let (first, rest) = match text.split_once('\n') {
        Some((first, rest)) => (first.trim(), rest),
        None => (text.trim(), ""),
    };

    if has_frontmatter(first) {
        return split_content_with_frontmatter(first, rest, source_file);
    }

    let mut data = Frontmatter::new();
    if guess_title {
        data.insert("title".into(), escape_html(first).into());
        Ok((data, rest.to_string()))
    } else {
        Ok((data, text))
    }
}

/// Separate the frontmatter block from the content below it.
fn split_content_with_frontmatter(
    first: &str,
    rest: &str,
    source_file: &Path,
) -> Result<(Frontmatter, String)> {
    // With a directive present there must be two marker lines below it.
    let splits = if first.starts_with('%') { 2 } else { 1 };
    let parts: Vec<&str> = rest.splitn(splits + 1, MARKER).collect();

    if parts.len() < splits + 1 {
        return Err(AbortError::msg(format!(
            "a frontmatter marker is missing in {}",
            source_file.display()
        )));
    }

    let mut data: Frontmatter = parts[splits - 1].parse().map_err(|err| {
        AbortError::msg(format!(
            "invalid TOML in the frontmatter of {}: {err}",
            source_file.display()
        ))
    })?;

    if let Some(title) = data.get("title").and_then(|v| v.as_str()) {
        let escaped = escape_html(title);
        data.insert("title".into(), escaped.into());
    }

    Ok((data, parts[splits].to_string()))
}

/// Escape text for literal inclusion in HTML.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn source(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_round_trip_with_directive() {
        let file = source("%TOML 1.0\n---\ntitle = \"Post\"\nblog = true\n---\nBody text\n");
        let (data, content) = extract(file.path()).unwrap();
        assert_eq!(data.get("title").unwrap().as_str(), Some("Post"));
        assert_eq!(data.get("blog").unwrap().as_bool(), Some(true));
        assert_eq!(content, "Body text\n");
    }

    #[test]
    fn test_bare_marker_block() {
        let file = source("---\ntitle = \"Post\"\n---\nBody\n");
        let (data, content) = extract(file.path()).unwrap();
        assert_eq!(data.get("title").unwrap().as_str(), Some("Post"));
        assert_eq!(content, "Body\n");
    }

    #[test]
    fn test_missing_closing_marker_aborts_naming_file() {
        let file = source("---\ntitle = \"Post\"\nno closing marker");
        let err = extract(file.path()).unwrap_err();
        let message = format!("{err}");
        assert!(message.contains("marker is missing"));
        assert!(message.contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_invalid_toml_aborts() {
        let file = source("---\ntitle = = broken\n---\nBody\n");
        let err = extract(file.path()).unwrap_err();
        assert!(format!("{err}").contains("invalid TOML"));
    }

    #[test]
    fn test_guess_title_mode() {
        let file = source("Title\nHello");
        let (data, content) = extract(file.path()).unwrap();
        assert_eq!(data.get("title").unwrap().as_str(), Some("Title"));
        assert_eq!(content, "Hello");
    }

    #[test]
    fn test_title_is_escaped() {
        let file = source("<Title> & \"friends\"\nHello");
        let (data, _) = extract(file.path()).unwrap();
        assert_eq!(
            data.get("title").unwrap().as_str(),
            Some("&lt;Title&gt; &amp; &quot;friends&quot;")
        );
    }

    #[test]
    fn test_untitled_passthrough() {
        let file = source("Title\nHello");
        let (data, content) = extract_untitled(file.path()).unwrap();
        assert!(data.is_empty());
        assert_eq!(content, "Title\nHello");
    }
}
