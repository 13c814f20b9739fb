//! Deterministic Atom feed assembly.
//!
//! Shared between the blog extension (which accumulates entries across
//! the build) and the `.atom` composer (which reads a standalone JSON
//! feed document). Given identical inputs the XML is reproduced
//! byte-for-byte.

use crate::error::{AbortError, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::Path;

/// XML namespace for Atom feeds.
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Accepted entry date layout; also the emitted layout (suffixed `Z`).
const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A complete feed ready to serialize.
#[derive(Debug, Clone, PartialEq)]
pub struct Feed {
    pub title: String,
    /// Feed id and alternate link.
    pub url: String,
    pub author: String,
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub url: String,
    pub updated: NaiveDateTime,
    pub summary: Option<String>,
}

impl Feed {
    /// Serialize as Atom XML. The feed `updated` stamp is the newest
    /// entry date so unchanged inputs yield unchanged bytes.
    pub fn to_xml(&self) -> String {
        let updated = self
            .entries
            .iter()
            .map(|entry| entry.updated)
            .max()
            .unwrap_or_else(|| DateTime::<Utc>::UNIX_EPOCH.naive_utc());

        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<feed xmlns="{ATOM_NS}">"#));
        xml.push('\n');
        xml.push_str(&format!("  <title>{}</title>\n", escape_xml(&self.title)));
        xml.push_str(&format!("  <id>{}</id>\n", escape_xml(&self.url)));
        xml.push_str(&format!(
            "  <link href=\"{}\" rel=\"alternate\"/>\n",
            escape_xml(&self.url)
        ));
        xml.push_str(&format!("  <updated>{}</updated>\n", format_date(updated)));
        xml.push_str(&format!(
            "  <author><name>{}</name></author>\n",
            escape_xml(&self.author)
        ));

        for entry in &self.entries {
            xml.push_str("  <entry>\n");
            xml.push_str(&format!("    <title>{}</title>\n", escape_xml(&entry.title)));
            xml.push_str(&format!("    <id>{}</id>\n", escape_xml(&entry.url)));
            xml.push_str(&format!(
                "    <link href=\"{}\" rel=\"alternate\"/>\n",
                escape_xml(&entry.url)
            ));
            xml.push_str(&format!(
                "    <updated>{}</updated>\n",
                format_date(entry.updated)
            ));
            if let Some(summary) = &entry.summary {
                xml.push_str(&format!(
                    "    <summary>{}</summary>\n",
                    escape_xml(summary)
                ));
            }
            xml.push_str("  </entry>\n");
        }

        xml.push_str("</feed>\n");
        xml
    }
}

/// Parse an entry date, naming the offending file on failure.
pub fn parse_date(date: &str, source_file: &Path) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(date, DATE_FORMAT).map_err(|_| {
        AbortError::msg(format!(
            "invalid date '{date}' in {} (expected {DATE_FORMAT})",
            source_file.display()
        ))
    })
}

fn format_date(date: NaiveDateTime) -> String {
    format!("{}Z", date.format(DATE_FORMAT))
}

/// Escape special XML characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ============================================================================
// Standalone feed documents (the `.atom` composer source format)
// ============================================================================

/// JSON metadata file describing a feed.
#[derive(Debug, Deserialize)]
pub struct FeedDocument {
    pub title: String,
    pub url: String,
    pub author: String,
    #[serde(default)]
    pub entries: Vec<EntryDocument>,
}

#[derive(Debug, Deserialize)]
pub struct EntryDocument {
    pub title: String,
    pub url: String,
    #[serde(alias = "published")]
    pub updated: String,
    #[serde(default)]
    pub summary: Option<String>,
}

impl FeedDocument {
    /// Validate dates and build the serializable feed.
    pub fn into_feed(self, source_file: &Path) -> Result<Feed> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            entries.push(FeedEntry {
                updated: parse_date(&entry.updated, source_file)?,
                title: entry.title,
                url: entry.url,
                summary: entry.summary,
            });
        }
        Ok(Feed {
            title: self.title,
            url: self.url,
            author: self.author,
            entries,
        })
    }
}
