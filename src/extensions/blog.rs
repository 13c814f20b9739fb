//! Track files marked as blog entries and regenerate the feed.
//!
//! Posts are keyed by source path and compared structurally on every
//! `frontmatter-loaded`, so reprocessing a file in watch mode only dirties
//! the feed when something actually changed. Because that signal only
//! fires for stale files, the post set is rehydrated from the source tree
//! at the first `pre-composition` of a session. The feed (and the optional
//! list page) is flushed on `post-composition` while the dirty flag is set.

use super::is_blog_entry;
use crate::composers::{PROVENANCE_MARKER, write_artifact};
use crate::director;
use crate::error::{AbortError, Result};
use crate::feed::{self, Feed, FeedEntry};
use crate::frontmatter::{self, Frontmatter};
use crate::log;
use crate::signals::{Extension, SiteView};
use chrono::NaiveDateTime;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// A discovered feed entry; equality is structural.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub date: NaiveDateTime,
    pub summary: Option<String>,
    pub route: String,
    pub url: String,
}

/// Options read from the `[blog]` configuration section.
#[derive(Debug, Clone)]
struct BlogSettings {
    author: String,
    title: String,
    url: String,
    feed: String,
    list_template: Option<String>,
    list_page: Option<String>,
}

#[derive(Default)]
pub struct BlogExtension {
    posts: BTreeMap<PathBuf, Post>,
    settings: Option<BlogSettings>,
    dirty: bool,
    hydrated: bool,
}

impl BlogExtension {
    pub fn new() -> Self {
        Self::default()
    }

    fn settings(&self) -> Result<&BlogSettings> {
        self.settings
            .as_ref()
            .ok_or_else(|| AbortError::msg("blog extension used before pre-composition"))
    }

    fn build_post(
        &self,
        source_file: &Path,
        frontmatter: &Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<Post> {
        let title = required_field(frontmatter, "title", source_file)?;
        let date = required_field(frontmatter, "date", source_file)?;
        let resolver = view.resolver();

        Ok(Post {
            title,
            date: feed::parse_date(&date, source_file)?,
            summary: frontmatter
                .get("summary")
                .and_then(|value| value.as_str())
                .map(str::to_string),
            route: resolver.route(source_file)?,
            url: resolver.as_url(source_file)?,
        })
    }

    /// Posts sorted most-recent-first, title as the tiebreak.
    fn sorted_posts(&self) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().collect();
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.title.cmp(&b.title)));
        posts
    }

    fn build_feed(&self) -> Result<Feed> {
        let settings = self.settings()?;
        Ok(Feed {
            title: settings.title.clone(),
            url: settings.url.clone(),
            author: settings.author.clone(),
            entries: self
                .sorted_posts()
                .iter()
                .map(|post| FeedEntry {
                    title: post.title.clone(),
                    url: post.url.clone(),
                    updated: post.date,
                    summary: post.summary.clone(),
                })
                .collect(),
        })
    }

    fn write_feed(&self, view: &SiteView<'_>) -> Result<()> {
        let feed_path = view.outdir.join(&self.settings()?.feed);
        write_artifact(&feed_path, &self.build_feed()?.to_xml())
    }

    /// Rebuild the post set from the source tree so a fresh session starts
    /// where the previous one ended; a stale-gated partial rebuild must
    /// never shrink the feed. Dirty is set when the feed on disk no longer
    /// matches that state.
    fn hydrate(&mut self, view: &SiteView<'_>) -> Result<()> {
        let skip_directories = director::skip_directory_names(view.config);
        let walker = WalkDir::new(view.site_path)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                let path = entry.path();
                if director::in_output_path(path, view.outdir, view.site_path)
                    || view.catalog.is_template(path)
                {
                    return false;
                }
                !(entry.file_type().is_dir()
                    && path
                        .file_name()
                        .and_then(|name| name.to_str())
                        .is_some_and(|name| skip_directories.contains(name)))
            });

        for entry in walker {
            let entry = entry.map_err(|err| AbortError::msg(format!("walk failed: {err}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if director::should_skip(&filename) {
                continue;
            }
            if view.composers.output_extension(path)? != ".html" {
                continue;
            }

            let (data, _) = frontmatter::extract(path)?;
            if !is_blog_entry(&data)? {
                continue;
            }
            let post = self.build_post(path, &data, view)?;
            self.posts.insert(path.to_path_buf(), post);
        }

        let feed_path = view.outdir.join(&self.settings()?.feed);
        self.dirty = match fs::read_to_string(&feed_path) {
            Ok(existing) => existing != format!("{}{PROVENANCE_MARKER}", self.build_feed()?.to_xml()),
            Err(_) => !self.posts.is_empty(),
        };
        Ok(())
    }

    fn write_list_page(&self, view: &SiteView<'_>) -> Result<()> {
        let settings = self.settings()?;
        let (Some(template_name), Some(list_page)) =
            (&settings.list_template, &settings.list_page)
        else {
            return Ok(());
        };

        let mut items = String::from("<ul>\n");
        for post in self.sorted_posts() {
            items.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                post.route, post.title
            ));
        }
        items.push_str("</ul>");

        let mut context = Frontmatter::new();
        context.insert("title".into(), settings.title.clone().into());
        context.insert("content".into(), items.into());

        let template = view.catalog.get_template(template_name)?;
        let rendered = template.render(&context, view.catalog)?;
        write_artifact(&view.outdir.join(list_page), &rendered)
    }
}

impl Extension for BlogExtension {
    fn on_pre_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if !view.config.has_section("blog") {
            return Err(AbortError::msg(
                "a [blog] section is missing in the configuration file",
            ));
        }

        let option = |key: &str| -> Result<String> {
            view.config
                .option("blog", key)
                .map(str::to_string)
                .ok_or_else(|| {
                    AbortError::msg(format!(
                        "a blog {key} is missing in the configuration file"
                    ))
                })
        };

        self.settings = Some(BlogSettings {
            author: option("author")?,
            title: option("title")?,
            url: option("url")?,
            feed: option("feed")?,
            list_template: view.config.option("blog", "list_template").map(str::to_string),
            list_page: view.config.option("blog", "list_page").map(str::to_string),
        });

        if !self.hydrated {
            self.hydrate(view)?;
            self.hydrated = true;
        }
        Ok(())
    }

    fn on_frontmatter_loaded(
        &mut self,
        source_file: &Path,
        frontmatter: &mut Frontmatter,
        view: &SiteView<'_>,
    ) -> Result<()> {
        if !is_blog_entry(frontmatter)? {
            return Ok(());
        }

        let post = self.build_post(source_file, frontmatter, view)?;
        if self.posts.get(source_file) != Some(&post) {
            self.posts.insert(source_file.to_path_buf(), post);
            self.dirty = true;
        }
        Ok(())
    }

    fn on_post_composition(&mut self, view: &SiteView<'_>) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        log!("blog"; "generating feed ...");
        self.write_feed(view)?;
        self.write_list_page(view)?;
        self.dirty = false;
        Ok(())
    }
}

/// A required frontmatter field, rendered as a string. TOML datetimes are
/// accepted for `date` since their display form matches the feed layout.
fn required_field(frontmatter: &Frontmatter, key: &str, source_file: &Path) -> Result<String> {
    let value = frontmatter.get(key).ok_or_else(|| {
        AbortError::msg(format!(
            "blog entry {} is missing a {key}",
            source_file.display()
        ))
    })?;
    Ok(match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}
