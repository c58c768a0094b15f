//! Content loader - discovers and parses posts and pages under the site root

use chrono::{FixedOffset, NaiveDate, TimeZone};
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::item::titleize_slug;
use super::frontmatter::DELIMITER;
use super::{ContentItem, Format, FrontMatter, ItemKind};
use crate::config::{SiteConfig, CONFIG_FILE};
use crate::error::{Result, SiteError};
use crate::Site;

lazy_static! {
    /// `YYYY-MM-DD-slug`, the file stem every post must have
    static ref POST_NAME: Regex = Regex::new(r"^(\d{4})-(\d{2})-(\d{2})-(.+)$").unwrap();
}

/// What a discovered file is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Post,
    Page,
    /// Copied to the destination unchanged
    Static,
}

/// A file found under the site root
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub kind: SourceKind,

    /// Full path
    pub path: PathBuf,

    /// Path relative to the site root
    pub relative: PathBuf,

    /// Relative path with `/` separators, without extension for posts and pages
    pub id: String,

    /// Date encoded in a post file name
    pub date: Option<NaiveDate>,

    /// Slug encoded in a post file name
    pub slug: Option<String>,
}

/// Everything `discover` found
#[derive(Debug, Clone, Default)]
pub struct Discovery {
    /// Newest first, ties broken by identifier
    pub posts: Vec<SourceFile>,
    pub pages: Vec<SourceFile>,
    pub statics: Vec<SourceFile>,
}

impl Discovery {
    /// Posts followed by pages
    pub fn content(&self) -> impl Iterator<Item = &SourceFile> {
        self.posts.iter().chain(self.pages.iter())
    }

    pub fn content_len(&self) -> usize {
        self.posts.len() + self.pages.len()
    }
}

/// Loads content from the site root
pub struct ContentLoader<'a> {
    root: &'a Path,
    /// Output directory, canonical when it exists
    destination: PathBuf,
    config: &'a SiteConfig,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Self {
        Self {
            root: &site.source_dir,
            destination: fs::canonicalize(&site.destination_dir)
                .unwrap_or_else(|_| site.destination_dir.clone()),
            config: &site.config,
        }
    }

    /// Enumerate the posts, pages and static files below the site root
    pub fn discover(&self) -> Result<Discovery> {
        if !self.root.is_dir() {
            return Err(SiteError::NotFound {
                path: self.root.to_path_buf(),
            });
        }

        let mut discovery = Discovery::default();
        self.discover_posts(&mut discovery.posts)?;
        self.discover_site_files(&mut discovery)?;

        discovery
            .posts
            .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));

        tracing::debug!(
            "Discovered {} posts, {} pages, {} static files",
            discovery.posts.len(),
            discovery.pages.len(),
            discovery.statics.len()
        );

        Ok(discovery)
    }

    fn discover_posts(&self, posts: &mut Vec<SourceFile>) -> Result<()> {
        let posts_dir = self.root.join(&self.config.posts_dir);
        if !posts_dir.is_dir() {
            return Ok(());
        }

        for entry in WalkDir::new(&posts_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        {
            let entry = entry.map_err(|e| walk_error(&posts_dir, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if !is_content_file(path) {
                tracing::warn!("Skipping non-content file in posts directory: {:?}", path);
                continue;
            }

            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            let Some((date, slug)) = parse_post_name(stem) else {
                tracing::warn!(
                    "Skipping {:?}: post file names must look like YYYY-MM-DD-title.md",
                    path
                );
                continue;
            };

            let relative = self.relative(path);
            posts.push(SourceFile {
                kind: SourceKind::Post,
                id: identifier(&relative, true),
                path: path.to_path_buf(),
                relative,
                date: Some(date),
                slug: Some(slug),
            });
        }

        Ok(())
    }

    fn discover_site_files(&self, discovery: &mut Discovery) -> Result<()> {
        let walker = WalkDir::new(self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(self.root, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = self.relative(path);
            let has_front_matter =
                starts_with_delimiter(path).map_err(|e| SiteError::io(path, e))?;

            if has_front_matter {
                discovery.pages.push(SourceFile {
                    kind: SourceKind::Page,
                    id: identifier(&relative, true),
                    path: path.to_path_buf(),
                    relative,
                    date: None,
                    slug: None,
                });
            } else {
                discovery.statics.push(SourceFile {
                    kind: SourceKind::Static,
                    id: identifier(&relative, false),
                    path: path.to_path_buf(),
                    relative,
                    date: None,
                    slug: None,
                });
            }
        }

        Ok(())
    }

    /// Entries below the root that never become pages or static files
    fn is_skipped(&self, entry: &DirEntry) -> bool {
        let path = entry.path();
        if is_hidden(entry) || self.is_destination(entry) {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if name.starts_with('_') || name == CONFIG_FILE {
            return true;
        }

        let relative = identifier(&self.relative(path), false);
        self.config.is_excluded(&relative)
    }

    /// Compares canonical paths, so `public`, `./public` and a symlink to
    /// the output directory all match.
    fn is_destination(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let path = entry.path();
        path == self.destination
            || fs::canonicalize(path).map_or(false, |p| p == self.destination)
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(self.root).unwrap_or(path).to_path_buf()
    }

    /// Read and parse one discovered file into a content item
    pub fn parse(&self, file: &SourceFile) -> Result<ContentItem> {
        let content = fs::read_to_string(&file.path).map_err(|e| SiteError::io(&file.path, e))?;
        self.parse_str(file, &content)
    }

    /// Parse already-read file contents
    pub fn parse_str(&self, file: &SourceFile, content: &str) -> Result<ContentItem> {
        let malformed = |reason: &dyn std::fmt::Display| SiteError::malformed(&file.id, reason);

        let (fm, body) = match FrontMatter::parse(content).map_err(|e| malformed(&e))? {
            Some(parsed) => parsed,
            None => return Err(malformed(&super::FrontMatterError::MissingStart)),
        };

        let kind = match file.kind {
            SourceKind::Post => ItemKind::Post,
            _ => ItemKind::Page,
        };

        let default_layout = match kind {
            ItemKind::Post => self.config.defaults.post_layout.as_deref(),
            ItemKind::Page => self.config.defaults.page_layout.as_deref(),
        };
        let layout = fm
            .get_str("layout")
            .map_err(|e| malformed(&e))?
            .or(default_layout)
            .map(str::to_string)
            .ok_or_else(|| malformed(&super::FrontMatterError::MissingKey("layout")))?;

        let stem = file
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        let slug = match fm.get_str("slug").map_err(|e| malformed(&e))? {
            Some(slug) => slug.to_string(),
            None => file.slug.clone().unwrap_or_else(|| stem.clone()),
        };

        let title = match fm.get_str("title").map_err(|e| malformed(&e))? {
            Some(title) => title.to_string(),
            None if kind == ItemKind::Post => titleize_slug(&slug),
            None => stem,
        };

        let date = match fm.get_date("date").map_err(|e| malformed(&e))? {
            Some(date) => Some(date),
            None => file.date.and_then(midnight_utc),
        };

        let mut categories = fm.get_list("categories").map_err(|e| malformed(&e))?;
        categories.extend(fm.get_list("category").map_err(|e| malformed(&e))?);
        dedup_preserving_order(&mut categories);

        let mut tags = fm.get_list("tags").map_err(|e| malformed(&e))?;
        tags.extend(fm.get_list("tag").map_err(|e| malformed(&e))?);
        dedup_preserving_order(&mut tags);

        let permalink = fm
            .get_str("permalink")
            .map_err(|e| malformed(&e))?
            .map(str::to_string);

        let format = file
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(Format::from_extension)
            .unwrap_or(Format::Html);

        Ok(ContentItem {
            kind,
            id: file.id.clone(),
            source: file.path.clone(),
            relative: file.relative.clone(),
            layout,
            title,
            date,
            categories,
            tags,
            permalink,
            slug,
            format,
            body: body.to_string(),
            front_matter: fm,
        })
    }
}

/// Split a post file stem into its date and slug
pub fn parse_post_name(stem: &str) -> Option<(NaiveDate, String)> {
    let caps = POST_NAME.captures(stem)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let day = caps[3].parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((date, caps[4].to_string()))
}

fn midnight_utc(date: NaiveDate) -> Option<chrono::DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;
    utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

/// Relative path with `/` separators, optionally without extension
fn identifier(relative: &Path, strip_extension: bool) -> String {
    let path = if strip_extension {
        relative.with_extension("")
    } else {
        relative.to_path_buf()
    };
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Check if a file is a markdown or HTML content file
fn is_content_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e, "md" | "markdown" | "mkd" | "mkdn" | "html" | "htm"))
        .unwrap_or(false)
}

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Whether the file's first line is the front-matter delimiter, by the rule
/// of [`FrontMatter::is_present`]. Reading stops as soon as the first line
/// can no longer match.
fn starts_with_delimiter(path: &Path) -> std::io::Result<bool> {
    let mut line = Vec::new();
    for byte in BufReader::new(fs::File::open(path)?).bytes() {
        let byte = byte?;
        if byte == b'\n' {
            break;
        }
        line.push(byte);
        if BOM.starts_with(&line) {
            continue;
        }
        let head = line.strip_prefix(BOM).unwrap_or(&line);
        if !may_open_front_matter(head) {
            return Ok(false);
        }
    }
    Ok(FrontMatter::is_present(&String::from_utf8_lossy(&line)))
}

/// `head` is a prefix of the delimiter, or the delimiter followed by bytes
/// that may still be trailing whitespace
fn may_open_front_matter(head: &[u8]) -> bool {
    let marker = DELIMITER.as_bytes();
    if head.len() <= marker.len() {
        return marker.starts_with(head);
    }
    head.starts_with(marker) && head.last().map_or(true, |b| !b.is_ascii_graphic())
}

fn walk_error(root: &Path, err: walkdir::Error) -> SiteError {
    let path = err.path().unwrap_or(root).to_path_buf();
    SiteError::Io {
        path,
        source: err.into(),
    }
}

fn dedup_preserving_order(values: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    values.retain(|v| seen.insert(v.clone()));
}
