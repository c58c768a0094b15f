//! Content item model

use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::path::PathBuf;

use super::FrontMatter;

/// Whether an item is a dated post or a standalone page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    Page,
}

/// Markup language of an item body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Markdown,
    Html,
}

impl Format {
    /// Format for a source file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "md" | "markdown" | "mkd" | "mkdn" => Format::Markdown,
            _ => Format::Html,
        }
    }
}

/// One unit of published content: a post or a page
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub kind: ItemKind,

    /// Source path relative to the site root, without extension
    pub id: String,

    /// Full source file path
    pub source: PathBuf,

    /// Source file path relative to the site root
    pub relative: PathBuf,

    /// Name of the layout that wraps this item
    pub layout: String,

    pub title: String,

    /// Publication date (always set for posts)
    pub date: Option<DateTime<FixedOffset>>,

    pub categories: Vec<String>,

    pub tags: Vec<String>,

    /// Output path override from front-matter
    pub permalink: Option<String>,

    /// URL-friendly name
    pub slug: String,

    pub format: Format,

    /// Complete front-matter, including keys the builder does not consume
    pub front_matter: FrontMatter,

    /// Raw body text after the front-matter block
    pub body: String,
}

impl ContentItem {
    pub fn is_post(&self) -> bool {
        self.kind == ItemKind::Post
    }

    /// Body text before the first `separator`, or the whole body
    pub fn excerpt_source(&self, separator: &str) -> &str {
        let body = self.body.trim_start_matches(['\n', '\r']);
        if separator.is_empty() {
            return body;
        }
        match body.find(separator) {
            Some(pos) => &body[..pos],
            None => body,
        }
    }
}

/// Turn a filename slug into a title, e.g. `lean-defs` -> `Lean Defs`
pub fn titleize_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(body: &str) -> ContentItem {
        ContentItem {
            kind: ItemKind::Post,
            id: "_posts/2024-01-01-hello".to_string(),
            source: PathBuf::from("_posts/2024-01-01-hello.md"),
            relative: PathBuf::from("_posts/2024-01-01-hello.md"),
            layout: "post".to_string(),
            title: "Hello".to_string(),
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            permalink: None,
            slug: "hello".to_string(),
            format: Format::Markdown,
            front_matter: FrontMatter::default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_excerpt_first_paragraph() {
        let post = item("\nFirst paragraph.\n\nSecond paragraph.");
        assert_eq!(post.excerpt_source("\n\n"), "First paragraph.");
    }

    #[test]
    fn test_excerpt_custom_separator() {
        let post = item("Intro\n<!-- more -->\nRest");
        assert_eq!(post.excerpt_source("<!-- more -->"), "Intro\n");
        assert_eq!(post.excerpt_source("<!-- none -->"), "Intro\n<!-- more -->\nRest");
    }

    #[test]
    fn test_titleize_slug() {
        assert_eq!(titleize_slug("how-lean-tracks"), "How Lean Tracks");
        assert_eq!(titleize_slug("a--b"), "A B");
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(Format::from_extension("md"), Format::Markdown);
        assert_eq!(Format::from_extension("markdown"), Format::Markdown);
        assert_eq!(Format::from_extension("html"), Format::Html);
    }
}
