//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Name of the configuration file at the site root
pub const CONFIG_FILE: &str = "_config.yml";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    pub url: String,
    pub baseurl: String,
    pub permalink: String,

    // Directory
    pub destination: String,
    pub posts_dir: String,
    pub layouts_dir: String,
    pub includes_dir: String,
    pub exclude: Vec<String>,

    // Writing
    pub excerpt_separator: String,
    pub markdown: MarkdownConfig,
    pub defaults: DefaultsConfig,

    // Build
    pub clean_destination: bool,

    // Any additional fields, exposed to templates as `site.<key>`
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            author: String::new(),

            url: String::new(),
            baseurl: String::new(),
            permalink: "date".to_string(),

            destination: "_site".to_string(),
            posts_dir: "_posts".to_string(),
            layouts_dir: "_layouts".to_string(),
            includes_dir: "_includes".to_string(),
            exclude: vec![
                "Gemfile".to_string(),
                "Gemfile.lock".to_string(),
                "node_modules".to_string(),
                "vendor".to_string(),
            ],

            excerpt_separator: "\n\n".to_string(),
            markdown: MarkdownConfig::default(),
            defaults: DefaultsConfig::default(),

            clean_destination: true,
            extra: BTreeMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        Ok(config)
    }

    /// The permalink pattern for posts, expanding Jekyll's named styles
    pub fn permalink_pattern(&self) -> &str {
        match self.permalink.as_str() {
            "date" => "/:categories/:year/:month/:day/:title.html",
            "pretty" => "/:categories/:year/:month/:day/:title/",
            "ordinal" => "/:categories/:year/:y_day/:title.html",
            "none" => "/:categories/:title.html",
            pattern => pattern,
        }
    }

    /// Whether a path relative to the site root is excluded from the build
    pub fn is_excluded(&self, relative: &str) -> bool {
        self.exclude.iter().any(|entry| {
            let entry = entry.trim_matches('/');
            !entry.is_empty()
                && (relative == entry
                    || relative
                        .strip_prefix(entry)
                        .map(|rest| rest.starts_with('/'))
                        .unwrap_or(false))
        })
    }
}

/// Markdown conversion options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Syntect theme used for fenced code blocks
    pub highlight_theme: String,
    pub line_numbers: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            highlight_theme: "base16-ocean.dark".to_string(),
            line_numbers: false,
        }
    }
}

/// Front-matter defaults applied when a file omits a key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub post_layout: Option<String>,
    pub page_layout: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.destination, "_site");
        assert_eq!(config.posts_dir, "_posts");
        assert_eq!(
            config.permalink_pattern(),
            "/:categories/:year/:month/:day/:title.html"
        );
        assert!(config.clean_destination);
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Notes on Proof Assistants
baseurl: /blog
permalink: pretty
github_username: someone
defaults:
  post_layout: post
markdown:
  line_numbers: true
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Notes on Proof Assistants");
        assert_eq!(config.baseurl, "/blog");
        assert_eq!(
            config.permalink_pattern(),
            "/:categories/:year/:month/:day/:title/"
        );
        assert_eq!(config.defaults.post_layout.as_deref(), Some("post"));
        assert!(config.markdown.line_numbers);
        assert_eq!(config.markdown.highlight_theme, "base16-ocean.dark");
        assert_eq!(
            config.extra.get("github_username").and_then(|v| v.as_str()),
            Some("someone")
        );
    }

    #[test]
    fn test_partial_config_keeps_default_lists() {
        let config: SiteConfig = serde_yaml::from_str("title: X\n").unwrap();
        assert_eq!(config.title, "X");
        assert_eq!(
            config.exclude,
            vec!["Gemfile", "Gemfile.lock", "node_modules", "vendor"]
        );
        assert_eq!(config.markdown.highlight_theme, "base16-ocean.dark");
        assert!(config.defaults.post_layout.is_none());
    }

    #[test]
    fn test_custom_permalink_is_kept() {
        let config = SiteConfig {
            permalink: "/blog/:year/:title/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.permalink_pattern(), "/blog/:year/:title/");
    }

    #[test]
    fn test_is_excluded() {
        let config = SiteConfig {
            exclude: vec!["vendor".to_string(), "notes/private/".to_string()],
            ..Default::default()
        };
        assert!(config.is_excluded("vendor"));
        assert!(config.is_excluded("vendor/bundle/x.rb"));
        assert!(config.is_excluded("notes/private/todo.md"));
        assert!(!config.is_excluded("vendored.md"));
        assert!(!config.is_excluded("notes/public.md"));
    }
}
