//! quire: a small static site generator for Jekyll-style blogs
//!
//! Posts and pages carry YAML front-matter, bodies are Markdown or HTML, and
//! output is wrapped in the site's `_layouts/` (Tera templates that may nest).
//! A build runs every content file once through discover, parse, render and
//! emit.

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod generator;
pub mod layout;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::BuildReport;

/// A site on disk and its configuration
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Site root, where `_config.yml`, `_posts/` and `_layouts/` live
    pub source_dir: PathBuf,
    /// Output directory
    pub destination_dir: PathBuf,
}

impl Site {
    /// Open the site rooted at `source_dir`, reading `_config.yml` if present
    pub fn new<P: AsRef<Path>>(source_dir: P) -> Result<Self> {
        let source_dir = absolute(source_dir.as_ref())?;
        let config_path = source_dir.join(config::CONFIG_FILE);

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let destination_dir = source_dir.join(&config.destination);

        Ok(Self {
            config,
            source_dir,
            destination_dir,
        })
    }

    /// Write output somewhere other than the configured destination.
    /// A relative path is taken from the current directory.
    pub fn with_destination<P: AsRef<Path>>(mut self, destination: P) -> Result<Self> {
        self.destination_dir = absolute(destination.as_ref())?;
        Ok(self)
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.posts_dir)
    }

    pub fn layouts_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.layouts_dir)
    }

    pub fn includes_dir(&self) -> PathBuf {
        self.source_dir.join(&self.config.includes_dir)
    }

    /// Build the site
    pub fn build(&self) -> Result<BuildReport> {
        commands::build::run(self)
    }

    /// Remove the output directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }

    /// Create a new post or page
    pub fn new_post(&self, title: &str, layout: &str) -> Result<PathBuf> {
        commands::new::create_post(self, title, layout)
    }

    /// Delete the destination directory. Returns whether anything was removed.
    ///
    /// Refuses to delete a destination that is the site root or contains it.
    pub fn remove_destination(&self) -> Result<bool> {
        if !self.destination_dir.exists() {
            return Ok(false);
        }

        let destination = fs::canonicalize(&self.destination_dir)
            .with_context(|| format!("Failed to resolve {:?}", self.destination_dir))?;
        let source = fs::canonicalize(&self.source_dir)
            .with_context(|| format!("Failed to resolve {:?}", self.source_dir))?;
        if source.starts_with(&destination) {
            anyhow::bail!(
                "Refusing to delete {:?}: it contains the site source",
                self.destination_dir
            );
        }

        fs::remove_dir_all(&self.destination_dir)
            .with_context(|| format!("Failed to delete {:?}", self.destination_dir))?;
        tracing::info!("Deleted: {:?}", self.destination_dir);
        Ok(true)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_site_defaults_without_config() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.destination_dir, dir.path().join("_site"));
        assert_eq!(site.posts_dir(), dir.path().join("_posts"));
        assert_eq!(site.layouts_dir(), dir.path().join("_layouts"));
    }

    #[test]
    fn test_site_reads_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Notes\ndestination: public\n").unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert_eq!(site.config.title, "Notes");
        assert_eq!(site.destination_dir, dir.path().join("public"));

        let other = dir.path().join("elsewhere");
        let site = site.with_destination(&other).unwrap();
        assert_eq!(site.destination_dir, other);

        let site = site.with_destination("public").unwrap();
        assert!(site.destination_dir.is_absolute());
        assert!(site.destination_dir.ends_with("public"));
    }

    #[test]
    fn test_remove_destination() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        assert!(!site.remove_destination().unwrap());

        fs::create_dir_all(site.destination_dir.join("a")).unwrap();
        fs::write(site.destination_dir.join("a/index.html"), "x").unwrap();
        assert!(site.remove_destination().unwrap());
        assert!(!site.destination_dir.exists());
    }

    #[test]
    fn test_remove_destination_refuses_site_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("about.md"), "---\nlayout: page\n---\n").unwrap();
        let site = Site::new(dir.path())
            .unwrap()
            .with_destination(dir.path())
            .unwrap();
        assert!(site.remove_destination().is_err());
        assert!(dir.path().join("about.md").exists());
    }
}
