//! Create a new post or page

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::content::FrontMatter;
use crate::Site;

/// Create a post in the posts directory or a page at the site root.
/// Returns the path of the new file.
pub fn create_post(site: &Site, title: &str, layout: &str) -> Result<PathBuf> {
    let now = chrono::Local::now();
    let slug = slug::slugify(title);
    if slug.is_empty() {
        anyhow::bail!("Cannot derive a file name from title {:?}", title);
    }

    let mut front_matter = FrontMatter::default();
    front_matter.insert("layout", layout);
    front_matter.insert("title", title);

    let file_path = match layout {
        "post" => {
            front_matter.insert("date", now.format("%Y-%m-%d %H:%M:%S %z").to_string());
            site.posts_dir()
                .join(format!("{}-{}.md", now.format("%Y-%m-%d"), slug))
        }
        "page" => site.source_dir.join(format!("{}.md", slug)),
        _ => anyhow::bail!("Unknown layout: {}. Available: post, page", layout),
    };

    if file_path.exists() {
        anyhow::bail!("File already exists: {:?}", file_path);
    }

    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = front_matter.to_document("")?;
    fs::write(&file_path, content).with_context(|| format!("Failed to write {:?}", file_path))?;

    tracing::info!("Created: {:?}", file_path);

    Ok(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentLoader;
    use tempfile::TempDir;

    #[test]
    fn test_new_post_is_discoverable() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let path = create_post(&site, "How Lean tracks your definitions", "post").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-how-lean-tracks-your-definitions.md"), "{}", name);

        let loader = ContentLoader::new(&site);
        let discovery = loader.discover().unwrap();
        assert_eq!(discovery.posts.len(), 1);
        let item = loader.parse(&discovery.posts[0]).unwrap();
        assert_eq!(item.title, "How Lean tracks your definitions");
        assert_eq!(item.layout, "post");
        assert!(item.date.is_some());
    }

    #[test]
    fn test_new_page() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        let path = create_post(&site, "About", "page").unwrap();
        assert_eq!(path, dir.path().join("about.md"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "---\nlayout: page\ntitle: About\n---\n"
        );
    }

    #[test]
    fn test_new_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let site = Site::new(dir.path()).unwrap();
        create_post(&site, "About", "page").unwrap();
        assert!(create_post(&site, "About", "page").is_err());
        assert!(create_post(&site, "!!!", "page").is_err());
        assert!(create_post(&site, "Draft", "draft").is_err());
    }
}
