//! List site content

use anyhow::Result;
use std::collections::BTreeMap;

use crate::content::{ContentItem, ContentLoader, SourceFile};
use crate::generator::permalink;
use crate::Site;

/// Print the site's posts, pages or categories
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    let loader = ContentLoader::new(site);
    let discovery = loader.discover()?;

    match content_type {
        "post" | "posts" => {
            let posts = parse_all(&loader, &discovery.posts);
            println!("Posts ({}):", posts.len());
            for post in posts {
                let date = post
                    .date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!(
                    "  {} - {} [{}] -> {}",
                    date,
                    post.title,
                    post.id,
                    permalink::item_url(&post, &site.config)
                );
            }
        }
        "page" | "pages" => {
            let pages = parse_all(&loader, &discovery.pages);
            println!("Pages ({}):", pages.len());
            for page in pages {
                println!(
                    "  {} [{}] -> {}",
                    page.title,
                    page.id,
                    permalink::item_url(&page, &site.config)
                );
            }
        }
        "category" | "categories" => {
            let posts = parse_all(&loader, &discovery.posts);
            let categories = count_categories(&posts);
            println!("Categories ({}):", categories.len());
            for (category, count) in categories {
                println!("  {} ({})", category, count);
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: post, page, category",
                content_type
            );
        }
    }

    Ok(())
}

/// Parse every file, skipping the ones that fail with a warning
fn parse_all(loader: &ContentLoader<'_>, files: &[SourceFile]) -> Vec<ContentItem> {
    files
        .iter()
        .filter_map(|file| match loader.parse(file) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping {}: {}", file.id, e);
                None
            }
        })
        .collect()
}

/// Categories with their post counts, most used first, then by name
fn count_categories(posts: &[ContentItem]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for post in posts {
        for category in &post.categories {
            *counts.entry(category.as_str()).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<_> = counts
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
