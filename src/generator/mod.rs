//! Generator module - runs discover, parse, render and emit over a whole site

mod context;
mod emit;
pub mod permalink;
mod render;

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::content::{ContentItem, ContentLoader, MarkdownRenderer};
use crate::error::{ItemFailure, SiteError};
use crate::layout::{load_layouts, LayoutCollection};
use crate::Site;

pub use context::{page_variables, PageSummary, PostSummary, SiteData};
pub use emit::{copy_static, emit};
pub use render::Renderer;

/// Outcome of one build
#[derive(Debug, Default)]
pub struct BuildReport {
    /// Rendered files, in discovery order
    pub written: Vec<PathBuf>,
    /// Copied static files
    pub copied: Vec<PathBuf>,
    pub failures: Vec<ItemFailure>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} pages written, {} files copied, {} failed",
            self.written.len(),
            self.copied.len(),
            self.failures.len()
        )
    }

    fn fail(&mut self, id: &str, source: &Path, error: SiteError) {
        tracing::debug!("{}: {}", source.display(), error);
        self.failures.push(ItemFailure::new(id, source, error));
    }
}

/// An item whose destination has been claimed
struct Planned {
    item: ContentItem,
    url: String,
    destination: PathBuf,
}

/// Static site generator driven by the site's `_layouts/`
pub struct Generator<'a> {
    site: &'a Site,
    layouts: LayoutCollection,
    markdown: MarkdownRenderer,
}

impl<'a> Generator<'a> {
    /// Create a generator, loading the site's layouts and includes
    pub fn new(site: &'a Site) -> Result<Self> {
        let layouts = load_layouts(&site.layouts_dir(), &site.includes_dir(), &site.config)
            .with_context(|| format!("Failed to load layouts from {:?}", site.layouts_dir()))?;
        Ok(Self::with_layouts(site, layouts))
    }

    /// Create a generator with an already assembled layout collection
    pub fn with_layouts(site: &'a Site, layouts: LayoutCollection) -> Self {
        Self {
            site,
            layouts,
            markdown: MarkdownRenderer::with_config(&site.config.markdown),
        }
    }

    /// Build the whole site.
    ///
    /// Errors tied to one item are collected in the report and never stop
    /// the other items. Only site-wide problems (a missing root, an
    /// unwritable destination) return `Err`.
    pub fn build(&self) -> Result<BuildReport> {
        let start = Instant::now();
        let loader = ContentLoader::new(self.site);
        let discovery = loader.discover()?;
        tracing::info!(
            "Found {} posts, {} pages and {} static files",
            discovery.posts.len(),
            discovery.pages.len(),
            discovery.statics.len()
        );

        if self.site.config.clean_destination {
            self.site.remove_destination()?;
        }

        let mut report = BuildReport::default();

        let sources: Vec<_> = discovery.content().collect();
        let parsed: Vec<_> = sources.par_iter().map(|file| loader.parse(file)).collect();

        let mut items = Vec::with_capacity(parsed.len());
        for (file, result) in sources.iter().zip(parsed) {
            match result {
                Ok(item) => items.push(item),
                Err(e) => report.fail(&file.id, &file.relative, e),
            }
        }
        // A front-matter date can reorder posts relative to their file names
        items.sort_by(publication_order);

        // Output path -> source path of the item that owns it. An item only
        // claims a path once its layout chain resolves.
        let mut claimed: HashMap<PathBuf, String> = HashMap::new();
        let mut planned = Vec::with_capacity(items.len());
        for item in items {
            if let Err(e) = self.layouts.resolve_chain(&item.layout) {
                report.fail(&item.id, &item.relative, e);
                continue;
            }
            let (url, relative) = match permalink::destination(&item, &self.site.config) {
                Ok(found) => found,
                Err(e) => {
                    report.fail(&item.id, &item.relative, e);
                    continue;
                }
            };
            let destination = self.site.destination_dir.join(&relative);
            let source = display_path(&item.relative);
            if let Some(first) = claimed.get(&relative) {
                let error = SiteError::DuplicateDestination {
                    path: destination,
                    first: first.clone(),
                    second: source,
                };
                report.fail(&item.id, &item.relative, error);
                continue;
            }
            claimed.insert(relative, source);
            planned.push(Planned { item, url, destination });
        }

        let post_count = planned.iter().take_while(|p| p.item.is_post()).count();
        let separator = &self.site.config.excerpt_separator;
        let posts: Vec<PostSummary> = planned[..post_count]
            .par_iter()
            .map(|p| {
                let excerpt = self.markdown.render(p.item.excerpt_source(separator));
                PostSummary::new(&p.item, &p.url, excerpt)
            })
            .collect();
        let pages: Vec<PageSummary> = planned[post_count..]
            .iter()
            .map(|p| PageSummary::new(&p.item, &p.url))
            .collect();
        let site = SiteData::new(&self.site.config, &posts, &pages).to_value()?;

        let renderer = Renderer::new(&self.layouts, &self.markdown, &site);
        let rendered: Vec<_> = planned
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let (excerpt, previous, next) = if i < post_count {
                    (
                        Some(posts[i].excerpt.as_str()),
                        posts.get(i + 1),
                        i.checked_sub(1).and_then(|j| posts.get(j)),
                    )
                } else {
                    (None, None, None)
                };
                let page = page_variables(&p.item, &p.url, excerpt, previous, next)?;
                renderer.render(&p.item, &page)
            })
            .collect();

        for (p, result) in planned.iter().zip(rendered) {
            match result.and_then(|markup| emit(&markup, &p.destination)) {
                Ok(()) => {
                    tracing::debug!("Generated: {:?}", p.destination);
                    report.written.push(p.destination.clone());
                }
                Err(e) => report.fail(&p.item.id, &p.item.relative, e),
            }
        }

        for file in &discovery.statics {
            let destination = self.site.destination_dir.join(&file.relative);
            if let Some(first) = claimed.get(&file.relative) {
                let error = SiteError::DuplicateDestination {
                    path: destination,
                    first: first.clone(),
                    second: display_path(&file.relative),
                };
                report.fail(&file.id, &file.relative, error);
                continue;
            }
            match copy_static(&file.path, &destination) {
                Ok(()) => {
                    tracing::debug!("Copied: {:?}", destination);
                    report.copied.push(destination);
                }
                Err(e) => report.fail(&file.id, &file.relative, e),
            }
        }

        tracing::info!("{} in {:.2?}", report.summary(), start.elapsed());
        Ok(report)
    }
}

/// A relative path with `/` separators
fn display_path(relative: &Path) -> String {
    relative.to_string_lossy().replace('\\', "/")
}

/// Posts before pages; posts newest first with identifier as tie-break;
/// pages keep discovery order
fn publication_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    match (a.is_post(), b.is_post()) {
        (true, true) => b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}
