//! Body conversion and layout application

use serde_json::Value;

use crate::content::{ContentItem, Format, MarkdownRenderer};
use crate::error::Result;
use crate::layout::{LayoutCollection, LayoutContext};

/// Renders items against a read-only layout collection and site object
pub struct Renderer<'a> {
    layouts: &'a LayoutCollection,
    markdown: &'a MarkdownRenderer,
    site: &'a Value,
}

impl<'a> Renderer<'a> {
    pub fn new(layouts: &'a LayoutCollection, markdown: &'a MarkdownRenderer, site: &'a Value) -> Self {
        Self {
            layouts,
            markdown,
            site,
        }
    }

    /// The item's body as HTML
    pub fn convert(&self, item: &ContentItem) -> String {
        match item.format {
            Format::Markdown => self.markdown.render(&item.body),
            Format::Html => item.body.clone(),
        }
    }

    /// Convert the body, then wrap it in the item's layout and each parent
    /// that layout declares, innermost first.
    ///
    /// The whole chain is resolved before anything is evaluated, so a missing
    /// or cyclic layout fails without rendering a single template.
    pub fn render(&self, item: &ContentItem, page: &Value) -> Result<String> {
        let chain = self.layouts.resolve_chain(&item.layout)?;

        let mut content = self.convert(item);
        for layout in chain {
            let context = LayoutContext {
                content: &content,
                page,
                layout: layout.variables(),
                site: self.site,
            };
            content = layout.render(&context)?;
        }

        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{FrontMatter, ItemKind};
    use crate::error::SiteError;
    use crate::layout::Layout;
    use serde_json::json;
    use std::path::PathBuf;

    fn item(layout: &str, format: Format, body: &str) -> ContentItem {
        ContentItem {
            kind: ItemKind::Post,
            id: "_posts/2025-12-08-lean-defs".to_string(),
            source: PathBuf::from("_posts/2025-12-08-lean-defs.md"),
            relative: PathBuf::from("_posts/2025-12-08-lean-defs.md"),
            layout: layout.to_string(),
            title: "How Lean tracks your definitions".to_string(),
            date: None,
            categories: Vec::new(),
            tags: Vec::new(),
            permalink: None,
            slug: "lean-defs".to_string(),
            format,
            front_matter: FrontMatter::default(),
            body: body.to_string(),
        }
    }

    fn layouts() -> LayoutCollection {
        let mut layouts = LayoutCollection::new();
        layouts.insert(Layout::from_fn("default", None, |ctx| {
            Ok(format!(
                "<html><title>{}</title>{}</html>",
                ctx.site["title"].as_str().unwrap_or_default(),
                ctx.content
            ))
        }));
        layouts.insert(
            Layout::from_fn("post", Some("default"), |ctx| {
                Ok(format!(
                    "<article class=\"{}\"><h1>{}</h1>{}</article>",
                    ctx.layout["class"].as_str().unwrap_or_default(),
                    ctx.page["title"].as_str().unwrap_or_default(),
                    ctx.content
                ))
            })
            .with_variables(json!({"class": "post"})),
        );
        layouts
    }

    #[test]
    fn test_render_applies_chain_innermost_first() {
        let layouts = layouts();
        let markdown = MarkdownRenderer::new();
        let site = json!({"title": "Notes"});
        let renderer = Renderer::new(&layouts, &markdown, &site);

        let item = item("post", Format::Markdown, "Lean *remembers*.");
        let page = json!({"title": item.title});
        let html = renderer.render(&item, &page).unwrap();

        assert_eq!(
            html,
            "<html><title>Notes</title><article class=\"post\"><h1>How Lean tracks your definitions</h1><p>Lean <em>remembers</em>.</p>\n</article></html>"
        );
    }

    #[test]
    fn test_render_is_idempotent() {
        let layouts = layouts();
        let markdown = MarkdownRenderer::new();
        let site = json!({"title": "Notes"});
        let renderer = Renderer::new(&layouts, &markdown, &site);

        let item = item("post", Format::Markdown, "# Heading\n\n```rust\nfn main() {}\n```\n");
        let page = json!({"title": item.title});
        let first = renderer.render(&item, &page).unwrap();
        let second = renderer.render(&item, &page).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_html_body_passes_through() {
        let layouts = layouts();
        let markdown = MarkdownRenderer::new();
        let site = json!({});
        let renderer = Renderer::new(&layouts, &markdown, &site);

        let item = item("default", Format::Html, "<p>*not markdown*</p>");
        assert_eq!(renderer.convert(&item), "<p>*not markdown*</p>");
        assert_eq!(
            renderer.render(&item, &json!({})).unwrap(),
            "<html><title></title><p>*not markdown*</p></html>"
        );
    }

    #[test]
    fn test_missing_layout() {
        let layouts = layouts();
        let markdown = MarkdownRenderer::new();
        let site = json!({});
        let renderer = Renderer::new(&layouts, &markdown, &site);

        let item = item("missing-layout", Format::Markdown, "text");
        match renderer.render(&item, &json!({})).unwrap_err() {
            SiteError::UnresolvedLayout { name, .. } => assert_eq!(name, "missing-layout"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cyclic_layouts_render_nothing() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let mut layouts = LayoutCollection::new();
        for (name, parent) in [("a", "b"), ("b", "a")] {
            let calls = Arc::clone(&calls);
            layouts.insert(Layout::from_fn(name, Some(parent), move |ctx| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(ctx.content.to_string())
            }));
        }
        let markdown = MarkdownRenderer::new();
        let site = json!({});
        let renderer = Renderer::new(&layouts, &markdown, &site);

        let err = renderer.render(&item("a", Format::Html, ""), &json!({})).unwrap_err();
        match err {
            SiteError::CyclicLayout { chain } => assert_eq!(chain, vec!["a", "b", "a"]),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
