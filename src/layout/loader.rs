//! Layout loader - reads `_layouts/` and `_includes/` into Tera templates

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tera::Tera;
use walkdir::WalkDir;

use super::{filters, Layout, LayoutCollection, LayoutContext, Template};
use crate::config::SiteConfig;
use crate::content::FrontMatter;

/// Prefix for layout template names inside the Tera instance, so layouts
/// never collide with include names
const LAYOUT_PREFIX: &str = "_layouts/";

/// A layout backed by a template in a shared Tera instance
pub struct TeraTemplate {
    tera: Arc<Tera>,
    name: String,
}

impl TeraTemplate {
    pub fn new(tera: Arc<Tera>, name: impl Into<String>) -> Self {
        Self {
            tera,
            name: name.into(),
        }
    }
}

impl Template for TeraTemplate {
    fn render(&self, context: &LayoutContext<'_>) -> tera::Result<String> {
        let context = tera::Context::from_serialize(context)?;
        self.tera.render(&self.name, &context)
    }
}

/// A layout file before its template is compiled
struct LayoutSource {
    name: String,
    parent: Option<String>,
    variables: serde_json::Value,
    template: String,
}

/// Load every layout under `layouts_dir`, with the files under
/// `includes_dir` available to `{% include %}` by their relative path.
/// Missing directories give an empty collection.
pub fn load_layouts(layouts_dir: &Path, includes_dir: &Path, config: &SiteConfig) -> Result<LayoutCollection> {
    let mut templates: Vec<(String, String)> = Vec::new();

    for (relative, content) in read_tree(includes_dir)? {
        templates.push((relative, content));
    }

    let mut sources = Vec::new();
    for (relative, content) in read_tree(layouts_dir)? {
        let source = parse_layout(&relative, &content)
            .with_context(|| format!("Failed to load layout {:?}", layouts_dir.join(&relative)))?;
        templates.push((format!("{}{}", LAYOUT_PREFIX, source.name), source.template.clone()));
        sources.push(source);
    }

    let mut tera = Tera::default();
    // Layouts emit HTML built from already-rendered content
    tera.autoescape_on(vec![]);
    filters::register(&mut tera, config);
    tera.add_raw_templates(templates)
        .map_err(|e| anyhow!("Failed to compile layouts: {}", describe(&e)))?;
    let tera = Arc::new(tera);

    let mut collection = LayoutCollection::new();
    for source in sources {
        let template = TeraTemplate::new(Arc::clone(&tera), format!("{}{}", LAYOUT_PREFIX, source.name));
        let layout = Layout::new(source.name, source.parent.as_deref(), template).with_variables(source.variables);
        if let Some(previous) = collection.insert(layout) {
            tracing::warn!("Layout `{}` is defined more than once", previous.name());
        }
    }

    tracing::debug!("Loaded layouts: {:?}", collection.names());
    Ok(collection)
}

/// Split a layout file into its optional front-matter and template body
fn parse_layout(relative: &str, content: &str) -> Result<LayoutSource> {
    let name = match relative.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => relative.to_string(),
    };

    let (front_matter, template) = match FrontMatter::parse(content)? {
        Some((fm, body)) => (fm, body),
        None => (FrontMatter::default(), content),
    };

    let parent = front_matter.get_str("layout")?.map(str::to_string);
    let variables = serde_json::to_value(front_matter.data())
        .with_context(|| format!("Layout `{}` has front-matter that cannot be exposed to templates", name))?;

    Ok(LayoutSource {
        name,
        parent,
        variables,
        template: template.to_string(),
    })
}

/// Read every file below `dir` as `(relative path, contents)`, sorted
fn read_tree(dir: &Path) -> Result<Vec<(String, String)>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(dir)?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        files.push((relative, content));
    }

    Ok(files)
}

/// Tera puts the details of compile errors in the source chain
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn render(layouts: &LayoutCollection, name: &str, content: &str, page: serde_json::Value) -> String {
        let layout = layouts.get(name).unwrap();
        let site = json!({"title": "Site"});
        let ctx = LayoutContext {
            content,
            page: &page,
            layout: layout.variables(),
            site: &site,
        };
        layout.render(&ctx).unwrap()
    }

    #[test]
    fn test_load_layouts_with_parents_and_includes() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_includes/nav.html", "<nav>{{ site.title }}</nav>");
        write(
            dir.path(),
            "_layouts/default.html",
            "<html>{% include \"nav.html\" %}{{ content }}</html>",
        );
        write(
            dir.path(),
            "_layouts/post.html",
            "---\nlayout: default\nclass: entry\n---\n<article class=\"{{ layout.class }}\"><h1>{{ page.title }}</h1>{{ content }}</article>",
        );

        let layouts = load_layouts(
            &dir.path().join("_layouts"),
            &dir.path().join("_includes"),
            &SiteConfig::default(),
        )
        .unwrap();

        assert_eq!(layouts.names(), vec!["default", "post"]);
        assert_eq!(layouts.get("post").unwrap().parent(), Some("default"));
        assert_eq!(layouts.get("default").unwrap().parent(), None);

        let html = render(&layouts, "post", "<p>Body</p>", json!({"title": "Hi"}));
        assert_eq!(html, "<article class=\"entry\"><h1>Hi</h1><p>Body</p></article>");

        let html = render(&layouts, "default", "X", json!({}));
        assert_eq!(html, "<html><nav>Site</nav>X</html>");
    }

    #[test]
    fn test_content_is_not_escaped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_layouts/raw.html", "{{ content }}");

        let layouts = load_layouts(&dir.path().join("_layouts"), &dir.path().join("_includes"), &SiteConfig::default()).unwrap();
        let html = render(&layouts, "raw", "<em>&amp;</em>", json!({}));
        assert_eq!(html, "<em>&amp;</em>");
    }

    #[test]
    fn test_missing_directories_give_empty_collection() {
        let dir = TempDir::new().unwrap();
        let layouts = load_layouts(&dir.path().join("_layouts"), &dir.path().join("_includes"), &SiteConfig::default()).unwrap();
        assert!(layouts.is_empty());
    }

    #[test]
    fn test_invalid_template_fails_to_load() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_layouts/bad.html", "{% if %}");
        let result = load_layouts(&dir.path().join("_layouts"), &dir.path().join("_includes"), &SiteConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_render_error_for_unknown_variable() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_layouts/strict.html", "{{ page.missing.deeper }}");

        let layouts = load_layouts(&dir.path().join("_layouts"), &dir.path().join("_includes"), &SiteConfig::default()).unwrap();
        let layout = layouts.get("strict").unwrap();
        let empty = json!({});
        let ctx = LayoutContext {
            content: "",
            page: &empty,
            layout: &empty,
            site: &empty,
        };
        assert!(layout.render(&ctx).is_err());
    }
}
