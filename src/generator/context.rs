//! Template variables: the shared `site` object and per-item `page` objects

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::config::SiteConfig;
use crate::content::{ContentItem, ItemKind};
use crate::error::{Result, SiteError};

/// A post as seen from listings, neighbours and indexes
#[derive(Debug, Clone, Serialize)]
pub struct PostSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    /// RFC 3339
    pub date: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    /// Rendered HTML of the text before the excerpt separator
    pub excerpt: String,
}

impl PostSummary {
    pub fn new(item: &ContentItem, url: &str, excerpt: String) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: url.to_string(),
            date: item.date.map(|d| d.to_rfc3339()),
            categories: item.categories.clone(),
            tags: item.tags.clone(),
            excerpt,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageSummary {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl PageSummary {
    pub fn new(item: &ContentItem, url: &str) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: url.to_string(),
        }
    }
}

/// The `site` variable. Extra config keys come first so that computed
/// fields win on a name clash.
#[derive(Debug, Serialize)]
pub struct SiteData<'a> {
    #[serde(flatten)]
    pub extra: &'a BTreeMap<String, serde_yaml::Value>,
    pub title: &'a str,
    pub description: &'a str,
    pub author: &'a str,
    pub url: &'a str,
    pub baseurl: &'a str,
    /// Newest first
    pub posts: &'a [PostSummary],
    pub pages: &'a [PageSummary],
    pub categories: BTreeMap<&'a str, Vec<&'a PostSummary>>,
    pub tags: BTreeMap<&'a str, Vec<&'a PostSummary>>,
}

impl<'a> SiteData<'a> {
    pub fn new(config: &'a SiteConfig, posts: &'a [PostSummary], pages: &'a [PageSummary]) -> Self {
        let mut categories: BTreeMap<&str, Vec<&PostSummary>> = BTreeMap::new();
        let mut tags: BTreeMap<&str, Vec<&PostSummary>> = BTreeMap::new();
        for post in posts {
            for category in &post.categories {
                categories.entry(category.as_str()).or_default().push(post);
            }
            for tag in &post.tags {
                tags.entry(tag.as_str()).or_default().push(post);
            }
        }

        Self {
            extra: &config.extra,
            title: &config.title,
            description: &config.description,
            author: &config.author,
            url: &config.url,
            baseurl: &config.baseurl,
            posts,
            pages,
            categories,
            tags,
        }
    }

    pub fn to_value(&self) -> anyhow::Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// The `page` variable: every front-matter key, overlaid with the values the
/// loader derived for the item
pub fn page_variables(
    item: &ContentItem,
    url: &str,
    excerpt: Option<&str>,
    previous: Option<&PostSummary>,
    next: Option<&PostSummary>,
) -> Result<Value> {
    let mut page = match serde_json::to_value(item.front_matter.data()) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(SiteError::malformed(&item.id, e)),
    };

    page.insert("id".into(), json!(item.id));
    page.insert("title".into(), json!(item.title));
    page.insert("layout".into(), json!(item.layout));
    page.insert("url".into(), json!(url));
    page.insert("slug".into(), json!(item.slug));
    page.insert("path".into(), json!(item.relative.to_string_lossy().replace('\\', "/")));
    page.insert("kind".into(), json!(item.kind));
    page.insert("date".into(), json!(item.date.map(|d| d.to_rfc3339())));
    page.insert("categories".into(), json!(item.categories));
    page.insert("tags".into(), json!(item.tags));
    if let Some(excerpt) = excerpt {
        page.insert("excerpt".into(), json!(excerpt));
    }
    if item.kind == ItemKind::Post {
        page.insert("previous".into(), json!(previous));
        page.insert("next".into(), json!(next));
    }

    Ok(Value::Object(page))
}
