//! Output URLs and destination paths derived from an item's identifier

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};

use crate::config::SiteConfig;
use crate::content::{ContentItem, Format, ItemKind};
use crate::error::{Result, SiteError};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r":([a-z_]+)").unwrap();
}

/// The URL of an item, relative to the site root and without `baseurl`
pub fn item_url(item: &ContentItem, config: &SiteConfig) -> String {
    match (&item.permalink, item.kind) {
        (Some(pattern), _) => expand(pattern, item),
        (None, ItemKind::Post) => expand(config.permalink_pattern(), item),
        (None, ItemKind::Page) => page_url(&item.relative),
    }
}

/// Where an item is written, relative to the destination directory
pub fn destination(item: &ContentItem, config: &SiteConfig) -> Result<(String, PathBuf)> {
    let url = item_url(item, config);
    let path = url_to_path(&url).ok_or_else(|| {
        SiteError::malformed(
            &item.id,
            format!("permalink `{}` does not name a file inside the site", url),
        )
    })?;
    Ok((url, path))
}

/// Fill a permalink pattern's placeholders from the item
pub fn expand(pattern: &str, item: &ContentItem) -> String {
    let date = |fmt: &str| {
        item.date
            .map(|d| d.format(fmt).to_string())
            .unwrap_or_default()
    };

    let expanded = PLACEHOLDER.replace_all(pattern, |caps: &Captures| match &caps[1] {
        "year" => date("%Y"),
        "short_year" => date("%y"),
        "month" => date("%m"),
        "i_month" => date("%-m"),
        "day" => date("%d"),
        "i_day" => date("%-d"),
        "y_day" => date("%j"),
        "hour" => date("%H"),
        "minute" => date("%M"),
        "second" => date("%S"),
        "title" => item.slug.clone(),
        "slug" => slug::slugify(&item.title),
        "categories" => item
            .categories
            .iter()
            .map(|c| slug::slugify(c))
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("/"),
        "category" => item
            .categories
            .first()
            .map(|c| slug::slugify(c))
            .unwrap_or_default(),
        "output_ext" => ".html".to_string(),
        _ => caps[0].to_string(),
    });

    normalize(&expanded)
}

/// URL of a page: its source path, Markdown extensions replaced by `.html`,
/// with `index.html` files addressed by their directory
pub fn page_url(relative: &Path) -> String {
    let is_markdown = relative
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| Format::from_extension(ext) == Format::Markdown)
        .unwrap_or(false);
    let output = if is_markdown {
        relative.with_extension("html")
    } else {
        relative.to_path_buf()
    };
    let parts: Vec<String> = output
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    match parts.split_last() {
        Some((last, dirs)) if last == "index.html" => normalize(&format!("/{}/", dirs.join("/"))),
        _ => normalize(&format!("/{}", parts.join("/"))),
    }
}

/// Leading slash, no repeated slashes
fn normalize(url: &str) -> String {
    let mut out = String::with_capacity(url.len() + 1);
    out.push('/');
    for c in url.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// File path for a URL. Directory URLs get `index.html`; a last segment
/// without an extension gets `.html`. `None` if the URL leaves the site.
pub fn url_to_path(url: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for segment in url.split('/').filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." || segment.contains('\\') {
            return None;
        }
        path.push(segment);
    }

    if url.ends_with('/') || path.as_os_str().is_empty() {
        path.push("index.html");
    } else if path.extension().is_none() {
        path.set_extension("html");
    }

    Some(path)
}
