//! Content module - handles posts, pages, and content processing

mod frontmatter;
mod item;
pub mod loader;
mod markdown;

pub use frontmatter::{parse_date_string, FrontMatter, FrontMatterError};
pub use item::{titleize_slug, ContentItem, Format, ItemKind};
pub use loader::{ContentLoader, Discovery, SourceFile, SourceKind};
pub use markdown::MarkdownRenderer;

pub(crate) use markdown::html_escape;
