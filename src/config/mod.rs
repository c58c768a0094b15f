//! Configuration module

mod site;

pub use site::DefaultsConfig;
pub use site::MarkdownConfig;
pub use site::SiteConfig;
pub use site::CONFIG_FILE;
