//! Error types for loading, rendering and writing content items

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used by the build pipeline
pub type Result<T, E = SiteError> = std::result::Result<T, E>;

/// Errors raised while turning a content file into an output page
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("site root not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("malformed front-matter in {id}: {reason}")]
    MalformedFrontMatter { id: String, reason: String },

    #[error("{}", unresolved_message(.name, .referenced_by))]
    UnresolvedLayout {
        name: String,
        referenced_by: Option<String>,
    },

    #[error("cyclic layout chain: {}", .chain.join(" -> "))]
    CyclicLayout { chain: Vec<String> },

    #[error("rendering layout `{layout}`: {}", template_message(.source))]
    Template {
        layout: String,
        #[source]
        source: tera::Error,
    },

    #[error("{} is produced by both {first} and {second}", .path.display())]
    DuplicateDestination {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SiteError {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        SiteError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn malformed(id: impl Into<String>, reason: impl fmt::Display) -> Self {
        SiteError::MalformedFrontMatter {
            id: id.into(),
            reason: reason.to_string(),
        }
    }

    /// Short machine-friendly name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            SiteError::NotFound { .. } => "not-found",
            SiteError::MalformedFrontMatter { .. } => "malformed-front-matter",
            SiteError::UnresolvedLayout { .. } => "unresolved-layout",
            SiteError::CyclicLayout { .. } => "cyclic-layout",
            SiteError::Template { .. } => "template",
            SiteError::DuplicateDestination { .. } => "duplicate-destination",
            SiteError::Io { .. } => "io",
        }
    }
}

fn unresolved_message(name: &str, referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(parent) => format!("layout `{}` (required by layout `{}`) does not exist", name, parent),
        None => format!("layout `{}` does not exist", name),
    }
}

/// Tera keeps the useful part of a render failure in the source chain
fn template_message(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// A failure attributed to a single content item
#[derive(Debug)]
pub struct ItemFailure {
    /// Identifier of the offending source file
    pub id: String,
    /// Source path relative to the site root. Unlike the identifier it
    /// keeps the extension, so `about.md` and `about.html` stay distinct.
    pub source: PathBuf,
    pub error: SiteError,
}

impl ItemFailure {
    pub fn new(id: impl Into<String>, source: impl AsRef<Path>, error: SiteError) -> Self {
        Self {
            id: id.into(),
            source: source.as_ref().to_path_buf(),
            error,
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.error)
    }
}
