//! Atomic writes into the destination directory

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{Result, SiteError};

/// Write `markup` to `destination`, replacing any existing file.
///
/// The bytes go to a temporary file next to the destination which is renamed
/// into place once complete. On any failure the temporary file is removed and
/// the destination is left as it was, including any directories this call
/// created for it.
pub fn emit(markup: &str, destination: &Path) -> Result<()> {
    write_atomically(destination, |file| {
        file.write_all(markup.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| SiteError::io(destination, e))
    })
}

/// Copy a static file to `destination` the same way [`emit`] writes markup
pub fn copy_static(source: &Path, destination: &Path) -> Result<()> {
    let mut input = File::open(source).map_err(|e| SiteError::io(source, e))?;
    write_atomically(destination, |file| {
        io::copy(&mut input, file)
            .map(|_| ())
            .map_err(|e| SiteError::io(destination, e))
    })
}

fn write_atomically<F>(destination: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut NamedTempFile) -> Result<()>,
{
    let parent = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let first_missing = first_missing_ancestor(parent);

    let result = fs::create_dir_all(parent)
        .map_err(|e| SiteError::io(parent, e))
        .and_then(|_| {
            tempfile::Builder::new()
                .prefix(".quire-")
                .tempfile_in(parent)
                .map_err(|e| SiteError::io(parent, e))
        })
        .and_then(|mut file| {
            fill(&mut file)?;
            persist(file, destination)
        });

    if result.is_err() {
        if let Some(top) = first_missing {
            remove_created_dirs(parent, &top);
        }
    }
    result
}

/// The outermost ancestor of `dir` (possibly `dir` itself) that does not exist
fn first_missing_ancestor(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .take_while(|ancestor| !ancestor.as_os_str().is_empty() && !ancestor.exists())
        .last()
        .map(Path::to_path_buf)
}

/// Remove `dir` and its parents up to and including `top` while they are empty
fn remove_created_dirs(dir: &Path, top: &Path) {
    for ancestor in dir.ancestors() {
        if fs::remove_dir(ancestor).is_err() || ancestor == top {
            break;
        }
    }
}

fn persist(file: NamedTempFile, destination: &Path) -> Result<()> {
    file.persist(destination)
        .map(|_| ())
        .map_err(|e| SiteError::io(destination, e.error))
}
