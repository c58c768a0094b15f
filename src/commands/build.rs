//! Build the site, once or on every change

use anyhow::Result;
use notify::{Event, EventKind, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::generator::{BuildReport, Generator};
use crate::Site;

/// Quiet period after the last change before a rebuild starts
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Build the site and log every failed item
pub fn run(site: &Site) -> Result<BuildReport> {
    tracing::info!("Building {:?} into {:?}", site.source_dir, site.destination_dir);

    let generator = Generator::new(site)?;
    let report = generator.build()?;

    for failure in &report.failures {
        tracing::error!("{}", failure);
    }

    Ok(report)
}

/// Rebuild whenever something under the site root changes.
///
/// Changes inside the destination directory are ignored. Failed builds are
/// logged and the watch goes on.
pub fn watch(site: &Site) -> Result<()> {
    let (tx, rx) = channel();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        let _ = tx.send(res);
    })?;
    watcher.watch(&site.source_dir, notify::RecursiveMode::Recursive)?;

    let destination = resolve(&site.destination_dir);
    tracing::info!("Watching {:?} for changes. Press Ctrl+C to stop.", site.source_dir);

    let mut pending: Option<Instant> = None;
    loop {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(Ok(event)) => {
                if is_source_change(&event, &destination) {
                    tracing::debug!("Changed: {:?}", event.paths);
                    pending = Some(Instant::now());
                }
            }
            Ok(Err(e)) => tracing::warn!("Watch error: {}", e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if pending.is_some_and(|changed| changed.elapsed() >= DEBOUNCE) {
            pending = None;
            tracing::info!("Files changed, rebuilding...");
            if let Err(e) = rebuild(site) {
                tracing::error!("Build failed: {:#}", e);
            }
        }
    }

    Ok(())
}

/// Rebuild with a freshly read `_config.yml`, keeping the destination
fn rebuild(site: &Site) -> Result<()> {
    let site = Site::new(&site.source_dir)?.with_destination(&site.destination_dir)?;
    let report = run(&site)?;
    if report.is_success() {
        tracing::info!("Rebuilt: {}", report.summary());
    }
    Ok(())
}

fn is_source_change(event: &Event, destination: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .any(|path| !resolve(path).starts_with(destination))
}

/// Canonical form of a path, or the path itself if it does not exist
fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
