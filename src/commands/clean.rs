//! Clean the destination directory

use anyhow::Result;

use crate::Site;

/// Remove the generated site
pub fn run(site: &Site) -> Result<()> {
    if !site.remove_destination()? {
        tracing::info!("Nothing to clean at {:?}", site.destination_dir);
    }
    Ok(())
}
