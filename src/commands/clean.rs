//! Clean the public directory

use anyhow::Result;
use std::fs;

use crate::generator::Generator;
use crate::Site;

/// Remove the corpus export, and the public directory once it is empty
pub fn run(site: &Site) -> Result<()> {
    let output = Generator::new(site).output_path();
    if output.exists() {
        fs::remove_file(&output)?;
        tracing::info!("Deleted: {:?}", output);
    }

    let is_empty = fs::read_dir(&site.public_dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false);
    if is_empty {
        fs::remove_dir(&site.public_dir)?;
        tracing::info!("Deleted: {:?}", site.public_dir);
    }

    Ok(())
}
