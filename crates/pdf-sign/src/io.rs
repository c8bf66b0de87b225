//! Document I/O helpers

use crate::types::*;
use lopdf::Document;
use std::path::Path;

/// Read a PDF from disk, checking that it parses before handing back the bytes
pub async fn load_pdf(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref().to_owned();
    let bytes = tokio::fs::read(&path).await?;
    let bytes = tokio::task::spawn_blocking(move || {
        let doc = Document::load_mem(&bytes)?;
        if doc.get_pages().is_empty() {
            return Err(SignError::NoPages);
        }
        Ok(bytes)
    })
    .await??;
    log::debug!("Loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}

/// Write exported PDF bytes to disk
pub async fn save_pdf(bytes: &[u8], path: impl AsRef<Path>) -> Result<()> {
    tokio::fs::write(path.as_ref(), bytes).await?;
    log::info!("Saved {}", path.as_ref().display());
    Ok(())
}
