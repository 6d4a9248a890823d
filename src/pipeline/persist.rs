//! Writing the text artifacts to the output directory.

use crate::error::PdfSumError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `text` as UTF-8 to `dir/filename`, replacing any existing file.
///
/// The directory is created if missing. Content goes to a sibling `.tmp`
/// file first and is renamed into place, so a reader never sees a
/// half-written artifact.
pub async fn save_text(dir: &Path, filename: &str, text: &str) -> Result<PathBuf, PdfSumError> {
    let path = dir.join(filename);
    let staging = dir.join(format!("{filename}.tmp"));
    let write_failed = |source| PdfSumError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;
    tokio::fs::write(&staging, text.as_bytes())
        .await
        .map_err(write_failed)?;
    if let Err(e) = tokio::fs::rename(&staging, &path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(write_failed(e));
    }

    info!("Saved {} ({} bytes)", path.display(), text.len());
    Ok(path)
}
