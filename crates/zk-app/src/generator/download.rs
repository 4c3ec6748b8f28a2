use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use zk_core::looks_like_glb;
use zk_core::presenter::DownloadAction;

use crate::error::AppError;

/// Fetch the asset and save it as `out_dir/<action.filename>`
pub async fn download_asset(
    client: &Client,
    action: &DownloadAction,
    out_dir: &Path,
    timeout: Option<Duration>,
) -> Result<PathBuf, AppError> {
    info!("Downloading {}", action.url);

    let mut request = client.get(&action.url);
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await.map_err(|e| download_error(e, timeout))?;

    if !response.status().is_success() {
        return Err(AppError::Download(format!(
            "{} returned {}",
            action.url,
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| download_error(e, timeout))?;

    if !looks_like_glb(&bytes) {
        warn!("{} does not look like a binary glTF file", action.url);
    }

    tokio::fs::create_dir_all(out_dir).await?;
    let path = out_dir.join(&action.filename);
    tokio::fs::write(&path, &bytes).await?;

    info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

/// [`download_asset`] that stops as soon as `cancel` fires. `Ok(None)` means it was cancelled.
pub async fn download_or_cancel(
    client: &Client,
    action: &DownloadAction,
    out_dir: &Path,
    timeout: Option<Duration>,
    cancel: &CancellationToken,
) -> Result<Option<PathBuf>, AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            info!("Download of {} cancelled", action.url);
            Ok(None)
        }
        result = download_asset(client, action, out_dir, timeout) => result.map(Some),
    }
}

fn download_error(e: reqwest::Error, timeout: Option<Duration>) -> AppError {
    match timeout {
        Some(timeout) if e.is_timeout() => {
            AppError::Download(format!("timed out after {}s", timeout.as_secs()))
        }
        _ => AppError::Download(e.to_string()),
    }
}
