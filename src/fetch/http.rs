use std::path::Path;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

/// Stream a URL to a local file. A non-2xx response is reported and returns
/// `false` without failing the surrounding import.
pub async fn download_to_file(client: &Client, url: &str, path: &Path) -> Result<bool> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {url}"))?;

    if !response.status().is_success() {
        warn!("HTTP request status {} from url {}", response.status(), url);
        return Ok(false);
    }

    info!("Downloading from {} to {:?}", url, path);
    let mut file = tokio::fs::File::create(path)
        .await
        .with_context(|| format!("Failed to create {path:?}"))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("Download stream failed")?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("Failed to write {path:?}"))?;
    }
    file.flush().await?;
    Ok(true)
}

/// Fetch a URL body as text, or `None` on a non-2xx response.
pub async fn fetch_text(client: &Client, url: &str) -> Result<Option<String>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to request {url}"))?;

    if !response.status().is_success() {
        warn!("HTTP request status {} from url {}", response.status(), url);
        return Ok(None);
    }

    let body = response
        .text()
        .await
        .with_context(|| format!("Failed to read response body from {url}"))?;
    Ok(Some(body))
}
