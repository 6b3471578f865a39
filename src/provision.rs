//! Fetching the gazetteer file on first use.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;
use tracing::{error, info};

/// Make sure the gazetteer exists at `path`, downloading it from `url` if not.
///
/// The download goes to a temporary file next to the target and is only moved
/// into place once complete, so an interrupted run never leaves a truncated
/// gazetteer behind.
pub async fn ensure_gazetteer(path: &Path, url: &str) -> Result<PathBuf> {
    if path.is_file() {
        info!("Gazetteer already present at {}", path.display());
        return Ok(path.to_path_buf());
    }

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    info!("Downloading gazetteer from {}", url);
    let client = reqwest::Client::new();
    let response = client
        .get(url)
        .send()
        .await
        .context("Gazetteer request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        error!("Gazetteer download failed: {}", status);
        anyhow::bail!("Gazetteer download from {} failed with {}", url, status);
    }

    let body = response
        .bytes()
        .await
        .context("Failed to read gazetteer response")?;

    let mut tmp = NamedTempFile::new_in(&dir).context("Failed to create temp file")?;
    tmp.write_all(&body)?;
    tmp.flush()?;
    tmp.persist(path)
        .with_context(|| format!("Failed to move gazetteer into {}", path.display()))?;

    info!(
        "Saved gazetteer to {} ({:.1} MB)",
        path.display(),
        body.len() as f64 / 1_048_576.0
    );
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_existing_file_is_not_downloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("places.geojson");
        fs::write(&path, "{}").unwrap();

        // Unreachable URL: any network attempt would fail the test
        let result = ensure_gazetteer(&path, "http://127.0.0.1:1/places.geojson")
            .await
            .unwrap();
        assert_eq!(result, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets").join("places.geojson");

        let result = ensure_gazetteer(&path, "http://127.0.0.1:1/places.geojson").await;
        assert!(result.is_err());
        assert!(!path.exists());
        let leftovers = fs::read_dir(dir.path().join("assets")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
