use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::DownloadConfig;
use crate::error::{Result, VidscribeError};

/// Outcome of a successful download.
#[derive(Debug, Clone)]
pub struct DownloadInfo {
    pub video_id: String,
    pub title: Option<String>,
    pub video_path: PathBuf,
}

/// Metadata subset parsed from yt-dlp's JSON dump.
#[derive(Debug, Deserialize)]
struct VideoMetadata {
    id: String,
    title: Option<String>,
}

/// yt-dlp stage adapter. Downloads best video+audio merged to mp4 into a
/// scratch directory; the orchestrator relocates the file into the workdir.
pub struct Downloader {
    config: DownloadConfig,
}

impl Downloader {
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    pub async fn download(&self, url: &str) -> Result<DownloadInfo> {
        tokio::fs::create_dir_all(&self.config.tmp_dir).await?;

        let metadata = self.probe(url).await?;
        info!(
            "Downloading video {} ({})",
            metadata.id,
            metadata.title.as_deref().unwrap_or("untitled")
        );

        let output_template = self
            .config
            .tmp_dir
            .join("%(id)s.%(ext)s")
            .to_string_lossy()
            .to_string();

        let output = Command::new(&self.config.binary_path)
            .arg("-f")
            .arg("bestvideo+bestaudio/best")
            .arg("--merge-output-format")
            .arg("mp4")
            .arg("--no-playlist")
            .arg("-o")
            .arg(&output_template)
            .arg(url)
            .output()
            .await
            .map_err(|e| VidscribeError::Download(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Download(format!(
                "yt-dlp failed: {}",
                stderr
            )));
        }

        let video_path = self.locate_download(&metadata.id)?;
        debug!("Downloaded to {}", video_path.display());

        Ok(DownloadInfo {
            video_id: metadata.id,
            title: metadata.title,
            video_path,
        })
    }

    /// Fetch video id and title without downloading.
    async fn probe(&self, url: &str) -> Result<VideoMetadata> {
        let output = Command::new(&self.config.binary_path)
            .arg("--dump-single-json")
            .arg("--no-playlist")
            .arg(url)
            .output()
            .await
            .map_err(|e| VidscribeError::Download(format!("Failed to execute yt-dlp: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Download(format!(
                "yt-dlp metadata probe failed: {}",
                stderr
            )));
        }

        let metadata: VideoMetadata = serde_json::from_slice(&output.stdout)
            .map_err(|e| VidscribeError::Download(format!("Failed to parse metadata: {}", e)))?;

        Ok(metadata)
    }

    /// The merge step guarantees an mp4 extension; single-format downloads
    /// can land under the original extension, so fall back to a scan.
    fn locate_download(&self, video_id: &str) -> Result<PathBuf> {
        let expected = self.config.tmp_dir.join(format!("{}.mp4", video_id));
        if expected.exists() {
            return Ok(expected);
        }

        for entry in std::fs::read_dir(&self.config.tmp_dir)? {
            let path = entry?.path();
            if path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem == video_id)
            {
                return Ok(path);
            }
        }

        Err(VidscribeError::Download(format!(
            "downloaded file for {} not found in {}",
            video_id,
            self.config.tmp_dir.display()
        )))
    }
}

/// Move a file, falling back to copy+remove across filesystems.
pub async fn relocate(source: &Path, destination: &Path) -> Result<()> {
    if tokio::fs::rename(source, destination).await.is_ok() {
        return Ok(());
    }
    tokio::fs::copy(source, destination).await?;
    tokio::fs::remove_file(source).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_download_prefers_mp4() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("abc123.mp4"), b"x").unwrap();
        std::fs::write(temp.path().join("abc123.webm"), b"x").unwrap();

        let downloader = Downloader::new(DownloadConfig {
            binary_path: "yt-dlp".to_string(),
            tmp_dir: temp.path().to_path_buf(),
        });

        let path = downloader.locate_download("abc123").unwrap();
        assert_eq!(path, temp.path().join("abc123.mp4"));
    }

    #[test]
    fn test_locate_download_falls_back_to_other_extension() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::write(temp.path().join("abc123.webm"), b"x").unwrap();

        let downloader = Downloader::new(DownloadConfig {
            binary_path: "yt-dlp".to_string(),
            tmp_dir: temp.path().to_path_buf(),
        });

        let path = downloader.locate_download("abc123").unwrap();
        assert_eq!(path, temp.path().join("abc123.webm"));
    }

    #[tokio::test]
    async fn test_relocate_moves_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("a.mp4");
        let destination = temp.path().join("video").join("a.mp4");
        std::fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std::fs::write(&source, b"data").unwrap();

        relocate(&source, &destination).await.unwrap();
        assert!(!source.exists());
        assert_eq!(std::fs::read(&destination).unwrap(), b"data");
    }
}
