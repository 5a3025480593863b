use std::path::Path;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::MediaConfig;
use crate::error::{Result, VidscribeError};

/// Abstract ffmpeg command representation.
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl MediaCommand {
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    pub fn copy_audio(self) -> Self {
        self.audio_codec("copy")
    }

    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    pub fn video_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-vf").arg(filter)
    }

    pub async fn execute(&self) -> Result<()> {
        debug!("Executing: {} {:?}", self.binary_path, self.args);

        let output = Command::new(&self.binary_path)
            .args(&self.args)
            .output()
            .await
            .map_err(|e| VidscribeError::Media(format!("Failed to execute ffmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Media(format!(
                "{} failed: {}",
                self.description, stderr
            )));
        }

        Ok(())
    }
}

/// ffmpeg-based media operations: audio extraction and subtitle muxing.
pub struct MediaProcessor {
    config: MediaConfig,
}

impl MediaProcessor {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Extract PCM audio from a video file.
    pub async fn extract_audio(
        &self,
        video_path: &Path,
        audio_path: &Path,
        sample_rate: u32,
        mono: bool,
    ) -> Result<()> {
        info!(
            "Extracting audio from {} to {}",
            video_path.display(),
            audio_path.display()
        );

        let mut command = MediaCommand::new(&self.config.binary_path, "Audio extraction")
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate);
        if mono {
            command = command.audio_channels(1);
        }
        command.output(audio_path).execute().await
    }

    /// Attach subtitles as a separate stream. mp4 soft subs require mov_text.
    pub async fn embed_subtitles_soft(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
        language: &str,
    ) -> Result<()> {
        info!(
            "Embedding soft subtitles from {} into {}",
            subtitle_path.display(),
            video_path.display()
        );

        MediaCommand::new(&self.config.binary_path, "Soft subtitle embedding")
            .overwrite()
            .input(video_path)
            .input(subtitle_path)
            .arg("-c")
            .arg("copy")
            .arg("-c:s")
            .arg("mov_text")
            .arg("-metadata:s:s:0")
            .arg(format!("language={}", language))
            .output(output_path)
            .execute()
            .await
    }

    /// Render subtitles into the video frames. Re-encodes the video stream.
    pub async fn burn_subtitles(
        &self,
        video_path: &Path,
        subtitle_path: &Path,
        output_path: &Path,
    ) -> Result<()> {
        info!(
            "Burning subtitles from {} into {}",
            subtitle_path.display(),
            video_path.display()
        );

        MediaCommand::new(&self.config.binary_path, "Subtitle burn-in")
            .overwrite()
            .input(video_path)
            .video_filter(format!("subtitles={}", subtitle_path.display()))
            .copy_audio()
            .output(output_path)
            .execute()
            .await
    }

    /// Check that the ffmpeg binary is runnable.
    pub fn check_availability(&self) -> Result<()> {
        let output = std::process::Command::new(&self.config.binary_path)
            .arg("-version")
            .output()
            .map_err(|e| VidscribeError::Media(format!("ffmpeg not found: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(VidscribeError::Media(
                "ffmpeg version check failed".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_extract_audio_command_shape() {
        let command = MediaCommand::new("ffmpeg", "Audio extraction")
            .overwrite()
            .input(PathBuf::from("in.mp4"))
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(16000)
            .audio_channels(1)
            .output(PathBuf::from("out.wav"));

        assert_eq!(
            command.args,
            vec![
                "-y", "-i", "in.mp4", "-vn", "-c:a", "pcm_s16le", "-ar", "16000", "-ac", "1",
                "out.wav"
            ]
        );
    }

    #[test]
    fn test_soft_subtitle_args_use_mov_text() {
        let command = MediaCommand::new("ffmpeg", "Soft subtitle embedding")
            .overwrite()
            .input(PathBuf::from("in.mp4"))
            .input(PathBuf::from("subs.srt"))
            .arg("-c")
            .arg("copy")
            .arg("-c:s")
            .arg("mov_text")
            .arg("-metadata:s:s:0")
            .arg("language=eng")
            .output(PathBuf::from("out.mp4"));

        assert!(command.args.contains(&"mov_text".to_string()));
        assert!(command.args.contains(&"language=eng".to_string()));
    }
}
