use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use tokio::process::Command;
use tracing::info;

use crate::config::AsrConfig;
use crate::error::{Result, VidscribeError};
use crate::transcript::{Segment, Transcript};
use super::Transcriber;

/// JSON output of the whisper CLI.
#[derive(Debug, Deserialize)]
struct WhisperOutput {
    #[allow(dead_code)]
    text: String,
    segments: Vec<WhisperSegment>,
    language: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WhisperSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Local transcription via the whisper CLI writing JSON output.
pub struct LocalTranscriber {
    config: AsrConfig,
}

impl LocalTranscriber {
    pub fn new(config: AsrConfig) -> Self {
        Self { config }
    }

    fn parse_output(content: &str) -> Result<Transcript> {
        let output: WhisperOutput = serde_json::from_str(content)
            .map_err(|e| VidscribeError::Transcription(format!("Failed to parse whisper JSON: {}", e)))?;

        let segments = output
            .segments
            .into_iter()
            .map(|seg| Segment {
                start: seg.start,
                end: seg.end.max(seg.start),
                text: seg.text.trim().to_string(),
            })
            .collect();

        Ok(Transcript::new(output.language, segments))
    }
}

#[async_trait]
impl Transcriber for LocalTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        if !audio_path.exists() {
            return Err(VidscribeError::FileNotFound(
                audio_path.display().to_string(),
            ));
        }

        info!(
            "Transcribing {} with local whisper model {}",
            audio_path.display(),
            self.config.whisper_model
        );

        let temp_dir = tempfile::tempdir().map_err(|e| {
            VidscribeError::Transcription(format!("Failed to create temp directory: {}", e))
        })?;

        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg(audio_path)
            .arg("--model")
            .arg(&self.config.whisper_model)
            .arg("--output_dir")
            .arg(temp_dir.path())
            .arg("--output_format")
            .arg("json");

        if let Some(lang) = language {
            cmd.arg("--language").arg(lang);
        }

        let output = cmd.output().await.map_err(|e| {
            VidscribeError::Transcription(format!("Failed to execute whisper: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VidscribeError::Transcription(format!(
                "whisper failed: {}",
                stderr
            )));
        }

        let audio_stem = audio_path
            .file_stem()
            .ok_or_else(|| VidscribeError::Transcription("Invalid audio filename".to_string()))?;
        let json_file = temp_dir
            .path()
            .join(format!("{}.json", audio_stem.to_string_lossy()));

        let content = std::fs::read_to_string(&json_file).map_err(|e| {
            VidscribeError::Transcription(format!("Failed to read whisper output: {}", e))
        })?;

        let transcript = Self::parse_output(&content)?;
        transcript.validate()?;
        Ok(transcript)
    }

    fn backend_name(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whisper_output() {
        let json = r#"{
            "text": "hello world",
            "segments": [
                {"id": 0, "start": 0.0, "end": 1.2, "text": " hello "},
                {"id": 1, "start": 1.2, "end": 2.4, "text": " world "}
            ],
            "language": "en"
        }"#;

        let transcript = LocalTranscriber::parse_output(json).unwrap();
        assert_eq!(transcript.language.as_deref(), Some("en"));
        assert_eq!(transcript.segments.len(), 2);
        assert_eq!(transcript.segments[0].text, "hello");
        assert_eq!(transcript.segments[1].start, 1.2);
    }

    #[test]
    fn test_parse_clamps_inverted_end() {
        let json = r#"{
            "text": "x",
            "segments": [{"start": 2.0, "end": 1.0, "text": "x"}],
            "language": null
        }"#;

        let transcript = LocalTranscriber::parse_output(json).unwrap();
        assert_eq!(transcript.segments[0].end, 2.0);
    }

    #[test]
    fn test_parse_rejects_malformed_json() {
        assert!(LocalTranscriber::parse_output("not json").is_err());
    }
}
