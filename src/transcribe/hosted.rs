use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::AsrConfig;
use crate::error::{Result, VidscribeError};
use crate::transcript::{Segment, Transcript};
use super::Transcriber;

/// verbose_json response from an OpenAI-compatible transcription endpoint.
#[derive(Debug, Deserialize)]
struct VerboseTranscription {
    language: Option<String>,
    text: Option<String>,
    segments: Option<Vec<VerboseSegment>>,
}

#[derive(Debug, Deserialize)]
struct VerboseSegment {
    start: f64,
    end: f64,
    text: String,
}

/// Hosted transcription via an OpenAI-compatible /audio/transcriptions
/// endpoint (Groq).
pub struct HostedTranscriber {
    client: Client,
    config: AsrConfig,
}

impl HostedTranscriber {
    pub fn new(config: AsrConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(600))
            .build()
            .unwrap_or_default();

        Self { client, config }
    }

    fn api_key() -> Result<String> {
        std::env::var("GROQ_API_KEY").map_err(|_| {
            VidscribeError::Config("GROQ_API_KEY is required for hosted transcription".to_string())
        })
    }

    fn into_transcript(response: VerboseTranscription) -> Transcript {
        let segments = match response.segments {
            Some(segments) if !segments.is_empty() => segments
                .into_iter()
                .map(|seg| Segment {
                    start: seg.start,
                    end: seg.end.max(seg.start),
                    text: seg.text.trim().to_string(),
                })
                .collect(),
            // Some models return plain text only; keep it as one segment
            _ => vec![Segment {
                start: 0.0,
                end: 0.0,
                text: response.text.unwrap_or_default().trim().to_string(),
            }],
        };

        Transcript::new(response.language, segments)
    }
}

#[async_trait]
impl Transcriber for HostedTranscriber {
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript> {
        if !audio_path.exists() {
            return Err(VidscribeError::FileNotFound(
                audio_path.display().to_string(),
            ));
        }

        info!(
            "Transcribing {} with hosted model {}",
            audio_path.display(),
            self.config.hosted_model
        );

        let api_key = Self::api_key()?;
        let bytes = tokio::fs::read(audio_path).await?;
        let filename = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".to_string());

        let file_part = Part::bytes(bytes)
            .file_name(filename)
            .mime_str("audio/wav")
            .map_err(VidscribeError::Http)?;

        let mut form = Form::new()
            .part("file", file_part)
            .text("model", self.config.hosted_model.clone())
            .text("response_format", "verbose_json")
            .text("temperature", "0");

        if let Some(lang) = language {
            form = form.text("language", lang.to_string());
        }

        let url = format!("{}/audio/transcriptions", self.config.endpoint);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VidscribeError::Transcription(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VidscribeError::Transcription(format!(
                "transcription API error {}: {}",
                status, error_text
            )));
        }

        let verbose: VerboseTranscription = response
            .json()
            .await
            .map_err(|e| VidscribeError::Transcription(format!("Failed to parse response: {}", e)))?;

        let transcript = Self::into_transcript(verbose);
        transcript.validate()?;
        Ok(transcript)
    }

    fn backend_name(&self) -> &'static str {
        "hosted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_transcript_maps_segments() {
        let response = VerboseTranscription {
            language: Some("en".to_string()),
            text: Some("hello world".to_string()),
            segments: Some(vec![VerboseSegment {
                start: 0.5,
                end: 2.0,
                text: " hello world ".to_string(),
            }]),
        };

        let transcript = HostedTranscriber::into_transcript(response);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].text, "hello world");
        assert_eq!(transcript.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_into_transcript_falls_back_to_full_text() {
        let response = VerboseTranscription {
            language: None,
            text: Some("full text only".to_string()),
            segments: None,
        };

        let transcript = HostedTranscriber::into_transcript(response);
        assert_eq!(transcript.segments.len(), 1);
        assert_eq!(transcript.segments[0].start, 0.0);
        assert_eq!(transcript.segments[0].text, "full text only");
    }
}
