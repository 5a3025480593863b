// Modular transcription architecture
//
// Two backends behind one trait, selected by config:
// - Local: whisper CLI on this machine
// - Hosted: OpenAI-compatible transcription API (Groq)

pub mod hosted;
pub mod local;

use async_trait::async_trait;
use std::path::Path;

use crate::config::{AsrBackend, AsrConfig};
use crate::error::Result;
use crate::transcript::Transcript;

/// Main trait for transcription operations.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file into a timed transcript.
    async fn transcribe(&self, audio_path: &Path, language: Option<&str>) -> Result<Transcript>;

    /// Short backend name used in artifact filenames (asr_<name>.json).
    fn backend_name(&self) -> &'static str;
}

/// Factory for creating transcriber instances.
pub struct TranscriberFactory;

impl TranscriberFactory {
    pub fn create(config: AsrConfig) -> Box<dyn Transcriber> {
        match config.backend {
            AsrBackend::Local => Box::new(local::LocalTranscriber::new(config)),
            AsrBackend::Hosted => Box::new(hosted::HostedTranscriber::new(config)),
        }
    }
}
