use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{Result, VidscribeError};

// Default for the strict resolution flag added after the initial config schema
fn default_strict() -> bool {
    false
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub outputs_root: PathBuf,
    pub download: DownloadConfig,
    pub audio: AudioConfig,
    pub separation: SeparationConfig,
    pub asr: AsrConfig,
    pub llm: LlmConfig,
    pub subtitles: SubtitleConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Path to yt-dlp binary
    pub binary_path: String,
    /// Scratch directory for downloads before relocation into the workdir
    pub tmp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate for extracted audio
    pub sample_rate: u32,
    /// Downmix extracted audio to a single channel
    pub mono: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeparationConfig {
    /// Run the source-separation stage before transcription
    pub enabled: bool,
    /// Path to audio-separator binary
    pub binary_path: String,
    /// Model name or filename to use for separation
    pub model: String,
    /// Pick the highest-SDR model for `stem_type`, overriding `model`
    pub auto_select_best: bool,
    /// Stem used for auto-selection and for the fallback path
    pub stem_type: String,
    /// Output container for separated stems (WAV, FLAC, MP3, M4A)
    pub output_format: String,
    /// Sample rate for separated stems
    pub sample_rate: u32,
    /// Transcribe the separated stem instead of the full mix when available
    pub use_separated_for_transcription: bool,
    /// Fail on an unknown model identifier instead of falling back
    #[serde(default = "default_strict")]
    pub strict: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrConfig {
    /// Transcription backend: Local or Hosted
    pub backend: AsrBackend,
    /// Path to whisper binary (local backend)
    pub binary_path: String,
    /// Whisper model name (local backend)
    pub whisper_model: String,
    /// Model name for the hosted backend
    pub hosted_model: String,
    /// OpenAI-compatible endpoint for the hosted backend
    pub endpoint: String,
    /// Source language hint; empty means auto-detect
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AsrBackend {
    /// Local: whisper CLI on this machine
    Local,
    /// Hosted: OpenAI-compatible transcription API
    Hosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,
    /// Model used for enhancement and translation
    pub model: String,
    /// API key; falls back to the GROQ_API_KEY environment variable
    pub api_key: String,
    pub enhancer: EnhancerConfig,
    pub translator: TranslatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancerConfig {
    pub enabled: bool,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatorConfig {
    pub enabled: bool,
    /// Target language, e.g. "Spanish"; required when enabled
    pub target_language: String,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtitleConfig {
    /// Subtitle delivery mode: Soft or Burn
    pub mode: SubtitleMode,
    /// ISO 639-2 language tag for the soft subtitle stream
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubtitleMode {
    /// Soft: attach the subtitle track as a separate stream (no re-encode)
    Soft,
    /// Burn: render subtitles into the video frames (re-encodes)
    Burn,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            outputs_root: PathBuf::from("outputs"),
            download: DownloadConfig {
                binary_path: "yt-dlp".to_string(),
                tmp_dir: PathBuf::from("tmp_downloads"),
            },
            audio: AudioConfig {
                sample_rate: 16000,
                mono: true,
            },
            separation: SeparationConfig {
                enabled: false,
                binary_path: "audio-separator".to_string(),
                model: "BS-Roformer-Viperx-1297".to_string(),
                auto_select_best: false,
                stem_type: "vocals".to_string(),
                output_format: "WAV".to_string(),
                sample_rate: 16000,
                use_separated_for_transcription: true,
                strict: false,
            },
            asr: AsrConfig {
                backend: AsrBackend::Local,
                binary_path: "whisper".to_string(),
                whisper_model: "base".to_string(),
                hosted_model: "whisper-large-v3".to_string(),
                endpoint: "https://api.groq.com/openai/v1".to_string(),
                language: String::new(),
            },
            llm: LlmConfig {
                endpoint: "https://api.groq.com/openai/v1".to_string(),
                model: "llama-3.3-70b-versatile".to_string(),
                api_key: String::new(),
                enhancer: EnhancerConfig {
                    enabled: true,
                    temperature: 0.0,
                },
                translator: TranslatorConfig {
                    enabled: false,
                    target_language: String::new(),
                    temperature: 0.1,
                },
            },
            subtitles: SubtitleConfig {
                mode: SubtitleMode::Soft,
                language: "eng".to_string(),
            },
            media: MediaConfig {
                binary_path: "ffmpeg".to_string(),
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VidscribeError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VidscribeError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VidscribeError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VidscribeError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }
}

impl LlmConfig {
    /// API key from the config file, or GROQ_API_KEY from the environment.
    pub fn resolve_api_key(&self) -> Result<String> {
        if !self.api_key.is_empty() {
            return Ok(self.api_key.clone());
        }
        std::env::var("GROQ_API_KEY").map_err(|_| {
            VidscribeError::Config(
                "No LLM API key configured; set llm.api_key or GROQ_API_KEY".to_string(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_round_trip() {
        let config = Config::default();
        let toml_text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_text).unwrap();

        assert_eq!(parsed.outputs_root, PathBuf::from("outputs"));
        assert_eq!(parsed.separation.stem_type, "vocals");
        assert!(!parsed.separation.strict);
        assert_eq!(parsed.subtitles.mode, SubtitleMode::Soft);
    }

    #[test]
    fn test_strict_defaults_when_absent() {
        let config = Config::default();
        let mut toml_text = toml::to_string_pretty(&config).unwrap();
        toml_text = toml_text
            .lines()
            .filter(|line| !line.starts_with("strict"))
            .collect::<Vec<_>>()
            .join("\n");

        let parsed: Config = toml::from_str(&toml_text).unwrap();
        assert!(!parsed.separation.strict);
    }
}
