use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, VidscribeError};
use super::catalog::ModelEntry;

/// Mapping from stem name to output file path.
pub type SeparationResult = BTreeMap<String, PathBuf>;

/// Output containers audio-separator can write.
pub const SUPPORTED_FORMATS: &[&str] = &["wav", "flac", "mp3", "m4a"];

pub fn is_supported_format(format: &str) -> bool {
    SUPPORTED_FORMATS.contains(&format.to_lowercase().as_str())
}

/// Driver for an external source-separation engine. The engine is assumed to
/// be deterministic for a fixed input, model, and parameter set.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SeparationEngine: Send + Sync {
    /// Run separation, writing one file per expected stem into `output_dir`.
    /// `output_names` maps each stem to its output basename (no extension).
    async fn separate(
        &self,
        audio_path: &Path,
        output_dir: &Path,
        entry: &ModelEntry,
        output_format: &str,
        sample_rate: u32,
        output_names: &BTreeMap<String, String>,
    ) -> Result<SeparationResult>;
}

/// Engine backed by the audio-separator CLI.
pub struct AudioSeparatorEngine {
    binary_path: String,
}

impl AudioSeparatorEngine {
    pub fn new<S: Into<String>>(binary_path: S) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }
}

#[async_trait]
impl SeparationEngine for AudioSeparatorEngine {
    async fn separate(
        &self,
        audio_path: &Path,
        output_dir: &Path,
        entry: &ModelEntry,
        output_format: &str,
        sample_rate: u32,
        output_names: &BTreeMap<String, String>,
    ) -> Result<SeparationResult> {
        if !audio_path.exists() {
            return Err(VidscribeError::FileNotFound(
                audio_path.display().to_string(),
            ));
        }
        if !is_supported_format(output_format) {
            return Err(VidscribeError::UnsupportedFormat(output_format.to_string()));
        }
        tokio::fs::create_dir_all(output_dir).await?;

        // audio-separator keys its custom output names by capitalized stem
        let custom_names: BTreeMap<String, &String> = output_names
            .iter()
            .map(|(stem, name)| (capitalize(stem), name))
            .collect();
        let custom_names_json = serde_json::to_string(&custom_names)?;

        info!(
            "Separating {} with model {} (SDR {})",
            audio_path.display(),
            entry.name,
            entry.sdr_score
        );

        let output = Command::new(&self.binary_path)
            .arg(audio_path)
            .arg("--model_filename")
            .arg(&entry.filename)
            .arg("--output_dir")
            .arg(output_dir)
            .arg("--output_format")
            .arg(output_format.to_uppercase())
            .arg("--sample_rate")
            .arg(sample_rate.to_string())
            .arg("--custom_output_names")
            .arg(&custom_names_json)
            .output()
            .await
            .map_err(|e| {
                VidscribeError::SeparationEngine(format!("Failed to execute audio-separator: {}", e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_engine_failure(&stderr));
        }

        let extension = output_format.to_lowercase();
        let mut result = SeparationResult::new();
        for stem in &entry.stems {
            let basename = match output_names.get(stem) {
                Some(name) => name.clone(),
                None => continue,
            };
            let path = output_dir.join(format!("{}.{}", basename, extension));
            if path.exists() {
                result.insert(stem.clone(), path);
            } else {
                debug!("Expected stem output missing: {}", path.display());
            }
        }

        if result.is_empty() {
            return Err(VidscribeError::SeparationEngine(format!(
                "engine produced no stem files in {}",
                output_dir.display()
            )));
        }

        Ok(result)
    }
}

/// Distinguish memory/device exhaustion from other engine failures. Resource
/// failures are fatal for the request but the pipeline may continue without
/// separated audio.
pub fn classify_engine_failure(stderr: &str) -> VidscribeError {
    let lowered = stderr.to_lowercase();
    let resource_markers = [
        "out of memory",
        "memoryerror",
        "cuda error",
        "cuda out of memory",
        "killed",
        "cannot allocate",
    ];
    if resource_markers.iter().any(|m| lowered.contains(m)) {
        VidscribeError::InsufficientResources(stderr.trim().to_string())
    } else {
        VidscribeError::SeparationEngine(format!("audio-separator failed: {}", stderr.trim()))
    }
}

fn capitalize(stem: &str) -> String {
    let mut chars = stem.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_formats_are_case_insensitive() {
        assert!(is_supported_format("WAV"));
        assert!(is_supported_format("flac"));
        assert!(!is_supported_format("wma"));
    }

    #[test]
    fn test_classify_resource_exhaustion() {
        let err = classify_engine_failure("torch.cuda.OutOfMemoryError: CUDA out of memory");
        assert!(matches!(err, VidscribeError::InsufficientResources(_)));

        let err = classify_engine_failure("Killed");
        assert!(matches!(err, VidscribeError::InsufficientResources(_)));
    }

    #[test]
    fn test_classify_generic_failure() {
        let err = classify_engine_failure("ValueError: unknown model architecture");
        assert!(matches!(err, VidscribeError::SeparationEngine(_)));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("vocals"), "Vocals");
        assert_eq!(capitalize("other"), "Other");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_unsupported_format_rejected_before_invocation() {
        let temp = tempfile::tempdir().unwrap();
        let audio = temp.path().join("audio.wav");
        std::fs::write(&audio, b"riff").unwrap();

        let engine = AudioSeparatorEngine::new("audio-separator-not-installed");
        let entry = ModelEntry {
            name: "Roformer HQ".to_string(),
            filename: "roformer_hq.ckpt".to_string(),
            stems: vec!["vocals".to_string()],
            sdr_score: 12.97,
        };
        let names = BTreeMap::from([("vocals".to_string(), "id_vocals".to_string())]);

        let err = engine
            .separate(&audio, temp.path(), &entry, "WMA", 16000, &names)
            .await
            .unwrap_err();
        assert!(matches!(err, VidscribeError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_missing_audio_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let engine = AudioSeparatorEngine::new("audio-separator");
        let entry = ModelEntry {
            name: "Roformer HQ".to_string(),
            filename: "roformer_hq.ckpt".to_string(),
            stems: vec!["vocals".to_string()],
            sdr_score: 12.97,
        };
        let names = BTreeMap::new();

        let err = engine
            .separate(
                &temp.path().join("nope.wav"),
                temp.path(),
                &entry,
                "WAV",
                16000,
                &names,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, VidscribeError::FileNotFound(_)));
    }
}
