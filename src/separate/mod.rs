// Audio source separation
//
// Three parts, mirroring the decision flow:
// - catalog: static registry of known separation models
// - resolver: identifier/auto-select resolution with fallback
// - engine: audio-separator CLI driver behind a mockable trait

pub mod catalog;
pub mod engine;
pub mod resolver;

use std::collections::BTreeMap;
use std::path::PathBuf;

pub use catalog::{ModelCatalog, ModelEntry};
pub use engine::{AudioSeparatorEngine, SeparationEngine, SeparationResult};
pub use resolver::{ModelResolver, ResolvedModel};

use crate::config::SeparationConfig;
use crate::error::Result;

/// One separation invocation. Exactly one of `model_identifier` /
/// `auto_select` determines the resolution path.
#[derive(Debug, Clone)]
pub struct SeparationRequest {
    pub audio_path: PathBuf,
    pub output_dir: PathBuf,
    pub model_identifier: Option<String>,
    pub auto_select: bool,
    pub stem_type: String,
    pub output_format: String,
    pub sample_rate: u32,
}

impl SeparationRequest {
    pub fn from_config(config: &SeparationConfig, audio_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            audio_path,
            output_dir,
            model_identifier: if config.model.is_empty() {
                None
            } else {
                Some(config.model.clone())
            },
            auto_select: config.auto_select_best,
            stem_type: config.stem_type.clone(),
            output_format: config.output_format.clone(),
            sample_rate: config.sample_rate,
        }
    }
}

/// Resolution plus the produced stems, so callers can observe which model
/// actually ran.
#[derive(Debug)]
pub struct SeparationOutcome {
    pub resolved: ResolvedModel,
    pub stems: SeparationResult,
}

/// Front of the separation stage: resolves the model, drives the engine,
/// and normalizes its output.
pub struct AudioSeparator<'a> {
    catalog: &'a ModelCatalog,
    engine: Box<dyn SeparationEngine>,
    strict: bool,
}

impl<'a> AudioSeparator<'a> {
    pub fn new(catalog: &'a ModelCatalog, engine: Box<dyn SeparationEngine>, strict: bool) -> Self {
        Self {
            catalog,
            engine,
            strict,
        }
    }

    /// Separate `request.audio_path` into per-stem files named
    /// `<base_name>_<stem>.<ext>`, unless `stem_rename_map` overrides a
    /// stem's basename.
    pub async fn separate(
        &self,
        request: &SeparationRequest,
        base_name: &str,
        stem_rename_map: Option<&BTreeMap<String, String>>,
    ) -> Result<SeparationOutcome> {
        let resolved = ModelResolver::new(self.catalog).strict(self.strict).resolve(
            request.model_identifier.as_deref(),
            request.auto_select,
            &request.stem_type,
        )?;

        let output_names = default_output_names(base_name, &resolved.entry, stem_rename_map);

        let stems = self
            .engine
            .separate(
                &request.audio_path,
                &request.output_dir,
                &resolved.entry,
                &request.output_format,
                request.sample_rate,
                &output_names,
            )
            .await?;

        // The result's stem set is always a subset of the resolved entry's
        let stems: SeparationResult = stems
            .into_iter()
            .filter(|(stem, _)| resolved.entry.supports_stem(stem))
            .collect();

        Ok(SeparationOutcome { resolved, stems })
    }
}

/// Deterministic output basenames: `<base_name>_<stem>` per stem the model
/// produces, with per-stem overrides from `stem_rename_map`.
pub fn default_output_names(
    base_name: &str,
    entry: &ModelEntry,
    stem_rename_map: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, String> {
    entry
        .stems
        .iter()
        .map(|stem| {
            let name = stem_rename_map
                .and_then(|map| map.get(stem))
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", base_name, stem));
            (stem.clone(), name)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidscribeError;
    use engine::MockSeparationEngine;
    use std::path::Path;

    fn test_catalog() -> ModelCatalog {
        ModelCatalog::new(vec![ModelEntry {
            name: "Roformer HQ".to_string(),
            filename: "roformer_hq.ckpt".to_string(),
            stems: vec!["vocals".to_string(), "instrumental".to_string()],
            sdr_score: 12.97,
        }])
    }

    fn test_request() -> SeparationRequest {
        SeparationRequest {
            audio_path: PathBuf::from("audio.wav"),
            output_dir: PathBuf::from("separated"),
            model_identifier: Some("Roformer HQ".to_string()),
            auto_select: false,
            stem_type: "vocals".to_string(),
            output_format: "WAV".to_string(),
            sample_rate: 16000,
        }
    }

    #[test]
    fn test_default_output_names() {
        let catalog = test_catalog();
        let entry = &catalog.list_models()[0];
        let names = default_output_names("vid123", entry, None);
        assert_eq!(names["vocals"], "vid123_vocals");
        assert_eq!(names["instrumental"], "vid123_instrumental");
    }

    #[test]
    fn test_rename_map_overrides_default_names() {
        let catalog = test_catalog();
        let entry = &catalog.list_models()[0];
        let rename = BTreeMap::from([("vocals".to_string(), "speech".to_string())]);
        let names = default_output_names("vid123", entry, Some(&rename));
        assert_eq!(names["vocals"], "speech");
        assert_eq!(names["instrumental"], "vid123_instrumental");
    }

    #[tokio::test]
    async fn test_result_stems_are_subset_of_model_stems() {
        let catalog = test_catalog();
        let mut engine = MockSeparationEngine::new();
        engine.expect_separate().returning(
            |_: &Path, _: &Path, _: &ModelEntry, _: &str, _: u32, _: &BTreeMap<String, String>| {
                // A misbehaving engine reporting a stem the model cannot produce
                Ok(BTreeMap::from([
                    ("vocals".to_string(), PathBuf::from("v.wav")),
                    ("noise".to_string(), PathBuf::from("n.wav")),
                ]))
            },
        );

        let separator = AudioSeparator::new(&catalog, Box::new(engine), false);
        let outcome = separator.separate(&test_request(), "vid123", None).await.unwrap();

        assert!(outcome.stems.contains_key("vocals"));
        assert!(!outcome.stems.contains_key("noise"));
        for stem in outcome.stems.keys() {
            assert!(outcome.resolved.entry.supports_stem(stem));
        }
    }

    #[tokio::test]
    async fn test_unknown_model_falls_back_then_separates() {
        let catalog = test_catalog();
        let mut engine = MockSeparationEngine::new();
        engine.expect_separate().returning(
            |_: &Path, _: &Path, entry: &ModelEntry, _: &str, _: u32, names: &BTreeMap<String, String>| {
                assert_eq!(entry.name, "Roformer HQ");
                assert_eq!(names["vocals"], "vid123_vocals");
                Ok(BTreeMap::from([(
                    "vocals".to_string(),
                    PathBuf::from("vid123_vocals.wav"),
                )]))
            },
        );

        let mut request = test_request();
        request.model_identifier = Some("NonExistentModel".to_string());

        let separator = AudioSeparator::new(&catalog, Box::new(engine), false);
        let outcome = separator.separate(&request, "vid123", None).await.unwrap();

        assert!(outcome.resolved.fell_back);
        assert_eq!(
            outcome.resolved.requested.as_deref(),
            Some("NonExistentModel")
        );
        assert_eq!(outcome.resolved.entry.name, "Roformer HQ");
    }

    #[tokio::test]
    async fn test_engine_failure_surfaces_unretried() {
        let catalog = test_catalog();
        let mut engine = MockSeparationEngine::new();
        engine.expect_separate().times(1).returning(
            |_: &Path, _: &Path, _: &ModelEntry, _: &str, _: u32, _: &BTreeMap<String, String>| {
                Err(VidscribeError::SeparationEngine("boom".to_string()))
            },
        );

        let separator = AudioSeparator::new(&catalog, Box::new(engine), false);
        let err = separator
            .separate(&test_request(), "vid123", None)
            .await
            .unwrap_err();
        assert!(matches!(err, VidscribeError::SeparationEngine(_)));
    }
}
