use std::cmp::Ordering;

/// One separation model known to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub name: String,
    pub filename: String,
    pub stems: Vec<String>,
    /// Signal-to-distortion ratio; higher is better.
    pub sdr_score: f64,
}

impl ModelEntry {
    pub fn supports_stem(&self, stem: &str) -> bool {
        self.stems.iter().any(|s| s == stem)
    }
}

/// Read-only registry of separation models, constructed once at startup and
/// passed by reference to the resolver and separator.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    entries: Vec<ModelEntry>,
}

impl ModelCatalog {
    pub fn new(entries: Vec<ModelEntry>) -> Self {
        Self { entries }
    }

    /// The models shipped with audio-separator that this pipeline knows how
    /// to drive, with their published SDR scores.
    pub fn builtin() -> Self {
        fn entry(name: &str, filename: &str, stems: &[&str], sdr_score: f64) -> ModelEntry {
            ModelEntry {
                name: name.to_string(),
                filename: filename.to_string(),
                stems: stems.iter().map(|s| s.to_string()).collect(),
                sdr_score,
            }
        }

        Self::new(vec![
            entry(
                "BS-Roformer-Viperx-1297",
                "model_bs_roformer_ep_317_sdr_12.9755.ckpt",
                &["vocals", "instrumental"],
                12.97,
            ),
            entry(
                "BS-Roformer-Viperx-1296",
                "model_bs_roformer_ep_368_sdr_12.9628.ckpt",
                &["vocals", "instrumental"],
                12.96,
            ),
            entry(
                "MelBand Roformer Kim FT",
                "mel_band_roformer_kim_ft_unwa.ckpt",
                &["vocals", "instrumental"],
                11.96,
            ),
            entry(
                "Kim Vocal 2",
                "Kim_Vocal_2.onnx",
                &["vocals", "instrumental"],
                10.86,
            ),
            entry(
                "MDX23C-InstVoc HQ",
                "MDX23C-8KFFT-InstVoc_HQ.ckpt",
                &["vocals", "instrumental"],
                10.17,
            ),
            entry(
                "UVR-MDX-NET Inst HQ 3",
                "UVR-MDX-NET-Inst_HQ_3.onnx",
                &["instrumental", "vocals"],
                9.60,
            ),
            entry(
                "htdemucs_ft",
                "htdemucs_ft.yaml",
                &["vocals", "drums", "bass", "other"],
                9.37,
            ),
            entry(
                "htdemucs",
                "htdemucs.yaml",
                &["vocals", "drums", "bass", "other"],
                8.75,
            ),
            entry(
                "htdemucs_6s",
                "htdemucs_6s.yaml",
                &["vocals", "drums", "bass", "guitar", "piano", "other"],
                8.30,
            ),
        ])
    }

    /// All entries in registration order.
    pub fn list_models(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Exact match on name first, then filename. No fuzzy matching.
    pub fn find_by_identifier(&self, id: &str) -> Option<&ModelEntry> {
        self.entries
            .iter()
            .find(|m| m.name == id)
            .or_else(|| self.entries.iter().find(|m| m.filename == id))
    }

    /// Entries supporting `stem`, by descending SDR; ties keep registration
    /// order (stable sort).
    pub fn models_for_stem(&self, stem: &str) -> Vec<&ModelEntry> {
        let mut models: Vec<&ModelEntry> = self
            .entries
            .iter()
            .filter(|m| m.supports_stem(stem))
            .collect();
        models.sort_by(|a, b| {
            b.sdr_score
                .partial_cmp(&a.sdr_score)
                .unwrap_or(Ordering::Equal)
        });
        models
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_catalog() -> ModelCatalog {
        ModelCatalog::new(vec![
            ModelEntry {
                name: "Alpha".to_string(),
                filename: "alpha.ckpt".to_string(),
                stems: vec!["vocals".to_string(), "instrumental".to_string()],
                sdr_score: 9.6,
            },
            ModelEntry {
                name: "Beta".to_string(),
                filename: "beta.onnx".to_string(),
                stems: vec!["vocals".to_string()],
                sdr_score: 12.97,
            },
            ModelEntry {
                name: "Gamma".to_string(),
                filename: "gamma.yaml".to_string(),
                stems: vec!["drums".to_string(), "bass".to_string()],
                sdr_score: 9.6,
            },
            ModelEntry {
                name: "Delta".to_string(),
                filename: "delta.ckpt".to_string(),
                stems: vec!["drums".to_string()],
                sdr_score: 9.6,
            },
        ])
    }

    #[test]
    fn test_list_models_keeps_registration_order() {
        let catalog = test_catalog();
        let names: Vec<&str> = catalog.list_models().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Beta", "Gamma", "Delta"]);
    }

    #[test]
    fn test_find_by_name_and_filename_resolve_same_entry() {
        let catalog = test_catalog();
        let by_name = catalog.find_by_identifier("Beta").unwrap();
        let by_filename = catalog.find_by_identifier("beta.onnx").unwrap();
        assert_eq!(by_name, by_filename);
    }

    #[test]
    fn test_find_by_identifier_is_exact() {
        let catalog = test_catalog();
        assert!(catalog.find_by_identifier("beta").is_none());
        assert!(catalog.find_by_identifier("Bet").is_none());
    }

    #[test]
    fn test_models_for_stem_sorted_descending() {
        let catalog = test_catalog();
        let vocals = catalog.models_for_stem("vocals");
        let scores: Vec<f64> = vocals.iter().map(|m| m.sdr_score).collect();
        assert_eq!(scores, vec![12.97, 9.6]);
    }

    #[test]
    fn test_models_for_stem_ties_keep_registration_order() {
        let catalog = test_catalog();
        let drums = catalog.models_for_stem("drums");
        let names: Vec<&str> = drums.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Gamma", "Delta"]);
    }

    #[test]
    fn test_models_for_unknown_stem_is_empty() {
        let catalog = test_catalog();
        assert!(catalog.models_for_stem("piano").is_empty());
    }

    #[test]
    fn test_builtin_catalog_has_vocal_models() {
        let catalog = ModelCatalog::builtin();
        let vocals = catalog.models_for_stem("vocals");
        assert!(!vocals.is_empty());
        // The shipped best vocals model is the BS-Roformer 12.97 checkpoint
        assert_eq!(vocals[0].name, "BS-Roformer-Viperx-1297");
    }
}
