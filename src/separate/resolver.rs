use tracing::{info, warn};

use crate::error::{Result, VidscribeError};
use super::catalog::{ModelCatalog, ModelEntry};

/// Resolution outcome. Callers can tell "used the requested model" apart
/// from "fell back to the best model for the stem" without parsing logs.
#[derive(Debug, Clone)]
pub struct ResolvedModel {
    /// Identifier the caller asked for, if any.
    pub requested: Option<String>,
    pub entry: ModelEntry,
    pub fell_back: bool,
}

/// Turns a model identifier or auto-select request into one catalog entry.
pub struct ModelResolver<'a> {
    catalog: &'a ModelCatalog,
    /// When set, an unknown identifier fails instead of falling back.
    strict: bool,
}

impl<'a> ModelResolver<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self {
            catalog,
            strict: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn resolve(
        &self,
        identifier: Option<&str>,
        auto_select: bool,
        stem_type: &str,
    ) -> Result<ResolvedModel> {
        if auto_select {
            let entry = self.best_for_stem(stem_type)?;
            info!(
                "Auto-selected model {} (SDR {}) for stem '{}'",
                entry.name, entry.sdr_score, stem_type
            );
            return Ok(ResolvedModel {
                requested: None,
                entry,
                fell_back: false,
            });
        }

        let identifier = identifier.ok_or_else(|| {
            VidscribeError::Config(
                "separation requires either a model identifier or auto_select".to_string(),
            )
        })?;

        if let Some(entry) = self.catalog.find_by_identifier(identifier) {
            info!("Using model {} (SDR {})", entry.name, entry.sdr_score);
            return Ok(ResolvedModel {
                requested: Some(identifier.to_string()),
                entry: entry.clone(),
                fell_back: false,
            });
        }

        if self.strict {
            return Err(VidscribeError::ModelNotFound(identifier.to_string()));
        }

        // Model switch notice: the requested identifier is unknown, so take
        // the best available model for the stem instead.
        let entry = self.best_for_stem(stem_type)?;
        warn!(
            "Model '{}' not found; switched to {} (SDR {}) for stem '{}'",
            identifier, entry.name, entry.sdr_score, stem_type
        );

        Ok(ResolvedModel {
            requested: Some(identifier.to_string()),
            entry,
            fell_back: true,
        })
    }

    fn best_for_stem(&self, stem_type: &str) -> Result<ModelEntry> {
        self.catalog
            .models_for_stem(stem_type)
            .first()
            .map(|entry| (*entry).clone())
            .ok_or_else(|| VidscribeError::ModelNotFound(stem_type.to_string()))
    }
}
