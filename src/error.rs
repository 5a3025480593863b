use thiserror::Error;

#[derive(Error, Debug)]
pub enum VidscribeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Enhancement error: {0}")]
    Enhance(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Media processing error: {0}")]
    Media(String),

    #[error("no separation model found for '{0}'")]
    ModelNotFound(String),

    #[error("Separation engine error: {0}")]
    SeparationEngine(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Insufficient resources: {0}")]
    InsufficientResources(String),

    #[error("stage {stage} failed: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<VidscribeError>,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

impl VidscribeError {
    /// Wrap an error with the name of the pipeline stage it occurred in.
    pub fn in_stage<S: Into<String>>(self, stage: S) -> Self {
        VidscribeError::Stage {
            stage: stage.into(),
            source: Box::new(self),
        }
    }
}

pub type Result<T> = std::result::Result<T, VidscribeError>;
