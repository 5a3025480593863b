use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

use crate::error::{Result, VidscribeError};

/// One timed piece of speech.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// An ordered transcript. Each stage (transcriber, enhancer, translator)
/// produces a new transcript; segments are never mutated in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn new(language: Option<String>, segments: Vec<Segment>) -> Self {
        Self { language, segments }
    }

    /// Check ordering invariants: start times non-decreasing, end >= start.
    pub fn validate(&self) -> Result<()> {
        let mut previous_start = f64::NEG_INFINITY;
        for (idx, segment) in self.segments.iter().enumerate() {
            if segment.end < segment.start {
                return Err(VidscribeError::Transcription(format!(
                    "segment {} ends before it starts ({} < {})",
                    idx, segment.end, segment.start
                )));
            }
            if segment.start < previous_start {
                return Err(VidscribeError::Transcription(format!(
                    "segment {} start {} precedes previous start {}",
                    idx, segment.start, previous_start
                )));
            }
            previous_start = segment.start;
        }
        Ok(())
    }

    /// Total time covered by all segments, in seconds.
    pub fn covered_span(&self) -> f64 {
        self.segments.iter().map(|s| s.end - s.start).sum()
    }

    pub async fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content).await?;
        Ok(())
    }

    pub async fn read_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).await?;
        let transcript: Transcript = serde_json::from_str(&content)?;
        Ok(transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start,
            end,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_ordered_segments() {
        let transcript = Transcript::new(
            Some("en".to_string()),
            vec![segment(0.0, 1.2, "hello"), segment(1.2, 2.6, "world")],
        );
        assert!(transcript.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_backwards_start() {
        let transcript = Transcript::new(
            None,
            vec![segment(2.0, 3.0, "later"), segment(1.0, 2.0, "earlier")],
        );
        assert!(transcript.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_end_before_start() {
        let transcript = Transcript::new(None, vec![segment(1.0, 0.5, "inverted")]);
        assert!(transcript.validate().is_err());
    }

    #[test]
    fn test_covered_span() {
        let transcript = Transcript::new(
            None,
            vec![segment(0.0, 1.5, "a"), segment(2.0, 3.0, "b")],
        );
        assert!((transcript.covered_span() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_json_round_trip() {
        let transcript = Transcript::new(
            Some("en".to_string()),
            vec![segment(0.0, 1.2, "hello everybody")],
        );
        let json = serde_json::to_string(&transcript).unwrap();
        let parsed: Transcript = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.segments, transcript.segments);
        assert_eq!(parsed.language, transcript.language);
    }
}
