use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Per-video directory tree under the outputs root. Created on first
/// reference to a video id; never deleted by the pipeline.
#[derive(Debug, Clone)]
pub struct WorkDirs {
    pub root: PathBuf,
    pub video_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub separated_dir: PathBuf,
    pub transcripts_dir: PathBuf,
    pub enhanced_dir: PathBuf,
    pub translated_dir: PathBuf,
    pub subtitled_dir: PathBuf,
}

impl WorkDirs {
    pub fn ensure<P: AsRef<Path>>(outputs_root: P, video_id: &str) -> Result<Self> {
        let root = outputs_root.as_ref().join(video_id);
        let dirs = Self {
            video_dir: root.join("video"),
            audio_dir: root.join("audio"),
            separated_dir: root.join("separated"),
            transcripts_dir: root.join("transcripts"),
            enhanced_dir: root.join("enhanced"),
            translated_dir: root.join("translated"),
            subtitled_dir: root.join("subtitled"),
            root,
        };

        for dir in [
            &dirs.root,
            &dirs.video_dir,
            &dirs.audio_dir,
            &dirs.separated_dir,
            &dirs.transcripts_dir,
            &dirs.enhanced_dir,
            &dirs.translated_dir,
            &dirs.subtitled_dir,
        ] {
            fs::create_dir_all(dir)?;
        }

        Ok(dirs)
    }
}
