use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{Config, SubtitleMode};
use crate::download::{relocate, Downloader};
use crate::enhance::Enhancer;
use crate::error::{Result, VidscribeError};
use crate::media::MediaProcessor;
use crate::separate::{
    AudioSeparator, AudioSeparatorEngine, ModelCatalog, SeparationRequest, SeparationResult,
};
use crate::subtitle::generate_srt;
use crate::transcribe::TranscriberFactory;
use crate::translate::{language_file_code, Translator};
use crate::workdir::WorkDirs;

/// Pipeline stages, in execution order. Failures report the stage they
/// occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    ExtractAudio,
    Separate,
    Transcribe,
    Enhance,
    Translate,
    Subtitle,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Download => "download",
            Stage::ExtractAudio => "extract-audio",
            Stage::Separate => "separate",
            Stage::Transcribe => "transcribe",
            Stage::Enhance => "enhance",
            Stage::Translate => "translate",
            Stage::Subtitle => "subtitle",
        };
        write!(f, "{}", name)
    }
}

/// Paths of everything a run produced. Artifacts from completed stages stay
/// on disk even when a later stage fails.
#[derive(Debug)]
pub struct PipelineArtifacts {
    pub video_id: String,
    pub video_path: PathBuf,
    pub audio_path: PathBuf,
    pub separated: Option<SeparationResult>,
    pub transcript_json: PathBuf,
    pub enhanced_json: Option<PathBuf>,
    pub translated_json: Option<PathBuf>,
    pub subtitle_srt: PathBuf,
    pub final_video: PathBuf,
}

/// Sequences the stage adapters, passing artifacts between them. One run is
/// single-threaded and sequential; each stage blocks on its external tool.
pub struct Pipeline {
    config: Config,
    catalog: ModelCatalog,
    media: MediaProcessor,
}

impl Pipeline {
    pub fn new(config: Config) -> Result<Self> {
        let media = MediaProcessor::new(config.media.clone());
        media.check_availability()?;

        Ok(Self {
            catalog: ModelCatalog::builtin(),
            config,
            media,
        })
    }

    pub async fn run(&self, url: &str) -> Result<PipelineArtifacts> {
        // 1) Download
        let downloader = Downloader::new(self.config.download.clone());
        let download = downloader
            .download(url)
            .await
            .map_err(|e| e.in_stage(Stage::Download.to_string()))?;
        let video_id = download.video_id.clone();

        let work = WorkDirs::ensure(&self.config.outputs_root, &video_id)?;

        // Relocate the video into the per-video directory
        let video_filename = download
            .video_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp4", video_id));
        let video_path = work.video_dir.join(video_filename);
        relocate(&download.video_path, &video_path)
            .await
            .map_err(|e| e.in_stage(Stage::Download.to_string()))?;

        let metadata = json!({
            "video_id": video_id,
            "title": download.title,
            "downloaded_at": chrono::Utc::now().to_rfc3339(),
        });
        tokio::fs::write(
            work.root.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )
        .await?;

        // 2) Extract audio
        let audio_path = work.audio_dir.join("audio.wav");
        self.media
            .extract_audio(
                &video_path,
                &audio_path,
                self.config.audio.sample_rate,
                self.config.audio.mono,
            )
            .await
            .map_err(|e| e.in_stage(Stage::ExtractAudio.to_string()))?;

        // 3) Optional source separation
        let separated = if self.config.separation.enabled {
            self.separate_audio(&work, &video_id, &audio_path).await?
        } else {
            None
        };

        // 4) Transcribe (separated stem when configured and available)
        let transcription_input = separated
            .as_ref()
            .filter(|_| self.config.separation.use_separated_for_transcription)
            .and_then(|stems| stems.get(&self.config.separation.stem_type))
            .cloned()
            .unwrap_or_else(|| audio_path.clone());

        let transcriber = TranscriberFactory::create(self.config.asr.clone());
        let language = if self.config.asr.language.is_empty() {
            None
        } else {
            Some(self.config.asr.language.as_str())
        };
        let transcript = transcriber
            .transcribe(&transcription_input, language)
            .await
            .map_err(|e| e.in_stage(Stage::Transcribe.to_string()))?;

        let backend = transcriber.backend_name();
        let transcript_json = work.transcripts_dir.join(format!("asr_{}.json", backend));
        transcript.write_json(&transcript_json).await?;
        generate_srt(
            &transcript,
            work.transcripts_dir.join(format!("asr_{}.srt", backend)),
        )
        .await?;

        // 5) Optional enhancement
        let (subtitle_source, enhanced_json) = if self.config.llm.enhancer.enabled {
            let enhancer =
                Enhancer::new(&self.config.llm).map_err(|e| e.in_stage(Stage::Enhance.to_string()))?;
            let enhanced = enhancer
                .enhance(&transcript)
                .await
                .map_err(|e| e.in_stage(Stage::Enhance.to_string()))?;

            let json_path = work.enhanced_dir.join("enhanced.json");
            enhanced.write_json(&json_path).await?;
            generate_srt(&enhanced, work.enhanced_dir.join("enhanced.srt")).await?;
            (enhanced, Some(json_path))
        } else {
            (transcript, None)
        };

        // 6) Optional translation
        let translation_enabled = self.config.llm.translator.enabled
            && !self.config.llm.translator.target_language.is_empty();
        let (final_transcript, translated_json, srt_path) = if translation_enabled {
            let target = self.config.llm.translator.target_language.clone();
            let translator = Translator::new(&self.config.llm)
                .map_err(|e| e.in_stage(Stage::Translate.to_string()))?;
            let translated = translator
                .translate(&subtitle_source, &target)
                .await
                .map_err(|e| e.in_stage(Stage::Translate.to_string()))?;

            let code = language_file_code(&target);
            let json_path = work.translated_dir.join(format!("translated_{}.json", code));
            let srt_path = work.translated_dir.join(format!("translated_{}.srt", code));
            translated.write_json(&json_path).await?;
            (translated, Some(json_path), srt_path)
        } else if enhanced_json.is_some() {
            (subtitle_source, None, work.enhanced_dir.join("enhanced.srt"))
        } else {
            let srt_path = work.transcripts_dir.join(format!("asr_{}.srt", backend));
            (subtitle_source, None, srt_path)
        };

        if translation_enabled {
            generate_srt(&final_transcript, &srt_path)
                .await
                .map_err(|e| e.in_stage(Stage::Translate.to_string()))?;
        }

        // 7) Subtitles
        let final_video = match self.config.subtitles.mode {
            SubtitleMode::Soft => {
                let output = work.subtitled_dir.join("with_subtitles_soft.mp4");
                self.media
                    .embed_subtitles_soft(
                        &video_path,
                        &srt_path,
                        &output,
                        &self.config.subtitles.language,
                    )
                    .await
                    .map_err(|e| e.in_stage(Stage::Subtitle.to_string()))?;
                output
            }
            SubtitleMode::Burn => {
                let output = work.subtitled_dir.join("with_subtitles_burned.mp4");
                self.media
                    .burn_subtitles(&video_path, &srt_path, &output)
                    .await
                    .map_err(|e| e.in_stage(Stage::Subtitle.to_string()))?;
                output
            }
        };

        info!("Pipeline completed for {}", video_id);

        Ok(PipelineArtifacts {
            video_id,
            video_path,
            audio_path,
            separated,
            transcript_json,
            enhanced_json,
            translated_json,
            subtitle_srt: srt_path,
            final_video,
        })
    }

    /// Run the separation stage. Resource exhaustion is fatal for the
    /// separation request but not for the run: the pipeline falls back to
    /// the original audio.
    async fn separate_audio(
        &self,
        work: &WorkDirs,
        video_id: &str,
        audio_path: &std::path::Path,
    ) -> Result<Option<SeparationResult>> {
        let request = SeparationRequest::from_config(
            &self.config.separation,
            audio_path.to_path_buf(),
            work.separated_dir.clone(),
        );
        let engine = AudioSeparatorEngine::new(self.config.separation.binary_path.clone());
        let separator = AudioSeparator::new(&self.catalog, Box::new(engine), self.config.separation.strict);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Separating audio...");
        spinner.enable_steady_tick(Duration::from_millis(120));

        let outcome = separator.separate(&request, video_id, None).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(outcome) => {
                if outcome.resolved.fell_back {
                    info!(
                        "Separation used {} after switching from requested '{}'",
                        outcome.resolved.entry.name,
                        outcome.resolved.requested.as_deref().unwrap_or("")
                    );
                }
                Ok(Some(outcome.stems))
            }
            Err(VidscribeError::InsufficientResources(msg)) => {
                warn!(
                    "Separation ran out of resources ({}); continuing with original audio",
                    msg
                );
                Ok(None)
            }
            Err(e) => Err(e.in_stage(Stage::Separate.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_display_names() {
        assert_eq!(Stage::Download.to_string(), "download");
        assert_eq!(Stage::ExtractAudio.to_string(), "extract-audio");
        assert_eq!(Stage::Separate.to_string(), "separate");
    }

    #[test]
    fn test_stage_error_reports_stage_and_cause() {
        let err = VidscribeError::Media("ffmpeg exploded".to_string())
            .in_stage(Stage::ExtractAudio.to_string());
        let message = err.to_string();
        assert!(message.contains("extract-audio"));
        assert!(message.contains("ffmpeg exploded"));
    }
}
