use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline: download, transcribe, enhance, subtitle
    Run {
        /// Video URL
        #[arg(short, long)]
        url: String,

        /// Transcription backend (local or hosted)
        #[arg(long)]
        asr_backend: Option<String>,

        /// Whisper model for the local backend
        #[arg(long)]
        whisper_model: Option<String>,

        /// Subtitle mode (soft or burn)
        #[arg(long)]
        subtitle_mode: Option<String>,

        /// Target language; enables the translation stage
        #[arg(long)]
        target_lang: Option<String>,

        /// Run vocal separation before transcription
        #[arg(long)]
        separate: bool,
    },

    /// Separate an audio file into stems, or list available models
    Separate {
        /// Input audio file
        audio: Option<PathBuf>,

        /// Video ID for the output directory
        #[arg(long)]
        video_id: Option<String>,

        /// Model to use (name or filename)
        #[arg(long)]
        model: Option<String>,

        /// Pick the highest-SDR model for the stem type
        #[arg(long)]
        auto_select: bool,

        /// Stem type for auto-selection and fallback
        #[arg(long, default_value = "vocals")]
        stem: String,

        /// Output format for separated stems
        #[arg(long, default_value = "WAV")]
        format: String,

        /// Sample rate for separated stems
        #[arg(long, default_value = "16000")]
        sample_rate: u32,

        /// List available models and exit without separating
        #[arg(long)]
        list_models: bool,

        /// Filter listed models by stem type
        #[arg(long)]
        filter_stem: Option<String>,

        /// Limit number of listed models
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Extract audio from a video file
    Extract {
        /// Input video file
        #[arg(short, long)]
        input: PathBuf,

        /// Output audio file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Transcribe an audio file into the workdir
    Transcribe {
        /// Input audio file
        #[arg(short, long)]
        audio: PathBuf,

        /// Video ID for the output directory
        #[arg(long)]
        video_id: String,

        /// Transcription backend (local or hosted)
        #[arg(long)]
        backend: Option<String>,

        /// Source language hint
        #[arg(short, long)]
        language: Option<String>,
    },

    /// Enhance an ASR transcript with the LLM
    Enhance {
        /// Video ID for the output directory
        #[arg(long)]
        video_id: String,

        /// Path to ASR JSON with segments
        #[arg(long)]
        input_json: PathBuf,
    },

    /// Translate a transcript to a target language
    Translate {
        /// Video ID for the output directory
        #[arg(long)]
        video_id: String,

        /// Path to input JSON with segments
        #[arg(long)]
        input_json: PathBuf,

        /// Target language, e.g. "Spanish"
        #[arg(long)]
        target_lang: String,
    },

    /// Attach or burn subtitles into a video
    Subtitle {
        /// Video ID for the output directory
        #[arg(long)]
        video_id: String,

        /// Input video file
        #[arg(long)]
        input_video: PathBuf,

        /// Subtitle file (SRT)
        #[arg(long)]
        srt: PathBuf,

        /// Subtitle mode (soft or burn)
        #[arg(long, default_value = "soft")]
        mode: String,
    },
}
