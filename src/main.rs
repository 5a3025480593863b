//! Vidscribe - Video Transcription and Subtitling Pipeline
//!
//! Entry point for the vidscribe application: downloads a video, extracts
//! and optionally separates its audio, transcribes it, enhances/translates
//! the transcript, and produces a subtitled video.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vidscribe::cli::{Args, Commands};
use vidscribe::config::{AsrBackend, Config, SubtitleMode};
use vidscribe::enhance::Enhancer;
use vidscribe::error::VidscribeError;
use vidscribe::media::MediaProcessor;
use vidscribe::pipeline::Pipeline;
use vidscribe::separate::{
    AudioSeparator, AudioSeparatorEngine, ModelCatalog, ModelEntry, SeparationRequest,
};
use vidscribe::subtitle::generate_srt;
use vidscribe::transcribe::TranscriberFactory;
use vidscribe::translate::{language_file_code, Translator};
use vidscribe::transcript::Transcript;
use vidscribe::workdir::WorkDirs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Run {
            url,
            asr_backend,
            whisper_model,
            subtitle_mode,
            target_lang,
            separate,
        } => {
            if let Some(backend) = asr_backend {
                config.asr.backend = parse_asr_backend(&backend)?;
            }
            if let Some(model) = whisper_model {
                config.asr.whisper_model = model;
            }
            if let Some(mode) = subtitle_mode {
                config.subtitles.mode = parse_subtitle_mode(&mode)?;
            }
            if let Some(lang) = target_lang {
                config.llm.translator.enabled = true;
                config.llm.translator.target_language = lang;
            }
            if separate {
                config.separation.enabled = true;
            }

            info!("Processing video: {}", url);
            let pipeline = Pipeline::new(config)?;
            let artifacts = pipeline.run(&url).await?;

            println!("Pipeline completed for {}", artifacts.video_id);
            println!("  video:      {}", artifacts.video_path.display());
            println!("  audio:      {}", artifacts.audio_path.display());
            if let Some(stems) = &artifacts.separated {
                for (stem, path) in stems {
                    println!("  {}: {}", stem, path.display());
                }
            }
            println!("  transcript: {}", artifacts.transcript_json.display());
            if let Some(path) = &artifacts.enhanced_json {
                println!("  enhanced:   {}", path.display());
            }
            if let Some(path) = &artifacts.translated_json {
                println!("  translated: {}", path.display());
            }
            println!("  subtitles:  {}", artifacts.subtitle_srt.display());
            println!("  final:      {}", artifacts.final_video.display());
        }
        Commands::Separate {
            audio,
            video_id,
            model,
            auto_select,
            stem,
            format,
            sample_rate,
            list_models,
            filter_stem,
            limit,
        } => {
            let catalog = ModelCatalog::builtin();

            if list_models {
                print_models(&catalog, filter_stem.as_deref(), limit);
                return Ok(());
            }

            let audio = audio.ok_or_else(|| {
                VidscribeError::Config(
                    "audio file is required unless --list-models is specified".to_string(),
                )
            })?;
            let video_id = video_id.ok_or_else(|| {
                VidscribeError::Config("--video-id is required".to_string())
            })?;

            let work = WorkDirs::ensure(&config.outputs_root, &video_id)?;
            info!(
                "Separating {} into {}",
                audio.display(),
                work.separated_dir.display()
            );

            let request = SeparationRequest {
                audio_path: audio,
                output_dir: work.separated_dir.clone(),
                model_identifier: model,
                auto_select,
                stem_type: stem,
                output_format: format,
                sample_rate,
            };
            let engine = AudioSeparatorEngine::new(config.separation.binary_path.clone());
            let separator =
                AudioSeparator::new(&catalog, Box::new(engine), config.separation.strict);

            let outcome = separator.separate(&request, &video_id, None).await?;

            if outcome.resolved.fell_back {
                println!(
                    "Model switched from '{}' to '{}'",
                    outcome.resolved.requested.as_deref().unwrap_or(""),
                    outcome.resolved.entry.name
                );
            }
            println!("Separation completed. Output files:");
            for (stem, path) in &outcome.stems {
                println!("  {}: {}", stem, path.display());
            }
        }
        Commands::Extract { input, output } => {
            info!("Extracting audio from: {}", input.display());
            let media = MediaProcessor::new(config.media.clone());
            media.check_availability()?;
            media
                .extract_audio(&input, &output, config.audio.sample_rate, config.audio.mono)
                .await?;
            println!("Saved: {}", output.display());
        }
        Commands::Transcribe {
            audio,
            video_id,
            backend,
            language,
        } => {
            if let Some(backend) = backend {
                config.asr.backend = parse_asr_backend(&backend)?;
            }

            let work = WorkDirs::ensure(&config.outputs_root, &video_id)?;
            let transcriber = TranscriberFactory::create(config.asr.clone());
            let transcript = transcriber.transcribe(&audio, language.as_deref()).await?;

            let name = transcriber.backend_name();
            let json_path = work.transcripts_dir.join(format!("asr_{}.json", name));
            let srt_path = work.transcripts_dir.join(format!("asr_{}.srt", name));
            transcript.write_json(&json_path).await?;
            generate_srt(&transcript, &srt_path).await?;
            println!("Saved: {}", json_path.display());
            println!("Saved: {}", srt_path.display());
        }
        Commands::Enhance { video_id, input_json } => {
            let work = WorkDirs::ensure(&config.outputs_root, &video_id)?;
            let transcript = Transcript::read_json(&input_json).await?;

            let enhancer = Enhancer::new(&config.llm)?;
            let enhanced = enhancer.enhance(&transcript).await?;

            let json_path = work.enhanced_dir.join("enhanced.json");
            let srt_path = work.enhanced_dir.join("enhanced.srt");
            enhanced.write_json(&json_path).await?;
            generate_srt(&enhanced, &srt_path).await?;
            println!("Saved: {}", json_path.display());
            println!("Saved: {}", srt_path.display());
        }
        Commands::Translate {
            video_id,
            input_json,
            target_lang,
        } => {
            let work = WorkDirs::ensure(&config.outputs_root, &video_id)?;
            let transcript = Transcript::read_json(&input_json).await?;

            let translator = Translator::new(&config.llm)?;
            let translated = translator.translate(&transcript, &target_lang).await?;

            let code = language_file_code(&target_lang);
            let json_path = work.translated_dir.join(format!("translated_{}.json", code));
            let srt_path = work.translated_dir.join(format!("translated_{}.srt", code));
            translated.write_json(&json_path).await?;
            generate_srt(&translated, &srt_path).await?;
            println!("Saved: {}", json_path.display());
            println!("Saved: {}", srt_path.display());
        }
        Commands::Subtitle {
            video_id,
            input_video,
            srt,
            mode,
        } => {
            let work = WorkDirs::ensure(&config.outputs_root, &video_id)?;
            let media = MediaProcessor::new(config.media.clone());
            media.check_availability()?;

            let output = match parse_subtitle_mode(&mode)? {
                SubtitleMode::Soft => {
                    let output = work.subtitled_dir.join("with_subtitles_soft.mp4");
                    media
                        .embed_subtitles_soft(&input_video, &srt, &output, &config.subtitles.language)
                        .await?;
                    output
                }
                SubtitleMode::Burn => {
                    let output = work.subtitled_dir.join("with_subtitles_burned.mp4");
                    media.burn_subtitles(&input_video, &srt, &output).await?;
                    output
                }
            };
            println!("Saved: {}", output.display());
        }
    }

    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let app_dir = std::env::current_dir()?.join(".vidscribe");
    let log_dir = app_dir.join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Daily rotation; the guard must outlive the program
    let file_appender = rolling::daily(&log_dir, "vidscribe.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer().with_target(false);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Print catalog entries, optionally filtered by stem and limited.
fn print_models(catalog: &ModelCatalog, filter_stem: Option<&str>, limit: Option<usize>) {
    let models: Vec<&ModelEntry> = match filter_stem {
        Some(stem) => catalog.models_for_stem(stem),
        None => catalog.list_models().iter().collect(),
    };
    let shown = limit.unwrap_or(models.len()).min(models.len());

    match filter_stem {
        Some(stem) => println!("\nAvailable Separation Models (filtered by stem: {}):", stem),
        None => println!("\nAvailable Separation Models:"),
    }
    println!("{}", "=".repeat(80));
    for (i, model) in models.iter().take(shown).enumerate() {
        println!("{:3}. {}", i + 1, model.name);
        println!("     Filename: {}", model.filename);
        println!("     Stems: {}", model.stems.join(", "));
        println!("     SDR: {}", model.sdr_score);
        println!();
    }
    if models.is_empty() {
        println!("No models found.");
    }
}

/// Parse ASR backend from string
fn parse_asr_backend(backend: &str) -> Result<AsrBackend> {
    match backend.to_lowercase().as_str() {
        "local" => Ok(AsrBackend::Local),
        "hosted" => Ok(AsrBackend::Hosted),
        _ => Err(VidscribeError::Config(format!(
            "Invalid ASR backend '{}'. Valid backends: local, hosted",
            backend
        ))
        .into()),
    }
}

/// Parse subtitle mode from string
fn parse_subtitle_mode(mode: &str) -> Result<SubtitleMode> {
    match mode.to_lowercase().as_str() {
        "soft" => Ok(SubtitleMode::Soft),
        "burn" => Ok(SubtitleMode::Burn),
        _ => Err(VidscribeError::Config(format!(
            "Invalid subtitle mode '{}'. Valid modes: soft, burn",
            mode
        ))
        .into()),
    }
}
