//! Vidscribe - Video Transcription and Subtitling Pipeline
//!
//! A pipeline that downloads a video, extracts its audio, optionally separates
//! vocals from background music, transcribes the speech, enhances and
//! optionally translates the transcript with an LLM, and produces a subtitled
//! video using yt-dlp, whisper, audio-separator, and ffmpeg.

pub mod cli;
pub mod config;
pub mod download;
pub mod enhance;
pub mod error;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod separate;
pub mod subtitle;
pub mod transcribe;
pub mod translate;
pub mod transcript;
pub mod workdir;
