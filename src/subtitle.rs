use std::path::Path;
use tokio::fs;
use tracing::info;

use crate::error::{Result, VidscribeError};
use crate::transcript::Transcript;

/// Generate an SRT subtitle file from a transcript.
pub async fn generate_srt<P: AsRef<Path>>(transcript: &Transcript, output_path: P) -> Result<()> {
    let output_path = output_path.as_ref();
    info!("Generating SRT file: {}", output_path.display());

    let mut srt_content = String::new();

    for (index, segment) in transcript.segments.iter().enumerate() {
        let start_time = format_srt_time(segment.start);
        let end_time = format_srt_time(segment.end);

        srt_content.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            start_time,
            end_time,
            segment.text.trim()
        ));
    }

    fs::write(output_path, srt_content)
        .await
        .map_err(VidscribeError::Io)?;

    Ok(())
}

/// Format time in seconds to SRT time format (HH:MM:SS,mmm)
fn format_srt_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let total_milliseconds = (seconds * 1000.0).round() as u64;
    let hours = total_milliseconds / 3_600_000;
    let minutes = (total_milliseconds % 3_600_000) / 60_000;
    let secs = (total_milliseconds % 60_000) / 1_000;
    let millis = total_milliseconds % 1_000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Segment;

    #[test]
    fn test_format_srt_time() {
        assert_eq!(format_srt_time(0.0), "00:00:00,000");
        assert_eq!(format_srt_time(65.123), "00:01:05,123");
        assert_eq!(format_srt_time(3661.500), "01:01:01,500");
        assert_eq!(format_srt_time(-1.0), "00:00:00,000");
    }

    #[tokio::test]
    async fn test_generate_srt_content() {
        let transcript = Transcript::new(
            Some("en".to_string()),
            vec![
                Segment {
                    start: 0.0,
                    end: 1.2,
                    text: " Hello everybody, welcome to the show. ".to_string(),
                },
                Segment {
                    start: 1.2,
                    end: 2.6,
                    text: "I'm your host.".to_string(),
                },
            ],
        );

        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.srt");
        generate_srt(&transcript, &path).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("1\n00:00:00,000 --> 00:00:01,200\n"));
        assert!(content.contains("Hello everybody, welcome to the show."));
        assert!(content.contains("2\n00:00:01,200 --> 00:00:02,600\nI'm your host."));
    }
}
