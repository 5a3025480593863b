use tracing::info;

use crate::config::LlmConfig;
use crate::enhance::validate_enhanced;
use crate::error::{Result, VidscribeError};
use crate::llm::ChatClient;
use crate::transcript::Transcript;

fn translation_system_prompt(target_lang: &str) -> String {
    format!(
        "You will receive a JSON array of subtitle segments with fields: start, end, text. \
Translate the text content to {target_lang} while preserving the exact timing boundaries. \
Keep the same number of segments and maintain natural flow for subtitles. \
Return a JSON object with a single key 'segments' mapping to the translated array. \
Do not include any prose, explanation, or markdown\u{2014}return JSON only.\n\n\
Example input:\n\
[\n\
  {{\"start\": 0.0, \"end\": 1.2, \"text\": \"Hello everybody, welcome to the show.\"}},\n\
  {{\"start\": 1.2, \"end\": 2.6, \"text\": \"I'm your host.\"}}\n\
]\n\n\
Example output (for Spanish):\n\
{{\n\
  \"segments\": [\n\
    {{\"start\": 0.0, \"end\": 1.2, \"text\": \"Hola a todos, bienvenidos al programa.\"}},\n\
    {{\"start\": 1.2, \"end\": 2.6, \"text\": \"Soy su anfitri\u{f3}n.\"}}\n\
  ]\n\
}}"
    )
}

/// LLM transcript translation: rewrites segment text into the target
/// language while preserving timing.
pub struct Translator {
    chat: ChatClient,
    temperature: f32,
}

impl Translator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(config, VidscribeError::Translation)?,
            temperature: config.translator.temperature,
        })
    }

    pub async fn translate(&self, transcript: &Transcript, target_lang: &str) -> Result<Transcript> {
        info!(
            "Translating {} segments to {}",
            transcript.segments.len(),
            target_lang
        );

        let system_prompt = translation_system_prompt(target_lang);
        let user_content = serde_json::to_string(&transcript.segments)?;
        let segments = self
            .chat
            .complete_segments(&system_prompt, &user_content, self.temperature)
            .await?;
        let translated = Transcript::new(Some(target_lang.to_string()), segments);

        translated.validate()?;
        // Same no-silent-drop contract as the enhancer
        validate_enhanced(transcript, &translated)?;
        Ok(translated)
    }
}

/// Lowercased, underscore-joined language code used in artifact filenames.
pub fn language_file_code(target_lang: &str) -> String {
    target_lang.to_lowercase().replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_file_code() {
        assert_eq!(language_file_code("Spanish"), "spanish");
        assert_eq!(language_file_code("Brazilian Portuguese"), "brazilian_portuguese");
    }

    #[test]
    fn test_prompt_names_target_language() {
        let prompt = translation_system_prompt("German");
        assert!(prompt.contains("Translate the text content to German"));
    }
}
