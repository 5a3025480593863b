use tracing::info;

use crate::config::LlmConfig;
use crate::error::{Result, VidscribeError};
use crate::llm::ChatClient;
use crate::transcript::Transcript;

const SYSTEM_PROMPT: &str = "You will receive a JSON array of segments with fields: start, end, text. \
Improve spelling, punctuation, casing, and fix obvious ASR mistakes without changing meaning. \
Preserve timing boundaries and keep the same number of segments where possible. \
Return a JSON object with a single key 'segments' mapping to the improved array. \
Do not include any prose, explanation, or markdown\u{2014}return JSON only.\n\n\
Example input:\n\
[\n\
  {\"start\": 0.0, \"end\": 1.2, \"text\": \"hello everbody welcome 2 the show\"},\n\
  {\"start\": 1.2, \"end\": 2.6, \"text\": \"im your host\"}\n\
]\n\n\
Example output:\n\
{\n\
  \"segments\": [\n\
    {\"start\": 0.0, \"end\": 1.2, \"text\": \"Hello everybody, welcome to the show.\"},\n\
    {\"start\": 1.2, \"end\": 2.6, \"text\": \"I'm your host.\"}\n\
  ]\n\
}";

/// LLM transcript enhancement: fixes spelling/punctuation/casing while
/// preserving timing.
pub struct Enhancer {
    chat: ChatClient,
    temperature: f32,
}

impl Enhancer {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            chat: ChatClient::new(config, VidscribeError::Enhance)?,
            temperature: config.enhancer.temperature,
        })
    }

    pub async fn enhance(&self, transcript: &Transcript) -> Result<Transcript> {
        info!("Enhancing {} transcript segments", transcript.segments.len());

        let user_content = serde_json::to_string(&transcript.segments)?;
        let segments = self
            .chat
            .complete_segments(SYSTEM_PROMPT, &user_content, self.temperature)
            .await?;
        let enhanced = Transcript::new(transcript.language.clone(), segments);

        enhanced.validate()?;
        validate_enhanced(transcript, &enhanced)?;
        Ok(enhanced)
    }
}

/// The enhancer must not silently drop content: either the segment count is
/// preserved, or (for a merge/split) the covered time span must not shrink.
pub(crate) fn validate_enhanced(input: &Transcript, output: &Transcript) -> Result<()> {
    if output.segments.is_empty() && !input.segments.is_empty() {
        return Err(VidscribeError::Enhance(
            "enhanced transcript has no segments".to_string(),
        ));
    }
    if output.segments.len() == input.segments.len() {
        return Ok(());
    }

    let input_span = input.covered_span();
    let output_span = output.covered_span();
    // Allow for rounding in the returned timestamps
    if output_span + 0.5 < input_span {
        return Err(VidscribeError::Enhance(format!(
            "enhanced transcript dropped coverage: {:.2}s -> {:.2}s over {} -> {} segments",
            input_span,
            output_span,
            input.segments.len(),
            output.segments.len()
        )));
    }
    Ok(())
}
