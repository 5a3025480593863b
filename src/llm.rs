use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LlmConfig;
use crate::error::{Result, VidscribeError};
use crate::transcript::Segment;

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Expected shape of segment-rewriting responses.
#[derive(Debug, Deserialize)]
struct SegmentsEnvelope {
    segments: Vec<Segment>,
}

/// Client for an OpenAI-compatible chat completions endpoint, shared by the
/// enhancement and translation stages. `make_error` tags failures with the
/// owning stage's error variant.
pub struct ChatClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    make_error: fn(String) -> VidscribeError,
}

impl ChatClient {
    pub fn new(config: &LlmConfig, make_error: fn(String) -> VidscribeError) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(VidscribeError::Http)?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.resolve_api_key()?,
            make_error,
        })
    }

    /// Ask for rewritten segments as JSON and parse the response. If the
    /// endpoint rejects JSON mode, retry once without response_format.
    pub async fn complete_segments(
        &self,
        system_prompt: &str,
        user_content: &str,
        temperature: f32,
    ) -> Result<Vec<Segment>> {
        let content = match self
            .complete(system_prompt, user_content, temperature, true)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                warn!("JSON mode failed, retrying without response_format: {}", e);
                self.complete(system_prompt, user_content, temperature, false)
                    .await?
            }
        };

        self.parse_segments(&content)
    }

    async fn complete(
        &self,
        system_prompt: &str,
        user_content: &str,
        temperature: f32,
        json_mode: bool,
    ) -> Result<String> {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_content},
            ],
            "temperature": temperature,
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Sending chat completion request to: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| (self.make_error)(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err((self.make_error)(format!(
                "LLM API error {}: {}",
                status, error_text
            )));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| (self.make_error)(format!("Failed to parse completion: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| (self.make_error)("LLM completion returned no choices".to_string()))?;

        Ok(choice.message.content)
    }

    /// Accept either {"segments": [...]} or a bare segment array.
    fn parse_segments(&self, content: &str) -> Result<Vec<Segment>> {
        if let Ok(envelope) = serde_json::from_str::<SegmentsEnvelope>(content) {
            return Ok(envelope.segments);
        }
        if let Ok(segments) = serde_json::from_str::<Vec<Segment>>(content) {
            return Ok(segments);
        }
        Err((self.make_error)(format!(
            "Unexpected LLM response format: {}",
            content.chars().take(200).collect::<String>()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;

    fn test_client() -> ChatClient {
        let config = LlmConfig {
            endpoint: "http://localhost:1".to_string(),
            model: "test".to_string(),
            api_key: "test-key".to_string(),
            enhancer: crate::config::EnhancerConfig {
                enabled: true,
                temperature: 0.0,
            },
            translator: crate::config::TranslatorConfig {
                enabled: false,
                target_language: String::new(),
                temperature: 0.1,
            },
        };
        ChatClient::new(&config, VidscribeError::Enhance).unwrap()
    }

    #[test]
    fn test_parse_segments_object_form() {
        let content = r#"{"segments": [{"start": 0.0, "end": 1.2, "text": "Hello."}]}"#;
        let segments = test_client().parse_segments(content).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Hello.");
    }

    #[test]
    fn test_parse_segments_bare_array_form() {
        let content = r#"[{"start": 0.0, "end": 1.2, "text": "Hello."}]"#;
        let segments = test_client().parse_segments(content).unwrap();
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_parse_segments_rejects_prose() {
        let err = test_client()
            .parse_segments("Sure! Here are the segments:")
            .unwrap_err();
        assert!(matches!(err, VidscribeError::Enhance(_)));
    }
}
