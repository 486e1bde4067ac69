//! Vision-model recognition engine.
//!
//! Talks to any OpenAI-compatible chat completions API with image input.
//! Defaults to Qwen-VL on DashScope's compatible-mode endpoint.
//! Requires VISION_API_KEY (or DASHSCOPE_API_KEY).
//!
//! Requests are never retried here. A 429 surfaces as `RateLimited` and the
//! track records it as a failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::backend::{EngineError, RecognitionEngine};
use super::model_utils::image_data_url;
use crate::config::VisionConfig;
use crate::models::{EngineOutput, EngineTag};

/// Vision engine using an OpenAI-compatible chat completions API.
pub struct VisionApiEngine {
    config: VisionConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: Vec<ChatContent<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ChatContent<'a> {
    #[serde(rename = "text")]
    Text { text: &'a str },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<ChatChoice>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl VisionApiEngine {
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn build_request<'a>(&'a self, image: &[u8], mime: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: vec![
                    ChatContent::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url(image, mime),
                        },
                    },
                    ChatContent::Text {
                        text: &self.config.prompt,
                    },
                ],
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }
}

#[async_trait]
impl RecognitionEngine for VisionApiEngine {
    fn engine_tag(&self) -> EngineTag {
        EngineTag::Vision
    }

    fn name(&self) -> &str {
        "vision-api"
    }

    fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    fn availability_hint(&self) -> String {
        if self.config.api_key.is_none() {
            "VISION_API_KEY (or DASHSCOPE_API_KEY) not set".to_string()
        } else {
            format!(
                "Vision API is available (model: {}, endpoint: {})",
                self.config.model, self.config.endpoint
            )
        }
    }

    fn model_name(&self) -> Option<String> {
        Some(self.config.model.clone())
    }

    async fn recognize(&self, image: &[u8], mime: &str) -> Result<EngineOutput, EngineError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            EngineError::NotAvailable("VISION_API_KEY (or DASHSCOPE_API_KEY) not set".to_string())
        })?;

        let request = self.build_request(image, mime);
        debug!(
            model = %self.config.model,
            bytes = image.len(),
            mime,
            "Sending vision request"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok());
            return Err(EngineError::RateLimited {
                engine: self.name().to_string(),
                retry_after_secs,
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::Failed(format!(
                "Vision API error ({}): {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::Failed(format!("Failed to parse response: {}", e)))?;
        let text = extract_text(parsed)?;
        Ok(self.output(text))
    }
}

impl VisionApiEngine {
    fn output(&self, text: String) -> EngineOutput {
        let mut output = EngineOutput::new(text).with_model(self.config.model.clone());
        output.confidence = self.config.assumed_confidence;
        output
    }
}

fn extract_text(response: ChatResponse) -> Result<String, EngineError> {
    if let Some(error) = response.error {
        return Err(EngineError::Failed(format!(
            "Vision API error: {}",
            error.message
        )));
    }
    Ok(response
        .choices
        .and_then(|c| c.into_iter().next())
        .and_then(|c| c.message.content)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{FusionEngine, FusionStrategy};
    use crate::models::RecognitionResult;
    use std::time::Duration;

    fn config() -> VisionConfig {
        VisionConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn request_inlines_image_and_prompt() {
        let engine = VisionApiEngine::new(config());
        let request = engine.build_request(&[1, 2, 3], "image/jpeg");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], engine.config.model.as_str());
        let content = &json["messages"][0]["content"];
        assert_eq!(content[0]["type"], "image_url");
        assert_eq!(
            content[0]["image_url"]["url"],
            "data:image/jpeg;base64,AQID"
        );
        assert_eq!(content[1]["type"], "text");
    }

    #[test]
    fn response_text_and_errors_are_extracted() {
        let ok: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "Hello World"}}]}"#,
        )
        .unwrap();
        assert_eq!(extract_text(ok).unwrap(), "Hello World");

        let err: ChatResponse =
            serde_json::from_str(r#"{"error": {"message": "invalid key"}}"#).unwrap();
        assert!(extract_text(err).unwrap_err().to_string().contains("invalid key"));
    }

    #[test]
    fn availability_follows_api_key() {
        let engine = VisionApiEngine::new(config());
        assert!(engine.is_available());

        let engine = VisionApiEngine::new(VisionConfig {
            api_key: None,
            ..Default::default()
        });
        assert!(!engine.is_available());
        assert!(engine.availability_hint().contains("VISION_API_KEY"));
    }

    #[test]
    fn default_vision_output_merges_with_close_ocr_result() {
        let engine = VisionApiEngine::new(config());
        let vision = RecognitionResult::succeeded(
            EngineTag::Vision,
            engine.name(),
            engine.output("你好，世界！".to_string()),
            Duration::from_millis(800),
        );
        assert_eq!(vision.confidence, 1.0);

        let ocr = RecognitionResult::succeeded(
            EngineTag::Ocr,
            "tesseract",
            EngineOutput::new("您好世界").with_confidence(0.9),
            Duration::from_millis(300),
        );
        let span = FusionEngine::default().fuse(ocr, vision);
        assert_eq!(span.strategy, Some(FusionStrategy::Merge));
    }
}
