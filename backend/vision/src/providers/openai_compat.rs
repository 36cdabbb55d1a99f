use std::time::Instant;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use listscan_core::{VisionModel, VisionRequest, VisionResponse};

/// DashScope's OpenAI-compatible endpoint.
pub const DASHSCOPE_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Chat-completions provider for OpenAI-compatible multimodal APIs.
///
/// The inner `reqwest::Client` is reference counted, so one provider can be
/// shared by every concurrent attempt.
pub struct OpenAiCompatProvider {
    client: Client,
    api_key: String,
    base_url: String,
    name: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: DASHSCOPE_BASE_URL.to_string(),
            name: "dashscope".to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    enable_thinking: Option<bool>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: [ContentPart<'a>; 2],
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    ImageUrl { image_url: ImageUrl<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct ImageUrl<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u64>,
}

fn build_body<'a>(request: &VisionRequest<'a>) -> ChatRequest<'a> {
    ChatRequest {
        model: request.model,
        messages: [ChatMessage {
            role: "user",
            content: [
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: request.image_url,
                    },
                },
                ContentPart::Text {
                    text: request.prompt,
                },
            ],
        }],
        enable_thinking: request.enable_thinking,
    }
}

fn first_content(response: ChatResponse) -> Result<(String, u64)> {
    let tokens_used = response
        .usage
        .and_then(|u| u.total_tokens)
        .unwrap_or(0);
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("Model response contained no message content")?;
    Ok((content, tokens_used))
}

#[async_trait]
impl VisionModel for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &VisionRequest<'_>) -> Result<VisionResponse> {
        let start = Instant::now();
        let body = build_body(request);

        debug!(
            provider = %self.name,
            model = %request.model,
            thinking = ?request.enable_thinking,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Chat completion HTTP request failed")?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("{} returned {}: {}", self.name, status, error_body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;
        let (content, tokens_used) = first_content(chat_response)?;

        Ok(VisionResponse {
            content,
            provider: self.name.clone(),
            model: request.model.to_string(),
            tokens_used,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(enable_thinking: Option<bool>) -> VisionRequest<'static> {
        VisionRequest {
            model: "qwen-vl-max-latest",
            image_url: "data:image/png;base64,iVBORw0KGgo=",
            prompt: "read the list",
            enable_thinking,
        }
    }

    #[test]
    fn body_puts_image_before_text() {
        let body = serde_json::to_value(build_body(&request(Some(false)))).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "qwen-vl-max-latest",
                "messages": [{
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": "data:image/png;base64,iVBORw0KGgo=" } },
                        { "type": "text", "text": "read the list" }
                    ]
                }],
                "enable_thinking": false
            })
        );
    }

    #[test]
    fn thinking_flag_omitted_when_unset() {
        let body = serde_json::to_value(build_body(&request(None))).unwrap();
        assert!(body.get("enable_thinking").is_none());
    }

    #[test]
    fn extracts_first_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": "[[\"tea\"]]" } }],
            "usage": { "total_tokens": 321 }
        }))
        .unwrap();
        let (content, tokens) = first_content(response).unwrap();
        assert_eq!(content, "[[\"tea\"]]");
        assert_eq!(tokens, 321);
    }

    #[test]
    fn missing_content_is_an_error() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        }))
        .unwrap();
        assert!(first_content(response).is_err());

        let response: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(first_content(response).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let provider = OpenAiCompatProvider::new("k").with_base_url("http://localhost:9000/v1/");
        assert_eq!(provider.base_url(), "http://localhost:9000/v1");
    }
}
