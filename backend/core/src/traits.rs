use anyhow::Result;
use async_trait::async_trait;

/// A multimodal chat-completion backend.
///
/// Implementations must be safe to call concurrently; the orchestrator shares
/// one instance across all parallel recognition attempts of a request.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Provider name (e.g., "dashscope", "mock").
    fn name(&self) -> &str;

    /// Send one image plus one text prompt and return the generated text.
    async fn complete(&self, request: &VisionRequest<'_>) -> Result<VisionResponse>;
}

/// A single image + prompt completion request.
///
/// Borrows the image so N parallel attempts do not copy a multi-megabyte data URL.
#[derive(Debug, Clone)]
pub struct VisionRequest<'a> {
    pub model: &'a str,
    /// Data URL of the image.
    pub image_url: &'a str,
    pub prompt: &'a str,
    /// Provider reasoning switch; `None` leaves the provider default.
    pub enable_thinking: Option<bool>,
}

/// Response from a vision model.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub content: String,
    pub provider: String,
    pub model: String,
    pub tokens_used: u64,
    pub latency_ms: u64,
}
