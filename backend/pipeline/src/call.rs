use std::time::Duration;

use listscan_core::{ScanError, VisionModel, VisionRequest};
use uuid::Uuid;

/// Everything one model call needs besides the client.
#[derive(Debug, Clone)]
pub struct ModelCall<'a> {
    pub request_id: Uuid,
    pub model_name: &'a str,
    pub image_url: &'a str,
    pub prompt: &'a str,
    pub enable_thinking: Option<bool>,
    pub timeout: Duration,
}

impl<'a> ModelCall<'a> {
    pub fn with_prompt(&self, prompt: &'a str) -> Self {
        Self {
            prompt,
            ..self.clone()
        }
    }
}

/// Run one completion under the call's timeout.
///
/// A failed call maps to [`ScanError::Upstream`], an expired timer to
/// [`ScanError::Timeout`].
pub(crate) async fn invoke(model: &dyn VisionModel, call: &ModelCall<'_>) -> Result<String, ScanError> {
    let request = VisionRequest {
        model: call.model_name,
        image_url: call.image_url,
        prompt: call.prompt,
        enable_thinking: call.enable_thinking,
    };

    match tokio::time::timeout(call.timeout, model.complete(&request)).await {
        Ok(Ok(response)) => Ok(response.content),
        Ok(Err(e)) => Err(ScanError::Upstream {
            model: call.model_name.to_string(),
            message: format!("{e:#}"),
        }),
        Err(_) => Err(ScanError::Timeout {
            model: call.model_name.to_string(),
            after: call.timeout,
        }),
    }
}
