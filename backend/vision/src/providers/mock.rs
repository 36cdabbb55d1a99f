use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use listscan_core::{VisionModel, VisionRequest, VisionResponse};

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail(String),
    /// Never answers; used to exercise timeouts.
    Hang,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// One call seen by [`ScriptedVisionModel`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub model: String,
    pub prompt: String,
    pub image_url: String,
    pub enable_thinking: Option<bool>,
}

/// A mock vision model with per-model reply queues.
///
/// Replies are consumed in call order for each model name. When a queue runs
/// dry the last reply of that model is repeated; a model with no script
/// fails.
pub struct ScriptedVisionModel {
    name: String,
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    last: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
}

impl ScriptedVisionModel {
    pub fn new() -> Self {
        Self {
            name: "mock".to_string(),
            scripts: Mutex::new(HashMap::new()),
            last: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Queue replies for calls naming `model`.
    pub fn on_model(self, model: impl Into<String>, replies: impl IntoIterator<Item = Reply>) -> Self {
        self.lock_scripts()
            .entry(model.into())
            .or_default()
            .extend(replies);
        self
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn calls_for(&self, model: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.model == model)
            .collect()
    }

    fn lock_scripts(&self) -> std::sync::MutexGuard<'_, HashMap<String, VecDeque<Reply>>> {
        self.scripts.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn next_reply(&self, model: &str) -> Option<Reply> {
        let queued = self.lock_scripts().get_mut(model).and_then(|q| q.pop_front());
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        match queued {
            Some(reply) => {
                last.insert(model.to_string(), reply.clone());
                Some(reply)
            }
            None => last.get(model).cloned(),
        }
    }
}

impl Default for ScriptedVisionModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VisionModel for ScriptedVisionModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &VisionRequest<'_>) -> Result<VisionResponse> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                model: request.model.to_string(),
                prompt: request.prompt.to_string(),
                image_url: request.image_url.to_string(),
                enable_thinking: request.enable_thinking,
            });

        let reply = self.next_reply(request.model);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Text(content)) => Ok(VisionResponse {
                content,
                provider: self.name.clone(),
                model: request.model.to_string(),
                tokens_used: 0,
                latency_ms: 0,
            }),
            Some(Reply::Fail(message)) => anyhow::bail!(message),
            Some(Reply::Hang) => std::future::pending().await,
            None => anyhow::bail!("no scripted reply for model {}", request.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(model: &str) -> VisionRequest<'_> {
        VisionRequest {
            model,
            image_url: "data:image/png;base64,AAAA",
            prompt: "p",
            enable_thinking: None,
        }
    }

    #[tokio::test]
    async fn replies_in_order_then_repeats_last() {
        let mock = ScriptedVisionModel::new()
            .on_model("m", [Reply::text("one"), Reply::text("two")]);
        assert_eq!(mock.complete(&req("m")).await.unwrap().content, "one");
        assert_eq!(mock.complete(&req("m")).await.unwrap().content, "two");
        assert_eq!(mock.complete(&req("m")).await.unwrap().content, "two");
        assert_eq!(mock.calls_for("m").len(), 3);
    }

    #[tokio::test]
    async fn scripted_failure_and_unknown_model() {
        let mock = ScriptedVisionModel::new().on_model("m", [Reply::fail("503")]);
        assert!(mock.complete(&req("m")).await.is_err());
        assert!(mock.complete(&req("other")).await.is_err());
    }
}
