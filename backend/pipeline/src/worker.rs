//! One recognition attempt.

use listscan_core::{ScanError, VisionModel};
use listscan_logging::{preview, ScanEvent, ScanEventLogger};
use tracing::{debug, warn};

use crate::call::{invoke, ModelCall};

/// Ask the recognition model to read the image once and return its raw reply.
///
/// The reply is not parsed here; an unparseable reply is still a completed
/// attempt.
pub async fn recognize(
    model: &dyn VisionModel,
    call: &ModelCall<'_>,
    attempt: usize,
) -> Result<String, ScanError> {
    debug!(attempt, model = %call.model_name, "Starting recognition attempt");

    match invoke(model, call).await {
        Ok(raw) => {
            ScanEventLogger::log_event(
                call.request_id,
                ScanEvent::AttemptCompleted {
                    attempt,
                    model: call.model_name.to_string(),
                    preview: preview(&raw),
                },
            );
            Ok(raw)
        }
        Err(e) => {
            warn!(attempt, model = %call.model_name, error = %e, "Recognition attempt failed");
            ScanEventLogger::log_event(
                call.request_id,
                ScanEvent::AttemptFailed {
                    attempt,
                    model: call.model_name.to_string(),
                    error: e.to_string(),
                },
            );
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use listscan_vision::{Reply, ScriptedVisionModel};
    use uuid::Uuid;

    use super::*;

    fn call(timeout: Duration) -> ModelCall<'static> {
        ModelCall {
            request_id: Uuid::new_v4(),
            model_name: "vl",
            image_url: "data:image/png;base64,AAAA",
            prompt: "read it",
            enable_thinking: Some(true),
            timeout,
        }
    }

    #[tokio::test]
    async fn returns_raw_reply() {
        let model = ScriptedVisionModel::new().on_model("vl", [Reply::text("no table here")]);
        let raw = recognize(&model, &call(Duration::from_secs(5)), 0).await.unwrap();
        assert_eq!(raw, "no table here");

        let seen = model.calls_for("vl");
        assert_eq!(seen[0].prompt, "read it");
        assert_eq!(seen[0].enable_thinking, Some(true));
    }

    #[tokio::test]
    async fn failure_is_upstream() {
        let model = ScriptedVisionModel::new().on_model("vl", [Reply::fail("quota exceeded")]);
        let err = recognize(&model, &call(Duration::from_secs(5)), 2).await.unwrap_err();
        assert!(err.is_upstream());
        assert_eq!(err.code(), "INTERNAL_ERROR");
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn hang_times_out() {
        let model = ScriptedVisionModel::new().on_model("vl", [Reply::Hang]);
        let err = recognize(&model, &call(Duration::from_millis(20)), 0).await.unwrap_err();
        assert!(matches!(err, ScanError::Timeout { .. }));
    }
}
