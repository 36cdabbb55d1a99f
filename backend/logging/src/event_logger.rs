//! Scan event logger.
//!
//! One structured record per model call outcome, tagged with the request id,
//! routed to the `scan_events` tracing target.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::redact::redact_sensitive_data;

/// Characters of model output kept in a log record.
pub const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    AttemptCompleted {
        attempt: usize,
        model: String,
        preview: String,
    },
    AttemptFailed {
        attempt: usize,
        model: String,
        error: String,
    },
    Consolidated {
        model: String,
        candidates: usize,
        preview: String,
    },
}

#[derive(Debug, Serialize)]
pub struct ScanEventEntry {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: ScanEvent,
}

pub struct ScanEventLogger;

impl ScanEventLogger {
    /// Log a scan event, scrubbing free text before it is recorded.
    pub fn log_event(request_id: Uuid, mut event: ScanEvent) {
        match &mut event {
            ScanEvent::AttemptCompleted { preview, .. }
            | ScanEvent::Consolidated { preview, .. } => {
                *preview = redact_sensitive_data(preview);
            }
            ScanEvent::AttemptFailed { error, .. } => {
                *error = redact_sensitive_data(error);
            }
        }

        let entry = ScanEventEntry {
            request_id,
            timestamp: Utc::now(),
            event,
        };

        info!(target: "scan_events", event = ?entry, "Scan event");
    }
}

/// First [`PREVIEW_CHARS`] characters of `text`, on a char boundary.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_on_char_boundary() {
        let long = "苹果".repeat(80);
        let p = preview(&long);
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 1);
        assert!(p.ends_with('…'));
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(preview("[[\"tea\"]]"), "[[\"tea\"]]");
    }
}
