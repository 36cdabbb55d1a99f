//! Telemetry and structured logging for listscan.
//!
//! Handles subscriber setup (console + rolling NDJSON file), secret redaction,
//! and the per-attempt scan event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{preview, ScanEvent, ScanEventLogger, PREVIEW_CHARS};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
