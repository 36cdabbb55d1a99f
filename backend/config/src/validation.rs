//! Config validation with field paths.

use listscan_core::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use thiserror::Error;
use tracing::{error, warn};

use crate::schema::ScanConfig;

/// Timeouts above this are probably a unit mistake (seconds vs ms).
const SUSPICIOUS_TIMEOUT_MS: u64 = 300_000;

/// A config validation finding with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation findings from one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Emit every finding through `tracing`.
    pub fn log(&self) {
        for warning in &self.warnings {
            warn!(path = %warning.path, message = %warning.message, "Config warning");
        }
        for err in &self.errors {
            error!(path = %err.path, message = %err.message, "Config error");
        }
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ScanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_ocr(config, &mut report);
    validate_prompts(config, &mut report);
    validate_upload(config, &mut report);
    report
}

fn validate_ocr(config: &ScanConfig, report: &mut ValidationReport) {
    let ocr = &config.ocr;
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&ocr.concurrency) {
        report.error(
            "ocr.concurrency",
            format!(
                "must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}; requests relying on it will be rejected"
            ),
        );
    }
    if ocr.timeout_ms > SUSPICIOUS_TIMEOUT_MS {
        report.warn(
            "ocr.timeout",
            format!("{} ms is unusually long; the value is in milliseconds", ocr.timeout_ms),
        );
    }
}

fn validate_prompts(config: &ScanConfig, report: &mut ValidationReport) {
    for (path, text) in [
        ("prompt.ocrInstruction", &config.prompt.ocr_instruction),
        ("prompt.decisionInstruction", &config.prompt.decision_instruction),
    ] {
        if !text.to_ascii_lowercase().contains("json") {
            report.warn(path, "does not ask for a JSON array; replies may not parse");
        }
    }
}

fn validate_upload(config: &ScanConfig, report: &mut ValidationReport) {
    for (i, format) in config.upload.allowed_formats.iter().enumerate() {
        if !format.starts_with("image/") {
            report.error(
                format!("upload.allowedFormats[{i}]"),
                format!("\"{format}\" is not an image MIME type"),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let report = validate(&ScanConfig::default());
        assert!(report.is_valid(), "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn out_of_range_concurrency_is_an_error() {
        let mut cfg = ScanConfig::default();
        cfg.ocr.concurrency = 12;
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "ocr.concurrency");
    }

    #[test]
    fn long_timeout_warns() {
        let mut cfg = ScanConfig::default();
        cfg.ocr.timeout_ms = 30 * 60 * 1000;
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "ocr.timeout");
    }

    #[test]
    fn non_image_format_is_an_error() {
        let mut cfg = ScanConfig::default();
        cfg.upload.allowed_formats.push("application/pdf".into());
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].path.starts_with("upload.allowedFormats"));
    }

    #[test]
    fn prompt_without_json_hint_warns() {
        let mut cfg = ScanConfig::default();
        cfg.prompt.ocr_instruction = "Read the list".into();
        let report = validate(&cfg);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, "prompt.ocrInstruction");
    }
}
