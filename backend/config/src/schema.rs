//! Recognition config schema.
//!
//! Every field is optional in the JSON document; `#[serde(default)]` fills
//! gaps from the constants in [`crate::defaults`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::defaults::{
    DEFAULT_ALLOWED_FORMATS, DEFAULT_CONCURRENCY, DEFAULT_DECISION_INSTRUCTION,
    DEFAULT_DECISION_MODEL, DEFAULT_MAX_SIZE_MB, DEFAULT_OCR_INSTRUCTION, DEFAULT_OCR_MODEL,
    DEFAULT_TIMEOUT_MS,
};

/// Root of the config document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanConfig {
    pub ocr: OcrConfig,
    pub prompt: PromptConfig,
    pub upload: UploadConfig,
}

impl ScanConfig {
    /// The subset of the config a browser client may see.
    pub fn client_view(&self) -> ClientConfig {
        ClientConfig {
            ocr: ClientOcrConfig {
                concurrency: self.ocr.concurrency,
                enable_thinking: self.ocr.enable_thinking,
            },
            upload: self.upload.clone(),
        }
    }
}

/// What happens to a round when some recognition calls fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Failed calls count as completed samples without a table.
    #[default]
    Degrade,
    /// Any failed call fails the whole round.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OcrConfig {
    /// Parallel attempts when the request does not say.
    pub concurrency: i64,
    pub ocr_model: String,
    /// Model used to reconcile several valid samples.
    pub decision_model: String,
    pub enable_thinking: bool,
    /// Per-call timeout in milliseconds.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,
    pub failure_policy: FailurePolicy,
}

impl OcrConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            ocr_model: DEFAULT_OCR_MODEL.to_string(),
            decision_model: DEFAULT_DECISION_MODEL.to_string(),
            enable_thinking: false,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            failure_policy: FailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptConfig {
    pub ocr_instruction: String,
    /// Prefix of the consolidation prompt; candidate tables are appended.
    pub decision_instruction: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            ocr_instruction: DEFAULT_OCR_INSTRUCTION.to_string(),
            decision_instruction: DEFAULT_DECISION_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    #[serde(rename = "maxSizeMB")]
    pub max_size_mb: u64,
    /// Accepted image MIME types.
    pub allowed_formats: Vec<String>,
}

impl UploadConfig {
    pub fn max_size_bytes(&self) -> usize {
        (self.max_size_mb as usize).saturating_mul(1024 * 1024)
    }

    pub fn allows(&self, mime: &str) -> bool {
        self.allowed_formats
            .iter()
            .any(|format| format.eq_ignore_ascii_case(mime))
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: DEFAULT_MAX_SIZE_MB,
            allowed_formats: DEFAULT_ALLOWED_FORMATS
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// Client-safe view served at `/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub ocr: ClientOcrConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOcrConfig {
    pub concurrency: i64,
    pub enable_thinking: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_document_is_all_defaults() {
        let cfg: ScanConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg, ScanConfig::default());
        assert_eq!(cfg.ocr.concurrency, 5);
        assert_eq!(cfg.ocr.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.ocr.failure_policy, FailurePolicy::Degrade);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let cfg: ScanConfig = serde_json::from_value(json!({
            "ocr": { "concurrency": 3, "timeout": 45000, "failurePolicy": "abort" }
        }))
        .unwrap();
        assert_eq!(cfg.ocr.concurrency, 3);
        assert_eq!(cfg.ocr.timeout_ms, 45_000);
        assert_eq!(cfg.ocr.failure_policy, FailurePolicy::Abort);
        assert_eq!(cfg.ocr.ocr_model, DEFAULT_OCR_MODEL);
        assert_eq!(cfg.prompt, PromptConfig::default());
    }

    #[test]
    fn upload_limits() {
        let cfg: ScanConfig = serde_json::from_value(json!({
            "upload": { "maxSizeMB": 2, "allowedFormats": ["image/png"] }
        }))
        .unwrap();
        assert_eq!(cfg.upload.max_size_bytes(), 2 * 1024 * 1024);
        assert!(cfg.upload.allows("image/png"));
        assert!(cfg.upload.allows("IMAGE/PNG"));
        assert!(!cfg.upload.allows("image/jpeg"));
    }

    #[test]
    fn client_view_hides_prompts_and_models() {
        let value = serde_json::to_value(ScanConfig::default().client_view()).unwrap();
        assert_eq!(value["ocr"]["concurrency"], 5);
        assert_eq!(value["ocr"]["enableThinking"], false);
        assert_eq!(value["upload"]["maxSizeMB"], 10);
        assert!(value.get("prompt").is_none());
        assert!(value["ocr"].get("ocrModel").is_none());
    }
}
