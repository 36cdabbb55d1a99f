//! Built-in defaults, used when the config document or a field is missing.

use crate::schema::ScanConfig;

/// Default parallel recognition attempts.
pub const DEFAULT_CONCURRENCY: i64 = 5;

pub const DEFAULT_OCR_MODEL: &str = "qwen-vl-max-latest";

pub const DEFAULT_DECISION_MODEL: &str = "qwen-max-latest";

/// Default per-call timeout (ms).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default upload limit (MB, decoded image bytes).
pub const DEFAULT_MAX_SIZE_MB: u64 = 10;

pub const DEFAULT_ALLOWED_FORMATS: &[&str] = &["image/png", "image/jpeg", "image/jpg"];

pub const DEFAULT_OCR_INSTRUCTION: &str = "Read the handwritten text in this image. It is a shopping list or an inventory list.

Requirements:
1. Transcribe every handwritten entry
2. Organize each entry as [item name, quantity, unit, note]
3. The unit is a unit of measure, such as piece, bottle, bag, pack, jin, kg, g, box or carton
4. Use an empty string for a missing quantity, unit or note
5. Answer with a JSON array: [[\"item\", \"quantity\", \"unit\", \"note\"], ...]

Return only the JSON array, without any other explanation.";

pub const DEFAULT_DECISION_INSTRUCTION: &str = "Below are the results of several independent recognitions of the same image. Using the original image and these results, give the most accurate final result.

Requirements:
1. Weigh all recognition results and keep the most accurate content
2. Answer with a JSON array: [[\"item\", \"quantity\", \"unit\", \"note\"], ...]
3. The unit is a unit of measure, such as piece, bottle, bag, pack, jin, kg, g, box or carton
4. Return only the JSON array, without any other explanation";

/// Apply all defaults to a freshly loaded config.
///
/// Serde already fills absent fields; this repairs fields that are present
/// but unusable (blank strings, zero limits, empty lists).
pub fn apply_all_defaults(config: ScanConfig) -> ScanConfig {
    let config = apply_ocr_defaults(config);
    let config = apply_prompt_defaults(config);
    apply_upload_defaults(config)
}

fn apply_ocr_defaults(mut config: ScanConfig) -> ScanConfig {
    let ocr = &mut config.ocr;
    if ocr.ocr_model.trim().is_empty() {
        ocr.ocr_model = DEFAULT_OCR_MODEL.to_string();
    }
    if ocr.decision_model.trim().is_empty() {
        ocr.decision_model = DEFAULT_DECISION_MODEL.to_string();
    }
    if ocr.timeout_ms == 0 {
        ocr.timeout_ms = DEFAULT_TIMEOUT_MS;
    }
    config
}

fn apply_prompt_defaults(mut config: ScanConfig) -> ScanConfig {
    let prompt = &mut config.prompt;
    if prompt.ocr_instruction.trim().is_empty() {
        prompt.ocr_instruction = DEFAULT_OCR_INSTRUCTION.to_string();
    }
    if prompt.decision_instruction.trim().is_empty() {
        prompt.decision_instruction = DEFAULT_DECISION_INSTRUCTION.to_string();
    }
    config
}

fn apply_upload_defaults(mut config: ScanConfig) -> ScanConfig {
    let upload = &mut config.upload;
    if upload.max_size_mb == 0 {
        upload.max_size_mb = DEFAULT_MAX_SIZE_MB;
    }
    upload.allowed_formats.retain(|f| !f.trim().is_empty());
    if upload.allowed_formats.is_empty() {
        upload.allowed_formats = DEFAULT_ALLOWED_FORMATS.iter().map(|f| f.to_string()).collect();
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_blank_models_and_zero_timeout() {
        let mut cfg = ScanConfig::default();
        cfg.ocr.ocr_model = "  ".into();
        cfg.ocr.decision_model = String::new();
        cfg.ocr.timeout_ms = 0;
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.ocr.ocr_model, DEFAULT_OCR_MODEL);
        assert_eq!(cfg.ocr.decision_model, DEFAULT_DECISION_MODEL);
        assert_eq!(cfg.ocr.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn repairs_blank_prompts() {
        let mut cfg = ScanConfig::default();
        cfg.prompt.ocr_instruction = String::new();
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.prompt.ocr_instruction, DEFAULT_OCR_INSTRUCTION);
    }

    #[test]
    fn does_not_override_user_values() {
        let mut cfg = ScanConfig::default();
        cfg.ocr.ocr_model = "qwen-vl-plus".into();
        cfg.ocr.concurrency = 3;
        cfg.upload.allowed_formats = vec!["image/webp".into()];
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.ocr.ocr_model, "qwen-vl-plus");
        assert_eq!(cfg.ocr.concurrency, 3);
        assert_eq!(cfg.upload.allowed_formats, vec!["image/webp".to_string()]);
    }

    #[test]
    fn empty_format_list_falls_back() {
        let mut cfg = ScanConfig::default();
        cfg.upload.allowed_formats = vec!["".into()];
        cfg.upload.max_size_mb = 0;
        let cfg = apply_all_defaults(cfg);
        assert!(cfg.upload.allows("image/png"));
        assert_eq!(cfg.upload.max_size_mb, DEFAULT_MAX_SIZE_MB);
    }
}
