//! Request intake.
//!
//! Turns a raw [`RecognitionRequest`] into a [`ScanPlan`] or rejects it
//! before any model is called. Checks run in a fixed order so the first
//! reported problem is stable: missing image, concurrency, then the image
//! payload itself.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use listscan_config::{ScanConfig, UploadConfig};
use listscan_core::{RecognitionRequest, ScanError, MAX_CONCURRENCY, MIN_CONCURRENCY};
use uuid::Uuid;

/// A validated request, ready to run.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub request_id: Uuid,
    /// Always a `data:<mime>;base64,` URL.
    pub image_url: String,
    pub concurrency: usize,
    pub enable_thinking: bool,
}

/// Validate `request` against `config`.
pub fn prepare(request: RecognitionRequest, config: &ScanConfig) -> Result<ScanPlan, ScanError> {
    let image = request
        .image
        .filter(|image| !image.trim().is_empty())
        .ok_or(ScanError::NoImage)?;

    let concurrency = effective_concurrency(request.concurrency, config.ocr.concurrency)?;
    let image_url = normalize_image(image, &config.upload)?;
    let enable_thinking = request.enable_thinking.unwrap_or(false) || config.ocr.enable_thinking;

    Ok(ScanPlan {
        request_id: Uuid::new_v4(),
        image_url,
        concurrency,
        enable_thinking,
    })
}

/// The request's concurrency, or the configured default when absent.
///
/// Whichever value applies must lie in the supported range.
pub fn effective_concurrency(requested: Option<i64>, configured: i64) -> Result<usize, ScanError> {
    let n = requested.unwrap_or(configured);
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&n) {
        return Err(ScanError::InvalidConcurrency(n));
    }
    Ok(n as usize)
}

/// Accept a base64 data URL or bare base64 and return a data URL.
///
/// Bare base64 gets its MIME type from the decoded magic bytes.
pub fn normalize_image(image: String, upload: &UploadConfig) -> Result<String, ScanError> {
    let trimmed = image.trim();

    if let Some(rest) = trimmed.strip_prefix("data:") {
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ScanError::InvalidImage("malformed data URL".to_string()))?;
        let mime = header.strip_suffix(";base64").ok_or_else(|| {
            ScanError::InvalidImage("only base64-encoded data URLs are supported".to_string())
        })?;
        check_format(mime, upload)?;
        let bytes = decode(payload)?;
        check_size(bytes.len(), upload)?;
        if trimmed.len() == image.len() {
            return Ok(image);
        }
        return Ok(trimmed.to_string());
    }

    let bytes = decode(trimmed)?;
    let mime = sniff_mime(&bytes)
        .ok_or_else(|| ScanError::InvalidImage("unrecognized image format".to_string()))?;
    check_format(mime, upload)?;
    check_size(bytes.len(), upload)?;
    Ok(format!("data:{mime};base64,{trimmed}"))
}

/// Detect an image MIME type from its leading bytes.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        _ => None,
    }
}

fn decode(payload: &str) -> Result<Vec<u8>, ScanError> {
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| ScanError::InvalidImage(format!("image data is not valid base64: {e}")))?;
    if bytes.is_empty() {
        return Err(ScanError::InvalidImage("image data is empty".to_string()));
    }
    Ok(bytes)
}

fn check_format(mime: &str, upload: &UploadConfig) -> Result<(), ScanError> {
    if upload.allows(mime) {
        Ok(())
    } else {
        Err(ScanError::InvalidImage(format!(
            "{mime} is not an accepted format (accepted: {})",
            upload.allowed_formats.join(", ")
        )))
    }
}

fn check_size(size_bytes: usize, upload: &UploadConfig) -> Result<(), ScanError> {
    if size_bytes > upload.max_size_bytes() {
        return Err(ScanError::ImageTooLarge {
            size_bytes,
            limit_mb: upload.max_size_mb,
        });
    }
    Ok(())
}
