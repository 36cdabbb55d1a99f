//! `listscan-config`: the recognition config document.
//!
//! Provides:
//! - Typed schema (`ocr`, `prompt`, `upload` sections)
//! - Built-in defaults used when the document or a field is missing
//! - `${ENV_VAR}` substitution
//! - Validation with warnings and errors
//! - Redacted snapshots for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{load_config, parse_config, CONFIG_FILE_NAME};
pub use redact::{collect_redacted_paths, redact};
pub use schema::{ClientConfig, FailurePolicy, OcrConfig, PromptConfig, ScanConfig, UploadConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::path::Path;

use tracing::warn;

/// Load the config document, falling back to built-in defaults.
///
/// A missing, unreadable or invalid document is not fatal: the service keeps
/// running on defaults. Validation findings are logged.
pub async fn load_and_prepare(path: &Path) -> ScanConfig {
    let config = match load_config(path).await {
        Ok(config) => config,
        Err(e) => {
            warn!(path = %path.display(), error = %format!("{e:#}"), "Config unavailable; using built-in defaults");
            ScanConfig::default()
        }
    };

    let report = validate(&config);
    report.log();
    config
}
