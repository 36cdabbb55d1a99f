//! Environment variable substitution for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! `$${VAR}` escapes to a literal `${VAR}`.

use std::collections::HashMap;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// `${VAR}` with an optional leading `$` marking an escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\$)?\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid"));

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Only string leaves are processed. A referenced variable that is unset or
/// empty is an error.
pub fn resolve_env_vars(value: &Value) -> Result<Value> {
    substitute_value(value, &std::env::vars().collect(), "")
}

/// Substitute env vars using a provided map (useful for testing).
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if caps.get(1).is_some() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err.into()),
        None => Ok(substituted.into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_string() {
        let value = json!({ "ocr": { "ocrModel": "${OCR_MODEL}" } });
        let out = resolve_env_vars_with(&value, &env(&[("OCR_MODEL", "qwen-vl-plus")])).unwrap();
        assert_eq!(out["ocr"]["ocrModel"], "qwen-vl-plus");
    }

    #[test]
    fn substitutes_inside_text_and_arrays() {
        let value = json!({ "upload": { "allowedFormats": ["image/${FMT}"] } });
        let out = resolve_env_vars_with(&value, &env(&[("FMT", "webp")])).unwrap();
        assert_eq!(out["upload"]["allowedFormats"][0], "image/webp");
    }

    #[test]
    fn escaped_reference_is_kept_literal() {
        let value = json!("use $${HOME} literally");
        let out = resolve_env_vars_with(&value, &env(&[])).unwrap();
        assert_eq!(out, json!("use ${HOME} literally"));
    }

    #[test]
    fn missing_var_reports_path() {
        let value = json!({ "prompt": { "ocrInstruction": "${NOPE}" } });
        let err = resolve_env_vars_with(&value, &env(&[])).unwrap_err();
        let missing = err.downcast_ref::<MissingEnvVarError>().unwrap();
        assert_eq!(missing.var_name, "NOPE");
        assert_eq!(missing.config_path, "prompt.ocrInstruction");
    }

    #[test]
    fn non_strings_pass_through() {
        let value = json!({ "ocr": { "concurrency": 3, "enableThinking": true } });
        assert_eq!(resolve_env_vars_with(&value, &env(&[])).unwrap(), value);
    }
}
