//! Config redaction: safe-to-print snapshots with credentials masked.

use serde_json::Value;

/// Keys whose string values are credentials.
static SENSITIVE_KEYS: &[&str] = &[
    "apiKey",
    "api_key",
    "accessToken",
    "access_token",
    "token",
    "secret",
    "password",
];

/// Replace every sensitive string with a four-character hint plus `***`.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    let hint: String = s.chars().take(4).collect();
    if s.chars().count() > 8 {
        Value::String(format!("{hint}***"))
    } else {
        Value::String("***".to_string())
    }
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_recursive(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}

/// Field paths that [`redact`] would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() => {
            let key = path.rsplit('.').next().unwrap_or("");
            if is_sensitive_key(key) {
                out.push(path.to_string());
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, &child_path, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redacts_api_key() {
        let v = json!({ "settings": { "apiKey": "sk-abcdef123456" } });
        let redacted = redact(&v);
        let key = redacted["settings"]["apiKey"].as_str().unwrap();
        assert_eq!(key, "sk-a***");
        assert_eq!(collect_redacted_paths(&v), vec!["settings.apiKey".to_string()]);
    }

    #[test]
    fn short_secrets_get_no_hint() {
        let redacted = redact(&json!({ "accessToken": "abc123" }));
        assert_eq!(redacted["accessToken"], "***");
    }

    #[test]
    fn passthrough_non_sensitive() {
        let v = json!({ "ocr": { "ocrModel": "qwen-vl-max-latest", "concurrency": 5 } });
        assert_eq!(redact(&v), v);
        assert!(collect_redacted_paths(&v).is_empty());
    }
}
