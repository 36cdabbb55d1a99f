//! CLI Status Command
//!
//! Asks a running gateway for its health report.

use anyhow::Result;

use crate::settings::ServerSettings;
use crate::terminal_output::{note_error, note_success};

pub async fn run(settings: &ServerSettings) -> Result<bool> {
    let url = format!("http://localhost:{}/healthz", settings.port);
    match reqwest::get(&url).await {
        Ok(resp) if resp.status().is_success() => {
            let body: serde_json::Value = resp.json().await?;
            println!("{}", serde_json::to_string_pretty(&body)?);
            note_success(&format!("listscan is running on port {}", settings.port));
            Ok(true)
        }
        Ok(resp) => {
            note_error(&format!("{url} answered {}", resp.status()));
            Ok(false)
        }
        Err(_) => {
            note_error(&format!("listscan is not running on port {}", settings.port));
            Ok(false)
        }
    }
}
