//! CLI Scan Command
//!
//! Runs the recognition pipeline in-process against one image file.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::ValueEnum;
use listscan_config::load_and_prepare;
use listscan_core::{ProgressEvent, RecognitionRequest};
use listscan_pipeline::encode_ndjson;

use crate::settings::ServerSettings;
use crate::terminal_output::{
    note_error, note_progress, note_success, note_warn, render_items, render_tsv, stream_write,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every event as one JSON line, as the HTTP API streams it
    Ndjson,
    /// Only the final table, tab separated with a header line
    Tsv,
    /// Only the final table, aligned for reading
    Table,
}

pub struct ScanArgs {
    pub image: PathBuf,
    pub concurrency: Option<i64>,
    pub thinking: bool,
    pub format: OutputFormat,
    pub config_path: PathBuf,
}

/// Returns whether the scan produced a table.
pub async fn run(settings: &ServerSettings, args: ScanArgs) -> Result<bool> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read image file: {}", args.image.display()))?;
    let config = load_and_prepare(&args.config_path).await;

    let model = settings.vision_model();
    if model.is_none() {
        note_warn("DASHSCOPE_API_KEY is not set");
    }

    let request = RecognitionRequest {
        image: Some(STANDARD.encode(&bytes)),
        concurrency: args.concurrency,
        enable_thinking: args.thinking.then_some(true),
    };

    let mut events = match listscan_pipeline::start(model, config, request) {
        Ok(events) => events,
        Err(err) => {
            if args.format == OutputFormat::Ndjson {
                stream_write(&mut io::stdout(), &encode_ndjson(&ProgressEvent::from(&err))?)?;
            }
            note_error(&format!("{}: {err}", err.code()));
            return Ok(false);
        }
    };

    let mut produced_table = false;
    while let Some(event) = events.recv().await {
        if args.format == OutputFormat::Ndjson {
            stream_write(&mut io::stdout(), &encode_ndjson(&event)?)?;
        }
        match &event {
            ProgressEvent::Progress { percent, message } => {
                if args.format != OutputFormat::Ndjson {
                    note_progress(*percent, message);
                }
            }
            ProgressEvent::Error { code, message } => note_error(&format!("{code}: {message}")),
            ProgressEvent::Result { table, metadata } => {
                produced_table = true;
                match args.format {
                    OutputFormat::Tsv => stream_write(&mut io::stdout(), &render_tsv(table))?,
                    OutputFormat::Table => stream_write(&mut io::stdout(), &render_items(table))?,
                    OutputFormat::Ndjson => {}
                }
                note_success(&format!(
                    "{} rows from {}/{} valid samples in {:.2}s",
                    table.len(),
                    metadata.valid_attempts,
                    metadata.concurrency_used,
                    metadata.processing_time_seconds
                ));
            }
        }
    }

    Ok(produced_table)
}
