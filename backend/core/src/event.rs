use serde::ser::Serializer;
use serde::Serialize;

use crate::error::ScanError;
use crate::types::{ParsedTable, TableRow};

/// Summary attached to a successful result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    pub concurrency_used: usize,
    pub valid_attempts: usize,
    /// Seconds, rounded to two decimals.
    #[serde(rename = "processingTime")]
    pub processing_time_seconds: f64,
}

/// One entry of the progress stream sent back to the caller.
///
/// A stream ends with exactly one `Error` or `Result`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Progress { percent: u8, message: String },
    Error { code: String, message: String },
    Result { table: ParsedTable, metadata: ResultMetadata },
}

impl ProgressEvent {
    pub fn progress(percent: u8, message: impl Into<String>) -> Self {
        Self::Progress {
            percent: percent.min(100),
            message: message.into(),
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Error {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress { .. })
    }

    /// Wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "progress",
            Self::Error { .. } => "error",
            Self::Result { .. } => "result",
        }
    }
}

impl From<&ScanError> for ProgressEvent {
    fn from(err: &ScanError) -> Self {
        Self::error(err.code(), err.to_string())
    }
}

// Wire shapes, kept compatible with the browser client.

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent<'a> {
    Progress {
        progress: u8,
        message: &'a str,
    },
    Error {
        error: WireError<'a>,
    },
    Result {
        success: bool,
        data: WireResult<'a>,
    },
}

#[derive(Serialize)]
struct WireError<'a> {
    code: &'a str,
    message: &'a str,
}

#[derive(Serialize)]
struct WireResult<'a> {
    items: &'a [TableRow],
    metadata: &'a ResultMetadata,
}

impl Serialize for ProgressEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let wire = match self {
            Self::Progress { percent, message } => WireEvent::Progress {
                progress: *percent,
                message,
            },
            Self::Error { code, message } => WireEvent::Error {
                error: WireError { code, message },
            },
            Self::Result { table, metadata } => WireEvent::Result {
                success: true,
                data: WireResult {
                    items: table.rows(),
                    metadata,
                },
            },
        };
        wire.serialize(serializer)
    }
}
