//! Core types shared by every listscan crate.

pub mod error;
pub mod event;
pub mod parser;
pub mod traits;
pub mod types;

pub use error::ScanError;
pub use event::{ProgressEvent, ResultMetadata};
pub use parser::{extract_rows, parse_table};
pub use traits::{VisionModel, VisionRequest, VisionResponse};
pub use types::{
    EmptyTableError, ParsedTable, RecognitionAttempt, RecognitionRequest, TableRow,
    MAX_CONCURRENCY, MIN_CONCURRENCY,
};
