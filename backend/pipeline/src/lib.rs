//! Multi-sample OCR consolidation pipeline.
//!
//! A request is validated ([`intake`]), fanned out to N parallel recognition
//! calls ([`worker`]), reconciled when more than one sample parses
//! ([`consolidator`]), and reported as an ordered event stream
//! ([`progress`]). [`orchestrator`] drives the whole flow.

pub mod call;
pub mod consolidator;
pub mod intake;
pub mod orchestrator;
pub mod progress;
pub mod worker;

pub use call::ModelCall;
pub use intake::{prepare, ScanPlan};
pub use orchestrator::{start, Orchestrator};
pub use progress::{encode_ndjson, ndjson_stream, progress_channel, ProgressSink, ReceiverGone};
