//! Ordered progress reporting.
//!
//! A [`ProgressSink`] is the only writer of a request's event stream. It keeps
//! percentages non-decreasing and closes itself after the first terminal
//! event, so a consumer sees zero or more progress events followed by
//! exactly one `error` or `result`.

use futures::Stream;
use listscan_core::ProgressEvent;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tracing::debug;

/// Events buffered between the orchestrator and a slow consumer.
pub const PROGRESS_BUFFER: usize = 32;

/// The consumer went away; nobody will read further events.
#[derive(Debug, Error)]
#[error("progress receiver dropped")]
pub struct ReceiverGone;

pub struct ProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
    last_percent: u8,
    finished: bool,
}

pub fn progress_channel(buffer: usize) -> (ProgressSink, mpsc::Receiver<ProgressEvent>) {
    let (tx, rx) = mpsc::channel(buffer);
    let sink = ProgressSink {
        tx,
        last_percent: 0,
        finished: false,
    };
    (sink, rx)
}

impl ProgressSink {
    /// Report progress. A percentage lower than the last one sent is raised
    /// to it.
    pub async fn progress(&mut self, percent: u8, message: impl Into<String>) -> Result<(), ReceiverGone> {
        if self.finished {
            debug!("Dropping progress event after terminal event");
            return Ok(());
        }
        let percent = percent.max(self.last_percent).min(100);
        self.last_percent = percent;
        self.send(ProgressEvent::progress(percent, message)).await
    }

    /// Send the terminal event and close the sink.
    ///
    /// A second call is ignored.
    pub async fn finish(&mut self, event: ProgressEvent) -> Result<(), ReceiverGone> {
        debug_assert!(event.is_terminal());
        if self.finished {
            debug!(kind = event.kind(), "Dropping second terminal event");
            return Ok(());
        }
        self.finished = true;
        self.send(event).await
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn last_percent(&self) -> u8 {
        self.last_percent
    }

    async fn send(&self, event: ProgressEvent) -> Result<(), ReceiverGone> {
        self.tx.send(event).await.map_err(|_| ReceiverGone)
    }
}

/// One NDJSON line for `event`, newline included.
pub fn encode_ndjson(event: &ProgressEvent) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

/// Adapt an event receiver into a stream of NDJSON lines.
pub fn ndjson_stream(
    rx: mpsc::Receiver<ProgressEvent>,
) -> impl Stream<Item = Result<String, serde_json::Error>> + Send + 'static {
    ReceiverStream::new(rx).map(|event| encode_ndjson(&event))
}
