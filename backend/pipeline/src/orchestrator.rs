//! Request orchestration.
//!
//! Runs N recognition attempts against the same image at once, waits for all
//! of them, keeps the ones whose reply parsed into a table, and either
//! returns the single survivor or asks the decision model to reconcile the
//! survivors. Every step is reported through a [`ProgressSink`].
//!
//! Progress schedule:
//!
//! | percent         | message                                  |
//! |-----------------|------------------------------------------|
//! | 5               | `Preparing recognition...`               |
//! | 10              | `Starting N concurrent recognitions...`  |
//! | 10 + 60 * c / N | `Recognition progress: c/N`              |
//! | 70              | `All recognition requests complete`      |
//! | 75              | `Parsed: V/N valid results`              |
//! | 90              | `Preparing result...` (V = 1)            |
//! | 80, 95          | consolidation start and end (V >= 2)     |

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use listscan_config::{FailurePolicy, ScanConfig};
use listscan_core::{
    ParsedTable, ProgressEvent, RecognitionAttempt, RecognitionRequest, ResultMetadata, ScanError,
    VisionModel,
};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use crate::call::ModelCall;
use crate::consolidator;
use crate::intake::{prepare, ScanPlan};
use crate::progress::{progress_channel, ProgressSink, ReceiverGone, PROGRESS_BUFFER};
use crate::worker;

/// Why a run stopped before producing a result.
enum Halt {
    Failed(ScanError),
    Disconnected,
}

impl From<ScanError> for Halt {
    fn from(err: ScanError) -> Self {
        Halt::Failed(err)
    }
}

impl From<ReceiverGone> for Halt {
    fn from(_: ReceiverGone) -> Self {
        Halt::Disconnected
    }
}

/// Validate a request and start it in the background.
///
/// Validation failures are returned before anything is spawned. A missing
/// model (no API key) is reported only after the request itself checked out.
pub fn start(
    model: Option<Arc<dyn VisionModel>>,
    config: ScanConfig,
    request: RecognitionRequest,
) -> Result<mpsc::Receiver<ProgressEvent>, ScanError> {
    let plan = prepare(request, &config)?;
    let model = model.ok_or(ScanError::NoApiKey)?;
    Ok(Orchestrator::new(model, config).spawn(plan))
}

/// Drives one request from fan-out to final table.
///
/// The config is a snapshot taken when the request arrived; a reload during
/// the run does not affect it.
pub struct Orchestrator {
    model: Arc<dyn VisionModel>,
    config: ScanConfig,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn VisionModel>, config: ScanConfig) -> Self {
        Self { model, config }
    }

    /// Run `plan` on a background task and return its event stream.
    ///
    /// Dropping the receiver cancels the run at its next event.
    pub fn spawn(self, plan: ScanPlan) -> mpsc::Receiver<ProgressEvent> {
        let (mut sink, rx) = progress_channel(PROGRESS_BUFFER);
        tokio::spawn(async move {
            self.run(plan, &mut sink).await;
        });
        rx
    }

    /// Run `plan` to completion, ending the stream with one terminal event.
    #[instrument(
        name = "scan",
        skip_all,
        fields(request_id = %plan.request_id, concurrency = plan.concurrency)
    )]
    pub async fn run(&self, plan: ScanPlan, sink: &mut ProgressSink) {
        let started = Instant::now();

        let terminal = match self.execute(&plan, sink).await {
            Ok((table, valid_attempts)) => {
                let metadata = ResultMetadata {
                    concurrency_used: plan.concurrency,
                    valid_attempts,
                    processing_time_seconds: round_seconds(started.elapsed().as_secs_f64()),
                };
                info!(
                    rows = table.len(),
                    valid_attempts,
                    seconds = metadata.processing_time_seconds,
                    "Scan complete"
                );
                ProgressEvent::Result { table, metadata }
            }
            Err(Halt::Failed(err)) => {
                if err.is_client_error() {
                    warn!(code = err.code(), error = %err, "Scan rejected");
                } else {
                    error!(code = err.code(), error = %err, "Scan failed");
                }
                ProgressEvent::from(&err)
            }
            Err(Halt::Disconnected) => {
                info!("Client disconnected; scan abandoned");
                return;
            }
        };

        if sink.finish(terminal).await.is_err() {
            info!("Client disconnected before the final event");
        }
    }

    async fn execute(
        &self,
        plan: &ScanPlan,
        sink: &mut ProgressSink,
    ) -> Result<(ParsedTable, usize), Halt> {
        let n = plan.concurrency;

        sink.progress(5, "Preparing recognition...").await?;
        sink.progress(10, format!("Starting {n} concurrent recognitions..."))
            .await?;

        let replies = self.recognize_all(plan, sink).await?;
        sink.progress(70, "All recognition requests complete").await?;

        let candidates: Vec<ParsedTable> = replies
            .into_iter()
            .filter_map(|(index, raw)| RecognitionAttempt::from_raw(index, raw).parsed)
            .collect();
        let valid = candidates.len();
        info!(valid, total = n, "Parsed recognition replies");
        sink.progress(75, format!("Parsed: {valid}/{n} valid results"))
            .await?;

        let table = match valid {
            0 => return Err(ScanError::NoValidResults.into()),
            1 => {
                sink.progress(90, "Preparing result...").await?;
                candidates.into_iter().next()
            }
            _ => {
                sink.progress(80, "Consolidating results...").await?;
                let call = ModelCall {
                    request_id: plan.request_id,
                    model_name: &self.config.ocr.decision_model,
                    image_url: &plan.image_url,
                    prompt: &self.config.prompt.decision_instruction,
                    enable_thinking: None,
                    timeout: self.config.ocr.timeout(),
                };
                let merged =
                    consolidator::consolidate(self.model.as_ref(), &call, &candidates).await?;
                sink.progress(95, "Consolidation complete").await?;
                merged
            }
        };

        let table = table.ok_or(ScanError::ConsolidationFailed)?;
        Ok((table, valid))
    }

    /// Fan out `plan.concurrency` attempts and wait for every one of them.
    ///
    /// Returns the successful raw replies sorted by attempt index. Failed
    /// attempts are resolved by the configured [`FailurePolicy`].
    async fn recognize_all(
        &self,
        plan: &ScanPlan,
        sink: &mut ProgressSink,
    ) -> Result<Vec<(usize, String)>, Halt> {
        let n = plan.concurrency;
        let model = self.model.as_ref();
        let call = ModelCall {
            request_id: plan.request_id,
            model_name: &self.config.ocr.ocr_model,
            image_url: &plan.image_url,
            prompt: &self.config.prompt.ocr_instruction,
            enable_thinking: Some(plan.enable_thinking),
            timeout: self.config.ocr.timeout(),
        };

        let mut pending: FuturesUnordered<_> = (0..n)
            .map(|index| {
                let call = call.clone();
                async move { (index, worker::recognize(model, &call, index).await) }
            })
            .collect();

        let mut replies = Vec::with_capacity(n);
        let mut failures = Vec::new();
        let mut completed = 0usize;

        while let Some((index, outcome)) = pending.next().await {
            completed += 1;
            match outcome {
                Ok(raw) => replies.push((index, raw)),
                Err(err) => failures.push(err),
            }
            let percent = 10 + (60 * completed / n) as u8;
            sink.progress(percent, format!("Recognition progress: {completed}/{n}"))
                .await?;
        }

        if !failures.is_empty() {
            match self.config.ocr.failure_policy {
                FailurePolicy::Abort => {
                    warn!(failed = failures.len(), total = n, "Recognition attempt failed; aborting");
                    return Err(failures.swap_remove(0).into());
                }
                FailurePolicy::Degrade if replies.is_empty() => {
                    warn!(failed = failures.len(), total = n, "Every recognition attempt failed");
                    if let Some(last) = failures.pop() {
                        return Err(last.into());
                    }
                }
                FailurePolicy::Degrade => {
                    warn!(
                        failed = failures.len(),
                        total = n,
                        "Continuing with the attempts that succeeded"
                    );
                }
            }
        }

        replies.sort_by_key(|(index, _)| *index);
        Ok(replies)
    }
}

fn round_seconds(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}
