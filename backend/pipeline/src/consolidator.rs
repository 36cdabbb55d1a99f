//! Reconciles several candidate tables into one.
//!
//! The decision model sees the original image again together with every
//! candidate, labeled `Result 1:` .. `Result N:` in attempt order, and
//! answers with a single table in the same JSON shape.

use listscan_core::{parse_table, ParsedTable, ScanError, VisionModel};
use listscan_logging::{preview, ScanEvent, ScanEventLogger};
use tracing::{info, warn};

use crate::call::{invoke, ModelCall};

/// Build the decision prompt: the instruction, then each labeled candidate.
pub fn build_consolidation_prompt(
    instruction: &str,
    candidates: &[ParsedTable],
) -> Result<String, ScanError> {
    let mut sections = Vec::with_capacity(candidates.len() + 1);
    sections.push(instruction.to_string());
    for (i, table) in candidates.iter().enumerate() {
        let json = serde_json::to_string_pretty(table)
            .map_err(|e| ScanError::Internal(format!("failed to encode candidate table: {e}")))?;
        sections.push(format!("Result {}:\n{json}", i + 1));
    }
    Ok(sections.join("\n\n"))
}

/// Ask the decision model for a final table.
///
/// `call.prompt` is the decision instruction; the candidates are appended
/// to it. `Ok(None)` means the model answered but no table could be parsed
/// from the answer.
pub async fn consolidate(
    model: &dyn VisionModel,
    call: &ModelCall<'_>,
    candidates: &[ParsedTable],
) -> Result<Option<ParsedTable>, ScanError> {
    let prompt = build_consolidation_prompt(call.prompt, candidates)?;
    let call = ModelCall {
        enable_thinking: None,
        ..call.with_prompt(&prompt)
    };

    info!(model = %call.model_name, candidates = candidates.len(), "Consolidating candidate tables");
    let raw = invoke(model, &call).await?;

    ScanEventLogger::log_event(
        call.request_id,
        ScanEvent::Consolidated {
            model: call.model_name.to_string(),
            candidates: candidates.len(),
            preview: preview(&raw),
        },
    );

    let table = parse_table(&raw);
    if table.is_none() {
        warn!(model = %call.model_name, "Decision model reply contained no table");
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use listscan_core::TableRow;
    use listscan_vision::{Reply, ScriptedVisionModel};
    use uuid::Uuid;

    use super::*;

    fn table(item: &str) -> ParsedTable {
        ParsedTable::try_from(vec![TableRow::new(item, "1", "kg", "")]).unwrap()
    }

    fn call() -> ModelCall<'static> {
        ModelCall {
            request_id: Uuid::new_v4(),
            model_name: "decider",
            image_url: "data:image/png;base64,AAAA",
            prompt: "Pick the best.",
            enable_thinking: Some(true),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn prompt_lists_candidates_in_order() {
        let prompt = build_consolidation_prompt("Decide.", &[table("apples"), table("pears")]).unwrap();
        assert!(prompt.starts_with("Decide.\n\nResult 1:\n"));
        let first = prompt.find("Result 1:").unwrap();
        let second = prompt.find("Result 2:").unwrap();
        assert!(first < second);
        assert!(prompt[first..second].contains("apples"));
        assert!(prompt[second..].contains("pears"));
        assert!(!prompt.contains("Result 3:"));
    }

    #[tokio::test]
    async fn parses_decision_reply_without_thinking() {
        let model = ScriptedVisionModel::new().on_model(
            "decider",
            [Reply::text("Final:\n[[\"apples\",\"2\",\"kg\",\"green\"]]")],
        );
        let merged = consolidate(&model, &call(), &[table("apples"), table("apples")])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(merged.rows()[0].cells(), ["apples", "2", "kg", "green"]);

        let seen = model.calls_for("decider");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].enable_thinking, None);
        assert_eq!(seen[0].image_url, "data:image/png;base64,AAAA");
        assert!(seen[0].prompt.starts_with("Pick the best."));
        assert!(seen[0].prompt.contains("Result 2:"));
    }

    #[tokio::test]
    async fn unparseable_reply_is_none() {
        let model = ScriptedVisionModel::new().on_model("decider", [Reply::text("I cannot decide")]);
        let merged = consolidate(&model, &call(), &[table("a"), table("b")]).await.unwrap();
        assert!(merged.is_none());
    }

    #[tokio::test]
    async fn call_failure_propagates() {
        let model = ScriptedVisionModel::new().on_model("decider", [Reply::fail("boom")]);
        let err = consolidate(&model, &call(), &[table("a"), table("b")]).await.unwrap_err();
        assert!(err.is_upstream());
    }
}
