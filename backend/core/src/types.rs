use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::parser::parse_table;

/// Smallest number of parallel recognition attempts a request may ask for.
pub const MIN_CONCURRENCY: i64 = 1;

/// Largest number of parallel recognition attempts a request may ask for.
pub const MAX_CONCURRENCY: i64 = 10;

/// Body of `POST /api/ocr`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionRequest {
    /// Data URL (`data:image/png;base64,...`) or bare base64.
    #[serde(default)]
    pub image: Option<String>,

    /// Number of parallel recognition attempts; falls back to config.
    #[serde(default)]
    pub concurrency: Option<i64>,

    /// Ask the OCR model to reason before answering.
    #[serde(default)]
    pub enable_thinking: Option<bool>,
}

/// One line of a recognized list.
///
/// On the wire a row is always the 4-element array `[item, quantity, unit, note]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRow {
    pub item: String,
    pub quantity: String,
    pub unit: String,
    pub note: String,
}

impl TableRow {
    pub fn new(
        item: impl Into<String>,
        quantity: impl Into<String>,
        unit: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            item: item.into(),
            quantity: quantity.into(),
            unit: unit.into(),
            note: note.into(),
        }
    }

    /// Build a row from decoded model cells.
    ///
    /// Missing cells become empty strings and cells past the fourth are ignored.
    pub fn from_cells(cells: &[Value]) -> Self {
        let mut text = cells.iter().map(cell_text);
        Self {
            item: text.next().unwrap_or_default(),
            quantity: text.next().unwrap_or_default(),
            unit: text.next().unwrap_or_default(),
            note: text.next().unwrap_or_default(),
        }
    }

    pub fn cells(&self) -> [&str; 4] {
        [&self.item, &self.quantity, &self.unit, &self.note]
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl Serialize for TableRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.cells().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TableRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cells = Vec::<Value>::deserialize(deserializer)?;
        Ok(TableRow::from_cells(&cells))
    }
}

#[derive(Debug, Error)]
#[error("a parsed table must contain at least one row")]
pub struct EmptyTableError;

/// A non-empty, ordered list of rows.
///
/// A failed parse is represented by the absence of a table, never by an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TableRow>")]
pub struct ParsedTable(Vec<TableRow>);

impl ParsedTable {
    pub fn rows(&self) -> &[TableRow] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_rows(self) -> Vec<TableRow> {
        self.0
    }
}

impl TryFrom<Vec<TableRow>> for ParsedTable {
    type Error = EmptyTableError;

    fn try_from(rows: Vec<TableRow>) -> Result<Self, Self::Error> {
        if rows.is_empty() {
            Err(EmptyTableError)
        } else {
            Ok(Self(rows))
        }
    }
}

/// Outcome of one of the N parallel recognition calls.
#[derive(Debug, Clone)]
pub struct RecognitionAttempt {
    /// 0-based position among the parallel calls.
    pub index: usize,
    pub raw_text: String,
    pub parsed: Option<ParsedTable>,
}

impl RecognitionAttempt {
    pub fn from_raw(index: usize, raw_text: String) -> Self {
        let parsed = parse_table(&raw_text);
        Self {
            index,
            raw_text,
            parsed,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.parsed.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_serializes_as_four_element_array() {
        let row = TableRow::new("apples", "3", "kg", "");
        assert_eq!(
            serde_json::to_value(&row).unwrap(),
            json!(["apples", "3", "kg", ""])
        );
    }

    #[test]
    fn short_rows_are_padded_with_empty_strings() {
        let row: TableRow = serde_json::from_value(json!(["milk"])).unwrap();
        assert_eq!(row, TableRow::new("milk", "", "", ""));
    }

    #[test]
    fn non_string_cells_are_stringified() {
        let row = TableRow::from_cells(&[json!("eggs"), json!(12), Value::Null, json!(true)]);
        assert_eq!(row, TableRow::new("eggs", "12", "", "true"));
    }

    #[test]
    fn extra_cells_are_ignored() {
        let row = TableRow::from_cells(&[
            json!("rice"),
            json!("2"),
            json!("bag"),
            json!("brown"),
            json!("extra"),
        ]);
        assert_eq!(row.note, "brown");
    }

    #[test]
    fn empty_table_is_rejected() {
        assert!(ParsedTable::try_from(Vec::new()).is_err());
        assert!(serde_json::from_value::<ParsedTable>(json!([])).is_err());
    }

    #[test]
    fn request_accepts_camel_case_fields() {
        let req: RecognitionRequest = serde_json::from_value(json!({
            "image": "data:image/png;base64,AAAA",
            "concurrency": 3,
            "enableThinking": true
        }))
        .unwrap();
        assert_eq!(req.concurrency, Some(3));
        assert_eq!(req.enable_thinking, Some(true));
    }

    #[test]
    fn attempt_parses_its_raw_text() {
        let attempt = RecognitionAttempt::from_raw(2, r#"[["bread","1","loaf",""]]"#.into());
        assert!(attempt.is_valid());
        assert_eq!(attempt.index, 2);

        let attempt = RecognitionAttempt::from_raw(0, "I cannot read this image".into());
        assert!(!attempt.is_valid());
    }
}
