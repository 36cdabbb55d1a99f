//! Result parser: pulls a 2D array literal out of free-form model output.
//!
//! Models tend to wrap the table in commentary or code fences, so the parser
//! looks for the first `[[ ... ]]` shaped substring instead of decoding the
//! whole reply. It never fails loudly; anything unusable comes back as `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::types::{ParsedTable, TableRow};

/// Leftmost, shortest `[[ ... ] ]` span.
static TABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*\[.*?\]\s*\]").expect("table pattern is valid"));

/// Decode the first bracketed array-of-arrays in `text`, cells untouched.
///
/// Returns `None` when there is no match, the match is not valid JSON, or the
/// decoded value is not a non-empty array whose elements are all arrays.
pub fn extract_rows(text: &str) -> Option<Vec<Vec<Value>>> {
    let candidate = TABLE_PATTERN.find(text)?.as_str();

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Table candidate is not valid JSON");
            return None;
        }
    };

    let Value::Array(rows) = value else {
        return None;
    };
    if rows.is_empty() {
        return None;
    }

    rows.into_iter()
        .map(|row| match row {
            Value::Array(cells) => Some(cells),
            _ => None,
        })
        .collect()
}

/// Parse model output into a [`ParsedTable`].
pub fn parse_table(text: &str) -> Option<ParsedTable> {
    let rows: Vec<TableRow> = extract_rows(text)?
        .iter()
        .map(|cells| TableRow::from_cells(cells))
        .collect();
    ParsedTable::try_from(rows).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_bare_array() {
        let table = parse_table(r#"[["apples","3","kg","green"],["milk","2","bottle",""]]"#)
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0], TableRow::new("apples", "3", "kg", "green"));
        assert_eq!(table.rows()[1], TableRow::new("milk", "2", "bottle", ""));
    }

    #[test]
    fn well_formed_string_table_round_trips() {
        let input = json!([["soap", "1", "box", ""], ["salt", "500", "g", "coarse"]]);
        let rows = extract_rows(&input.to_string()).unwrap();
        assert_eq!(Value::Array(rows.into_iter().map(Value::Array).collect()), input);
    }

    #[test]
    fn tolerates_surrounding_prose_and_fences() {
        let text = "Sure! Here is the list:\n```json\n[\n  [\"tea\", \"1\", \"box\", \"\"]\n]\n```\nLet me know if you need anything else.";
        let table = parse_table(text).unwrap();
        assert_eq!(table.rows(), &[TableRow::new("tea", "1", "box", "")]);
    }

    #[test]
    fn takes_the_leftmost_match() {
        let text = r#"first [["a","1","",""]] then [["b","2","",""],["c","3","",""]]"#;
        let table = parse_table(text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].item, "a");
    }

    #[test]
    fn short_rows_are_kept_as_is_by_extract() {
        let rows = extract_rows(r#"[["flour"],["sugar","1"]]"#).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[1].len(), 2);

        let table = parse_table(r#"[["flour"],["sugar","1"]]"#).unwrap();
        assert_eq!(table.rows()[0], TableRow::new("flour", "", "", ""));
    }

    #[test]
    fn no_array_yields_none() {
        assert!(parse_table("").is_none());
        assert!(parse_table("The image is too blurry to read.").is_none());
        assert!(parse_table("[1, 2, 3]").is_none());
        assert!(parse_table(r#"["a","b"]"#).is_none());
    }

    #[test]
    fn malformed_array_yields_none() {
        assert!(parse_table(r#"[["unterminated, "1"]]"#).is_none());
        assert!(parse_table(r#"[["a", "1",]]"#).is_none());
        assert!(parse_table("[[nonsense]]").is_none());
    }

    #[test]
    fn mixed_row_shapes_are_rejected() {
        // The match itself is a valid array, but the second element is not a row.
        assert!(extract_rows(r#"[["a","1"], 5, ["b"]]"#).is_none());
    }

    #[test]
    fn numeric_cells_become_text() {
        let table = parse_table(r#"[["eggs", 12, "pcs", null]]"#).unwrap();
        assert_eq!(table.rows()[0], TableRow::new("eggs", "12", "pcs", ""));
    }
}
