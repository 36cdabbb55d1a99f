//! Terminal output utilities: notes, table rendering, TSV, stream writing.
//!
//! Notes go to stderr so that stdout carries only scan output.

use std::io::Write;

use listscan_core::ParsedTable;

// ---------------------------------------------------------------------------
// ANSI Color/Style helpers
// ---------------------------------------------------------------------------

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";

/// Column headers used for every rendering of a table.
pub const HEADERS: [&str; 4] = ["Item", "Quantity", "Unit", "Note"];

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // Skip until 'm'
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Formatted notes
// ---------------------------------------------------------------------------

/// Print a progress line, e.g. ` 45% Recognition progress: 2/5`.
pub fn note_progress(percent: u8, msg: &str) {
    if supports_color() {
        eprintln!("{DIM}{percent:>3}%{RESET} {msg}");
    } else {
        eprintln!("{percent:>3}% {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}⚠{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}✗{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        eprintln!("{GREEN}{BOLD}✓{RESET} {msg}");
    } else {
        eprintln!("OK: {msg}");
    }
}

// ---------------------------------------------------------------------------
// Table rendering
// ---------------------------------------------------------------------------

/// Column alignment.
pub enum Align {
    Left,
    Right,
}

/// A table column definition.
pub struct Column {
    pub header: String,
    pub align: Align,
    pub max_width: Option<usize>,
}

impl Column {
    pub fn left(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Left,
            max_width: None,
        }
    }

    pub fn right(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            align: Align::Right,
            max_width: None,
        }
    }

    pub fn max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }
}

/// Render a table with given columns and rows. Widths count characters.
pub fn render_table(columns: &[Column], rows: &[Vec<String>]) -> String {
    let num_cols = columns.len();
    let mut widths: Vec<usize> = columns.iter().map(|c| visible_width(&c.header)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            let w = visible_width(cell);
            let w = columns[i].max_width.map_or(w, |max| w.min(max));
            widths[i] = widths[i].max(w);
        }
    }

    let mut out = String::new();

    let header_cells: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, col)| pad_cell(&col.header, widths[i], &col.align))
        .collect();
    out.push_str(&format!("  {}  \n", header_cells.join("  ")));

    let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    out.push_str(&format!("  {}  \n", sep.join("  ")));

    for row in rows {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                pad_cell(cell, widths[i], &columns[i].align)
            })
            .collect();
        out.push_str(&format!("  {}  \n", cells.join("  ")));
    }

    out
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn pad_cell(s: &str, width: usize, align: &Align) -> String {
    let pad = width.saturating_sub(visible_width(s));
    match align {
        Align::Left => format!("{s}{}", " ".repeat(pad)),
        Align::Right => format!("{}{s}", " ".repeat(pad)),
    }
}

/// Aligned plain-text rendering of a recognized list. Line breaks inside
/// cells become spaces.
pub fn render_items(table: &ParsedTable) -> String {
    let columns = [
        Column::left(HEADERS[0]).max_width(40),
        Column::right(HEADERS[1]),
        Column::left(HEADERS[2]),
        Column::left(HEADERS[3]).max_width(40),
    ];
    let rows: Vec<Vec<String>> = table
        .rows()
        .iter()
        .map(|row| row.cells().iter().map(|c| flatten_cell(c)).collect())
        .collect();
    render_table(&columns, &rows)
}

/// Tab-separated rendering with a header line, ready to paste into a
/// spreadsheet. Tabs and line breaks inside cells become spaces too.
pub fn render_tsv(table: &ParsedTable) -> String {
    let mut lines = Vec::with_capacity(table.len() + 1);
    lines.push(HEADERS.join("\t"));
    for row in table.rows() {
        let cells: Vec<String> = row.cells().iter().map(|c| flatten_cell(c)).collect();
        lines.push(cells.join("\t"));
    }
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn flatten_cell(cell: &str) -> String {
    cell.replace(['\t', '\r', '\n'], " ")
}

// ---------------------------------------------------------------------------
// Streaming writer
// ---------------------------------------------------------------------------

/// Write chunks to a buffered writer, flushing after each.
pub fn stream_write(writer: &mut impl Write, chunk: &str) -> std::io::Result<()> {
    writer.write_all(chunk.as_bytes())?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use listscan_core::TableRow;

    use super::*;

    fn table() -> ParsedTable {
        ParsedTable::try_from(vec![
            TableRow::new("Äpfel", "3", "kg", "rot"),
            TableRow::new("milk", "2", "L", "line\tbreak\nhere"),
        ])
        .unwrap()
    }

    #[test]
    fn strips_ansi() {
        let colored = format!("{GREEN}hello{RESET}");
        assert_eq!(strip_ansi(&colored), "hello");
    }

    #[test]
    fn tsv_has_header_and_flat_cells() {
        let tsv = render_tsv(&table());
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "Item\tQuantity\tUnit\tNote");
        assert_eq!(lines[1], "Äpfel\t3\tkg\trot");
        assert_eq!(lines[2], "milk\t2\tL\tline break here");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn renders_aligned_items() {
        let rendered = render_items(&table());
        let lines: Vec<&str> = rendered.lines().collect();
        assert!(lines[0].contains("Item"));
        assert!(lines[2].contains("Äpfel"));
        let widths: Vec<usize> = lines[..3].iter().map(|l| l.chars().count()).collect();
        assert_eq!(widths[0], widths[2]);
    }

    #[test]
    fn stream_write_flushes_chunk() {
        let mut buf = Vec::new();
        stream_write(&mut buf, "{\"type\":\"progress\"}\n").unwrap();
        assert_eq!(buf, b"{\"type\":\"progress\"}\n");
    }
}
