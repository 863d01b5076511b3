use std::collections::HashMap;

use csv::ReaderBuilder;
use tracing::debug;

use crate::yard::erp::error::{ReportError, Result};
use crate::yard::erp::model::Table;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses a comma-delimited export with a header row into a [`Table`].
///
/// Rows shorter than the header are padded with empty cells. Rows longer than
/// the header are rejected.
pub fn read_table(name: &str, bytes: &[u8]) -> Result<Table> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut table = Table::new(name, dedupe_headers(headers));
    let width = table.columns.len();

    for result in reader.records() {
        let record = result?;
        if record.len() > width {
            return Err(ReportError::RaggedRow {
                source_name: name.to_string(),
                line: record.position().map(|pos| pos.line()).unwrap_or_default(),
                expected: width,
                found: record.len(),
            });
        }
        let mut cells: Vec<String> = record.iter().map(str::to_string).collect();
        cells.resize(width, String::new());
        table.rows.push(cells);
    }

    debug!(source = name, row_count = table.len(), column_count = width, "read CSV export");
    Ok(table)
}

/// Renames repeated header cells to `Name.1`, `Name.2`, … so that every column
/// can be addressed by name.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<String> = Vec::with_capacity(headers.len());

    for header in headers {
        let mut candidate = header.clone();
        while result.contains(&candidate) {
            let counter = counts.entry(header.clone()).or_insert(0);
            *counter += 1;
            candidate = format!("{header}.{counter}");
        }
        result.push(candidate);
    }

    result
}
