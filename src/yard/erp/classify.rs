use tracing::debug;

use crate::yard::erp::error::{ReportError, Result};
use crate::yard::erp::model::{
    AGEING_COLUMN, AgingBucket, CATEGORY_COLUMN, ClassifiedSet, DAYS_STORED_COLUMN, Record,
    Table,
};

/// Category fragment selecting the rows that belong in the report.
pub const TRANSSHIPMENT: &str = "transshipment";

/// Case-insensitive substring match on the transshipment category.
pub fn is_transshipment(category: &str) -> bool {
    category.to_lowercase().contains(TRANSSHIPMENT)
}

/// Parses a Days stored cell. Whole numbers are taken as-is; decimals round
/// up, which keeps every bucket threshold comparison unchanged.
pub fn parse_days(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if let Ok(days) = trimmed.parse::<i64>() {
        return Some(days);
    }
    match trimmed.parse::<f64>() {
        Ok(days) if days.is_finite() => Some(days.ceil() as i64),
        _ => None,
    }
}

/// Keeps the transshipment rows of `table` and assigns each one an aging
/// bucket. Other rows are dropped without notice. Only `Category` and
/// `Days stored` are required here.
///
/// The output header is the input header with an `Ageing` column appended, or
/// the input header unchanged when it already carries one (the label then
/// replaces the existing value).
pub fn classify(table: &Table) -> Result<ClassifiedSet> {
    let category_idx = table.require_column(CATEGORY_COLUMN)?;
    let days_idx = table.require_column(DAYS_STORED_COLUMN)?;

    let mut columns = table.columns.clone();
    let ageing_idx = match table.column_index(AGEING_COLUMN) {
        Some(idx) => idx,
        None => {
            columns.push(AGEING_COLUMN.to_string());
            columns.len() - 1
        }
    };

    let mut records = Vec::new();
    for (row_idx, row) in table.rows.iter().enumerate() {
        let category = &row[category_idx];
        if !is_transshipment(category) {
            continue;
        }

        let raw_days = &row[days_idx];
        let days_stored = parse_days(raw_days).ok_or_else(|| ReportError::InvalidDays {
            row: row_idx + 1,
            value: raw_days.clone(),
        })?;
        let bucket = AgingBucket::from_days(days_stored);

        let mut cells = row.clone();
        if ageing_idx < cells.len() {
            cells[ageing_idx] = bucket.label().to_string();
        } else {
            cells.push(bucket.label().to_string());
        }

        records.push(Record { bucket, cells });
    }

    debug!(
        input_rows = table.len(),
        kept_rows = records.len(),
        "classified inventory rows"
    );
    Ok(ClassifiedSet {
        source: table.name.clone(),
        columns,
        records,
    })
}
