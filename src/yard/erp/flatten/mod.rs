use crate::yard::erp::model::CustomerBatch;

/// Largest sheet name Excel accepts.
const MAX_SHEET_NAME: usize = 31;

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Flattens one customer's records into a single-sheet workbook. The header
/// row follows the classified column order, the ageing column included.
pub fn build_customer_workbook(batch: &CustomerBatch) -> WorkbookData {
    let rows = batch
        .records
        .iter()
        .map(|record| record.cells.clone())
        .collect();

    WorkbookData {
        tables: vec![SheetTable {
            sheet_name: sanitize_sheet_name(&batch.customer),
            columns: batch.columns.clone(),
            rows,
        }],
    }
}

/// Attachment file name used for a customer's report.
pub fn report_file_name(customer: &str) -> String {
    format!("{customer}_Report.xlsx")
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Report".to_string();
    }

    if sanitized.chars().count() > MAX_SHEET_NAME {
        sanitized = sanitized.chars().take(MAX_SHEET_NAME).collect();
    }

    sanitized
}
