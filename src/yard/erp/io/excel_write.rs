use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use crate::yard::erp::error::Result;
use crate::yard::erp::flatten::WorkbookData;

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = build(workbook)?;
    workbook_writer.save(path)?;
    Ok(())
}

/// Serialises the workbook into `.xlsx` bytes without touching the disk.
pub fn workbook_bytes(workbook: &WorkbookData) -> Result<Vec<u8>> {
    let mut workbook_writer = build(workbook)?;
    Ok(workbook_writer.save_to_buffer()?)
}

fn build(workbook: &WorkbookData) -> Result<Workbook> {
    let mut workbook_writer = Workbook::new();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, header)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                write_cell(worksheet, (row_idx + 1) as u32, col_idx as u16, cell)?;
            }
        }

        // A table needs at least one data row and distinct, non-blank headers.
        if !table.rows.is_empty() && headers_form_table(&table.columns) {
            let mut excel_table = rust_xlsxwriter::Table::new();
            excel_table.set_autofilter(true);
            let col_end = (table.columns.len() as u16).saturating_sub(1);
            let row_end = table.rows.len() as u32;
            worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;
        }
    }

    Ok(workbook_writer)
}

fn headers_form_table(columns: &[String]) -> bool {
    let mut seen: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let key = column.trim().to_lowercase();
        if key.is_empty() || seen.contains(&key) {
            return false;
        }
        seen.push(key);
    }
    !seen.is_empty()
}

/// Numeric cells are stored as numbers, empty cells are left blank.
fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &str) -> Result<()> {
    if cell.is_empty() {
        return Ok(());
    }
    match cell.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => {
            worksheet.write_number(row, col, number)?;
        }
        _ => {
            worksheet.write_string(row, col, cell)?;
        }
    }
    Ok(())
}
