use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xlsx};
use tracing::{debug, warn};

use crate::yard::erp::error::{ReportError, Result};
use crate::yard::erp::model::{CUSTOMER_COLUMN, ContactDirectory};

/// Sheet in the settings workbook holding the customer contacts.
pub const CONTACTS_SHEET: &str = "Contacts";
/// Contacts column holding the recipient address.
pub const EMAIL_COLUMN: &str = "Email Address";

/// Reads the [`ContactDirectory`] from an in-memory settings workbook.
pub fn read_contacts(bytes: &[u8]) -> Result<ContactDirectory> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec()))?;
    let range = read_required_sheet(&mut workbook, CONTACTS_SHEET)?;
    parse_contacts(&range)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ReportError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ReportError::from)?;
    Ok(range)
}

fn parse_contacts(range: &Range<DataType>) -> Result<ContactDirectory> {
    let headers: Vec<String> = match range.rows().next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => Vec::new(),
    };

    let name_idx = header_index(&headers, CUSTOMER_COLUMN)?;
    let email_idx = header_index(&headers, EMAIL_COLUMN)?;

    let mut contacts = ContactDirectory::new();
    for row in range.rows().skip(1) {
        let customer = cell_to_string(row.get(name_idx));
        let email = cell_to_string(row.get(email_idx));
        let email = email.trim();
        if customer.is_empty() || email.is_empty() {
            continue;
        }
        if let Some(previous) = contacts.insert(customer.clone(), email) {
            warn!(%customer, %previous, "duplicate contact entry, keeping the later address");
        }
    }

    debug!(contact_count = contacts.len(), "loaded contact directory");
    Ok(contacts)
}

fn header_index(headers: &[String], column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header == column)
        .ok_or_else(|| ReportError::MissingColumn {
            column: column.to_string(),
            table: format!("sheet '{CONTACTS_SHEET}'"),
        })
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
