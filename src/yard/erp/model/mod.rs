use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::yard::erp::error::{ReportError, Result};

/// Column carrying the cargo category.
pub const CATEGORY_COLUMN: &str = "Category";
/// Column carrying the number of days an item has been stored.
pub const DAYS_STORED_COLUMN: &str = "Days stored";
/// Column carrying the customer the inventory belongs to.
pub const CUSTOMER_COLUMN: &str = "Customer Name";
/// Column added by classification holding the aging bucket label.
pub const AGEING_COLUMN: &str = "Ageing";

/// A loaded tabular file: ordered header plus rows of raw text cells. Every
/// row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    /// Label used in error messages, usually the uploaded file name.
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `column` in the header.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Like [`Table::column_index`] but reports a missing column as an error.
    pub fn require_column(&self, column: &str) -> Result<usize> {
        self.column_index(column)
            .ok_or_else(|| ReportError::MissingColumn {
                column: column.to_string(),
                table: self.name.clone(),
            })
    }

    /// Stacks `tables` on top of each other. The resulting header is the union
    /// of every input header in first-appearance order; cells for columns a
    /// table does not carry are left empty.
    pub fn concat(tables: &[Table]) -> Table {
        let mut columns: Vec<String> = Vec::new();
        for table in tables {
            for column in &table.columns {
                if !columns.contains(column) {
                    columns.push(column.clone());
                }
            }
        }

        let name = tables
            .iter()
            .map(|table| table.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let mut merged = Table::new(name, columns);
        merged.rows.reserve(tables.iter().map(Table::len).sum());

        for table in tables {
            let mapping: Vec<usize> = table
                .columns
                .iter()
                .filter_map(|column| merged.column_index(column))
                .collect();
            for row in &table.rows {
                let mut cells = vec![String::new(); merged.columns.len()];
                for (cell, target) in row.iter().zip(&mapping) {
                    cells[*target] = cell.clone();
                }
                merged.rows.push(cells);
            }
        }

        merged
    }
}

/// Aging tier derived from the number of days an item has been stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgingBucket {
    /// Up to and including 14 days.
    UpToFourteen,
    /// 15 to 90 days inclusive.
    FifteenToNinety,
    /// More than 90 days.
    NinetyOneAbove,
}

impl AgingBucket {
    /// Classifies a stored duration. Boundaries belong to the lower bucket.
    pub fn from_days(days: i64) -> Self {
        if days <= 14 {
            AgingBucket::UpToFourteen
        } else if days <= 90 {
            AgingBucket::FifteenToNinety
        } else {
            AgingBucket::NinetyOneAbove
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AgingBucket::UpToFourteen => "1 to 14",
            AgingBucket::FifteenToNinety => "15 to 90",
            AgingBucket::NinetyOneAbove => "91 Above",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A kept inventory row after classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub bucket: AgingBucket,
    /// Every output cell, aligned with [`ClassifiedSet::columns`], the ageing
    /// label included.
    pub cells: Vec<String>,
}

/// Result of classification: the output header and the kept records in
/// source order.
///
/// Only the columns classification needs are checked up front. The customer
/// column is looked up when records are grouped per customer.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassifiedSet {
    /// Name of the table the records came from, used in error messages.
    pub source: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl ClassifiedSet {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn customer_index(&self) -> Result<usize> {
        self.columns
            .iter()
            .position(|column| column == CUSTOMER_COLUMN)
            .ok_or_else(|| ReportError::MissingColumn {
                column: CUSTOMER_COLUMN.to_string(),
                table: self.source.clone(),
            })
    }

    /// Distinct customer names in the order they first appear.
    pub fn customers(&self) -> Result<Vec<&str>> {
        let idx = self.customer_index()?;
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            let customer = record.cells[idx].as_str();
            if !seen.contains(&customer) {
                seen.push(customer);
            }
        }
        Ok(seen)
    }

    /// Collects the records belonging to `customer`.
    pub fn batch_for(&self, customer: &str) -> Result<CustomerBatch> {
        let idx = self.customer_index()?;
        Ok(CustomerBatch {
            customer: customer.to_string(),
            columns: self.columns.clone(),
            records: self
                .records
                .iter()
                .filter(|record| record.cells[idx] == customer)
                .cloned()
                .collect(),
        })
    }

    /// The first `limit` records.
    pub fn preview(&self, limit: usize) -> &[Record] {
        &self.records[..limit.min(self.records.len())]
    }

    /// The first `limit` records paired with their column names. Each row
    /// serialises as an object whose keys keep the column order.
    pub fn preview_rows(&self, limit: usize) -> Vec<PreviewRow<'_>> {
        self.preview(limit)
            .iter()
            .map(|record| PreviewRow {
                columns: &self.columns,
                cells: &record.cells,
            })
            .collect()
    }
}

/// Borrowed view of one previewed record.
#[derive(Debug, Clone, Copy)]
pub struct PreviewRow<'a> {
    columns: &'a [String],
    cells: &'a [String],
}

impl Serialize for PreviewRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, cell) in self.columns.iter().zip(self.cells) {
            map.serialize_entry(column, cell)?;
        }
        map.end()
    }
}

/// All classified records for one customer, built per send cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerBatch {
    pub customer: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Customer name → email address lookup loaded from the settings workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactDirectory {
    entries: BTreeMap<String, String>,
}

impl ContactDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the address for `customer`, returning the previous
    /// address if there was one.
    pub fn insert(&mut self, customer: impl Into<String>, email: impl Into<String>) -> Option<String> {
        self.entries.insert(customer.into(), email.into())
    }

    pub fn lookup(&self, customer: &str) -> Option<&str> {
        self.entries.get(customer).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of a completed send loop.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DispatchReport {
    /// Customers that received a report, in send order.
    pub sent: Vec<String>,
    /// Customers without a contact address.
    pub skipped: Vec<String>,
}
