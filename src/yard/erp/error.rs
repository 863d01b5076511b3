use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the different failure cases that can occur while the
/// tool loads inventory exports, classifies them, or mails the reports.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when a CSV export cannot be parsed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON serialization of the preview fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when a sheet does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when a CSV row has more cells than its header.
    #[error("{source_name}: line {line} has {found} fields but the header has {expected}")]
    RaggedRow {
        source_name: String,
        line: u64,
        expected: usize,
        found: usize,
    },

    /// Raised when a stage reads a column the loaded table does not carry.
    #[error("missing column '{column}' in {table}")]
    MissingColumn { column: String, table: String },

    /// Raised when a kept row carries a Days stored value that is not a number.
    #[error("invalid Days stored value '{value}' in row {row}")]
    InvalidDays { row: usize, value: String },

    /// Raised when a sender or recipient address does not parse.
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Raised when the attachment media type is rejected.
    #[error("invalid content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),

    /// Raised when the email message cannot be assembled.
    #[error("failed to build email: {0}")]
    Message(#[from] lettre::error::Error),

    /// Raised when the SMTP session fails to connect, authenticate, or deliver.
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Raised when the send loop stops part way. `sent` lists the customers
    /// that already received their report.
    #[error(
        "sending report to '{customer}' failed after {} successful send(s): {source}",
        .sent.len()
    )]
    Dispatch {
        customer: String,
        sent: Vec<String>,
        source: Box<ReportError>,
    },

    /// Raised when no inventory export was supplied.
    #[error("no inventory files supplied")]
    NoInventory,

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
