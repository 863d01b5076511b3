use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::yard::erp::classify;
use crate::yard::erp::dispatch::{self, Mailer};
use crate::yard::erp::error::{ReportError, Result};
use crate::yard::erp::flatten::{build_customer_workbook, report_file_name};
use crate::yard::erp::io::{csv_read, excel_read, excel_write};
use crate::yard::erp::model::{ClassifiedSet, DispatchReport, Table};

/// Number of rows shown by a preview unless the caller asks otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// One uploaded input: its display name and raw contents.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads a file from disk, naming it after the path.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ReportError::MissingInput(path.to_path_buf()));
        }
        Ok(Self::new(path.display().to_string(), fs::read(path)?))
    }
}

/// Loads every inventory export, stacks them, and classifies the result.
#[instrument(level = "info", skip_all, fields(file_count = inventory.len()))]
pub fn prepare(inventory: &[UploadedFile]) -> Result<ClassifiedSet> {
    if inventory.is_empty() {
        return Err(ReportError::NoInventory);
    }

    let tables = inventory
        .iter()
        .map(|file| csv_read::read_table(&file.name, &file.bytes))
        .collect::<Result<Vec<Table>>>()?;
    let master = Table::concat(&tables);
    info!(row_count = master.len(), column_count = master.columns.len(), "consolidated inventory");

    let set = classify::classify(&master)?;
    info!(record_count = set.len(), "classified transshipment records");
    Ok(set)
}

/// Prepares the inventory, loads the contact directory from `settings`, and
/// mails one report per contactable customer, calling `on_sent` as each one
/// goes out.
#[instrument(level = "info", skip_all, fields(settings = %settings.name))]
pub fn send_reports(
    inventory: &[UploadedFile],
    settings: &UploadedFile,
    sender: &str,
    mailer: &dyn Mailer,
    on_sent: impl FnMut(&str),
) -> Result<DispatchReport> {
    let set = prepare(inventory)?;
    let contacts = excel_read::read_contacts(&settings.bytes)?;
    debug!(contact_count = contacts.len(), "contact directory ready");
    dispatch::dispatch(&set, &contacts, sender, mailer, on_sent)
}

/// Dry run of [`send_reports`]: writes each contactable customer's workbook to
/// `output_dir` and returns the written paths. Customers whose names map to
/// the same file name are numbered `_Report (2).xlsx`, `_Report (3).xlsx`, …
/// so no report replaces another.
#[instrument(
    level = "info",
    skip_all,
    fields(settings = %settings.name, output = %output_dir.display())
)]
pub fn export_reports(
    inventory: &[UploadedFile],
    settings: &UploadedFile,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let set = prepare(inventory)?;
    let contacts = excel_read::read_contacts(&settings.bytes)?;
    fs::create_dir_all(output_dir)?;

    let mut written: Vec<PathBuf> = Vec::new();
    let mut used: HashSet<String> = HashSet::new();
    for customer in set.customers()? {
        if contacts.lookup(customer).is_none() {
            warn!(%customer, "no contact address, skipping customer");
            continue;
        }
        let workbook = build_customer_workbook(&set.batch_for(customer)?);
        let path = output_dir.join(unique_file_name(customer, &mut used));
        excel_write::write_workbook(&path, &workbook)?;
        debug!(%customer, path = %path.display(), "report written");
        written.push(path);
    }

    info!(report_count = written.len(), "reports exported");
    Ok(written)
}

/// Sanitised report file name for `customer`, numbered when an earlier
/// customer already took it. File names are compared case-insensitively.
fn unique_file_name(customer: &str, used: &mut HashSet<String>) -> String {
    let file_name = report_file_name(&safe_file_name(customer));
    let stem = file_name.strip_suffix(".xlsx").unwrap_or(&file_name);
    let mut candidate = file_name.clone();
    let mut counter = 1;
    while !used.insert(candidate.to_lowercase()) {
        counter += 1;
        candidate = format!("{stem} ({counter}).xlsx");
    }
    candidate
}

fn safe_file_name(name: &str) -> String {
    name.chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect()
}
