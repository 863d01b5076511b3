#![allow(dead_code)]

use std::cell::RefCell;
use std::io::Cursor;

use calamine::{DataType, Range, Reader, Xlsx};
use lettre::Message;
use rust_xlsxwriter::Workbook;
use yard_erp::dispatch::Mailer;
use yard_erp::pipeline::UploadedFile;
use yard_erp::{ReportError, Result};

pub const SENDER: &str = "yard@example.com";

pub const YARD_A: &str = "\
Customer Name,Category,Days stored,Container
Acme,Transshipment,10,MSCU1000001
Acme,Transshipment,95,MSCU1000002
Beta,Storage,5,TGHU2000001
";

pub const YARD_B: &str = "\
Customer Name,Category,Days stored,Vessel
Gamma,transshipment-bulk,14,Ever Given
Beta,TRANSSHIPMENT,90,Maersk Alabama
";

pub fn upload(name: &str, contents: &str) -> UploadedFile {
    UploadedFile::new(name, contents.as_bytes())
}

/// Builds a settings workbook whose Contacts sheet lists `entries`.
pub fn settings(entries: &[(&str, &str)]) -> UploadedFile {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Contacts").expect("sheet named");
    sheet.write_string(0, 0, "Customer Name").expect("header written");
    sheet.write_string(0, 1, "Email Address").expect("header written");
    for (idx, (customer, email)) in entries.iter().enumerate() {
        let row = (idx + 1) as u32;
        sheet.write_string(row, 0, *customer).expect("name written");
        sheet.write_string(row, 1, *email).expect("email written");
    }
    let bytes = workbook.save_to_buffer().expect("workbook serialised");
    UploadedFile::new("ERP_Master_Settings.xlsx", bytes)
}

/// Reads the first sheet of an `.xlsx` buffer back as text rows.
pub fn read_sheet(bytes: Vec<u8>) -> Vec<Vec<String>> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).expect("workbook opened");
    let name = workbook.sheet_names().first().cloned().expect("one sheet");
    let range: Range<DataType> = workbook
        .worksheet_range(&name)
        .expect("sheet present")
        .expect("sheet read");
    range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect()
}

fn cell_text(cell: &DataType) -> String {
    match cell {
        DataType::String(value) => value.clone(),
        DataType::Float(value) => value.to_string(),
        DataType::Int(value) => value.to_string(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Mailer double that keeps every message and can refuse one recipient.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: RefCell<Vec<Message>>,
    pub refuse: Option<String>,
}

impl RecordingMailer {
    pub fn refusing(recipient: &str) -> Self {
        Self {
            sent: RefCell::new(Vec::new()),
            refuse: Some(recipient.to_string()),
        }
    }

    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .flat_map(|message| message.envelope().to().iter().map(ToString::to_string))
            .collect()
    }

    pub fn raw_messages(&self) -> Vec<String> {
        self.sent
            .borrow()
            .iter()
            .map(|message| String::from_utf8_lossy(&message.formatted()).into_owned())
            .collect()
    }
}

impl Mailer for RecordingMailer {
    fn send(&self, message: &Message) -> Result<()> {
        let refused = message
            .envelope()
            .to()
            .iter()
            .any(|address| Some(address.to_string()) == self.refuse);
        if refused {
            return Err(ReportError::Io(std::io::Error::other("relay refused recipient")));
        }
        self.sent.borrow_mut().push(message.clone());
        Ok(())
    }
}
