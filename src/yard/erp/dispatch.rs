//! Per-customer report delivery.
//!
//! Each customer with a contact address gets one message carrying an `.xlsx`
//! extract of their rows. Delivery goes through the [`Mailer`] trait so the
//! send loop can run against a real SMTP relay or an in-process recorder.

use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use crate::yard::erp::error::{ReportError, Result};
use crate::yard::erp::flatten::{build_customer_workbook, report_file_name};
use crate::yard::erp::io::excel_write;
use crate::yard::erp::model::{ClassifiedSet, ContactDirectory, CustomerBatch, DispatchReport};

/// Relay used when the operator does not name one.
pub const DEFAULT_SMTP_SERVER: &str = "smtp.office365.com";
/// Submission port; sessions are upgraded with STARTTLS.
pub const DEFAULT_SMTP_PORT: u16 = 587;
/// Media type of the attached workbook.
pub const XLSX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Sender identity and relay settings. The password is only exposed when the
/// SMTP credentials are built.
#[derive(Debug)]
pub struct SenderConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub address: String,
    pub password: SecretString,
}

impl SenderConfig {
    pub fn new(address: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            smtp_server: DEFAULT_SMTP_SERVER.to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            address: address.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.smtp_server = server.into();
        self.smtp_port = port;
        self
    }
}

/// Delivers one fully built message.
pub trait Mailer {
    fn send(&self, message: &Message) -> Result<()>;
}

/// Sends through an authenticated STARTTLS relay, opening a fresh session for
/// every message.
pub struct SmtpMailer<'a> {
    config: &'a SenderConfig,
}

impl<'a> SmtpMailer<'a> {
    pub fn new(config: &'a SenderConfig) -> Self {
        Self { config }
    }
}

impl Mailer for SmtpMailer<'_> {
    fn send(&self, message: &Message) -> Result<()> {
        let credentials = Credentials::new(
            self.config.address.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let transport = SmtpTransport::starttls_relay(&self.config.smtp_server)?
            .port(self.config.smtp_port)
            .credentials(credentials)
            .build();

        transport.send(message)?;
        Ok(())
    }
}

/// Renders a customer's rows into `.xlsx` bytes.
pub fn render_attachment(batch: &CustomerBatch) -> Result<Vec<u8>> {
    let workbook = build_customer_workbook(batch);
    excel_write::workbook_bytes(&workbook)
}

/// Builds the report message for `customer` with the rendered workbook
/// attached as `{customer}_Report.xlsx`.
pub fn compose_message(
    sender: &str,
    recipient: &str,
    customer: &str,
    attachment: Vec<u8>,
) -> Result<Message> {
    let from: Mailbox = sender.parse()?;
    let to: Mailbox = recipient.parse()?;
    let content_type = ContentType::parse(XLSX_MEDIA_TYPE)?;

    let body = SinglePart::plain(format!(
        "Dear {customer}, your transshipment report is attached."
    ));
    let attachment = Attachment::new(report_file_name(customer)).body(attachment, content_type);

    let message = Message::builder()
        .from(from)
        .to(to)
        .subject(format!("Inventory Report - {customer}"))
        .multipart(MultiPart::mixed().singlepart(body).singlepart(attachment))?;
    Ok(message)
}

/// Sends one report per customer in `set`, in first-appearance order.
///
/// Customers missing from `contacts` are skipped without an error. `on_sent`
/// runs after each successful send, before the next customer is processed.
/// The first failure stops the loop; the returned [`ReportError::Dispatch`]
/// names the failing customer and every customer already served.
#[instrument(
    level = "info",
    skip_all,
    fields(sender = %sender, record_count = set.len())
)]
pub fn dispatch(
    set: &ClassifiedSet,
    contacts: &ContactDirectory,
    sender: &str,
    mailer: &dyn Mailer,
    mut on_sent: impl FnMut(&str),
) -> Result<DispatchReport> {
    let mut report = DispatchReport::default();

    for customer in set.customers()? {
        let Some(recipient) = contacts.lookup(customer) else {
            warn!(%customer, "no contact address, skipping customer");
            report.skipped.push(customer.to_string());
            continue;
        };

        let outcome = set
            .batch_for(customer)
            .and_then(|batch| send_batch(&batch, sender, recipient, mailer).map(|()| batch));
        let batch = match outcome {
            Ok(batch) => batch,
            Err(error) => {
                return Err(ReportError::Dispatch {
                    customer: customer.to_string(),
                    sent: report.sent,
                    source: Box::new(error),
                });
            }
        };

        info!(%customer, %recipient, row_count = batch.records.len(), "report sent");
        on_sent(customer);
        report.sent.push(customer.to_string());
    }

    Ok(report)
}

fn send_batch(
    batch: &CustomerBatch,
    sender: &str,
    recipient: &str,
    mailer: &dyn Mailer,
) -> Result<()> {
    let attachment = render_attachment(batch)?;
    let message = compose_message(sender, recipient, &batch.customer, attachment)?;
    mailer.send(&message)
}
