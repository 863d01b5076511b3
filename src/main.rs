use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use yard_erp::dispatch::{DEFAULT_SMTP_PORT, DEFAULT_SMTP_SERVER, SenderConfig, SmtpMailer};
use yard_erp::model::ClassifiedSet;
use yard_erp::pipeline::{self, DEFAULT_PREVIEW_ROWS, UploadedFile};
use yard_erp::{ReportError, Result};

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_tracing().and_then(|()| run(cli)) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ReportError::Logging(error.to_string()))
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Preview(args) => execute_preview(args),
        Command::Send(args) => execute_send(args),
        Command::Export(args) => execute_export(args),
    }
}

fn execute_preview(args: PreviewArgs) -> Result<()> {
    let inventory = load_inventory(&args.csv)?;
    let set = pipeline::prepare(&inventory)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&set.preview_rows(args.rows))?);
    } else {
        print_preview(&set, args.rows);
    }
    Ok(())
}

fn execute_send(args: SendArgs) -> Result<()> {
    let inventory = load_inventory(&args.csv)?;
    let settings = UploadedFile::from_path(&args.settings)?;

    // Only the first provider install succeeds; later calls are harmless.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let sender = SenderConfig::new(args.from, args.password)
        .with_server(args.smtp_server, args.smtp_port);
    let mailer = SmtpMailer::new(&sender);

    let report = pipeline::send_reports(&inventory, &settings, &sender.address, &mailer, |name| {
        println!("Sent to {name}");
    })?;
    if !report.skipped.is_empty() {
        println!("Skipped (no contact): {}", report.skipped.join(", "));
    }
    println!("All emails sent successfully.");
    Ok(())
}

fn execute_export(args: ExportArgs) -> Result<()> {
    let inventory = load_inventory(&args.csv)?;
    let settings = UploadedFile::from_path(&args.settings)?;
    let written = pipeline::export_reports(&inventory, &settings, &args.output)?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn load_inventory(paths: &[PathBuf]) -> Result<Vec<UploadedFile>> {
    paths
        .iter()
        .map(|path| UploadedFile::from_path(path))
        .collect()
}

fn print_preview(set: &ClassifiedSet, rows: usize) {
    let preview = set.preview(rows);
    let mut widths: Vec<usize> = set.columns.iter().map(|c| c.chars().count()).collect();
    for record in preview {
        for (width, cell) in widths.iter_mut().zip(&record.cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", render(&set.columns).trim_end());
    for record in preview {
        println!("{}", render(&record.cells).trim_end());
    }
    println!("({} of {} transshipment rows)", preview.len(), set.len());
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Consolidate yard inventory exports and email per-customer transshipment reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the first classified transshipment rows.
    Preview(PreviewArgs),
    /// Email each customer their report.
    Send(SendArgs),
    /// Write each customer's report to a directory instead of emailing it.
    Export(ExportArgs),
}

#[derive(clap::Args)]
struct PreviewArgs {
    /// Inventory CSV export. Repeat for several files.
    #[arg(long, required = true)]
    csv: Vec<PathBuf>,

    /// Number of rows to show.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    rows: usize,

    /// Print the rows as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
struct SendArgs {
    /// Inventory CSV export. Repeat for several files.
    #[arg(long, required = true)]
    csv: Vec<PathBuf>,

    /// Settings workbook containing the Contacts sheet.
    #[arg(long)]
    settings: PathBuf,

    /// Sender email address, also used as the SMTP login.
    #[arg(long)]
    from: String,

    /// SMTP app password.
    #[arg(long, env = "YARD_ERP_SMTP_PASSWORD", hide_env_values = true)]
    password: String,

    /// SMTP relay host.
    #[arg(long, default_value = DEFAULT_SMTP_SERVER)]
    smtp_server: String,

    /// SMTP submission port.
    #[arg(long, default_value_t = DEFAULT_SMTP_PORT)]
    smtp_port: u16,
}

#[derive(clap::Args)]
struct ExportArgs {
    /// Inventory CSV export. Repeat for several files.
    #[arg(long, required = true)]
    csv: Vec<PathBuf>,

    /// Settings workbook containing the Contacts sheet.
    #[arg(long)]
    settings: PathBuf,

    /// Directory receiving the generated workbooks.
    #[arg(long)]
    output: PathBuf,
}
