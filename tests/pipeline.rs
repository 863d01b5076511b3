mod common;

use common::{RecordingMailer, SENDER, settings, upload};
use yard_erp::ReportError;
use yard_erp::pipeline::{self, DEFAULT_PREVIEW_ROWS};

#[test]
fn acme_receives_both_rows_and_beta_is_excluded() {
    let inventory = vec![upload("yard_a.csv", common::YARD_A)];
    let settings = settings(&[("Acme", "ops@acme.example"), ("Beta", "ops@beta.example")]);
    let mailer = RecordingMailer::default();

    let report = pipeline::send_reports(&inventory, &settings, SENDER, &mailer, |_| {})
        .expect("reports sent");

    assert_eq!(report.sent, vec!["Acme"]);
    assert!(report.skipped.is_empty());
    assert_eq!(mailer.recipients(), vec!["ops@acme.example"]);

    let raw = mailer.raw_messages();
    assert!(raw[0].contains("Subject: Inventory Report - Acme"));
    assert!(raw[0].contains("filename=\"Acme_Report.xlsx\""));
}

#[test]
fn several_exports_are_consolidated_before_classification() {
    let inventory = vec![
        upload("yard_a.csv", common::YARD_A),
        upload("yard_b.csv", common::YARD_B),
    ];
    let set = pipeline::prepare(&inventory).expect("inventory prepared");

    assert_eq!(set.len(), 4);
    assert_eq!(
        set.customers().expect("customer column"),
        vec!["Acme", "Gamma", "Beta"]
    );
    let labels: Vec<&str> = set.records.iter().map(|record| record.bucket.label()).collect();
    assert_eq!(labels, vec!["1 to 14", "91 Above", "1 to 14", "15 to 90"]);
}

#[test]
fn preview_is_capped() {
    let mut source = String::from("Customer Name,Category,Days stored\n");
    for idx in 0..25 {
        source.push_str(&format!("Cust{idx},Transshipment,{idx}\n"));
    }
    let set = pipeline::prepare(&[upload("big.csv", &source)]).expect("inventory prepared");

    assert_eq!(set.preview(DEFAULT_PREVIEW_ROWS).len(), 10);
    assert_eq!(set.preview(100).len(), 25);

    let json = serde_json::to_value(set.preview_rows(2)).expect("preview serialised");
    assert_eq!(json[1]["Customer Name"], "Cust1");
    assert_eq!(json[1]["Ageing"], "1 to 14");

    let text = serde_json::to_string(&set.preview_rows(1)).expect("preview serialised");
    assert_eq!(
        text,
        r#"[{"Customer Name":"Cust0","Category":"Transshipment","Days stored":"0","Ageing":"1 to 14"}]"#
    );
}

#[test]
fn no_inventory_is_an_error() {
    let error = pipeline::prepare(&[]).expect_err("nothing uploaded");
    assert!(matches!(error, ReportError::NoInventory));
}

#[test]
fn export_writes_one_workbook_per_contactable_customer() {
    let inventory = vec![
        upload("yard_a.csv", common::YARD_A),
        upload("yard_b.csv", common::YARD_B),
    ];
    let settings = settings(&[("Acme", "ops@acme.example"), ("Beta", "ops@beta.example")]);
    let temp_dir = tempfile::tempdir().expect("temporary directory");

    let written = pipeline::export_reports(&inventory, &settings, temp_dir.path())
        .expect("reports exported");

    assert_eq!(
        written,
        vec![
            temp_dir.path().join("Acme_Report.xlsx"),
            temp_dir.path().join("Beta_Report.xlsx"),
        ]
    );

    let beta = std::fs::read(&written[1]).expect("Beta workbook read");
    let rows = common::read_sheet(beta);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], "Beta");
    assert_eq!(rows[1][5], "15 to 90");
}

#[test]
fn preview_works_without_customer_column() {
    let set = pipeline::prepare(&[upload("p.csv", "Category,Days stored\nTransshipment,10\n")])
        .expect("inventory prepared");

    assert_eq!(set.len(), 1);
    let json = serde_json::to_value(set.preview_rows(DEFAULT_PREVIEW_ROWS))
        .expect("preview serialised");
    assert_eq!(json[0]["Ageing"], "1 to 14");
}

#[test]
fn export_numbers_colliding_file_names() {
    let inventory = vec![upload(
        "yard.csv",
        "Customer Name,Category,Days stored\nA/B,Transshipment,5\nA_B,Transshipment,50\n",
    )];
    let settings = settings(&[("A/B", "ab@example.com"), ("A_B", "a_b@example.com")]);
    let temp_dir = tempfile::tempdir().expect("temporary directory");

    let written = pipeline::export_reports(&inventory, &settings, temp_dir.path())
        .expect("reports exported");

    assert_eq!(
        written,
        vec![
            temp_dir.path().join("A_B_Report.xlsx"),
            temp_dir.path().join("A_B_Report (2).xlsx"),
        ]
    );
    let on_disk = std::fs::read_dir(temp_dir.path())
        .expect("output listed")
        .count();
    assert_eq!(on_disk, 2);

    let first = common::read_sheet(std::fs::read(&written[0]).expect("first workbook read"));
    let second = common::read_sheet(std::fs::read(&written[1]).expect("second workbook read"));
    assert_eq!(first[1][0], "A/B");
    assert_eq!(second[1][0], "A_B");
}
