//! Integration tests for the icpp-breakdown CLI.
//!
//! These tests run the actual binary in a scratch directory and check the
//! console output and the report files it writes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SHARED_STRINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sst>
<si><t>Transactions</t></si>
<si><t>Gateway UUID</t></si>
<si><t>Merchant</t></si>
<si><t>Amount</t></si>
<si><t>Currency</t></si>
<si><t>Card Type</t></si>
<si><t>Payment Type</t></si>
<si><t>T1</t></si>
<si><t>Hong Kong Store</t></si>
<si><t>HKD</t></si>
<si><t>VISA</t></si>
<si><t>T2</t></si>
<si><t>Refund</t></si>
</sst>"#;

const WORKSHEET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet><sheetData>
<row r="1"><c r="A1" t="s"><v>0</v></c></row>
<row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2" t="s"><v>2</v></c><c r="C2" t="s"><v>3</v></c><c r="D2" t="s"><v>4</v></c><c r="E2" t="s"><v>5</v></c><c r="F2" t="s"><v>6</v></c></row>
<row r="3"><c r="A3" t="s"><v>7</v></c><c r="B3" t="s"><v>8</v></c><c r="C3"><v>100</v></c><c r="D3" t="s"><v>9</v></c><c r="E3" t="s"><v>10</v></c></row>
<row r="4"><c r="A4" t="s"><v>11</v></c><c r="B4" t="s"><v>8</v></c><c r="C4"><v>50</v></c><c r="D4" t="s"><v>9</v></c><c r="E4" t="s"><v>10</v></c><c r="F4" t="s"><v>12</v></c></row>
</sheetData></worksheet>"#;

const FEES: &str = "NP Transaction ID,MDR Amount,MDR Currency,Interchange Amount,Scheme Fee Bucket Amount,Gateway Fee Amount
T1,3.00,HKD,1.50,0.30,0.10
T2,1.00,HKD,0.50,0.10,0
";

/// Write a minimal workbook and fee export into `dir`.
fn write_inputs(dir: &Path) {
    let file = fs::File::create(dir.join("transactions.xlsx")).unwrap();
    let mut zip = ZipWriter::new(file);
    zip.start_file("xl/sharedStrings.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(SHARED_STRINGS.as_bytes()).unwrap();
    zip.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(WORKSHEET.as_bytes()).unwrap();
    zip.finish().unwrap();

    fs::write(dir.join("fees.csv"), FEES).unwrap();
}

fn command_in(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("icpp-breakdown").unwrap();
    cmd.current_dir(dir);
    cmd
}

#[test]
fn test_full_run_writes_reports() {
    let tmp = TempDir::new().unwrap();
    write_inputs(tmp.path());

    command_in(tmp.path())
        .args(["transactions.xlsx", "fees.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("IC++ PRICING BREAKDOWN ANALYSIS"))
        .stdout(predicate::str::contains("Total Transactions Processed: 1"))
        .stdout(predicate::str::contains("Refund transaction: 1"))
        .stdout(predicate::str::contains("REGION: HONG KONG (HK)"))
        .stdout(predicate::str::contains("HK$3.00"))
        .stdout(predicate::str::contains("icpp_breakdown_report.csv"));

    let csv = fs::read_to_string(tmp.path().join("icpp_breakdown_report.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Region,CardType,TxnCount,TotalVolume,Currency,IC_Total"));
    assert!(lines[1].starts_with("HK,VISA,1,100.00,HKD,1.50,1.50,0.30,0.30,1.20,1.20,0.10,"));
    assert!(lines[1].ends_with(",1.10,3.00,3.00"));

    let html = fs::read_to_string(tmp.path().join("icpp_breakdown_report.html")).unwrap();
    assert!(html.contains("HONG KONG (HK)"));
    assert!(html.contains("Refund transaction"));
}

#[test]
fn test_missing_arguments() {
    let tmp = TempDir::new().unwrap();

    command_in(tmp.path())
        .arg("transactions.xlsx")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing input file"));
}

#[test]
fn test_nonexistent_spreadsheet() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("fees.csv"), FEES).unwrap();

    command_in(tmp.path())
        .args(["nope.xlsx", "fees.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_corrupt_archive_writes_nothing() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("transactions.xlsx"), b"definitely not a zip").unwrap();
    fs::write(tmp.path().join("fees.csv"), FEES).unwrap();

    command_in(tmp.path())
        .args(["transactions.xlsx", "fees.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    assert!(!tmp.path().join("icpp_breakdown_report.csv").exists());
    assert!(!tmp.path().join("icpp_breakdown_report.html").exists());
}

#[test]
fn test_missing_fee_file() {
    let tmp = TempDir::new().unwrap();
    write_inputs(tmp.path());

    command_in(tmp.path())
        .args(["transactions.xlsx", "missing.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));

    assert!(!tmp.path().join("icpp_breakdown_report.csv").exists());
}
