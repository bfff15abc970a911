// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use tallybook::models::EntryDraft;
use tallybook::{cli, commands::exporter, db, ledger};
use tempfile::tempdir;

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let account_id = ledger::create_account(&conn, "Checking", "checking").unwrap();
    (conn, account_id)
}

#[test]
fn export_entries_writes_csv() {
    let (mut conn, acct) = setup();
    conn.execute("INSERT INTO categories(name) VALUES ('Groceries')", [])
        .unwrap();
    let cat_id = conn.last_insert_rowid();
    ledger::post_transaction(
        &mut conn,
        &EntryDraft {
            date: NaiveDate::parse_from_str("2025-01-02", "%Y-%m-%d").unwrap(),
            account_id: acct,
            amount: "-12.34".parse().unwrap(),
            category_id: Some(cat_id),
            budget_id: None,
            location: Some("Corner Shop".to_string()),
            note: Some("Weekly run".to_string()),
        },
    )
    .unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["tallybook", "export", "tx", "--out", &out_str]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers,
        csv::StringRecord::from(vec![
            "date", "account", "amount", "kind", "category", "budget", "location", "note",
            "voided",
        ])
    );
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][0], "2025-01-02");
    assert_eq!(&records[0][1], "Checking");
    assert_eq!(&records[0][2], "-12.34");
    assert_eq!(&records[0][3], "transaction");
    assert_eq!(&records[0][4], "Groceries");
    assert_eq!(&records[0][6], "Corner Shop");
    assert_eq!(&records[0][8], "0");
}

#[test]
fn export_includes_voided_rows_for_audit() {
    let (mut conn, acct) = setup();
    let id = ledger::post_transaction(
        &mut conn,
        &EntryDraft {
            date: NaiveDate::parse_from_str("2025-01-02", "%Y-%m-%d").unwrap(),
            account_id: acct,
            amount: "-40".parse().unwrap(),
            category_id: None,
            budget_id: None,
            location: None,
            note: None,
        },
    )
    .unwrap();
    ledger::void_entry(&mut conn, id).unwrap();

    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["tallybook", "export", "tx", "--out", &out_str]);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(&conn, export_m).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    // Original and its reversal, both flagged voided.
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| &r[8] == "1"));
}
