// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::{cli, commands::importer, db, ledger};
use tempfile::tempdir;

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let account_id = ledger::create_account(&conn, "Checking", "checking").unwrap();
    (conn, account_id)
}

fn run_import(conn: &mut Connection, path: &str, account: &str) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "tallybook", "import", "tx", "--file", path, "--account", account,
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(conn, import_m)
    } else {
        panic!("no import subcommand");
    }
}

#[test]
fn import_posts_through_the_ledger() {
    let (mut conn, acct) = setup();
    conn.execute("INSERT INTO categories(name) VALUES ('Groceries')", [])
        .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("tx.csv");
    std::fs::write(
        &path,
        "date,amount,category,location,note\n\
         2025-01-02,-12.34,Groceries,Corner Shop,Weekly run\n\
         2025-01-05,2000,,,Salary\n",
    )
    .unwrap();

    run_import(&mut conn, &path.to_string_lossy(), "Checking").unwrap();

    let entries = ledger::list_entries(&conn, acct, None, None).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].location.as_deref(), Some("Corner Shop"));
    let account = ledger::get_account(&conn, acct).unwrap();
    assert_eq!(account.balance, "1987.66".parse::<Decimal>().unwrap());
}

#[test]
fn import_rejects_zero_amount_rows() {
    let (mut conn, acct) = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("tx.csv");
    std::fs::write(&path, "date,amount,category,location,note\n2025-01-02,0,,,\n").unwrap();

    assert!(run_import(&mut conn, &path.to_string_lossy(), "Checking").is_err());
    let entries = ledger::list_entries(&conn, acct, None, None).unwrap();
    assert!(entries.is_empty());
}

#[test]
fn import_rejects_unknown_category() {
    let (mut conn, _) = setup();
    let dir = tempdir().unwrap();
    let path = dir.path().join("tx.csv");
    std::fs::write(
        &path,
        "date,amount,category,location,note\n2025-01-02,-5,Nope,,\n",
    )
    .unwrap();
    assert!(run_import(&mut conn, &path.to_string_lossy(), "Checking").is_err());
}
