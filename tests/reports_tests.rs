// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::models::EntryDraft;
use tallybook::{db, ledger, reports};

fn setup() -> (Connection, i64) {
    let conn = db::open_in_memory().unwrap();
    let account_id = ledger::create_account(&conn, "Checking", "checking").unwrap();
    (conn, account_id)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn category(conn: &Connection, name: &str) -> i64 {
    conn.execute(
        "INSERT INTO categories(name) VALUES (?1)",
        rusqlite::params![name],
    )
    .unwrap();
    conn.last_insert_rowid()
}

fn post(conn: &mut Connection, acct: i64, d: &str, amount: &str, category_id: Option<i64>) -> i64 {
    ledger::post_transaction(
        conn,
        &EntryDraft {
            date: date(d),
            account_id: acct,
            amount: dec(amount),
            category_id,
            budget_id: None,
            location: None,
            note: None,
        },
    )
    .unwrap()
}

#[test]
fn totals_split_income_and_expense() {
    let (mut conn, acct) = setup();
    post(&mut conn, acct, "2025-05-01", "2000", None);
    post(&mut conn, acct, "2025-05-10", "-350", None);
    post(&mut conn, acct, "2025-05-20", "-150", None);
    // Out of range.
    post(&mut conn, acct, "2025-06-01", "-999", None);

    let from = date("2025-05-01");
    let to = date("2025-05-31");
    assert_eq!(reports::total_income(&conn, from, to).unwrap(), dec("2000"));
    assert_eq!(reports::total_expense(&conn, from, to).unwrap(), dec("500"));
}

#[test]
fn adjustments_are_invisible_to_every_report() {
    let (mut conn, acct) = setup();
    let groceries = category(&conn, "Groceries");
    post(&mut conn, acct, "2025-05-10", "-350", Some(groceries));
    post(&mut conn, acct, "2025-05-01", "2000", None);
    for (d, amount) in [("2025-05-02", "500"), ("2025-05-12", "-75")] {
        ledger::post_adjustment(
            &mut conn,
            &EntryDraft {
                date: date(d),
                account_id: acct,
                amount: dec(amount),
                category_id: Some(groceries),
                budget_id: None,
                location: None,
                note: None,
            },
        )
        .unwrap();
    }

    let from = date("2025-05-01");
    let to = date("2025-05-31");
    assert_eq!(reports::total_income(&conn, from, to).unwrap(), dec("2000"));
    assert_eq!(reports::total_expense(&conn, from, to).unwrap(), dec("350"));
    let spend = reports::spend_by_category(&conn, from, to).unwrap();
    assert_eq!(spend, vec![("Groceries".to_string(), dec("350"))]);
}

#[test]
fn voided_entries_drop_out_of_aggregates() {
    let (mut conn, acct) = setup();
    post(&mut conn, acct, "2025-05-01", "2000", None);
    let id = post(&mut conn, acct, "2025-05-10", "-350", None);
    ledger::void_entry(&mut conn, id).unwrap();

    let from = date("2025-05-01");
    let to = date("2025-05-31");
    assert_eq!(reports::total_expense(&conn, from, to).unwrap(), Decimal::ZERO);
    assert!(reports::spend_by_category(&conn, from, to).unwrap().is_empty());
}

#[test]
fn spend_by_category_sorts_largest_first() {
    let (mut conn, acct) = setup();
    let groceries = category(&conn, "Groceries");
    let dining = category(&conn, "Dining");
    post(&mut conn, acct, "2025-05-03", "-40", Some(dining));
    post(&mut conn, acct, "2025-05-05", "-120", Some(groceries));
    post(&mut conn, acct, "2025-05-07", "-60", Some(groceries));
    post(&mut conn, acct, "2025-05-09", "-15", None);

    let spend =
        reports::spend_by_category(&conn, date("2025-05-01"), date("2025-05-31")).unwrap();
    assert_eq!(
        spend,
        vec![
            ("Groceries".to_string(), dec("180")),
            ("Dining".to_string(), dec("40")),
            ("(uncategorized)".to_string(), dec("15")),
        ]
    );
}

#[test]
fn cashflow_groups_by_month() {
    let (mut conn, acct) = setup();
    post(&mut conn, acct, "2025-04-01", "1000", None);
    post(&mut conn, acct, "2025-04-15", "-200", None);
    post(&mut conn, acct, "2025-05-01", "1100", None);
    post(&mut conn, acct, "2025-05-20", "-300", None);

    let flows = reports::cashflow_by_month(&conn, 12).unwrap();
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].month, "2025-04");
    assert_eq!(flows[0].income, dec("1000"));
    assert_eq!(flows[0].expense, dec("200"));
    assert_eq!(flows[1].month, "2025-05");
    assert_eq!(flows[1].income, dec("1100"));
    assert_eq!(flows[1].expense, dec("300"));

    let recent = reports::cashflow_by_month(&conn, 1).unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].month, "2025-05");
}
