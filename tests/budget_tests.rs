// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::budget::{self, BudgetDraft};
use tallybook::errors::LedgerError;
use tallybook::models::{EntryDraft, RolloverPolicy};
use tallybook::{db, ledger};

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

fn make_budget(conn: &Connection, name: &str, limit: &str, rollover: RolloverPolicy) -> i64 {
    budget::create_budget(
        conn,
        &BudgetDraft {
            name: name.to_string(),
            limit_amount: dec(limit),
            rollover,
            category_ids: vec![],
        },
    )
    .unwrap()
}

fn spend(conn: &mut Connection, account_id: i64, budget_id: i64, d: &str, amount: &str) -> i64 {
    ledger::post_transaction(
        conn,
        &EntryDraft {
            date: date(d),
            account_id,
            amount: dec(amount),
            category_id: None,
            budget_id: Some(budget_id),
            location: None,
            note: None,
        },
    )
    .unwrap()
}

#[test]
fn consumption_and_remaining_for_a_period() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    spend(&mut conn, acct, b, "2025-07-03", "-120");
    spend(&mut conn, acct, b, "2025-07-19", "-80.50");
    // Next period's spend must not count.
    spend(&mut conn, acct, b, "2025-08-01", "-999");

    let balance = budget::period_balance(&conn, b, "2025-07").unwrap();
    assert_eq!(balance.opening, dec("500"));
    assert_eq!(balance.consumed, dec("200.50"));
    assert_eq!(balance.remaining, dec("299.50"));
}

#[test]
fn rollover_none_reopens_at_limit() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    spend(&mut conn, acct, b, "2025-07-03", "-100");

    let next = budget::close_period(&conn, b, "2025-07").unwrap();
    assert_eq!(next.period, "2025-08");
    assert_eq!(next.opening, dec("500"));
}

#[test]
fn rollover_same_carries_overspend() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::Same);
    spend(&mut conn, acct, b, "2025-07-03", "-550");

    let july = budget::period_balance(&conn, b, "2025-07").unwrap();
    assert_eq!(july.remaining, dec("-50"));

    let next = budget::close_period(&conn, b, "2025-07").unwrap();
    assert_eq!(next.opening, dec("450"));
}

#[test]
fn rollover_same_carries_surplus() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::Same);
    spend(&mut conn, acct, b, "2025-07-03", "-300");

    let next = budget::close_period(&conn, b, "2025-07").unwrap();
    assert_eq!(next.opening, dec("700"));
}

#[test]
fn rollover_into_credits_the_named_budget() {
    let (mut conn, acct) = setup();
    let savings = make_budget(&conn, "Savings", "0", RolloverPolicy::None);
    let b = make_budget(
        &conn,
        "Groceries",
        "500",
        RolloverPolicy::Into("Savings".to_string()),
    );
    spend(&mut conn, acct, b, "2025-07-03", "-300");

    let next = budget::close_period(&conn, b, "2025-07").unwrap();
    // The donor reopens at its limit...
    assert_eq!(next.opening, dec("500"));
    // ...and the target's next opening carries the remaining 200.
    let target = budget::period_balance(&conn, savings, "2025-08").unwrap();
    assert_eq!(target.opening, dec("200"));
}

#[test]
fn rollover_into_unknown_budget_fails() {
    let (mut conn, acct) = setup();
    let b = make_budget(
        &conn,
        "Groceries",
        "500",
        RolloverPolicy::Into("Nope".to_string()),
    );
    spend(&mut conn, acct, b, "2025-07-03", "-300");
    let err = budget::close_period(&conn, b, "2025-07").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::UnknownName { entity: "budget", .. })
    ));
}

#[test]
fn close_is_idempotent() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::Same);
    spend(&mut conn, acct, b, "2025-07-03", "-550");

    let first = budget::close_period(&conn, b, "2025-07").unwrap();
    let second = budget::close_period(&conn, b, "2025-07").unwrap();
    assert_eq!(first.opening, second.opening);
    assert_eq!(first.remaining, second.remaining);
    assert_eq!(second.opening, dec("450"));

    // Exactly one carryover row exists for the closed period.
    let rows: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM budget_carryovers WHERE from_budget=?1 AND out_of_period='2025-07'",
            [b],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn apply_transaction_rejects_foreign_entries() {
    let (mut conn, acct) = setup();
    let groceries = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let dining = make_budget(&conn, "Dining", "200", RolloverPolicy::None);
    let entry = spend(&mut conn, acct, dining, "2025-07-03", "-50");

    let err = budget::apply_transaction(&conn, groceries, entry).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::BudgetMismatch { .. })
    ));

    let ok = budget::apply_transaction(&conn, dining, entry).unwrap();
    assert_eq!(ok.consumed, dec("50"));
}

#[test]
fn transfer_moves_current_period_remaining() {
    let (conn, _) = setup();
    let groceries = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let dining = make_budget(&conn, "Dining", "200", RolloverPolicy::None);

    budget::transfer(&conn, groceries, dining, "2025-07", dec("75")).unwrap();

    assert_eq!(
        budget::get_remaining(&conn, groceries, "2025-07").unwrap(),
        dec("425")
    );
    assert_eq!(
        budget::get_remaining(&conn, dining, "2025-07").unwrap(),
        dec("275")
    );
    // The transfer is period-scoped; August is untouched.
    assert_eq!(
        budget::get_remaining(&conn, groceries, "2025-08").unwrap(),
        dec("500")
    );
}

#[test]
fn transfer_rejects_zero_and_self() {
    let (conn, _) = setup();
    let groceries = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let dining = make_budget(&conn, "Dining", "200", RolloverPolicy::None);

    let err = budget::transfer(&conn, groceries, dining, "2025-07", Decimal::ZERO).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::ZeroAmount)
    ));
    assert!(budget::transfer(&conn, groceries, groceries, "2025-07", dec("10")).is_err());
}

#[test]
fn voided_spend_releases_budget_headroom() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let entry = spend(&mut conn, acct, b, "2025-07-03", "-120");

    assert_eq!(budget::get_remaining(&conn, b, "2025-07").unwrap(), dec("380"));
    ledger::void_entry(&mut conn, entry).unwrap();
    assert_eq!(budget::get_remaining(&conn, b, "2025-07").unwrap(), dec("500"));
}

#[test]
fn adjustments_never_consume_budget() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    // Tag an adjustment with the budget directly at the store layer.
    ledger::post_adjustment(
        &mut conn,
        &EntryDraft {
            date: date("2025-07-03"),
            account_id: acct,
            amount: dec("-120"),
            category_id: None,
            budget_id: Some(b),
            location: None,
            note: None,
        },
    )
    .unwrap();
    assert_eq!(budget::get_remaining(&conn, b, "2025-07").unwrap(), dec("500"));
}

#[test]
fn unpadded_month_close_still_carries_over() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::Same);
    spend(&mut conn, acct, b, "2025-07-03", "-550");

    let next = budget::close_period(&conn, b, "2025-7").unwrap();
    assert_eq!(next.period, "2025-08");
    assert_eq!(next.opening, dec("450"));
    // The carryover row landed under the canonical key.
    let august = budget::period_balance(&conn, b, "2025-08").unwrap();
    assert_eq!(august.opening, dec("450"));
}

#[test]
fn unpadded_month_transfer_lands_in_the_canonical_period() {
    let (conn, _) = setup();
    let groceries = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let dining = make_budget(&conn, "Dining", "200", RolloverPolicy::None);

    budget::transfer(&conn, groceries, dining, "2025-7", dec("75")).unwrap();
    assert_eq!(
        budget::get_remaining(&conn, dining, "2025-07").unwrap(),
        dec("275")
    );
}

#[test]
fn malformed_period_is_rejected() {
    let (conn, _) = setup();
    let groceries = make_budget(&conn, "Groceries", "500", RolloverPolicy::None);
    let dining = make_budget(&conn, "Dining", "200", RolloverPolicy::None);

    assert!(budget::period_balance(&conn, groceries, "2025-13").is_err());
    assert!(budget::close_period(&conn, groceries, "July 2025").is_err());
    assert!(budget::transfer(&conn, groceries, dining, "07-2025", dec("10")).is_err());
}

#[test]
fn year_boundary_rolls_into_january() {
    let (mut conn, acct) = setup();
    let b = make_budget(&conn, "Groceries", "500", RolloverPolicy::Same);
    spend(&mut conn, acct, b, "2025-12-10", "-100");

    let next = budget::close_period(&conn, b, "2025-12").unwrap();
    assert_eq!(next.period, "2026-01");
    assert_eq!(next.opening, dec("900"));
}
