// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{pretty_table, stored_decimal};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

pub fn handle(conn: &Connection) -> Result<()> {
    let mut rows = Vec::new();

    // 1) Stored account balances must match the recomputed non-voided sum.
    let mut stmt = conn.prepare("SELECT id, name, balance FROM accounts ORDER BY name")?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        let name: String = r.get(1)?;
        let stored: String = r.get(2)?;
        let stored = stored_decimal(&stored, "accounts.balance")?;

        let mut sum_stmt =
            conn.prepare_cached("SELECT amount FROM entries WHERE account_id=?1 AND voided=0")?;
        let mut amounts = sum_stmt.query([id])?;
        let mut recomputed = Decimal::ZERO;
        while let Some(a) = amounts.next()? {
            let s: String = a.get(0)?;
            recomputed += stored_decimal(&s, "entries.amount")?;
        }
        if stored != recomputed {
            rows.push(vec![
                "balance_drift".into(),
                format!("{}: stored {} vs ledger {}", name, stored, recomputed),
            ]);
        }
    }

    // 2) Dangling references
    let checks = [
        (
            "entry_account_missing",
            "SELECT e.id FROM entries e LEFT JOIN accounts a ON e.account_id=a.id WHERE a.id IS NULL",
        ),
        (
            "entry_category_missing",
            "SELECT e.id FROM entries e LEFT JOIN categories c ON e.category_id=c.id WHERE e.category_id IS NOT NULL AND c.id IS NULL",
        ),
        (
            "entry_budget_missing",
            "SELECT e.id FROM entries e LEFT JOIN budgets b ON e.budget_id=b.id WHERE e.budget_id IS NOT NULL AND b.id IS NULL",
        ),
        (
            "template_account_missing",
            "SELECT t.id FROM recurrence_templates t LEFT JOIN accounts a ON t.account_id=a.id WHERE a.id IS NULL",
        ),
    ];
    for (issue, sql) in checks {
        let mut stmt = conn.prepare(sql)?;
        let mut cur = stmt.query([])?;
        while let Some(r) = cur.next()? {
            let id: i64 = r.get(0)?;
            rows.push(vec![issue.into(), format!("id {}", id)]);
        }
    }

    // 3) Reversals must point at a voided original of opposite amount.
    let mut stmt3 = conn.prepare(
        "SELECT r.id, r.amount, o.amount, o.voided FROM entries r
         JOIN entries o ON r.reversal_of=o.id",
    )?;
    let mut cur3 = stmt3.query([])?;
    while let Some(r) = cur3.next()? {
        let rid: i64 = r.get(0)?;
        let r_amount = stored_decimal(&r.get::<_, String>(1)?, "entries.amount")?;
        let o_amount = stored_decimal(&r.get::<_, String>(2)?, "entries.amount")?;
        let o_voided: bool = r.get(3)?;
        if r_amount != -o_amount || !o_voided {
            rows.push(vec!["broken_reversal".into(), format!("entry {}", rid)]);
        }
    }

    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}
