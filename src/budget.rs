// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget accounting over monthly periods.
//!
//! Period state is derived on every read from the ledger plus two small
//! append-style tables: carryover rows written by `close_period` (one per
//! budget and closed period, upserted) and on-demand transfer rows. Closing
//! the same period twice with identical inputs rewrites the identical
//! carryover row, so retries are harmless.

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::errors::LedgerError;
use crate::ledger;
use crate::models::{Budget, BudgetPeriodBalance, EntryKind, RolloverPolicy};
use crate::utils::{
    next_period, parse_month, period_end, period_of, period_start, prev_period, stored_decimal,
};

pub struct BudgetDraft {
    pub name: String,
    pub limit_amount: Decimal,
    pub rollover: RolloverPolicy,
    pub category_ids: Vec<i64>,
}

pub fn create_budget(conn: &Connection, draft: &BudgetDraft) -> Result<i64> {
    if let RolloverPolicy::Into(target) = &draft.rollover {
        if *target == draft.name {
            bail!("Rollover target must name a different budget; use 'same' instead");
        }
    }
    conn.execute(
        "INSERT INTO budgets(name, limit_amount, rollover) VALUES (?1, ?2, ?3)",
        params![
            draft.name,
            draft.limit_amount.to_string(),
            draft.rollover.encode()
        ],
    )
    .with_context(|| format!("Create budget '{}'", draft.name))?;
    let budget_id = conn.last_insert_rowid();
    for cat_id in &draft.category_ids {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE id=?1",
                params![cat_id],
                |r| r.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(LedgerError::InvalidReference {
                entity: "category",
                id: *cat_id,
            }
            .into());
        }
        conn.execute(
            "INSERT INTO budget_categories(budget_id, category_id) VALUES (?1, ?2)
             ON CONFLICT(budget_id, category_id) DO NOTHING",
            params![budget_id, cat_id],
        )?;
    }
    Ok(budget_id)
}

pub fn get_budget(conn: &Connection, budget_id: i64) -> Result<Budget> {
    let row = conn
        .query_row(
            "SELECT id, name, limit_amount, rollover FROM budgets WHERE id=?1",
            params![budget_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;
    let (id, name, limit_amount, rollover) = row.ok_or(LedgerError::InvalidReference {
        entity: "budget",
        id: budget_id,
    })?;
    Ok(Budget {
        id,
        name,
        limit_amount: stored_decimal(&limit_amount, "budgets.limit_amount")?,
        rollover: RolloverPolicy::parse(&rollover)?,
    })
}

pub fn list_budgets(conn: &Connection) -> Result<Vec<Budget>> {
    let mut stmt = conn.prepare("SELECT id FROM budgets ORDER BY name")?;
    let ids = stmt.query_map([], |r| r.get::<_, i64>(0))?;
    let mut out = Vec::new();
    for id in ids {
        out.push(get_budget(conn, id?)?);
    }
    Ok(out)
}

/// The budget a category belongs to, when it belongs to exactly one. Used by
/// the transaction command to auto-tag postings.
pub fn budget_for_category(conn: &Connection, category_id: i64) -> Result<Option<i64>> {
    let mut stmt =
        conn.prepare("SELECT budget_id FROM budget_categories WHERE category_id=?1 LIMIT 2")?;
    let ids: Vec<i64> = stmt
        .query_map(params![category_id], |r| r.get(0))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(if ids.len() == 1 { Some(ids[0]) } else { None })
}

/// Positive spend tagged with the budget in the period. Expenses are stored
/// negative, so consumption is the negated sum; a tagged refund therefore
/// gives headroom back. Adjustments and voided pairs never count.
fn consumed(conn: &Connection, budget_id: i64, period: &str) -> Result<Decimal> {
    let from = period_start(period)?;
    let to = period_end(period)?;
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM entries
         WHERE budget_id=?1 AND voided=0 AND kind=?2 AND date>=?3 AND date<=?4",
    )?;
    let mut rows = stmt.query(params![
        budget_id,
        EntryKind::Transaction.as_str(),
        from.to_string(),
        to.to_string()
    ])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += stored_decimal(&s, "entries.amount")?;
    }
    Ok(-total)
}

/// Opening balance: the limit plus whatever the previous period's closes
/// carried into this budget.
fn opening(conn: &Connection, budget: &Budget, period: &str) -> Result<Decimal> {
    let prev = prev_period(period)?;
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM budget_carryovers WHERE to_budget=?1 AND out_of_period=?2",
    )?;
    let mut rows = stmt.query(params![budget.id, prev])?;
    let mut carried = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        carried += stored_decimal(&s, "budget_carryovers.amount")?;
    }
    Ok(budget.limit_amount + carried)
}

fn transfers_net(conn: &Connection, budget_id: i64, period: &str) -> Result<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT from_budget, to_budget, amount FROM budget_transfers
         WHERE period=?1 AND (from_budget=?2 OR to_budget=?2)",
    )?;
    let mut rows = stmt.query(params![period, budget_id])?;
    let mut net = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let from: i64 = r.get(0)?;
        let to: i64 = r.get(1)?;
        let s: String = r.get(2)?;
        let amount = stored_decimal(&s, "budget_transfers.amount")?;
        if to == budget_id {
            net += amount;
        }
        if from == budget_id {
            net -= amount;
        }
    }
    Ok(net)
}

/// Derived period state; `remaining` may go negative on overspend. The
/// period is normalized before any lookup so an unpadded month can never
/// miss the zero-padded carryover and transfer keys.
pub fn period_balance(
    conn: &Connection,
    budget_id: i64,
    period: &str,
) -> Result<BudgetPeriodBalance> {
    let period = parse_month(period)?;
    let budget = get_budget(conn, budget_id)?;
    let opening = opening(conn, &budget, &period)?;
    let consumed = consumed(conn, budget_id, &period)?;
    let remaining = opening - consumed + transfers_net(conn, budget_id, &period)?;
    Ok(BudgetPeriodBalance {
        budget_id,
        period,
        opening,
        consumed,
        remaining,
    })
}

pub fn get_remaining(conn: &Connection, budget_id: i64, period: &str) -> Result<Decimal> {
    Ok(period_balance(conn, budget_id, period)?.remaining)
}

/// Fold one posted entry into the budget's period state. The entry must be
/// tagged with this budget; anything else is a `BudgetMismatch`. Returns the
/// refreshed balance for the entry's period.
pub fn apply_transaction(
    conn: &Connection,
    budget_id: i64,
    entry_id: i64,
) -> Result<BudgetPeriodBalance> {
    let entry = ledger::get_entry(conn, entry_id)?;
    if entry.budget_id != Some(budget_id) {
        return Err(LedgerError::BudgetMismatch {
            entry: entry_id,
            expected: budget_id,
            actual: entry.budget_id,
        }
        .into());
    }
    period_balance(conn, budget_id, &period_of(entry.date))
}

/// Close a period and open the next one per the rollover policy. Upserts the
/// single carryover row keyed by (budget, period): re-closing with identical
/// inputs rewrites the identical row. Returns the next period's balance.
pub fn close_period(
    conn: &Connection,
    budget_id: i64,
    period: &str,
) -> Result<BudgetPeriodBalance> {
    let period = parse_month(period)?;
    let budget = get_budget(conn, budget_id)?;
    let balance = period_balance(conn, budget_id, &period)?;

    match &budget.rollover {
        RolloverPolicy::None => {
            // Remaining is discarded; clear any stale row from a policy edit.
            conn.execute(
                "DELETE FROM budget_carryovers WHERE from_budget=?1 AND out_of_period=?2",
                params![budget_id, period],
            )?;
        }
        RolloverPolicy::Same => {
            upsert_carryover(conn, budget_id, &period, budget_id, balance.remaining)?;
        }
        RolloverPolicy::Into(target_name) => {
            let target: Option<i64> = conn
                .query_row(
                    "SELECT id FROM budgets WHERE name=?1",
                    params![target_name],
                    |r| r.get(0),
                )
                .optional()?;
            let target = target.ok_or_else(|| LedgerError::UnknownName {
                entity: "budget",
                name: target_name.clone(),
            })?;
            upsert_carryover(conn, budget_id, &period, target, balance.remaining)?;
        }
    }
    period_balance(conn, budget_id, &next_period(&period)?)
}

fn upsert_carryover(
    conn: &Connection,
    from_budget: i64,
    out_of_period: &str,
    to_budget: i64,
    amount: Decimal,
) -> Result<()> {
    conn.execute(
        "INSERT INTO budget_carryovers(from_budget, out_of_period, to_budget, amount)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(from_budget, out_of_period)
         DO UPDATE SET to_budget=excluded.to_budget, amount=excluded.amount",
        params![from_budget, out_of_period, to_budget, amount.to_string()],
    )?;
    Ok(())
}

/// On-demand reallocation between two budgets' current-period remaining
/// balances. Append-only; never triggered by a period close.
pub fn transfer(
    conn: &Connection,
    from_budget: i64,
    to_budget: i64,
    period: &str,
    amount: Decimal,
) -> Result<()> {
    if amount.is_zero() {
        return Err(LedgerError::ZeroAmount.into());
    }
    if from_budget == to_budget {
        bail!("Transfer source and destination budgets are the same");
    }
    let period = parse_month(period)?;
    // Both sides must resolve before the row is written.
    let _ = get_budget(conn, from_budget)?;
    let _ = get_budget(conn, to_budget)?;
    conn.execute(
        "INSERT INTO budget_transfers(from_budget, to_budget, period, amount)
         VALUES (?1, ?2, ?3, ?4)",
        params![from_budget, to_budget, period, amount.to_string()],
    )?;
    Ok(())
}
