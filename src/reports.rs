// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only aggregates over the ledger. Every query here filters to
//! `kind='transaction'` and `voided=0`, so adjustments and voided pairs can
//! never leak into analytics. Nothing in this module writes.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::EntryKind;
use crate::utils::stored_decimal;

fn sum_amounts(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
    sign_filter: &str,
) -> Result<Decimal> {
    let sql = format!(
        "SELECT amount FROM entries
         WHERE kind=?1 AND voided=0 AND date>=?2 AND date<=?3 AND {}",
        sign_filter
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![
        EntryKind::Transaction.as_str(),
        from.to_string(),
        to.to_string()
    ])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += stored_decimal(&s, "entries.amount")?;
    }
    Ok(total)
}

pub fn total_income(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Decimal> {
    sum_amounts(conn, from, to, "amount>0")
}

pub fn total_expense(conn: &Connection, from: NaiveDate, to: NaiveDate) -> Result<Decimal> {
    Ok(-sum_amounts(conn, from, to, "amount<0")?)
}

/// Spend per category over the range, largest first. Uncategorized spend is
/// reported under "(uncategorized)".
pub fn spend_by_category(
    conn: &Connection,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(String, Decimal)>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, e.amount FROM entries e
         LEFT JOIN categories c ON e.category_id=c.id
         WHERE e.kind=?1 AND e.voided=0 AND e.date>=?2 AND e.date<=?3
           AND e.amount<0",
    )?;
    let mut rows = stmt.query(params![
        EntryKind::Transaction.as_str(),
        from.to_string(),
        to.to_string()
    ])?;
    let mut agg: BTreeMap<String, Decimal> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let cat: Option<String> = r.get(0)?;
        let s: String = r.get(1)?;
        let amount = stored_decimal(&s, "entries.amount")?;
        *agg.entry(cat.unwrap_or_else(|| "(uncategorized)".into()))
            .or_insert(Decimal::ZERO) += -amount;
    }
    let mut items: Vec<(String, Decimal)> = agg.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(items)
}

#[derive(Debug, Serialize)]
pub struct MonthFlow {
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

/// Income/expense per month, most recent `months` entries.
pub fn cashflow_by_month(conn: &Connection, months: usize) -> Result<Vec<MonthFlow>> {
    let mut stmt = conn.prepare(
        "SELECT substr(date,1,7) AS month, amount FROM entries
         WHERE kind=?1 AND voided=0
         ORDER BY date",
    )?;
    let mut rows = stmt.query(params![EntryKind::Transaction.as_str()])?;
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    while let Some(r) = rows.next()? {
        let month: String = r.get(0)?;
        let s: String = r.get(1)?;
        let amount = stored_decimal(&s, "entries.amount")?;
        let entry = map.entry(month).or_insert((Decimal::ZERO, Decimal::ZERO));
        if amount > Decimal::ZERO {
            entry.0 += amount;
        } else {
            entry.1 += -amount;
        }
    }
    let mut out: Vec<MonthFlow> = map
        .into_iter()
        .rev()
        .take(months)
        .map(|(month, (income, expense))| MonthFlow {
            month,
            income,
            expense,
        })
        .collect();
    out.reverse();
    Ok(out)
}
