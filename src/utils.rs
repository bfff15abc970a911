// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Canonical `YYYY-MM` period string. Unpadded months ("2025-7") normalize
/// to the zero-padded form every period key and stepper uses.
pub fn parse_month(s: &str) -> Result<String> {
    let (y, m) = split_period(s)
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", s))?;
    Ok(format!("{:04}-{:02}", y, m))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Decode a TEXT-stored amount, naming the column in the error.
pub fn stored_decimal(s: &str, what: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid stored amount '{}' in {}", s, what))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

/// YYYY-MM period containing the given date.
pub fn period_of(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn split_period(period: &str) -> Result<(i32, u32)> {
    let parts: Vec<&str> = period.split('-').collect();
    if parts.len() != 2 {
        return Err(anyhow::anyhow!("Invalid period '{}'", period));
    }
    let y: i32 = parts[0].parse()?;
    let m: u32 = parts[1].parse()?;
    if !(1..=12).contains(&m) {
        return Err(anyhow::anyhow!("Invalid month number {}", m));
    }
    Ok((y, m))
}

pub fn next_period(period: &str) -> Result<String> {
    let (y, m) = split_period(period)?;
    Ok(if m == 12 {
        format!("{:04}-01", y + 1)
    } else {
        format!("{:04}-{:02}", y, m + 1)
    })
}

pub fn prev_period(period: &str) -> Result<String> {
    let (y, m) = split_period(period)?;
    Ok(if m == 1 {
        format!("{:04}-12", y - 1)
    } else {
        format!("{:04}-{:02}", y, m - 1)
    })
}

pub fn period_start(period: &str) -> Result<NaiveDate> {
    let (y, m) = split_period(period)?;
    NaiveDate::from_ymd_opt(y, m, 1).ok_or_else(|| anyhow::anyhow!("Invalid period '{}'", period))
}

pub fn period_end(period: &str) -> Result<NaiveDate> {
    let (y, m) = split_period(period)?;
    NaiveDate::from_ymd_opt(y, m, last_day_of_month(y, m))
        .ok_or_else(|| anyhow::anyhow!("Invalid period '{}'", period))
}

pub fn last_day_of_month(y: i32, m: u32) -> u32 {
    match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if NaiveDate::from_ymd_opt(y, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_account(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM accounts WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Account '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_budget(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM budgets WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Budget '{}' not found", name))?;
    Ok(id)
}

pub fn id_for_template(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM recurrence_templates WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Recurring template '{}' not found", name))?;
    Ok(id)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
