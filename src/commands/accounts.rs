// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::utils::{fmt_money, id_for_account, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let kind = sub.get_one::<String>("kind").unwrap();
            ledger::create_account(conn, name, kind)?;
            println!("Added account '{}' ({})", name, kind);
        }
        Some(("list", sub)) => list(conn, sub)?,
        Some(("close", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let date = match sub.get_one::<String>("date") {
                Some(s) => parse_date(s)?,
                None => chrono::Utc::now().date_naive(),
            };
            let id = id_for_account(conn, name)?;
            ledger::close_account(conn, id, date)?;
            println!("Closed account '{}' as of {}", name, date);
        }
        Some(("balance", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            let as_of = match sub.get_one::<String>("as-of") {
                Some(s) => parse_date(s)?,
                None => chrono::Utc::now().date_naive(),
            };
            let id = id_for_account(conn, name)?;
            let balance = ledger::account_balance_as_of(conn, id, as_of)?;
            println!("{} as of {}: {}", name, as_of, fmt_money(&balance));
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct AccountRow {
    name: String,
    kind: String,
    balance: String,
    closed_at: Option<String>,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut stmt =
        conn.prepare("SELECT name, kind, balance, closed_at FROM accounts ORDER BY name")?;
    let rows = stmt.query_map([], |r| {
        Ok(AccountRow {
            name: r.get(0)?,
            kind: r.get(1)?,
            balance: r.get(2)?,
            closed_at: r.get(3)?,
        })
    })?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?);
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|a| {
                vec![
                    a.name,
                    a.kind,
                    a.balance,
                    a.closed_at.unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Name", "Kind", "Balance", "Closed"], rows)
        );
    }
    Ok(())
}
