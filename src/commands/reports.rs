// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::reports;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("totals", sub)) => totals(conn, sub)?,
        Some(("cashflow", sub)) => cashflow(conn, sub)?,
        Some(("spend-by-category", sub)) => spend_by_category(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn totals(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    let income = reports::total_income(conn, from, to)?;
    let expense = reports::total_expense(conn, from, to)?;
    let payload = json!({
        "from": from.to_string(),
        "to": to.to_string(),
        "income": income.to_string(),
        "expense": expense.to_string(),
        "net": (income - expense).to_string(),
    });
    if !maybe_print_json(json_flag, jsonl_flag, &payload)? {
        let rows = vec![vec![
            fmt_money(&income),
            fmt_money(&expense),
            fmt_money(&(income - expense)),
        ]];
        println!("{}", pretty_table(&["Income", "Expense", "Net"], rows));
    }
    Ok(())
}

fn cashflow(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let months: usize = *sub.get_one::<usize>("months").unwrap();
    let flows = reports::cashflow_by_month(conn, months)?;
    if !maybe_print_json(json_flag, jsonl_flag, &flows)? {
        let rows: Vec<Vec<String>> = flows
            .iter()
            .map(|f| {
                vec![
                    f.month.clone(),
                    fmt_money(&f.income),
                    fmt_money(&f.expense),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Month", "Income", "Expense"], rows));
    }
    Ok(())
}

fn spend_by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    let items = reports::spend_by_category(conn, from, to)?;
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(cat, amount)| vec![cat, fmt_money(&amount)])
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Category", "Spent"], data));
    }
    Ok(())
}
