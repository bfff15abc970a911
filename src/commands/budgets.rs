// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::budget::{self, BudgetDraft};
use crate::models::RolloverPolicy;
use crate::utils::{
    id_for_budget, id_for_category, maybe_print_json, parse_decimal, parse_month, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        Some(("close", sub)) => close(conn, sub)?,
        Some(("transfer", sub)) => transfer(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().to_string();
    let limit_amount = parse_decimal(sub.get_one::<String>("limit").unwrap())?;
    let rollover = RolloverPolicy::parse(sub.get_one::<String>("rollover").unwrap())?;
    let mut category_ids = Vec::new();
    if let Some(cats) = sub.get_many::<String>("category") {
        for cat in cats {
            category_ids.push(id_for_category(conn, cat)?);
        }
    }
    let draft = BudgetDraft {
        name: name.clone(),
        limit_amount,
        rollover,
        category_ids,
    };
    budget::create_budget(conn, &draft)?;
    println!("Added budget '{}' with limit {}", name, limit_amount);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let budgets = budget::list_budgets(conn)?;
    if !maybe_print_json(json_flag, jsonl_flag, &budgets)? {
        let rows: Vec<Vec<String>> = budgets
            .into_iter()
            .map(|b| {
                vec![
                    b.name,
                    b.limit_amount.to_string(),
                    b.rollover.encode(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Budget", "Limit", "Rollover"], rows));
    }
    Ok(())
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let name = sub.get_one::<String>("name").unwrap();
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let id = id_for_budget(conn, name)?;
    let balance = budget::period_balance(conn, id, &month)?;
    if !maybe_print_json(json_flag, jsonl_flag, &balance)? {
        let rows = vec![vec![
            name.to_string(),
            balance.period.clone(),
            balance.opening.to_string(),
            balance.consumed.to_string(),
            balance.remaining.to_string(),
        ]];
        println!(
            "{}",
            pretty_table(
                &["Budget", "Period", "Opening", "Consumed", "Remaining"],
                rows,
            )
        );
    }
    Ok(())
}

fn close(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let id = id_for_budget(conn, name)?;
    let next = budget::close_period(conn, id, &month)?;
    println!(
        "Closed {} for '{}'; {} opens at {}",
        month, name, next.period, next.opening
    );
    Ok(())
}

fn transfer(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let from = sub.get_one::<String>("from").unwrap();
    let to = sub.get_one::<String>("to").unwrap();
    let month = parse_month(sub.get_one::<String>("month").unwrap())?;
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let from_id = id_for_budget(conn, from)?;
    let to_id = id_for_budget(conn, to)?;
    budget::transfer(conn, from_id, to_id, &month, amount)?;
    println!("Moved {} from '{}' to '{}' in {}", amount, from, to, month);
    Ok(())
}
