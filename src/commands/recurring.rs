// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::IntervalUnit;
use crate::recurrence::{self, TemplateDraft};
use crate::utils::{
    id_for_account, id_for_budget, id_for_category, id_for_template, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("disable", sub)) => disable(conn, sub)?,
        Some(("run", sub)) => run(conn, sub)?,
        Some(("upcoming", sub)) => upcoming(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap().to_string();
    let account = sub.get_one::<String>("account").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let start_date = parse_date(sub.get_one::<String>("start").unwrap())?;
    let interval_unit = IntervalUnit::parse(sub.get_one::<String>("unit").unwrap())?;
    let interval_count = *sub.get_one::<u32>("every").unwrap();
    let end_date = sub
        .get_one::<String>("end")
        .map(|s| parse_date(s))
        .transpose()?;
    let max_occurrences = sub.get_one::<u32>("max").copied();

    let account_id = id_for_account(conn, account)?;
    let category_id = match sub.get_one::<String>("category") {
        Some(c) => Some(id_for_category(conn, c)?),
        None => None,
    };
    let budget_id = match sub.get_one::<String>("budget") {
        Some(b) => Some(id_for_budget(conn, b)?),
        None => None,
    };

    let draft = TemplateDraft {
        name: name.clone(),
        amount,
        account_id,
        category_id,
        budget_id,
        start_date,
        interval_unit,
        interval_count,
        end_date,
        max_occurrences,
    };
    recurrence::create_template(conn, &draft)?;
    println!(
        "Added recurring '{}': {} every {} {}(s) from {}",
        name,
        amount,
        interval_count,
        interval_unit.as_str(),
        start_date
    );
    Ok(())
}

#[derive(Serialize)]
struct TemplateRow {
    name: String,
    amount: String,
    start: String,
    rule: String,
    end: String,
    max: String,
    disabled_after: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let mut data = Vec::new();
    for t in recurrence::list_templates(conn)? {
        data.push(TemplateRow {
            name: t.name,
            amount: t.amount.to_string(),
            start: t.start_date.to_string(),
            rule: format!("every {} {}(s)", t.interval_count, t.interval_unit.as_str()),
            end: t.end_date.map(|d| d.to_string()).unwrap_or_default(),
            max: t.max_occurrences.map(|n| n.to_string()).unwrap_or_default(),
            disabled_after: t
                .disabled_after
                .map(|d| d.to_string())
                .unwrap_or_default(),
        });
    }
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .into_iter()
            .map(|t| vec![t.name, t.amount, t.start, t.rule, t.end, t.max, t.disabled_after])
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Amount", "Start", "Rule", "End", "Max", "Disabled after"],
                rows,
            )
        );
    }
    Ok(())
}

fn disable(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let date = match sub.get_one::<String>("date") {
        Some(s) => parse_date(s)?,
        None => chrono::Utc::now().date_naive(),
    };
    let id = id_for_template(conn, name)?;
    recurrence::disable_template(conn, id, date)?;
    println!("Disabled '{}' for occurrences after {}", name, date);
    Ok(())
}

fn run(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let name = sub.get_one::<String>("name").unwrap();
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    let id = id_for_template(conn, name)?;
    let inserted = recurrence::expand(conn, id, from, to)?;
    println!(
        "Materialized {} occurrence(s) of '{}' in {}..{}",
        inserted, name, from, to
    );
    Ok(())
}

fn upcoming(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let account = sub.get_one::<String>("account").unwrap();
    let from = parse_date(sub.get_one::<String>("from").unwrap())?;
    let to = parse_date(sub.get_one::<String>("to").unwrap())?;
    let account_id = id_for_account(conn, account)?;

    let items = recurrence::upcoming(conn, account_id, from, to)?;
    let data: Vec<Vec<String>> = items
        .into_iter()
        .map(|(name, date, amount)| vec![date.to_string(), name, amount.to_string()])
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        println!("{}", pretty_table(&["Date", "Template", "Amount"], data));
    }
    Ok(())
}
