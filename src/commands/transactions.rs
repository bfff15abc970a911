// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{EntryDraft, EntryKind};
use crate::utils::{
    id_for_account, id_for_budget, id_for_category, maybe_print_json, parse_date, parse_decimal,
    pretty_table,
};
use crate::{budget, ledger};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("adjust", sub)) => adjust(conn, sub)?,
        Some(("void", sub)) => void(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let category = sub.get_one::<String>("category");
    let budget_name = sub.get_one::<String>("budget");
    let location = sub.get_one::<String>("location").map(|s| s.to_string());
    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    let account_id = id_for_account(conn, account_name)?;
    let category_id = match category {
        Some(name) => Some(id_for_category(conn, name)?),
        None => None,
    };
    let mut budget_id = match budget_name {
        Some(name) => Some(id_for_budget(conn, name)?),
        None => None,
    };
    // Untagged postings inherit the budget their category belongs to, when
    // that mapping is unambiguous.
    if budget_id.is_none() {
        if let Some(cat_id) = category_id {
            budget_id = budget::budget_for_category(conn, cat_id)?;
        }
    }

    let draft = EntryDraft {
        date,
        account_id,
        amount,
        category_id,
        budget_id,
        location,
        note,
    };
    let id = ledger::post_transaction(conn, &draft)?;
    println!(
        "Recorded entry {} of {} on {} (acct: {})",
        id, amount, date, account_name
    );
    if let Some(budget_id) = budget_id {
        let balance = budget::apply_transaction(conn, budget_id, id)?;
        println!(
            "Budget remaining for {}: {}",
            balance.period, balance.remaining
        );
    }
    Ok(())
}

fn adjust(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let date = parse_date(sub.get_one::<String>("date").unwrap())?;
    let account_name = sub.get_one::<String>("account").unwrap();
    let amount = parse_decimal(sub.get_one::<String>("amount").unwrap())?;
    let note = sub.get_one::<String>("note").map(|s| s.to_string());

    let account_id = id_for_account(conn, account_name)?;
    let draft = EntryDraft {
        date,
        account_id,
        amount,
        category_id: None,
        budget_id: None,
        location: None,
        note,
    };
    let id = ledger::post_adjustment(conn, &draft)?;
    println!(
        "Adjusted '{}' by {} on {} (entry {}, excluded from reports)",
        account_name, amount, date, id
    );
    Ok(())
}

fn void(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = *sub.get_one::<i64>("id").unwrap();
    let reversal = ledger::void_entry(conn, id)?;
    println!("Voided entry {} (reversal entry {})", id, reversal);
    Ok(())
}

#[derive(Serialize)]
pub struct EntryRow {
    pub id: i64,
    pub date: String,
    pub amount: String,
    pub kind: String,
    pub category: String,
    pub budget: String,
    pub location: String,
    pub note: String,
    pub voided: bool,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let account_name = sub.get_one::<String>("account").unwrap();
    let from = sub
        .get_one::<String>("from")
        .map(|s| parse_date(s))
        .transpose()?;
    let to = sub
        .get_one::<String>("to")
        .map(|s| parse_date(s))
        .transpose()?;

    let account_id = id_for_account(conn, account_name)?;
    let entries = ledger::list_entries(conn, account_id, from, to)?;

    let mut data = Vec::new();
    for e in entries {
        let category = match e.category_id {
            Some(id) => conn.query_row(
                "SELECT name FROM categories WHERE id=?1",
                rusqlite::params![id],
                |r| r.get::<_, String>(0),
            )?,
            None => String::new(),
        };
        let budget = match e.budget_id {
            Some(id) => conn.query_row(
                "SELECT name FROM budgets WHERE id=?1",
                rusqlite::params![id],
                |r| r.get::<_, String>(0),
            )?,
            None => String::new(),
        };
        data.push(EntryRow {
            id: e.id,
            date: e.date.to_string(),
            amount: e.amount.to_string(),
            kind: e.kind.as_str().to_string(),
            category,
            budget,
            location: e.location.unwrap_or_default(),
            note: e.note.unwrap_or_default(),
            voided: e.voided,
        });
    }

    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.amount.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.budget.clone(),
                    r.note.clone(),
                    if r.voided { "yes".into() } else { String::new() },
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Id", "Date", "Amount", "Kind", "Category", "Budget", "Note", "Voided"],
                rows,
            )
        );
    }
    Ok(())
}
