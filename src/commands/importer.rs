// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::ledger;
use crate::models::EntryDraft;
use crate::utils::{id_for_account, id_for_category, parse_date, parse_decimal};
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use rusqlite::Connection;
use std::collections::{HashMap, hash_map::Entry};

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("tx", sub)) => import_entries(conn, sub),
        _ => Ok(()),
    }
}

/// Expected columns: date, amount, category (optional), location (optional),
/// note (optional). Rows post through the ledger store, so reference and
/// zero-amount checks apply the same as interactive entry.
fn import_entries(conn: &mut Connection, sub: &clap::ArgMatches) -> Result<()> {
    let path = sub.get_one::<String>("file").unwrap().trim();
    let account = sub.get_one::<String>("account").unwrap().trim();
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("Open CSV {}", path))?;

    let account_id = id_for_account(conn, account)?;
    let mut category_cache: HashMap<String, i64> = HashMap::new();
    let mut posted = 0usize;

    for result in rdr.records() {
        let rec = result?;
        let date_raw = rec.get(0).context("date missing")?.trim().to_string();
        let amount_raw = rec.get(1).context("amount missing")?.trim().to_string();
        let category = rec.get(2).unwrap_or("").trim().to_string();
        let location = rec
            .get(3)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());
        let note = rec
            .get(4)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string());

        let date =
            parse_date(&date_raw).with_context(|| format!("Invalid date '{}'", date_raw))?;
        let amount = parse_decimal(&amount_raw)
            .with_context(|| format!("Invalid amount '{}' on {}", amount_raw, date_raw))?;

        let category_id = if category.is_empty() {
            None
        } else {
            let cat_id = match category_cache.entry(category.clone()) {
                Entry::Occupied(entry) => *entry.get(),
                Entry::Vacant(entry) => {
                    let fetched = id_for_category(conn, &category)?;
                    *entry.insert(fetched)
                }
            };
            Some(cat_id)
        };

        let draft = EntryDraft {
            date,
            account_id,
            amount,
            category_id,
            budget_id: None,
            location,
            note,
        };
        ledger::post_transaction(conn, &draft)?;
        posted += 1;
    }
    println!("Imported {} entries from {}", posted, path);
    Ok(())
}
