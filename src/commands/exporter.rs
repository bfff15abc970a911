// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("tx", sub)) => export_entries(conn, sub),
        _ => Ok(()),
    }
}

fn export_entries(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let out = sub.get_one::<String>("out").unwrap();

    let mut stmt = conn.prepare(
        "SELECT e.date, a.name as account, e.amount, e.kind, c.name as category, b.name as budget, e.location, e.note, e.voided
         FROM entries e
         LEFT JOIN accounts a ON e.account_id=a.id
         LEFT JOIN categories c ON e.category_id=c.id
         LEFT JOIN budgets b ON e.budget_id=b.id
         ORDER BY e.date, e.id",
    )?;
    let rows = stmt.query_map([], |r| {
        Ok((
            r.get::<_, String>(0)?,
            r.get::<_, String>(1)?,
            r.get::<_, String>(2)?,
            r.get::<_, String>(3)?,
            r.get::<_, Option<String>>(4)?,
            r.get::<_, Option<String>>(5)?,
            r.get::<_, Option<String>>(6)?,
            r.get::<_, Option<String>>(7)?,
            r.get::<_, bool>(8)?,
        ))
    })?;

    let mut wtr = csv::Writer::from_path(out)?;
    wtr.write_record([
        "date", "account", "amount", "kind", "category", "budget", "location", "note", "voided",
    ])?;
    for row in rows {
        let (d, a, amt, kind, cat, budget, location, note, voided) = row?;
        wtr.write_record([
            d,
            a,
            amt,
            kind,
            cat.unwrap_or_default(),
            budget.unwrap_or_default(),
            location.unwrap_or_default(),
            note.unwrap_or_default(),
            if voided { "1".into() } else { "0".to_string() },
        ])?;
    }
    wtr.flush()?;
    println!("Exported entries to {}", out);
    Ok(())
}
