// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub.get_one::<String>("name").unwrap();
            conn.execute("INSERT INTO categories(name) VALUES (?1)", params![name])?;
            println!("Added category '{}'", name);
        }
        Some(("list", sub)) => {
            let json_flag = sub.get_flag("json");
            let jsonl_flag = sub.get_flag("jsonl");
            let mut stmt = conn.prepare("SELECT name FROM categories ORDER BY name")?;
            let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
            let mut names = Vec::new();
            for row in rows {
                names.push(row?);
            }
            if !maybe_print_json(json_flag, jsonl_flag, &names)? {
                let data = names.into_iter().map(|n| vec![n]).collect();
                println!("{}", pretty_table(&["Category"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
