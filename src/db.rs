// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("io.tallybook", "Tallybook", "tallybook"));

pub fn db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("tallybook.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    let path = db_path()?;
    let mut conn =
        Connection::open(&path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    Ok(conn)
}

/// In-memory database with the full schema; used by the tests.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&mut conn)?;
    Ok(conn)
}

fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS accounts(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL,
        balance TEXT NOT NULL DEFAULT '0',
        closed_at TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS budgets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        limit_amount TEXT NOT NULL,
        rollover TEXT NOT NULL DEFAULT 'none'
    );

    CREATE TABLE IF NOT EXISTS budget_categories(
        budget_id INTEGER NOT NULL,
        category_id INTEGER NOT NULL,
        UNIQUE(budget_id, category_id),
        FOREIGN KEY(budget_id) REFERENCES budgets(id) ON DELETE CASCADE,
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE CASCADE
    );

    -- Append-only ledger. Rows are never updated (void flips flags and adds
    -- a reversal row) and never deleted.
    CREATE TABLE IF NOT EXISTS entries(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        category_id INTEGER,
        budget_id INTEGER,
        location TEXT,
        note TEXT,
        kind TEXT NOT NULL DEFAULT 'transaction' CHECK(kind IN ('transaction','adjustment')),
        voided INTEGER NOT NULL DEFAULT 0,
        reversal_of INTEGER,
        occurrence_key TEXT UNIQUE,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(budget_id) REFERENCES budgets(id) ON DELETE SET NULL,
        FOREIGN KEY(reversal_of) REFERENCES entries(id)
    );
    CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date);
    CREATE INDEX IF NOT EXISTS idx_entries_account_date ON entries(account_id, date);

    CREATE TABLE IF NOT EXISTS recurrence_templates(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        amount TEXT NOT NULL,
        account_id INTEGER NOT NULL,
        category_id INTEGER,
        budget_id INTEGER,
        start_date TEXT NOT NULL,
        interval_unit TEXT NOT NULL CHECK(interval_unit IN ('day','week','month','year')),
        interval_count INTEGER NOT NULL CHECK(interval_count >= 1),
        end_date TEXT,
        max_occurrences INTEGER,
        disabled_after TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(account_id) REFERENCES accounts(id),
        FOREIGN KEY(category_id) REFERENCES categories(id) ON DELETE SET NULL,
        FOREIGN KEY(budget_id) REFERENCES budgets(id) ON DELETE SET NULL
    );

    -- One row per (budget, closed period). Re-closing the same period
    -- rewrites the same row, which is what makes close idempotent.
    CREATE TABLE IF NOT EXISTS budget_carryovers(
        from_budget INTEGER NOT NULL,
        out_of_period TEXT NOT NULL,
        to_budget INTEGER NOT NULL,
        amount TEXT NOT NULL,
        UNIQUE(from_budget, out_of_period),
        FOREIGN KEY(from_budget) REFERENCES budgets(id) ON DELETE CASCADE,
        FOREIGN KEY(to_budget) REFERENCES budgets(id) ON DELETE CASCADE
    );

    CREATE TABLE IF NOT EXISTS budget_transfers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_budget INTEGER NOT NULL,
        to_budget INTEGER NOT NULL,
        period TEXT NOT NULL,
        amount TEXT NOT NULL,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(from_budget) REFERENCES budgets(id) ON DELETE CASCADE,
        FOREIGN KEY(to_budget) REFERENCES budgets(id) ON DELETE CASCADE
    );
    "#,
    )?;
    Ok(())
}
