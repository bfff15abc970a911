// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Append-only ledger store. Posting an entry and moving the account's
//! running balance happen inside one SQL transaction; voids never delete,
//! they flag the row and append an equal-and-opposite reversal.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::errors::LedgerError;
use crate::models::{Account, Entry, EntryDraft, EntryKind};
use crate::utils::stored_decimal;

pub fn create_account(conn: &Connection, name: &str, kind: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO accounts(name, kind) VALUES (?1, ?2)",
        params![name, kind],
    )
    .with_context(|| format!("Create account '{}'", name))?;
    Ok(conn.last_insert_rowid())
}

/// Soft close. The account and its history stay queryable; further postings
/// fail with `AccountClosed`.
pub fn close_account(conn: &Connection, account_id: i64, as_of: NaiveDate) -> Result<()> {
    let n = conn.execute(
        "UPDATE accounts SET closed_at=?1 WHERE id=?2 AND closed_at IS NULL",
        params![as_of.to_string(), account_id],
    )?;
    if n == 0 {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM accounts WHERE id=?1",
                params![account_id],
                |r| r.get(0),
            )
            .optional()?;
        match exists {
            Some(_) => return Err(LedgerError::AccountClosed(account_id).into()),
            None => {
                return Err(LedgerError::InvalidReference {
                    entity: "account",
                    id: account_id,
                }
                .into());
            }
        }
    }
    Ok(())
}

pub fn get_account(conn: &Connection, account_id: i64) -> Result<Account> {
    let row = conn
        .query_row(
            "SELECT id, name, kind, balance, closed_at FROM accounts WHERE id=?1",
            params![account_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, Option<String>>(4)?,
                ))
            },
        )
        .optional()?;
    let (id, name, kind, balance, closed_at) = row.ok_or(LedgerError::InvalidReference {
        entity: "account",
        id: account_id,
    })?;
    Ok(Account {
        id,
        name,
        kind,
        balance: stored_decimal(&balance, "accounts.balance")?,
        closed_at: closed_at
            .map(|s| crate::utils::parse_date(&s))
            .transpose()?,
    })
}

fn check_refs(conn: &Connection, draft: &EntryDraft) -> Result<()> {
    let closed: Option<Option<String>> = conn
        .query_row(
            "SELECT closed_at FROM accounts WHERE id=?1",
            params![draft.account_id],
            |r| r.get(0),
        )
        .optional()?;
    match closed {
        None => {
            return Err(LedgerError::InvalidReference {
                entity: "account",
                id: draft.account_id,
            }
            .into());
        }
        Some(Some(_)) => return Err(LedgerError::AccountClosed(draft.account_id).into()),
        Some(None) => {}
    }
    if let Some(cat_id) = draft.category_id {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM categories WHERE id=?1",
                params![cat_id],
                |r| r.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(LedgerError::InvalidReference {
                entity: "category",
                id: cat_id,
            }
            .into());
        }
    }
    if let Some(budget_id) = draft.budget_id {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM budgets WHERE id=?1",
                params![budget_id],
                |r| r.get(0),
            )
            .optional()?;
        if found.is_none() {
            return Err(LedgerError::InvalidReference {
                entity: "budget",
                id: budget_id,
            }
            .into());
        }
    }
    Ok(())
}

/// Append a row and move the account balance in one SQL transaction.
///
/// When `occurrence_key` is set and a row with the same key already exists,
/// the insert is a no-op and `Ok(None)` is returned; the balance is left
/// untouched. That is the duplicate-occurrence contract the recurrence
/// engine relies on.
pub fn post_entry(
    conn: &mut Connection,
    draft: &EntryDraft,
    kind: EntryKind,
    occurrence_key: Option<&str>,
) -> Result<Option<i64>> {
    if draft.amount.is_zero() {
        return Err(LedgerError::ZeroAmount.into());
    }
    check_refs(conn, draft)?;

    let tx = conn.transaction()?;
    let inserted = tx.execute(
        "INSERT INTO entries(date, account_id, amount, category_id, budget_id, location, note, kind, occurrence_key)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(occurrence_key) DO NOTHING",
        params![
            draft.date.to_string(),
            draft.account_id,
            draft.amount.to_string(),
            draft.category_id,
            draft.budget_id,
            draft.location,
            draft.note,
            kind.as_str(),
            occurrence_key,
        ],
    )?;
    if inserted == 0 {
        tx.commit()?;
        return Ok(None);
    }
    let id = tx.last_insert_rowid();
    apply_to_balance(&tx, draft.account_id, draft.amount)?;
    tx.commit()?;
    Ok(Some(id))
}

fn apply_to_balance(conn: &Connection, account_id: i64, delta: Decimal) -> Result<()> {
    let balance: String = conn.query_row(
        "SELECT balance FROM accounts WHERE id=?1",
        params![account_id],
        |r| r.get(0),
    )?;
    let new_balance = stored_decimal(&balance, "accounts.balance")? + delta;
    conn.execute(
        "UPDATE accounts SET balance=?1 WHERE id=?2",
        params![new_balance.to_string(), account_id],
    )?;
    Ok(())
}

pub fn post_transaction(conn: &mut Connection, draft: &EntryDraft) -> Result<i64> {
    // No occurrence key, so the insert cannot conflict away.
    post_entry(conn, draft, EntryKind::Transaction, None)?
        .context("direct post unexpectedly deduplicated")
}

pub fn post_adjustment(conn: &mut Connection, draft: &EntryDraft) -> Result<i64> {
    post_entry(conn, draft, EntryKind::Adjustment, None)?
        .context("direct post unexpectedly deduplicated")
}

/// Mark an entry voided and append the balancing reversal row. Both rows are
/// flagged voided so every aggregate skips the pair, while the audit trail
/// keeps them retrievable. Returns the reversal row id.
pub fn void_entry(conn: &mut Connection, entry_id: i64) -> Result<i64> {
    let tx = conn.transaction()?;
    let row = tx
        .query_row(
            "SELECT date, account_id, amount, category_id, budget_id, kind, voided, reversal_of
             FROM entries WHERE id=?1",
            params![entry_id],
            |r| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, i64>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, Option<i64>>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, String>(5)?,
                    r.get::<_, bool>(6)?,
                    r.get::<_, Option<i64>>(7)?,
                ))
            },
        )
        .optional()?;
    let (date, account_id, amount_s, category_id, budget_id, kind, voided, reversal_of) =
        row.ok_or(LedgerError::InvalidReference {
            entity: "entry",
            id: entry_id,
        })?;
    if voided {
        return Err(LedgerError::AlreadyVoided(entry_id).into());
    }
    if reversal_of.is_some() {
        bail!("Entry {} is a reversal and cannot be voided", entry_id);
    }
    let amount = stored_decimal(&amount_s, "entries.amount")?;

    tx.execute(
        "UPDATE entries SET voided=1 WHERE id=?1",
        params![entry_id],
    )?;
    tx.execute(
        "INSERT INTO entries(date, account_id, amount, category_id, budget_id, note, kind, voided, reversal_of)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
        params![
            date,
            account_id,
            (-amount).to_string(),
            category_id,
            budget_id,
            format!("reversal of entry {}", entry_id),
            kind,
            entry_id,
        ],
    )?;
    let reversal_id = tx.last_insert_rowid();
    apply_to_balance(&tx, account_id, -amount)?;
    tx.commit()?;
    Ok(reversal_id)
}

/// Sum of non-voided amounts on the account dated on or before `as_of`,
/// served by the (account, date) index — insertion order is irrelevant.
pub fn account_balance_as_of(
    conn: &Connection,
    account_id: i64,
    as_of: NaiveDate,
) -> Result<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT amount FROM entries
         WHERE account_id=?1 AND date<=?2 AND voided=0",
    )?;
    let mut rows = stmt.query(params![account_id, as_of.to_string()])?;
    let mut total = Decimal::ZERO;
    while let Some(r) = rows.next()? {
        let s: String = r.get(0)?;
        total += stored_decimal(&s, "entries.amount")?;
    }
    Ok(total)
}

struct RawEntry {
    id: i64,
    date: String,
    account_id: i64,
    amount: String,
    category_id: Option<i64>,
    budget_id: Option<i64>,
    location: Option<String>,
    note: Option<String>,
    kind: String,
    voided: bool,
    reversal_of: Option<i64>,
    occurrence_key: Option<String>,
}

const ENTRY_COLUMNS: &str =
    "id, date, account_id, amount, category_id, budget_id, location, note, kind, voided, reversal_of, occurrence_key";

fn raw_entry(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: r.get(0)?,
        date: r.get(1)?,
        account_id: r.get(2)?,
        amount: r.get(3)?,
        category_id: r.get(4)?,
        budget_id: r.get(5)?,
        location: r.get(6)?,
        note: r.get(7)?,
        kind: r.get(8)?,
        voided: r.get(9)?,
        reversal_of: r.get(10)?,
        occurrence_key: r.get(11)?,
    })
}

impl RawEntry {
    fn decode(self) -> Result<Entry> {
        Ok(Entry {
            id: self.id,
            date: crate::utils::parse_date(&self.date)?,
            account_id: self.account_id,
            amount: stored_decimal(&self.amount, "entries.amount")?,
            category_id: self.category_id,
            budget_id: self.budget_id,
            location: self.location,
            note: self.note,
            kind: EntryKind::parse(&self.kind)?,
            voided: self.voided,
            reversal_of: self.reversal_of,
            occurrence_key: self.occurrence_key,
        })
    }
}

pub fn get_entry(conn: &Connection, entry_id: i64) -> Result<Entry> {
    let row = conn
        .query_row(
            &format!("SELECT {} FROM entries WHERE id=?1", ENTRY_COLUMNS),
            params![entry_id],
            raw_entry,
        )
        .optional()?;
    row.ok_or(LedgerError::InvalidReference {
        entity: "entry",
        id: entry_id,
    })?
    .decode()
}

/// Date-ordered slice of an account's ledger, voided rows included — the
/// history is the audit trail.
pub fn list_entries(
    conn: &Connection,
    account_id: i64,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<Vec<Entry>> {
    let mut sql = format!("SELECT {} FROM entries WHERE account_id=?1", ENTRY_COLUMNS);
    let mut binds: Vec<String> = Vec::new();
    if let Some(d) = from {
        sql.push_str(" AND date>=?");
        binds.push(d.to_string());
    }
    if let Some(d) = to {
        sql.push_str(" AND date<=?");
        binds.push(d.to_string());
    }
    sql.push_str(" ORDER BY date, id");

    let mut stmt = conn.prepare(&sql)?;
    let mut params_vec: Vec<&dyn rusqlite::ToSql> = vec![&account_id];
    for b in &binds {
        params_vec.push(b);
    }
    let mut rows = stmt.query(rusqlite::params_from_iter(params_vec))?;

    let mut out = Vec::new();
    while let Some(r) = rows.next()? {
        out.push(raw_entry(r)?.decode()?);
    }
    Ok(out)
}
