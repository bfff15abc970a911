// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Recurrence templates and their expansion into concrete ledger entries.
//!
//! Calendar pinning rule: day/week intervals step by exact day counts.
//! Month/year intervals keep the anchor day-of-month taken from the
//! template's start date and clamp to the last valid day of shorter months,
//! so a monthly template anchored on the 31st lands on Feb 28 (29 in leap
//! years), Mar 31, Apr 30, and returns to the 31st whenever the month allows.
//! A yearly template anchored on Feb 29 lands on Feb 28 in non-leap years.
//!
//! Expansion is idempotent: every materialized entry is keyed by
//! `tmpl<id>@<date>`, and re-inserting an existing key is a silent no-op.

use anyhow::{Context, Result, bail};
use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;

use crate::errors::LedgerError;
use crate::ledger;
use crate::models::{EntryDraft, EntryKind, IntervalUnit, RecurrenceTemplate};
use crate::utils::{last_day_of_month, stored_decimal};

/// Deterministic key for one materialized occurrence.
pub fn occurrence_key(template_id: i64, date: NaiveDate) -> String {
    format!("tmpl{}@{}", template_id, date)
}

/// Finite, restartable iterator over a template's occurrence dates clipped
/// to `[window_start, window_end]`. Building a fresh one re-walks from the
/// template start, so the occurrence cap always counts from the beginning.
pub struct Occurrences<'a> {
    template: &'a RecurrenceTemplate,
    window_start: NaiveDate,
    window_end: NaiveDate,
    n: u32,
}

impl<'a> Occurrences<'a> {
    pub fn new(
        template: &'a RecurrenceTemplate,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Self {
        Occurrences {
            template,
            window_start,
            window_end,
            n: 0,
        }
    }

    fn date_of(&self, n: u32) -> Option<NaiveDate> {
        let t = self.template;
        let steps = i64::from(n) * i64::from(t.interval_count);
        match t.interval_unit {
            IntervalUnit::Day => t
                .start_date
                .checked_add_signed(chrono::Duration::days(steps)),
            IntervalUnit::Week => t
                .start_date
                .checked_add_signed(chrono::Duration::days(steps * 7)),
            IntervalUnit::Month => {
                let months = i64::from(t.start_date.year()) * 12
                    + i64::from(t.start_date.month0())
                    + steps;
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
                let day = t.start_date.day().min(last_day_of_month(year, month));
                NaiveDate::from_ymd_opt(year, month, day)
            }
            IntervalUnit::Year => {
                let year = i32::try_from(i64::from(t.start_date.year()) + steps).ok()?;
                let month = t.start_date.month();
                let day = t.start_date.day().min(last_day_of_month(year, month));
                NaiveDate::from_ymd_opt(year, month, day)
            }
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        loop {
            if let Some(cap) = self.template.max_occurrences {
                if self.n >= cap {
                    return None;
                }
            }
            let date = self.date_of(self.n)?;
            self.n += 1;

            if let Some(end) = self.template.end_date {
                if date > end {
                    return None;
                }
            }
            if let Some(cutoff) = self.template.disabled_after {
                // Strictly-later occurrences stop; on-or-before stay valid.
                if date > cutoff {
                    return None;
                }
            }
            if date > self.window_end {
                return None;
            }
            if date < self.window_start {
                continue;
            }
            return Some(date);
        }
    }
}

pub struct TemplateDraft {
    pub name: String,
    pub amount: Decimal,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub budget_id: Option<i64>,
    pub start_date: NaiveDate,
    pub interval_unit: IntervalUnit,
    pub interval_count: u32,
    pub end_date: Option<NaiveDate>,
    pub max_occurrences: Option<u32>,
}

pub fn create_template(conn: &Connection, draft: &TemplateDraft) -> Result<i64> {
    if draft.amount.is_zero() {
        return Err(LedgerError::ZeroAmount.into());
    }
    if draft.interval_count < 1 {
        bail!("Interval count must be at least 1");
    }
    let account: Option<i64> = conn
        .query_row(
            "SELECT id FROM accounts WHERE id=?1",
            params![draft.account_id],
            |r| r.get(0),
        )
        .optional()?;
    if account.is_none() {
        return Err(LedgerError::InvalidReference {
            entity: "account",
            id: draft.account_id,
        }
        .into());
    }
    conn.execute(
        "INSERT INTO recurrence_templates(name, amount, account_id, category_id, budget_id, start_date, interval_unit, interval_count, end_date, max_occurrences)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            draft.name,
            draft.amount.to_string(),
            draft.account_id,
            draft.category_id,
            draft.budget_id,
            draft.start_date.to_string(),
            draft.interval_unit.as_str(),
            draft.interval_count,
            draft.end_date.map(|d| d.to_string()),
            draft.max_occurrences,
        ],
    )
    .with_context(|| format!("Create recurring template '{}'", draft.name))?;
    Ok(conn.last_insert_rowid())
}

pub fn get_template(conn: &Connection, template_id: i64) -> Result<RecurrenceTemplate> {
    let row = conn
        .query_row(
            "SELECT id, name, amount, account_id, category_id, budget_id, start_date, interval_unit, interval_count, end_date, max_occurrences, disabled_after
             FROM recurrence_templates WHERE id=?1",
            params![template_id],
            |r| {
                Ok((
                    r.get::<_, i64>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, i64>(3)?,
                    r.get::<_, Option<i64>>(4)?,
                    r.get::<_, Option<i64>>(5)?,
                    r.get::<_, String>(6)?,
                    r.get::<_, String>(7)?,
                    r.get::<_, u32>(8)?,
                    r.get::<_, Option<String>>(9)?,
                    r.get::<_, Option<u32>>(10)?,
                    r.get::<_, Option<String>>(11)?,
                ))
            },
        )
        .optional()?;
    let (
        id,
        name,
        amount,
        account_id,
        category_id,
        budget_id,
        start_date,
        interval_unit,
        interval_count,
        end_date,
        max_occurrences,
        disabled_after,
    ) = row.ok_or(LedgerError::InvalidReference {
        entity: "template",
        id: template_id,
    })?;
    Ok(RecurrenceTemplate {
        id,
        name,
        amount: stored_decimal(&amount, "recurrence_templates.amount")?,
        account_id,
        category_id,
        budget_id,
        start_date: crate::utils::parse_date(&start_date)?,
        interval_unit: IntervalUnit::parse(&interval_unit)?,
        interval_count,
        end_date: end_date.map(|s| crate::utils::parse_date(&s)).transpose()?,
        max_occurrences,
        disabled_after: disabled_after
            .map(|s| crate::utils::parse_date(&s))
            .transpose()?,
    })
}

pub fn list_templates(conn: &Connection) -> Result<Vec<RecurrenceTemplate>> {
    let mut stmt = conn.prepare("SELECT id FROM recurrence_templates ORDER BY name")?;
    let ids = stmt.query_map([], |r| r.get::<_, i64>(0))?;
    let mut out = Vec::new();
    for id in ids {
        out.push(get_template(conn, id?)?);
    }
    Ok(out)
}

/// Stop expansion for occurrence dates strictly after `as_of`. Entries
/// already materialized are not retracted.
pub fn disable_template(conn: &Connection, template_id: i64, as_of: NaiveDate) -> Result<()> {
    let n = conn.execute(
        "UPDATE recurrence_templates SET disabled_after=?1 WHERE id=?2",
        params![as_of.to_string(), template_id],
    )?;
    if n == 0 {
        return Err(LedgerError::InvalidReference {
            entity: "template",
            id: template_id,
        }
        .into());
    }
    Ok(())
}

/// Materialize every occurrence of the template inside the window. Returns
/// the number of entries actually inserted; occurrences that already exist
/// (matched by occurrence key) are skipped silently, so re-expanding an
/// overlapping window is safe, as is an external retry of the whole call.
/// A previously voided occurrence keeps its key and stays voided.
pub fn expand(
    conn: &mut Connection,
    template_id: i64,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<usize> {
    let template = get_template(conn, template_id)?;

    let out_of_bounds = window_start > window_end
        || window_end < template.start_date
        || template.end_date.is_some_and(|end| window_start > end);
    if out_of_bounds {
        return Err(LedgerError::RecurrenceBoundsExceeded {
            template: template_id,
            start: window_start,
            end: window_end,
        }
        .into());
    }

    let dates: Vec<NaiveDate> = Occurrences::new(&template, window_start, window_end).collect();
    let mut inserted = 0;
    for date in dates {
        let draft = EntryDraft {
            date,
            account_id: template.account_id,
            amount: template.amount,
            category_id: template.category_id,
            budget_id: template.budget_id,
            location: None,
            note: Some(template.name.clone()),
        };
        let key = occurrence_key(template_id, date);
        if ledger::post_entry(conn, &draft, EntryKind::Transaction, Some(&key))?.is_some() {
            inserted += 1;
        }
    }
    Ok(inserted)
}

/// Upcoming scheduled payments for an account: the next occurrence dates of
/// its active templates within the horizon, whether or not they have been
/// materialized yet.
pub fn upcoming(
    conn: &Connection,
    account_id: i64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(String, NaiveDate, Decimal)>> {
    let mut out = Vec::new();
    for template in list_templates(conn)? {
        if template.account_id != account_id {
            continue;
        }
        for date in Occurrences::new(&template, from, to) {
            out.push((template.name.clone(), date, template.amount));
        }
    }
    out.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    Ok(out)
}
