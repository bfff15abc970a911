// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub balance: Decimal,
    pub closed_at: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// Whether a ledger row is an ordinary transaction or an out-of-band
/// adjustment. Adjustments move the account balance but are excluded from
/// every analytic total and from budget consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Transaction,
    Adjustment,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Transaction => "transaction",
            EntryKind::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "transaction" => Ok(EntryKind::Transaction),
            "adjustment" => Ok(EntryKind::Adjustment),
            other => bail!("Invalid entry kind '{}'", other),
        }
    }
}

/// An immutable ledger row. Corrections are reversal rows, never updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: i64,
    pub date: NaiveDate,
    pub account_id: i64,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub budget_id: Option<i64>,
    pub location: Option<String>,
    pub note: Option<String>,
    pub kind: EntryKind,
    pub voided: bool,
    pub reversal_of: Option<i64>,
    pub occurrence_key: Option<String>,
}

/// Fields a caller supplies when posting; the store assigns the rest.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub account_id: i64,
    pub amount: Decimal,
    pub category_id: Option<i64>,
    pub budget_id: Option<i64>,
    pub location: Option<String>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Year => "year",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "day" => Ok(IntervalUnit::Day),
            "week" => Ok(IntervalUnit::Week),
            "month" => Ok(IntervalUnit::Month),
            "year" => Ok(IntervalUnit::Year),
            other => bail!(
                "Invalid interval unit '{}', expected day/week/month/year",
                other
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceTemplate {
    pub id: i64,
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
    /// Occurrences strictly after this date stop expanding; on-or-before
    /// remain valid.
    pub disabled_after: Option<NaiveDate>,
}

/// How an unspent (or overspent) budget amount carries into the next period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloverPolicy {
    /// Remaining is discarded; every period opens at the limit.
    None,
    /// Remaining (possibly negative) is added to this budget's next opening.
    Same,
    /// Remaining is credited to another budget's next opening.
    Into(String),
}

impl RolloverPolicy {
    pub fn encode(&self) -> String {
        match self {
            RolloverPolicy::None => "none".to_string(),
            RolloverPolicy::Same => "same".to_string(),
            RolloverPolicy::Into(name) => format!("into:{}", name),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        if s == "none" {
            Ok(RolloverPolicy::None)
        } else if s == "same" {
            Ok(RolloverPolicy::Same)
        } else if let Some(target) = s.strip_prefix("into:") {
            if target.is_empty() {
                bail!("Rollover target budget name is empty");
            }
            Ok(RolloverPolicy::Into(target.to_string()))
        } else {
            bail!(
                "Invalid rollover policy '{}', expected none/same/into:<budget>",
                s
            )
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub name: String,
    pub limit_amount: Decimal,
    pub rollover: RolloverPolicy,
}

/// Derived per-period budget state. Computed from the ledger plus carryover
/// and transfer records, never stored, so retried closes cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetPeriodBalance {
    pub budget_id: i64,
    pub period: String, // YYYY-MM
    pub opening: Decimal,
    pub consumed: Decimal,
    pub remaining: Decimal,
}
