// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Core error kinds surfaced by the ledger, recurrence, and budget modules.
/// Command handlers carry these inside `anyhow::Error`; callers that need to
/// branch on a kind can downcast.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("unknown {entity} id {id}")]
    InvalidReference { entity: &'static str, id: i64 },

    #[error("unknown {entity} '{name}'")]
    UnknownName { entity: &'static str, name: String },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("account {0} is closed")]
    AccountClosed(i64),

    #[error("entry {0} is already voided")]
    AlreadyVoided(i64),

    #[error("entry {entry} is tagged with budget {actual:?}, not budget {expected}")]
    BudgetMismatch {
        entry: i64,
        expected: i64,
        actual: Option<i64>,
    },

    #[error("window {start}..={end} lies outside template {template} validity")]
    RecurrenceBoundsExceeded {
        template: i64,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}
