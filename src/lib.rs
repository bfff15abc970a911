// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod budget;
pub mod cli;
pub mod commands;
pub mod db;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod recurrence;
pub mod reports;
pub mod utils;
