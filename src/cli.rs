// Copyright (c) 2025 Tallybook Authors.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON instead of a table"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print one JSON object per line"),
    )
}

fn required(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).required(true).help(help)
}

fn optional(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).help(help)
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .about("Personal finance ledger, recurring projections, and budget rollover")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Create the database if missing"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Account name"))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .default_value("checking")
                                .help("Account kind (checking, savings, cash, ...)"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("close")
                        .arg(required("name", "name", "Account name"))
                        .arg(optional("date", "date", "Close date, default today")),
                )
                .subcommand(
                    Command::new("balance")
                        .arg(required("name", "name", "Account name"))
                        .arg(optional("as-of", "as-of", "Balance as of date, default today")),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(Command::new("add").arg(required("name", "name", "Category name")))
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Post and inspect ledger entries")
                .subcommand(
                    Command::new("add")
                        .arg(required("date", "date", "Entry date YYYY-MM-DD"))
                        .arg(required("account", "account", "Account name"))
                        .arg(required(
                            "amount",
                            "amount",
                            "Signed amount; negative for expense",
                        ))
                        .arg(optional("category", "category", "Category name"))
                        .arg(optional("budget", "budget", "Budget name"))
                        .arg(optional("location", "location", "Where it happened"))
                        .arg(optional("note", "note", "Free-text note")),
                )
                .subcommand(
                    Command::new("adjust")
                        .about("Post an out-of-band balance adjustment")
                        .arg(required("date", "date", "Adjustment date YYYY-MM-DD"))
                        .arg(required("account", "account", "Account name"))
                        .arg(required("amount", "amount", "Signed amount"))
                        .arg(optional("note", "note", "Free-text note")),
                )
                .subcommand(
                    Command::new("void")
                        .about("Void an entry and post its reversal")
                        .arg(
                            Arg::new("id")
                                .long("id")
                                .required(true)
                                .value_parser(value_parser!(i64))
                                .help("Entry id"),
                        ),
                )
                .subcommand(
                    json_flags(Command::new("list"))
                        .arg(required("account", "account", "Account name"))
                        .arg(optional("from", "from", "Earliest date"))
                        .arg(optional("to", "to", "Latest date")),
                ),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring templates and their expansion")
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Template name"))
                        .arg(required("account", "account", "Account name"))
                        .arg(required(
                            "amount",
                            "amount",
                            "Signed amount; negative for expense",
                        ))
                        .arg(required("start", "start", "First occurrence YYYY-MM-DD"))
                        .arg(
                            Arg::new("unit")
                                .long("unit")
                                .required(true)
                                .help("Interval unit: day, week, month or year"),
                        )
                        .arg(
                            Arg::new("every")
                                .long("every")
                                .default_value("1")
                                .value_parser(value_parser!(u32))
                                .help("Interval count, e.g. 2 for every second unit"),
                        )
                        .arg(optional("category", "category", "Category name"))
                        .arg(optional("budget", "budget", "Budget name"))
                        .arg(optional("end", "end", "Last valid date"))
                        .arg(
                            Arg::new("max")
                                .long("max")
                                .value_parser(value_parser!(u32))
                                .help("Occurrence cap"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("disable")
                        .arg(required("name", "name", "Template name"))
                        .arg(optional("date", "date", "Disable after date, default today")),
                )
                .subcommand(
                    Command::new("run")
                        .about("Materialize occurrences inside a window")
                        .arg(required("name", "name", "Template name"))
                        .arg(required("from", "from", "Window start YYYY-MM-DD"))
                        .arg(required("to", "to", "Window end YYYY-MM-DD")),
                )
                .subcommand(
                    json_flags(Command::new("upcoming"))
                        .arg(required("account", "account", "Account name"))
                        .arg(required("from", "from", "Horizon start YYYY-MM-DD"))
                        .arg(required("to", "to", "Horizon end YYYY-MM-DD")),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Budgets, period balances, rollover")
                .subcommand(
                    Command::new("add")
                        .arg(required("name", "name", "Budget name"))
                        .arg(required("limit", "limit", "Per-period limit"))
                        .arg(
                            Arg::new("rollover")
                                .long("rollover")
                                .default_value("none")
                                .help("Rollover policy: none, same or into:<budget>"),
                        )
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .action(ArgAction::Append)
                                .help("Member category; repeatable"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    json_flags(Command::new("status"))
                        .arg(required("name", "name", "Budget name"))
                        .arg(required("month", "month", "Period YYYY-MM")),
                )
                .subcommand(
                    Command::new("close")
                        .about("Close a period and open the next per policy")
                        .arg(required("name", "name", "Budget name"))
                        .arg(required("month", "month", "Period YYYY-MM")),
                )
                .subcommand(
                    Command::new("transfer")
                        .about("Reallocate remaining between budgets on demand")
                        .arg(required("from", "from", "Source budget"))
                        .arg(required("to", "to", "Destination budget"))
                        .arg(required("month", "month", "Period YYYY-MM"))
                        .arg(required("amount", "amount", "Amount to move")),
                ),
        )
        .subcommand(
            Command::new("report")
                .about("Read-only aggregates")
                .subcommand(
                    json_flags(Command::new("totals"))
                        .arg(required("from", "from", "Range start YYYY-MM-DD"))
                        .arg(required("to", "to", "Range end YYYY-MM-DD")),
                )
                .subcommand(
                    json_flags(Command::new("cashflow")).arg(
                        Arg::new("months")
                            .long("months")
                            .default_value("12")
                            .value_parser(value_parser!(usize))
                            .help("How many months back"),
                    ),
                )
                .subcommand(
                    json_flags(Command::new("spend-by-category"))
                        .arg(required("from", "from", "Range start YYYY-MM-DD"))
                        .arg(required("to", "to", "Range end YYYY-MM-DD")),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data as CSV").subcommand(
                Command::new("tx").arg(required("out", "out", "Output CSV path")),
            ),
        )
        .subcommand(
            Command::new("import").about("Import data from CSV").subcommand(
                Command::new("tx")
                    .arg(required("file", "file", "Input CSV path"))
                    .arg(required("account", "account", "Account to post into")),
            ),
        )
        .subcommand(Command::new("doctor").about("Run integrity checks"))
}
