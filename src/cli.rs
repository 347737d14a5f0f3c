// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{command, value_parser, Arg, ArgAction, Command};

const ACCOUNT_KINDS: [&str; 5] = ["checking", "credit", "savings", "cash", "other"];
const ENTRY_KINDS: [&str; 2] = ["expense", "income"];
const RECURRENCES: [&str; 3] = ["fixed", "installment", "one_time"];
const STATUSES: [&str; 2] = ["pending", "paid"];
const SWITCH: [&str; 2] = ["on", "off"];

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

/// `--month YYYY-MM` or an explicit `--from/--to` range.
fn period_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("month")
            .long("month")
            .value_name("YYYY-MM")
            .conflicts_with_all(["from", "to"])
            .help("Calendar month (defaults to the current month)"),
    )
    .arg(
        Arg::new("from")
            .long("from")
            .value_name("YYYY-MM-DD")
            .help("First day of the range, inclusive"),
    )
    .arg(
        Arg::new("to")
            .long("to")
            .value_name("YYYY-MM-DD")
            .help("Last day of the range, inclusive"),
    )
}

fn entry_filters(cmd: Command) -> Command {
    cmd.arg(Arg::new("account").long("account").help("Account name"))
        .arg(Arg::new("member").long("member").help("Member name"))
        .arg(Arg::new("category").long("category").help("Category name"))
        .arg(Arg::new("type").long("type").help("Type name"))
        .arg(
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .conflicts_with_all(["month", "from", "to"])
                .help("Ignore dates and list everything"),
        )
}

fn family_arg() -> Arg {
    Arg::new("family")
        .long("family")
        .value_parser(SWITCH)
        .help("Override the member's family setting for this entry")
}

fn entry_id() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    command!()
        .name("hearth")
        .about("Household budgeting ledger with installment tracking")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("Use this database file instead of the default location"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count)
                .help("More log output on stderr (-v info, -vv debug)"),
        )
        .subcommand(Command::new("init").about("Create the database and seed default categories and types"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(ACCOUNT_KINDS)
                                .default_value("checking"),
                        )
                        .arg(
                            Arg::new("initial")
                                .long("initial")
                                .allow_hyphen_values(true)
                                .default_value("0")
                                .help("Opening balance, may be negative"),
                        ),
                )
                .subcommand(json_flags(Command::new("list").about("Accounts with derived balances"))),
        )
        .subcommand(
            Command::new("member")
                .about("Manage family members")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("color").long("color").default_value("#3b82f6"))
                        .arg(
                            Arg::new("no-family")
                                .long("no-family")
                                .action(ArgAction::SetTrue)
                                .help("Keep this member's entries out of family totals by default"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("aggregate")
                        .about("Toggle whether a member counts toward family totals")
                        .arg(Arg::new("name").required(true))
                        .arg(Arg::new("state").required(true).value_parser(SWITCH)),
                ),
        )
        .subcommand(
            Command::new("category")
                .about("Manage categories")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(ENTRY_KINDS)
                                .default_value("expense"),
                        )
                        .arg(Arg::new("color").long("color").default_value("#64748b"))
                        .arg(Arg::new("description").long("description")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(Arg::new("kind").long("kind").value_parser(ENTRY_KINDS)),
                )),
        )
        .subcommand(
            Command::new("type")
                .about("Manage entry types")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("name").required(true))
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .value_parser(ENTRY_KINDS)
                                .default_value("expense"),
                        )
                        .arg(Arg::new("color").long("color").default_value("#64748b"))
                        .arg(Arg::new("description").long("description"))
                        .arg(
                            Arg::new("recurrence")
                                .long("recurrence")
                                .value_parser(RECURRENCES)
                                .help("Recurrence style of an expense type"),
                        ),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(Arg::new("kind").long("kind").value_parser(ENTRY_KINDS)),
                )),
        )
        .subcommand(
            Command::new("income")
                .about("Record and list income")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true),
                        )
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                        .arg(Arg::new("account").long("account"))
                        .arg(Arg::new("member").long("member"))
                        .arg(Arg::new("category").long("category"))
                        .arg(Arg::new("type").long("type"))
                        .arg(family_arg()),
                )
                .subcommand(json_flags(entry_filters(period_args(Command::new("list")))))
                .subcommand(Command::new("rm").arg(entry_id())),
        )
        .subcommand(
            Command::new("expense")
                .about("Record and list expenses")
                .subcommand(
                    Command::new("add")
                        .arg(Arg::new("description").required(true))
                        .arg(
                            Arg::new("amount")
                                .long("amount")
                                .required(true)
                                .help("Total amount; split across installments when given"),
                        )
                        .arg(Arg::new("member").long("member").required(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("type").long("type").required(true))
                        .arg(Arg::new("date").long("date").help("YYYY-MM-DD, defaults to today"))
                        .arg(Arg::new("account").long("account"))
                        .arg(
                            Arg::new("status")
                                .long("status")
                                .value_parser(STATUSES)
                                .default_value("pending"),
                        )
                        .arg(
                            Arg::new("installments")
                                .long("installments")
                                .short('n')
                                .value_parser(value_parser!(u32)),
                        )
                        .arg(family_arg())
                        .arg(
                            Arg::new("json")
                                .long("json")
                                .action(ArgAction::SetTrue)
                                .help("Print the created rows as JSON"),
                        ),
                )
                .subcommand(json_flags(entry_filters(period_args(
                    Command::new("list").arg(
                        Arg::new("status")
                            .long("status")
                            .value_parser(STATUSES),
                    ),
                ))))
                .subcommand(
                    Command::new("status")
                        .about("Mark an expense as pending or paid")
                        .arg(entry_id())
                        .arg(Arg::new("status").required(true).value_parser(STATUSES)),
                )
                .subcommand(Command::new("rm").arg(entry_id())),
        )
        .subcommand(
            Command::new("report")
                .about("Derived totals")
                .subcommand(json_flags(period_args(Command::new("summary"))))
                .subcommand(json_flags(period_args(Command::new("by-category"))))
                .subcommand(json_flags(period_args(Command::new("by-member"))))
                .subcommand(json_flags(period_args(Command::new("by-type"))))
                .subcommand(json_flags(period_args(Command::new("family"))))
                .subcommand(json_flags(period_args(Command::new("members"))))
                .subcommand(json_flags(
                    Command::new("committed")
                        .about("Pending expenses from a month onward")
                        .arg(
                            Arg::new("from")
                                .long("from")
                                .value_name("YYYY-MM")
                                .help("First month to include (defaults to the current month)"),
                        ),
                )),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budgets per expense category")
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("month").required(true).value_name("YYYY-MM"))
                        .arg(Arg::new("category").required(true))
                        .arg(Arg::new("amount").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(Arg::new("month").long("month").value_name("YYYY-MM")),
                ))
                .subcommand(json_flags(
                    Command::new("report")
                        .arg(Arg::new("month").required(true).value_name("YYYY-MM")),
                )),
        )
        .subcommand(
            Command::new("config")
                .about("Read and write settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                ),
        )
        .subcommand(Command::new("doctor").about("Check installment groups for inconsistencies"))
}
