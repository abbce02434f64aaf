// Copyright (c) 2025 Soumyadip Sarkar.
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
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .long("id")
        .required(true)
        .value_parser(value_parser!(i64))
}

pub fn build_cli() -> Command {
    Command::new("pennyledger")
        .version(clap::crate_version!())
        .about("Personal finance ledger: accounts, transactions, budgets, goals")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("Database file (default: $PENNYLEDGER_DB or the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .help("Owner username (default: $PENNYLEDGER_USER)"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging on stderr"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("user")
                .about("Ledger owners")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Username"))
                        .arg(opt("currency", "Preferred currency").default_value("USD")),
                )
                .subcommand(json_flags(Command::new("list"))),
        )
        .subcommand(
            Command::new("account")
                .about("Accounts")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Account name"))
                        .arg(
                            opt("type", "checking|savings|credit|investment|cash|other")
                                .default_value("checking"),
                        )
                        .arg(opt("number", "Account number"))
                        .arg(opt("color", "Display color")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(req("name", "Current account name"))
                        .arg(opt("new-name", "New name"))
                        .arg(opt("type", "New type"))
                        .arg(opt("number", "New account number"))
                        .arg(
                            Arg::new("clear-number")
                                .long("clear-number")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("number")
                                .help("Remove the account number"),
                        )
                        .arg(opt("color", "New display color")),
                )
                .subcommand(Command::new("rm").arg(req("name", "Account name"))),
        )
        .subcommand(
            Command::new("category")
                .about("Income and expense categories")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Category name"))
                        .arg(opt("type", "income|expense").default_value("expense"))
                        .arg(opt("color", "Display color")),
                )
                .subcommand(json_flags(
                    Command::new("list").arg(opt("type", "Only income or expense")),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(req("name", "Current category name"))
                        .arg(opt("new-name", "New name"))
                        .arg(opt("type", "New type"))
                        .arg(opt("color", "New display color")),
                )
                .subcommand(Command::new("rm").arg(req("name", "Category name"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .arg(req("account", "Account name"))
                        .arg(req("category", "Category name"))
                        .arg(req("amount", "Amount, non-negative"))
                        .arg(opt("type", "income|expense").default_value("expense"))
                        .arg(req("description", "Description"))
                        .arg(opt("date", "YYYY-MM-DD (default: today)"))
                        .arg(opt("method", "cash|debit|credit|bank|mobile|other").default_value("cash"))
                        .arg(opt("notes", "Free-text notes")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("account", "Account name"))
                        .arg(opt("category", "Category name"))
                        .arg(opt("type", "income|expense|all"))
                        .arg(opt("range", "month|quarter|year|all"))
                        .arg(opt("limit", "Max rows").value_parser(value_parser!(usize))),
                ))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("account", "Account name"))
                        .arg(opt("category", "Category name"))
                        .arg(opt("amount", "Amount"))
                        .arg(opt("type", "income|expense"))
                        .arg(opt("description", "Description"))
                        .arg(opt("date", "YYYY-MM-DD"))
                        .arg(opt("method", "Payment method"))
                        .arg(opt("notes", "Notes"))
                        .arg(
                            Arg::new("clear-notes")
                                .long("clear-notes")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("notes")
                                .help("Remove the notes"),
                        ),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("budget")
                .about("Category budgets")
                .subcommand(
                    Command::new("add")
                        .arg(req("category", "Expense category name"))
                        .arg(req("amount", "Budget cap"))
                        .arg(req("start", "Start date YYYY-MM-DD"))
                        .arg(opt("end", "End date YYYY-MM-DD")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("category", "Category name"))
                        .arg(opt("amount", "Budget cap"))
                        .arg(opt("start", "Start date"))
                        .arg(opt("end", "End date"))
                        .arg(
                            Arg::new("open-ended")
                                .long("open-ended")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("end")
                                .help("Remove the end date"),
                        ),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(
            Command::new("goal")
                .about("Savings goals")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Goal name"))
                        .arg(req("target", "Target amount"))
                        .arg(opt("current", "Amount saved so far").default_value("0"))
                        .arg(req("date", "Target date YYYY-MM-DD")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("edit")
                        .arg(id_arg())
                        .arg(opt("name", "Goal name"))
                        .arg(opt("target", "Target amount"))
                        .arg(opt("current", "Amount saved so far"))
                        .arg(opt("date", "Target date")),
                )
                .subcommand(Command::new("rm").arg(id_arg())),
        )
        .subcommand(json_flags(
            Command::new("dashboard")
                .about("Balances, this month, recent activity and the last six months")
                .arg(opt("as-of", "Report date YYYY-MM-DD (default: today)")),
        ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn global_user_flag_after_subcommand() {
        let m = build_cli().get_matches_from(["pennyledger", "tx", "rm", "--id", "3", "--user", "ana"]);
        assert_eq!(m.get_one::<String>("user").map(String::as_str), Some("ana"));
    }

    #[test]
    fn clear_flags_conflict_with_values() {
        let r = build_cli().try_get_matches_from([
            "pennyledger", "tx", "edit", "--id", "1", "--notes", "x", "--clear-notes",
        ]);
        assert!(r.is_err());
        let r = build_cli().try_get_matches_from([
            "pennyledger", "account", "edit", "--name", "A", "--number", "9", "--clear-number",
        ]);
        assert!(r.is_err());
    }
}
