// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{crate_version, value_parser, Arg, ArgAction, Command};

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
            .help("Print as JSON lines"),
    )
}

fn id_arg(name: &'static str) -> Arg {
    Arg::new(name)
        .required(true)
        .value_parser(value_parser!(i64))
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn currency_opt() -> Arg {
    opt("currency").help("Display currency (defaults to the main currency)")
}

fn fx_cmd() -> Command {
    Command::new("fx")
        .about("Exchange rates")
        .subcommand(
            Command::new("set-main")
                .about("Set the main (display) currency")
                .arg(Arg::new("currency").required(true)),
        )
        .subcommand(
            Command::new("set-key")
                .about("Store the rate API token")
                .arg(Arg::new("key").required(true)),
        )
        .subcommand(Command::new("fetch").about("Fetch fresh rates and save them"))
        .subcommand(json_flags(Command::new("show").about("Show the stored rate table")))
        .subcommand(json_flags(
            Command::new("compare").about("Compare stored rates with fresh ones"),
        ))
        .subcommand(
            Command::new("convert")
                .about("Convert an amount")
                .arg(Arg::new("amount").required(true))
                .arg(Arg::new("from").required(true))
                .arg(Arg::new("to").required(true)),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Expense categories")
        .subcommand(Command::new("add").arg(Arg::new("name").required(true)))
        .subcommand(Command::new("list"))
}

fn expense_cmd() -> Command {
    Command::new("expense")
        .about("Expenses")
        .subcommand(
            Command::new("add")
                .about("Record an expense, converted into the main currency")
                .arg(req("amount"))
                .arg(req("currency"))
                .arg(req("category"))
                .arg(opt("date").help("YYYY-MM-DD [HH:MM[:SS]], defaults to now"))
                .arg(
                    opt("method")
                        .default_value("cash")
                        .value_parser(["cash", "credit", "debit", "ewallet"]),
                )
                .arg(opt("bank"))
                .arg(opt("last4"))
                .arg(opt("card-name"))
                .arg(opt("wallet"))
                .arg(opt("linked-card"))
                .arg(opt("desc"))
                .arg(opt("receipt"))
                .arg(opt("product-image"))
                .arg(
                    Arg::new("public")
                        .long("public")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(json_flags(
            Command::new("list")
                .arg(opt("month").help("YYYY-MM"))
                .arg(
                    opt("limit")
                        .value_parser(value_parser!(usize)),
                ),
        ))
        .subcommand(Command::new("rm").arg(id_arg("id")))
}

fn report_cmd() -> Command {
    Command::new("report").about("Reports").subcommand(json_flags(
        Command::new("summary")
            .about("Totals by currency, category and payment method")
            .arg(opt("month").help("YYYY-MM or 'all', defaults to the current month"))
            .arg(currency_opt()),
    ))
}

fn debt_cmd() -> Command {
    let date = || opt("date").help("YYYY-MM-DD [HH:MM[:SS]], defaults to now");
    Command::new("debt")
        .about("Debts and their ledgers")
        .subcommand(
            Command::new("add")
                .arg(req("name"))
                .arg(req("principal"))
                .arg(req("currency"))
                .arg(req("repayment"))
                .arg(req("rate").help("Yearly interest rate in percent"))
                .arg(req("day").value_parser(value_parser!(u32).range(1..=31)))
                .arg(req("start")),
        )
        .subcommand(json_flags(Command::new("list")))
        .subcommand(json_flags(Command::new("show").arg(id_arg("id"))))
        .subcommand(
            Command::new("pay")
                .arg(id_arg("id"))
                .arg(req("amount"))
                .arg(date()),
        )
        .subcommand(
            Command::new("repay")
                .about("Record the scheduled repayment amount")
                .arg(id_arg("id"))
                .arg(date()),
        )
        .subcommand(
            Command::new("interest")
                .about("Accrue one round of interest on the current balance")
                .arg(id_arg("id"))
                .arg(date()),
        )
        .subcommand(
            Command::new("edit-tx")
                .arg(id_arg("tx"))
                .arg(opt("amount"))
                .arg(date())
                .arg(opt("type").value_parser(["payment", "repayment", "interest"])),
        )
        .subcommand(Command::new("rm-tx").arg(id_arg("tx")))
        .subcommand(
            Command::new("rm")
                .about("Delete a debt and all of its transactions")
                .arg(id_arg("id")),
        )
}

fn invest_cmd() -> Command {
    Command::new("invest")
        .about("Investments")
        .subcommand(
            Command::new("add")
                .arg(req("title"))
                .arg(req("type"))
                .arg(req("platform"))
                .arg(req("date"))
                .arg(req("quantity"))
                .arg(req("unit"))
                .arg(req("total"))
                .arg(req("currency"))
                .arg(opt("style").default_value("long-term")),
        )
        .subcommand(json_flags(Command::new("list").arg(currency_opt())))
        .subcommand(json_flags(
            Command::new("view").arg(id_arg("id")).arg(currency_opt()),
        ))
        .subcommand(
            Command::new("sell")
                .arg(id_arg("id"))
                .arg(req("amount"))
                .arg(opt("date")),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit fields; profit is not recomputed")
                .arg(id_arg("id"))
                .arg(opt("title"))
                .arg(opt("platform"))
                .arg(opt("quantity"))
                .arg(opt("total"))
                .arg(opt("sold-amount")),
        )
        .subcommand(
            Command::new("recompute")
                .about("Recompute profit of a sold investment")
                .arg(id_arg("id")),
        )
}

fn export_cmd() -> Command {
    Command::new("export").about("Export data").subcommand(
        Command::new("expenses")
            .arg(
                opt("format")
                    .default_value("csv")
                    .value_parser(["csv", "json"]),
            )
            .arg(req("out")),
    )
}

pub fn build_cli() -> Command {
    Command::new("fintrack")
        .version(crate_version!())
        .about("Multi-currency expense, debt and investment tracking")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(fx_cmd())
        .subcommand(category_cmd())
        .subcommand(expense_cmd())
        .subcommand(report_cmd())
        .subcommand(debt_cmd())
        .subcommand(invest_cmd())
        .subcommand(export_cmd())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        build_cli().debug_assert();
    }

    #[test]
    fn debt_day_out_of_range_is_rejected() {
        let res = build_cli().try_get_matches_from([
            "fintrack", "debt", "add", "--name", "x", "--principal", "1", "--currency", "USD",
            "--repayment", "1", "--rate", "1", "--day", "32", "--start", "2025-01-01",
        ]);
        assert!(res.is_err());
    }
}
