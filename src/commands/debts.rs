// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;

use super::{arg, date_or_now, id_arg, now_local, opt_arg};
use crate::debt::{self, LedgerLine};
use crate::models::{DebtRecord, DebtTxKind};
use crate::repo;
use crate::utils::{
    fmt_money, maybe_print_json, parse_currency, parse_date, parse_datetime, parse_non_negative,
    parse_stored_decimal, pretty_table,
};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("pay", sub)) => {
            let id = id_arg(sub, "id")?;
            let record = repo::get_debt(conn, id)?;
            let amount = parse_non_negative(arg(sub, "amount")?, &record.currency)?;
            record_tx(conn, &record, DebtTxKind::Payment, amount, sub)?;
        }
        Some(("repay", sub)) => {
            let record = repo::get_debt(conn, id_arg(sub, "id")?)?;
            let amount = record.repayment_amount;
            record_tx(conn, &record, DebtTxKind::Repayment, amount, sub)?;
        }
        Some(("interest", sub)) => {
            let record = repo::get_debt(conn, id_arg(sub, "id")?)?;
            let (tx, amount, balance) =
                repo::accrue_debt_interest(conn, record.id, date_or_now(sub)?)?;
            report_tx(&record, DebtTxKind::Interest, amount, tx, balance);
        }
        Some(("edit-tx", sub)) => edit_tx(conn, sub)?,
        Some(("rm-tx", sub)) => {
            let (debt_id, balance) = repo::remove_debt_tx(conn, id_arg(sub, "tx")?)?;
            println!("Deleted transaction; debt #{} balance is now {}", debt_id, balance);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            let removed = repo::delete_debt(conn, id)?;
            println!("Deleted debt #{} and {} transaction(s)", id, removed);
        }
        _ => {}
    }
    Ok(())
}

fn parse_rate(s: &str) -> Result<Decimal> {
    let rate = parse_stored_decimal(s, "rate")?;
    if rate < Decimal::ZERO {
        bail!("Interest rate must not be negative, got {}", rate);
    }
    Ok(rate)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let currency = parse_currency(arg(sub, "currency")?)?;
    let principal = parse_non_negative(arg(sub, "principal")?, &currency)?;
    let record = DebtRecord {
        id: 0,
        name: arg(sub, "name")?.trim().to_string(),
        original_principal: principal,
        principal_amount: principal,
        repayment_amount: parse_non_negative(arg(sub, "repayment")?, &currency)?,
        currency,
        interest_rate_percent_yearly: parse_rate(arg(sub, "rate")?)?,
        repayment_day_of_month: sub.get_one::<u32>("day").copied().unwrap_or(1),
        start_date: parse_date(arg(sub, "start")?)?,
    };
    let id = repo::insert_debt(conn, &record)?;
    println!("Added debt '{}' (#{})", record.name, id);
    Ok(())
}

fn record_tx(
    conn: &Connection,
    record: &DebtRecord,
    kind: DebtTxKind,
    amount: Decimal,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let date = date_or_now(sub)?;
    let (tx, balance) = repo::record_debt_tx(conn, record.id, kind, amount, date)?;
    report_tx(record, kind, amount, tx, balance);
    Ok(())
}

fn report_tx(record: &DebtRecord, kind: DebtTxKind, amount: Decimal, tx: i64, balance: Decimal) {
    println!(
        "Recorded {} of {} (tx #{}); balance {}",
        kind,
        fmt_money(&amount, &record.currency),
        tx,
        fmt_money(&balance, &record.currency)
    );
}

fn edit_tx(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut tx = repo::get_debt_tx(conn, id_arg(sub, "tx")?)?;
    let record = repo::get_debt(conn, tx.debt_id)?;
    if let Some(a) = opt_arg(sub, "amount") {
        tx.amount = parse_non_negative(a, &record.currency)?;
    }
    if let Some(d) = opt_arg(sub, "date") {
        tx.date = parse_datetime(d)?;
    }
    if let Some(k) = opt_arg(sub, "type") {
        tx.kind = k.parse()?;
    }
    let balance = repo::edit_debt_tx(conn, &tx)?;
    println!(
        "Updated transaction #{}; balance {}",
        tx.id,
        fmt_money(&balance, &record.currency)
    );
    Ok(())
}

#[derive(Serialize)]
struct DebtRow {
    id: i64,
    name: String,
    currency: String,
    original_principal: Decimal,
    balance: Decimal,
    repayment: Decimal,
    rate_percent: Decimal,
    next_repayment: chrono::NaiveDate,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let today = now_local().date();
    let rows: Vec<DebtRow> = repo::list_debts(conn)?
        .into_iter()
        .map(|d| DebtRow {
            id: d.id,
            next_repayment: debt::next_repayment_date(d.repayment_day_of_month, today),
            name: d.name,
            currency: d.currency,
            original_principal: d.original_principal,
            balance: d.principal_amount,
            repayment: d.repayment_amount,
            rate_percent: d.interest_rate_percent_yearly,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.name,
                    fmt_money(&r.balance, &r.currency),
                    fmt_money(&r.repayment, &r.currency),
                    format!("{}%", r.rate_percent),
                    r.next_repayment.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Debt", "Balance", "Repayment", "Rate", "Next due"],
                data
            )
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct DebtStatement {
    debt: DebtRecord,
    next_repayment: chrono::NaiveDate,
    ledger: Vec<LedgerLine>,
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub, "id")?;
    let record = repo::get_debt(conn, id)?;
    let txs = repo::debt_transactions(conn, id)?;
    let statement = DebtStatement {
        next_repayment: debt::next_repayment_date(
            record.repayment_day_of_month,
            now_local().date(),
        ),
        ledger: debt::statement(record.original_principal, &txs)?,
        debt: record,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &statement)? {
        let ccy = &statement.debt.currency;
        println!(
            "{} (#{}): started {} with {}, next repayment {}",
            statement.debt.name,
            statement.debt.id,
            statement.debt.start_date,
            fmt_money(&statement.debt.original_principal, ccy),
            statement.next_repayment
        );
        let data = statement
            .ledger
            .iter()
            .map(|l| {
                vec![
                    l.transaction_id.to_string(),
                    l.date.format("%Y-%m-%d %H:%M").to_string(),
                    l.kind.to_string(),
                    fmt_money(&l.amount, ccy),
                    fmt_money(&l.balance_after, ccy),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Tx", "Date", "Type", "Amount", "Balance"], data)
        );
    }
    Ok(())
}
