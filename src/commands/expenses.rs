// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::{arg, converter, date_or_now, id_arg, main_currency, opt_arg};
use crate::config::AppConfig;
use crate::fx::Convert;
use crate::models::{Expense, PaymentMethod};
use crate::report::Period;
use crate::repo;
use crate::utils::{
    fmt_money, id_for_category, maybe_print_json, parse_currency, parse_non_negative, pretty_table,
};

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, cfg, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = id_arg(sub, "id")?;
            repo::delete_expense(conn, id)?;
            println!("Deleted expense #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn payment_method(sub: &clap::ArgMatches) -> Result<PaymentMethod> {
    let need = |id: &str| -> Result<String> {
        opt_arg(sub, id)
            .map(|s| s.trim().to_string())
            .with_context(|| format!("--{} is required for this payment method", id))
    };
    let method = arg(sub, "method")?;
    let pm = match method {
        "cash" => PaymentMethod::Cash,
        "credit" => PaymentMethod::CreditCard {
            bank: need("bank")?,
            last4: need("last4")?,
            name: need("card-name")?,
        },
        "debit" => PaymentMethod::DebitCard {
            bank: need("bank")?,
            last4: need("last4")?,
        },
        "ewallet" => PaymentMethod::EWallet {
            name: need("wallet")?,
            linked_card: opt_arg(sub, "linked-card").map(|s| s.trim().to_string()),
        },
        other => bail!("Unknown payment method '{}'", other),
    };
    if let PaymentMethod::CreditCard { last4, .. } | PaymentMethod::DebitCard { last4, .. } = &pm {
        if last4.len() != 4 || !last4.chars().all(|c| c.is_ascii_digit()) {
            bail!("--last4 must be exactly four digits, got '{}'", last4);
        }
    }
    Ok(pm)
}

fn add(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let from_currency = parse_currency(arg(sub, "currency")?)?;
    let amount = parse_non_negative(arg(sub, "amount")?, &from_currency)?;
    let category_id = id_for_category(conn, arg(sub, "category")?.trim())?;
    let payment_method = payment_method(sub)?;
    let to_currency = main_currency(conn)?;
    let converted_amount = converter(conn, cfg)?
        .convert(amount, &from_currency, &to_currency)
        .with_context(|| {
            format!(
                "Converting {} to {}; the expense was not saved",
                from_currency, to_currency
            )
        })?;

    let expense = Expense {
        id: 0,
        amount,
        from_currency,
        converted_amount,
        to_currency,
        category_id,
        payment_method,
        date: date_or_now(sub)?,
        description: opt_arg(sub, "desc").unwrap_or_default().to_string(),
        receipt_image: opt_arg(sub, "receipt").map(str::to_string),
        product_image: opt_arg(sub, "product-image").map(str::to_string),
        is_public: sub.get_flag("public"),
    };
    let id = repo::insert_expense(conn, &expense)?;
    tracing::info!(expense = id, "expense recorded");
    println!(
        "Recorded expense #{}: {} ({})",
        id,
        fmt_money(&expense.amount, &expense.from_currency),
        fmt_money(&expense.converted_amount, &expense.to_currency)
    );
    Ok(())
}

#[derive(Serialize)]
struct ExpenseRow {
    id: i64,
    date: String,
    amount: String,
    currency: String,
    converted: String,
    category: String,
    method: String,
    description: String,
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period: Period = match opt_arg(sub, "month") {
        Some(s) => s.parse()?,
        None => Period::All,
    };
    let limit = sub.get_one::<usize>("limit").copied();
    let names: std::collections::HashMap<i64, String> = repo::list_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    let mut rows: Vec<ExpenseRow> = repo::list_expenses(conn)?
        .into_iter()
        .filter(|e| period.contains(e.date.date()))
        .rev()
        .map(|e| ExpenseRow {
            id: e.id,
            date: e.date.format("%Y-%m-%d %H:%M").to_string(),
            amount: e.amount.to_string(),
            currency: e.from_currency.clone(),
            converted: fmt_money(&e.converted_amount, &e.to_currency),
            category: names.get(&e.category_id).cloned().unwrap_or_default(),
            method: e.payment_method.label(),
            description: e.description,
        })
        .collect();
    if let Some(n) = limit {
        rows.truncate(n);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date,
                    r.amount,
                    r.currency,
                    r.converted,
                    r.category,
                    r.method,
                    r.description,
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Amount", "CCY", "Converted", "Category", "Method", "Description"],
                data
            )
        );
    }
    Ok(())
}
