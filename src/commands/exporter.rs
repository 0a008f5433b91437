// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::{bail, Result};
use rusqlite::Connection;
use serde_json::json;

use super::arg;
use crate::repo;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("expenses", sub)) => export_expenses(conn, sub),
        _ => Ok(()),
    }
}

fn export_expenses(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = arg(sub, "format")?.to_lowercase();
    let out = arg(sub, "out")?;

    let names: HashMap<i64, String> = repo::list_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let expenses = repo::list_expenses(conn)?;

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "date",
                "amount",
                "currency",
                "converted_amount",
                "converted_currency",
                "category",
                "payment_method",
                "description",
            ])?;
            for e in &expenses {
                wtr.write_record([
                    e.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                    e.amount.to_string(),
                    e.from_currency.clone(),
                    e.converted_amount.to_string(),
                    e.to_currency.clone(),
                    names.get(&e.category_id).cloned().unwrap_or_default(),
                    e.payment_method.label(),
                    e.description.clone(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = expenses
                .iter()
                .map(|e| {
                    json!({
                        "date": e.date.format("%Y-%m-%d %H:%M:%S").to_string(),
                        "amount": e.amount.to_string(),
                        "currency": e.from_currency,
                        "convertedAmount": e.converted_amount.to_string(),
                        "convertedCurrency": e.to_currency,
                        "category": names.get(&e.category_id),
                        "paymentMethod": e.payment_method,
                        "description": e.description,
                        "isPublic": e.is_public,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported {} expense(s) to {}", expenses.len(), out);
    Ok(())
}
