// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use chrono::Datelike;
use rusqlite::Connection;
use serde::Serialize;

use super::{batch_table, display_currency, now_local, opt_arg};
use crate::config::AppConfig;
use crate::report::{self, Period, ReportSummary};
use crate::repo;
use crate::utils::{fmt_money, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// Summary with category ids resolved to names.
#[derive(Serialize)]
struct NamedSummary {
    #[serde(flatten)]
    summary: ReportSummary,
    by_category_name: BTreeMap<String, rust_decimal::Decimal>,
}

fn summary(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let now = now_local();
    let period: Period = match opt_arg(sub, "month") {
        Some(s) => s.parse()?,
        None => Period::Month {
            year: now.year(),
            month: now.month(),
        },
    };
    let display = display_currency(conn, sub)?;
    let expenses = repo::list_expenses(conn)?;
    let table = batch_table(conn, cfg)?;
    let summary = report::aggregate(&expenses, period, &display, now, &table)?;

    let names: HashMap<i64, String> = repo::list_categories(conn)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();
    let by_category_name = summary
        .by_category
        .iter()
        .map(|(id, amount)| {
            let name = names
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("#{}", id));
            (name, *amount)
        })
        .collect();
    let named = NamedSummary {
        summary,
        by_category_name,
    };

    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &named)? {
        return Ok(());
    }
    let s = &named.summary;
    println!(
        "Period {} in {}: {} expense(s), total {}, {} day(s), daily average {}",
        s.period,
        s.display_currency,
        s.expense_count,
        fmt_money(&s.total, &s.display_currency),
        s.day_count,
        fmt_money(&s.daily_average, &s.display_currency)
    );

    let native = s
        .by_currency
        .iter()
        .map(|(ccy, amt)| vec![ccy.clone(), format!("{}", amt)])
        .collect();
    println!("{}", pretty_table(&["Currency", "Native total"], native));

    let cats = named
        .by_category_name
        .iter()
        .map(|(name, amt)| vec![name.clone(), fmt_money(amt, &s.display_currency)])
        .collect();
    println!("{}", pretty_table(&["Category", "Total"], cats));

    let methods = s
        .by_payment_method
        .iter()
        .map(|(label, amt)| vec![label.clone(), fmt_money(amt, &s.display_currency)])
        .collect();
    println!("{}", pretty_table(&["Payment method", "Total"], methods));

    if !s.unconverted.is_empty() {
        let ids: Vec<String> = s.unconverted.iter().map(|id| format!("#{}", id)).collect();
        println!(
            "Not converted to {} (no rate): {}",
            s.display_currency,
            ids.join(", ")
        );
    }
    Ok(())
}
