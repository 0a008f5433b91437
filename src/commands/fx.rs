// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

use super::{arg, converter, rate_provider};
use crate::config::AppConfig;
use crate::fx::{compare, Convert, RateProvider, RateStore, SqliteRateStore};
use crate::models::{RateTable, BASE_CURRENCY};
use crate::prefs::{self, Preferences};
use crate::utils::{
    maybe_print_json, parse_amount, parse_currency, pretty_table, set_main_currency, set_setting,
};

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set-main", sub)) => {
            let ccy = parse_currency(arg(sub, "currency")?)?;
            set_main_currency(conn, &ccy)?;
            prefs::begin_session(Preferences {
                main_currency: ccy.clone(),
            });
            println!("Main currency set to {}", ccy);
        }
        Some(("set-key", sub)) => {
            set_setting(conn, "rates_app_id", arg(sub, "key")?.trim())?;
            println!("Rate API token saved");
        }
        Some(("fetch", _)) => fetch_and_save(conn, cfg)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("compare", sub)) => compare_rates(conn, cfg, sub)?,
        Some(("convert", sub)) => convert_amount(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

/// Administrative refresh: fetch and overwrite the stored table.
fn fetch_and_save(conn: &Connection, cfg: &AppConfig) -> Result<()> {
    let fresh = fetch_fresh(conn, cfg)?;
    SqliteRateStore::new(conn).save(&fresh)?;
    println!(
        "Saved {} rates (provider time {})",
        fresh.len(),
        fresh.last_updated().to_rfc3339()
    );
    Ok(())
}

fn fetch_fresh(conn: &Connection, cfg: &AppConfig) -> Result<RateTable> {
    rate_provider(conn, cfg)?
        .fetch_latest(BASE_CURRENCY)
        .context("Fetching latest rates")
}

#[derive(Serialize)]
struct RateRow {
    currency: String,
    rate: String,
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let table = SqliteRateStore::new(conn)
        .load()
        .context("No stored rates; run `fintrack fx fetch`")?;
    let rows: Vec<RateRow> = table
        .rates()
        .iter()
        .map(|(c, r)| RateRow {
            currency: c.clone(),
            rate: r.to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        println!(
            "1 {} = rate, last updated {}",
            BASE_CURRENCY,
            table.last_updated().to_rfc3339()
        );
        let data = rows.into_iter().map(|r| vec![r.currency, r.rate]).collect();
        println!("{}", pretty_table(&["Currency", "Rate"], data));
    }
    Ok(())
}

#[derive(Serialize)]
struct DeltaRow {
    currency: String,
    stored: String,
    fresh: String,
    change_percent: String,
}

fn compare_rates(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let stored = SqliteRateStore::new(conn)
        .load()
        .context("No stored rates to compare against")?;
    let fresh = fetch_fresh(conn, cfg)?;
    let deltas = compare(&stored, &fresh);

    let rows: Vec<DeltaRow> = deltas
        .iter()
        .filter_map(|(code, delta)| {
            Some(DeltaRow {
                currency: code.clone(),
                stored: stored.rate(code)?.to_string(),
                fresh: fresh.rate(code)?.to_string(),
                change_percent: delta.to_string(),
            })
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .into_iter()
            .map(|r| vec![r.currency, r.stored, r.fresh, format!("{}%", r.change_percent)])
            .collect();
        println!(
            "{}",
            pretty_table(&["Currency", "Stored", "Fresh", "Change"], data)
        );
    }
    Ok(())
}

fn convert_amount(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let from = parse_currency(arg(sub, "from")?)?;
    let to = parse_currency(arg(sub, "to")?)?;
    let amount = parse_amount(arg(sub, "amount")?, &from)?;
    let res = converter(conn, cfg)?.convert(amount, &from, &to)?;
    println!("{} {} -> {:.4} {}", amount, from, res, to);
    Ok(())
}
