// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod categories;
pub mod debts;
pub mod expenses;
pub mod exporter;
pub mod fx;
pub mod investments;
pub mod reports;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime, Utc};
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::fx::{CurrencyConverter, HttpRateProvider, SqliteRateStore};
use crate::models::RateTable;
use crate::prefs;
use crate::utils::{get_main_currency, parse_currency, parse_datetime};

pub type Converter<'c> = CurrencyConverter<SqliteRateStore<'c>, HttpRateProvider>;

/// Reads an argument clap already guarantees is present.
pub fn arg<'a>(m: &'a clap::ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(|s| s.as_str())
        .with_context(|| format!("Missing --{}", id))
}

pub fn opt_arg<'a>(m: &'a clap::ArgMatches, id: &str) -> Option<&'a str> {
    m.try_get_one::<String>(id)
        .ok()
        .flatten()
        .map(|s| s.as_str())
}

pub fn id_arg(m: &clap::ArgMatches, id: &str) -> Result<i64> {
    m.get_one::<i64>(id)
        .copied()
        .with_context(|| format!("Missing {}", id))
}

/// `--date` if given, otherwise the current local time.
pub fn date_or_now(m: &clap::ArgMatches) -> Result<NaiveDateTime> {
    match opt_arg(m, "date") {
        Some(s) => parse_datetime(s),
        None => Ok(now_local()),
    }
}

pub fn now_local() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Session preference, then the stored setting.
pub fn main_currency(conn: &Connection) -> Result<String> {
    match prefs::current() {
        Some(p) => Ok(p.main_currency),
        None => get_main_currency(conn),
    }
}

/// `--currency` if given, otherwise the main currency.
pub fn display_currency(conn: &Connection, m: &clap::ArgMatches) -> Result<String> {
    match opt_arg(m, "currency") {
        Some(c) => Ok(parse_currency(c)?),
        None => main_currency(conn),
    }
}

pub fn rate_provider(conn: &Connection, cfg: &AppConfig) -> Result<HttpRateProvider> {
    let app_id = cfg.resolve_app_id(conn)?.unwrap_or_default();
    Ok(HttpRateProvider::new(&cfg.rates_url, &app_id)?)
}

pub fn converter<'c>(conn: &'c Connection, cfg: &AppConfig) -> Result<Converter<'c>> {
    Ok(CurrencyConverter::new(
        SqliteRateStore::new(conn),
        rate_provider(conn, cfg)?,
    ))
}

/// Resolves one table for a batch of conversions. When no rates can be had,
/// an empty table is returned so only same-currency figures convert.
pub fn batch_table(conn: &Connection, cfg: &AppConfig) -> Result<RateTable> {
    match converter(conn, cfg)?.resolve_table() {
        Ok(t) => Ok(t),
        Err(e) => {
            tracing::warn!(error = %e, "no exchange rates available");
            eprintln!("warning: exchange rates unavailable ({}); converted figures may be missing", e);
            Ok(RateTable::new(std::iter::empty(), Utc::now())?)
        }
    }
}
