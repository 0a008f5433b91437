// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::{FinanceError, FinanceResult};
use crate::models::BASE_CURRENCY;

const UA: &str = concat!(
    "fintrack/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/fintrack)"
);

static AMOUNT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?(\d+)(?:\.(\d+))?$").expect("amount pattern is valid")
});
static CURRENCY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}$").expect("currency pattern is valid"));

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts `YYYY-MM-DD HH:MM[:SS]` or a bare date (midnight).
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    Ok(parse_date(s)?.and_time(NaiveTime::MIN))
}

/// Number of digits after the decimal point a currency's amounts may carry.
pub fn minor_units(currency: &str) -> u32 {
    match currency {
        "JPY" | "KRW" | "VND" | "IDR" | "CLP" | "ISK" | "HUF" | "PYG" | "UGX" | "XAF" | "XOF" => 0,
        "BHD" | "KWD" | "OMR" | "JOD" | "TND" | "IQD" | "LYD" => 3,
        _ => 2,
    }
}

pub fn parse_currency(s: &str) -> FinanceResult<String> {
    let code = s.trim().to_uppercase();
    if CURRENCY_RE.is_match(&code) {
        Ok(code)
    } else {
        Err(FinanceError::InvalidInput(format!("currency code '{}'", s.trim())))
    }
}

/// Parses a user-entered amount for `currency`, rejecting anything that is not
/// a plain decimal or that carries more precision than the currency allows.
pub fn parse_amount(s: &str, currency: &str) -> FinanceResult<Decimal> {
    let raw = s.trim();
    let caps = AMOUNT_RE
        .captures(raw)
        .ok_or_else(|| FinanceError::invalid_input(raw, "not a number"))?;
    let places = caps.get(2).map(|m| m.as_str().len()).unwrap_or(0);
    let allowed = minor_units(currency) as usize;
    if places > allowed {
        return Err(FinanceError::invalid_input(
            raw,
            format!("{} allows at most {} decimal places", currency, allowed),
        ));
    }
    raw.parse::<Decimal>()
        .map_err(|e| FinanceError::invalid_input(raw, e.to_string()))
}

/// Same as [`parse_amount`] but the value must be zero or positive.
pub fn parse_non_negative(s: &str, currency: &str) -> FinanceResult<Decimal> {
    let d = parse_amount(s, currency)?;
    if d < Decimal::ZERO {
        return Err(FinanceError::invalid_input(s.trim(), "must not be negative"));
    }
    Ok(d)
}

/// Parses a stored decimal column; used at the data-loading boundary.
pub fn parse_stored_decimal(s: &str, field: &str) -> FinanceResult<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|e| FinanceError::invalid_input(s, format!("{}: {}", field, e)))
}

/// Rounds to the currency's minor unit, midpoint away from zero.
pub fn round_minor(d: Decimal, currency: &str) -> Decimal {
    d.round_dp_with_strategy(minor_units(currency), RoundingStrategy::MidpointAwayFromZero)
}

pub fn round_money(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn fmt_money(d: &Decimal, ccy: &str) -> String {
    format!("{} {:.2}", ccy, round_money(*d))
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(ny, nm, 1),
    ) {
        (Some(first), Some(next)) => (next - first).num_days() as u32,
        _ => 30,
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn id_for_category(conn: &Connection, name: &str) -> Result<i64> {
    let mut stmt = conn.prepare("SELECT id FROM categories WHERE name=?1")?;
    let id: i64 = stmt
        .query_row(params![name], |r| r.get(0))
        .with_context(|| format!("Category '{}' not found", name))?;
    Ok(id)
}

pub fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

pub fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, value],
    )?;
    Ok(())
}

// Main (display) currency settings
pub fn get_main_currency(conn: &Connection) -> Result<String> {
    Ok(get_setting(conn, "main_currency")?.unwrap_or_else(|| BASE_CURRENCY.to_string()))
}

pub fn set_main_currency(conn: &Connection, ccy: &str) -> Result<()> {
    set_setting(conn, "main_currency", ccy)
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // Arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
