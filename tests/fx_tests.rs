// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{TimeZone, Utc};
use fintrack::config::AppConfig;
use fintrack::errors::{FinanceError, FinanceResult};
use fintrack::fx::{
    compare, Convert, CurrencyConverter, RateProvider, RateStore, SqliteRateStore,
};
use fintrack::models::RateTable;
use fintrack::{cli, commands::fx, db};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn offline_cfg() -> AppConfig {
    AppConfig {
        db_path: PathBuf::from(":memory:"),
        rates_app_id: None,
        rates_url: "http://127.0.0.1:9".into(),
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn table(pairs: &[(&str, &str)]) -> RateTable {
    RateTable::new(
        pairs.iter().map(|(c, r)| (c.to_string(), d(r))),
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

struct CountingProvider {
    table: Option<RateTable>,
    calls: Cell<usize>,
}

impl RateProvider for CountingProvider {
    fn fetch_latest(&self, _base: &str) -> FinanceResult<RateTable> {
        self.calls.set(self.calls.get() + 1);
        self.table
            .clone()
            .ok_or_else(|| FinanceError::NetworkFailure("offline".into()))
    }
}

#[test]
fn provider_payload_saved_then_used_for_cross_rates() {
    let conn = setup();
    let body = r#"{"timestamp": 1754006400, "base": "USD",
                   "rates": {"USD": 1, "EUR": 0.90, "INR": 83}}"#;
    let fresh = fintrack::fx::provider::parse_latest(body, "USD").unwrap();
    let store = SqliteRateStore::new(&conn);
    store.save(&fresh).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.rates(), fresh.rates());
    assert_eq!(loaded.last_updated(), fresh.last_updated());

    // 90 EUR -> 100 USD -> 8300 INR
    let inr = loaded.convert(d("90"), "EUR", "INR").unwrap();
    assert_eq!(inr.round_dp(2), d("8300"));
    let usd = loaded.convert(d("166"), "INR", "USD").unwrap();
    assert_eq!(usd.round_dp(2), d("2"));
}

#[test]
fn saving_overwrites_the_single_slot() {
    let conn = setup();
    let store = SqliteRateStore::new(&conn);
    store.save(&table(&[("EUR", "0.90"), ("GBP", "0.78")])).unwrap();
    store.save(&table(&[("EUR", "0.95")])).unwrap();

    let loaded = store.load().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded.rate("EUR"), Some(d("0.95")));
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM conversion_rates", [], |r| r.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn converter_prefers_stored_rates_and_never_writes_back() {
    let conn = setup();
    let provider = CountingProvider {
        table: Some(table(&[("MYR", "4.50")])),
        calls: Cell::new(0),
    };

    let converter = CurrencyConverter::new(SqliteRateStore::new(&conn), &provider);
    assert_eq!(converter.convert(d("10"), "USD", "MYR").unwrap(), d("45.00"));
    assert_eq!(converter.convert(d("10"), "USD", "MYR").unwrap(), d("45.00"));
    assert_eq!(provider.calls.get(), 2);
    assert!(matches!(
        SqliteRateStore::new(&conn).load(),
        Err(FinanceError::NotFound(_))
    ));

    SqliteRateStore::new(&conn)
        .save(&table(&[("MYR", "4.40")]))
        .unwrap();
    assert_eq!(converter.convert(d("10"), "USD", "MYR").unwrap(), d("44.00"));
    assert_eq!(provider.calls.get(), 2);
}

#[test]
fn missing_rate_is_an_error_not_the_input_amount() {
    let conn = setup();
    SqliteRateStore::new(&conn)
        .save(&table(&[("MYR", "4.40")]))
        .unwrap();
    let provider = CountingProvider {
        table: None,
        calls: Cell::new(0),
    };
    let converter = CurrencyConverter::new(SqliteRateStore::new(&conn), &provider);
    match converter.convert(d("10"), "USD", "SGD") {
        Err(FinanceError::RateUnavailable { currency }) => assert_eq!(currency, "SGD"),
        other => panic!("expected RateUnavailable, got {:?}", other),
    }
    assert_eq!(provider.calls.get(), 0);
}

#[test]
fn compare_reports_percent_change_for_shared_currencies() {
    let stored = table(&[("EUR", "0.90"), ("MYR", "4.00"), ("GBP", "0.78")]);
    let fresh = table(&[("EUR", "0.99"), ("MYR", "4.00"), ("JPY", "150")]);
    let deltas = compare(&stored, &fresh);
    assert_eq!(deltas.len(), 2);
    assert_eq!(deltas["EUR"].to_string(), "10.00");
    assert_eq!(deltas["MYR"].to_string(), "0.00");
    assert!(!deltas.contains_key("GBP"));
    assert!(!deltas.contains_key("JPY"));
}

#[test]
fn fx_convert_command_uses_stored_table() {
    let conn = setup();
    SqliteRateStore::new(&conn)
        .save(&table(&[("MYR", "4.40")]))
        .unwrap();
    let matches = cli::build_cli().get_matches_from(["fintrack", "fx", "convert", "22", "MYR", "USD"]);
    if let Some(("fx", sub)) = matches.subcommand() {
        fx::handle(&conn, &offline_cfg(), sub).unwrap();
    } else {
        panic!("fx subcommand not parsed");
    }
}

#[test]
fn fx_commands_fail_cleanly_offline_without_rates() {
    let conn = setup();
    let cfg = offline_cfg();
    for args in [
        vec!["fintrack", "fx", "show"],
        vec!["fintrack", "fx", "convert", "1", "USD", "EUR"],
        vec!["fintrack", "fx", "fetch"],
    ] {
        let matches = cli::build_cli().get_matches_from(args.clone());
        let Some(("fx", sub)) = matches.subcommand() else {
            panic!("fx subcommand not parsed");
        };
        assert!(fx::handle(&conn, &cfg, sub).is_err(), "{:?} should fail", args);
    }
}

#[test]
fn stored_api_token_is_used_when_env_has_none() {
    let conn = setup();
    let matches = cli::build_cli().get_matches_from(["fintrack", "fx", "set-key", " abc123 "]);
    let Some(("fx", sub)) = matches.subcommand() else {
        panic!("fx subcommand not parsed");
    };
    fx::handle(&conn, &offline_cfg(), sub).unwrap();
    assert_eq!(
        offline_cfg().resolve_app_id(&conn).unwrap().as_deref(),
        Some("abc123")
    );
}
