// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{TimeZone, Utc};
use fintrack::commands::{categories, expenses, reports};
use fintrack::config::AppConfig;
use fintrack::fx::{RateStore, SqliteRateStore};
use fintrack::models::{PaymentMethod, RateTable};
use fintrack::utils::set_main_currency;
use fintrack::{cli, db, repo};
use rusqlite::Connection;
use rust_decimal::Decimal;

fn cfg() -> AppConfig {
    AppConfig {
        db_path: PathBuf::from(":memory:"),
        rates_app_id: None,
        rates_url: "http://127.0.0.1:9".into(),
    }
}

fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    run(&conn, &["fintrack", "category", "add", "Food"]).unwrap();
    set_main_currency(&conn, "MYR").unwrap();
    conn
}

fn save_rates(conn: &Connection) {
    let table = RateTable::new(
        [("MYR".to_string(), d("4.40")), ("EUR".to_string(), d("0.88"))],
        Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    SqliteRateStore::new(conn).save(&table).unwrap();
}

fn run(conn: &Connection, args: &[&str]) -> anyhow::Result<()> {
    let matches = cli::build_cli().get_matches_from(args.iter().copied());
    match matches.subcommand() {
        Some(("category", sub)) => categories::handle(conn, sub),
        Some(("expense", sub)) => expenses::handle(conn, &cfg(), sub),
        Some(("report", sub)) => reports::handle(conn, &cfg(), sub),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

#[test]
fn expense_snapshot_is_taken_in_main_currency() {
    let conn = setup();
    save_rates(&conn);
    run(
        &conn,
        &[
            "fintrack", "expense", "add", "--amount", "10", "--currency", "usd", "--category",
            "Food", "--date", "2025-08-02 12:30", "--desc", "Lunch",
        ],
    )
    .unwrap();

    let all = repo::list_expenses(&conn).unwrap();
    assert_eq!(all.len(), 1);
    let e = &all[0];
    assert_eq!(e.from_currency, "USD");
    assert_eq!(e.to_currency, "MYR");
    assert_eq!(e.converted_amount, d("44.00"));
    assert_eq!(e.payment_method, PaymentMethod::Cash);
    assert_eq!(e.date.to_string(), "2025-08-02 12:30:00");

    // Later rate changes never re-price the stored snapshot
    let moved = RateTable::new(
        [("MYR".to_string(), d("5.00"))],
        Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
    )
    .unwrap();
    SqliteRateStore::new(&conn).save(&moved).unwrap();
    assert_eq!(repo::list_expenses(&conn).unwrap()[0].converted_amount, d("44.00"));
}

#[test]
fn same_currency_expense_needs_no_rates() {
    let conn = setup();
    run(
        &conn,
        &[
            "fintrack", "expense", "add", "--amount", "12.50", "--currency", "MYR", "--category",
            "Food", "--method", "debit", "--bank", "CIMB", "--last4", "9876",
        ],
    )
    .unwrap();
    let e = &repo::list_expenses(&conn).unwrap()[0];
    assert_eq!(e.converted_amount, d("12.50"));
    assert_eq!(e.payment_method.label(), "Debit Card CIMB (9876)");
}

#[test]
fn failed_conversion_saves_nothing() {
    let conn = setup();
    let res = run(
        &conn,
        &[
            "fintrack", "expense", "add", "--amount", "10", "--currency", "USD", "--category",
            "Food",
        ],
    );
    assert!(res.is_err());
    assert!(repo::list_expenses(&conn).unwrap().is_empty());
}

#[test]
fn bad_input_is_rejected_before_writing() {
    let conn = setup();
    save_rates(&conn);
    for amount in ["--amount=-5", "--amount=abc", "--amount=1.234"] {
        let res = run(
            &conn,
            &[
                "fintrack", "expense", "add", amount, "--currency", "USD", "--category",
                "Food",
            ],
        );
        assert!(res.is_err(), "{} should be rejected", amount);
    }
    let res = run(
        &conn,
        &[
            "fintrack", "expense", "add", "--amount", "1", "--currency", "USD", "--category",
            "Food", "--method", "credit", "--bank", "HSBC", "--last4", "12",
            "--card-name", "Visa",
        ],
    );
    assert!(res.is_err());
    assert!(repo::list_expenses(&conn).unwrap().is_empty());
}

#[test]
fn list_report_and_delete() {
    let conn = setup();
    save_rates(&conn);
    for (amt, ccy, date) in [
        ("10", "USD", "2025-08-02"),
        ("20", "MYR", "2025-08-03"),
        ("5", "EUR", "2025-07-30"),
    ] {
        run(
            &conn,
            &[
                "fintrack", "expense", "add", "--amount", amt, "--currency", ccy, "--category",
                "Food", "--date", date,
            ],
        )
        .unwrap();
    }
    run(&conn, &["fintrack", "expense", "list", "--month", "2025-08", "--limit", "1"]).unwrap();
    run(&conn, &["fintrack", "report", "summary", "--month", "2025-08", "--json"]).unwrap();
    run(&conn, &["fintrack", "report", "summary", "--month", "all", "--currency", "EUR"]).unwrap();
    assert!(run(&conn, &["fintrack", "report", "summary", "--month", "August"]).is_err());

    let first = repo::list_expenses(&conn).unwrap()[0].id.to_string();
    run(&conn, &["fintrack", "expense", "rm", first.as_str()]).unwrap();
    assert_eq!(repo::list_expenses(&conn).unwrap().len(), 2);
    assert!(run(&conn, &["fintrack", "expense", "rm", first.as_str()]).is_err());
}
