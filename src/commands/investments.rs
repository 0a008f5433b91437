// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use rusqlite::Connection;
use serde::Serialize;

use super::{arg, batch_table, date_or_now, display_currency, id_arg, opt_arg};
use crate::config::AppConfig;
use crate::investment::InvestmentView;
use crate::models::Investment;
use crate::repo;
use crate::utils::{
    fmt_money, maybe_print_json, parse_currency, parse_date, parse_non_negative,
    parse_stored_decimal, pretty_table,
};

pub fn handle(conn: &Connection, cfg: &AppConfig, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, cfg, sub)?,
        Some(("view", sub)) => view(conn, cfg, sub)?,
        Some(("sell", sub)) => sell(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("recompute", sub)) => {
            let mut inv = repo::get_investment(conn, id_arg(sub, "id")?)?;
            let Some(profit) = inv.recompute_profit() else {
                bail!("Investment #{} has not been sold", inv.id);
            };
            repo::update_investment(conn, &inv)?;
            println!("Profit of #{} is now {}", inv.id, fmt_money(&profit, &inv.currency));
        }
        _ => {}
    }
    Ok(())
}

fn parse_quantity(s: &str) -> Result<Decimal> {
    let q = parse_stored_decimal(s, "quantity")?;
    if q < Decimal::ZERO {
        bail!("Quantity must not be negative, got {}", q);
    }
    Ok(q)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let currency = parse_currency(arg(sub, "currency")?)?;
    let inv = Investment {
        id: 0,
        title: arg(sub, "title")?.trim().to_string(),
        r#type: arg(sub, "type")?.trim().to_string(),
        platform: arg(sub, "platform")?.trim().to_string(),
        purchase_date: parse_date(arg(sub, "date")?)?,
        quantity: parse_quantity(arg(sub, "quantity")?)?,
        unit: arg(sub, "unit")?.trim().to_string(),
        total_amount: parse_non_negative(arg(sub, "total")?, &currency)?,
        currency,
        style: arg(sub, "style")?.trim().to_string(),
        sale: None,
    };
    let id = repo::insert_investment(conn, &inv)?;
    println!("Added investment '{}' (#{})", inv.title, id);
    Ok(())
}

fn sell(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut inv = repo::get_investment(conn, id_arg(sub, "id")?)?;
    let amount = parse_non_negative(arg(sub, "amount")?, &inv.currency)?;
    let profit = inv.sell(amount, date_or_now(sub)?)?;
    repo::update_investment(conn, &inv)?;
    println!(
        "Sold '{}' for {}; profit {}",
        inv.title,
        fmt_money(&amount, &inv.currency),
        fmt_money(&profit, &inv.currency)
    );
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let mut inv = repo::get_investment(conn, id_arg(sub, "id")?)?;
    if let Some(t) = opt_arg(sub, "title") {
        inv.title = t.trim().to_string();
    }
    if let Some(p) = opt_arg(sub, "platform") {
        inv.platform = p.trim().to_string();
    }
    if let Some(q) = opt_arg(sub, "quantity") {
        inv.quantity = parse_quantity(q)?;
    }
    if let Some(t) = opt_arg(sub, "total") {
        inv.total_amount = parse_non_negative(t, &inv.currency)?;
    }
    if let Some(s) = opt_arg(sub, "sold-amount") {
        let amount = parse_non_negative(s, &inv.currency)?;
        match inv.sale.as_mut() {
            Some(sale) => sale.sold_amount = amount,
            None => bail!("Investment #{} has not been sold; use `invest sell`", inv.id),
        }
    }
    repo::update_investment(conn, &inv)?;
    println!("Updated investment #{}", inv.id);
    if inv.is_sold() {
        println!("Stored profit is unchanged; run `invest recompute {}` to refresh it", inv.id);
    }
    Ok(())
}

#[derive(Serialize)]
struct InvestmentRow {
    #[serde(flatten)]
    investment: Investment,
    display_currency: String,
    converted: InvestmentView,
}

fn build_rows(
    conn: &Connection,
    cfg: &AppConfig,
    sub: &clap::ArgMatches,
    investments: Vec<Investment>,
) -> Result<Vec<InvestmentRow>> {
    let display = display_currency(conn, sub)?;
    let table = batch_table(conn, cfg)?;
    Ok(investments
        .into_iter()
        .map(|inv| InvestmentRow {
            converted: inv.converted_view(&display, &table),
            display_currency: display.clone(),
            investment: inv,
        })
        .collect())
}

fn print_rows(rows: Vec<InvestmentRow>) {
    let data = rows
        .into_iter()
        .map(|r| {
            let inv = &r.investment;
            let status = match &inv.sale {
                Some(s) => format!("sold {}", s.sold_date.format("%Y-%m-%d %H:%M")),
                None => "active".to_string(),
            };
            vec![
                inv.id.to_string(),
                inv.title.clone(),
                inv.platform.clone(),
                format!("{} {}", inv.quantity, inv.unit),
                fmt_money(&inv.total_amount, &inv.currency),
                r.converted.total_amount.to_string(),
                r.converted
                    .profit
                    .as_ref()
                    .map(|p| p.to_string())
                    .unwrap_or_default(),
                status,
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Title", "Platform", "Quantity", "Cost", "Cost (display)", "Profit", "Status"],
            data
        )
    );
}

fn list(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let rows = build_rows(conn, cfg, sub, repo::list_investments(conn)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        print_rows(rows);
    }
    Ok(())
}

fn view(conn: &Connection, cfg: &AppConfig, sub: &clap::ArgMatches) -> Result<()> {
    let inv = repo::get_investment(conn, id_arg(sub, "id")?)?;
    let Some(r) = build_rows(conn, cfg, sub, vec![inv])?.pop() else {
        return Ok(());
    };
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &r)? {
        return Ok(());
    }
    let inv = &r.investment;
    println!("{} (#{}) {} on {}, {}", inv.title, inv.id, inv.r#type, inv.platform, inv.style);
    println!("  bought {} {} on {}", inv.quantity, inv.unit, inv.purchase_date);
    println!("  cost   {}", r.converted.total_amount);
    if let (Some(sale), Some(sold), Some(profit)) =
        (&inv.sale, &r.converted.sold_amount, &r.converted.profit)
    {
        println!("  sold   {} on {}", sold, sale.sold_date.format("%Y-%m-%d %H:%M"));
        println!("  profit {}", profit);
    }
    Ok(())
}
