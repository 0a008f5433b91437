// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{FinanceError, FinanceResult};
use crate::fx::Convert;
use crate::models::Expense;
use crate::utils::days_in_month;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    All,
    Month { year: i32, month: u32 },
}

impl Period {
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Period::All => true,
            Period::Month { year, month } => date.year() == year && date.month() == month,
        }
    }
}

impl FromStr for Period {
    type Err = FinanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(Period::All);
        }
        let first = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| FinanceError::InvalidInput(format!("month '{}', expected YYYY-MM or all", s)))?;
        Ok(Period::Month {
            year: first.year(),
            month: first.month(),
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::All => f.write_str("all"),
            Period::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub period: String,
    pub display_currency: String,
    /// Native-currency totals, never converted.
    pub by_currency: BTreeMap<String, Decimal>,
    /// Display-currency totals keyed by category id.
    pub by_category: BTreeMap<i64, Decimal>,
    /// Display-currency totals keyed by payment method label.
    pub by_payment_method: BTreeMap<String, Decimal>,
    pub total: Decimal,
    pub day_count: i64,
    pub daily_average: Decimal,
    /// Days without expenses are omitted, not zero-filled.
    pub daily_series: Vec<DailyPoint>,
    pub expense_count: usize,
    /// Expenses left out of converted buckets because no rate was available.
    pub unconverted: Vec<i64>,
}

/// Days to average over: elapsed days for the current month, the full length
/// of any other month, and earliest-expense-to-now inclusive for all time.
pub fn day_count(period: Period, expenses: &[&Expense], now: NaiveDateTime) -> i64 {
    let days = match period {
        Period::Month { year, month } => {
            if now.year() == year && now.month() == month {
                now.day() as i64
            } else {
                days_in_month(year, month) as i64
            }
        }
        Period::All => match expenses.iter().map(|e| e.date).min() {
            Some(earliest) => {
                let secs = (now - earliest).num_seconds();
                let whole = secs.div_euclid(86_400);
                let ceil = if secs.rem_euclid(86_400) > 0 { whole + 1 } else { whole };
                ceil + 1
            }
            None => 1,
        },
    };
    days.max(1)
}

/// Amount of `e` in `display_currency`. The write-time snapshot is used when it
/// is already in the display currency so history is never re-priced.
fn display_amount(e: &Expense, display_currency: &str, fx: &impl Convert) -> FinanceResult<Decimal> {
    if e.to_currency == display_currency {
        Ok(e.converted_amount)
    } else {
        fx.convert(e.amount, &e.from_currency, display_currency)
    }
}

fn add_to(total: &mut Decimal, amount: Decimal) -> FinanceResult<()> {
    *total = total
        .checked_add(amount)
        .ok_or_else(|| FinanceError::overflow("report total"))?;
    Ok(())
}

/// Totals `expenses` falling in `period`. Sums that leave the decimal range
/// fail with `Overflow`.
pub fn aggregate(
    expenses: &[Expense],
    period: Period,
    display_currency: &str,
    now: NaiveDateTime,
    fx: &impl Convert,
) -> FinanceResult<ReportSummary> {
    let in_period: Vec<&Expense> = expenses
        .iter()
        .filter(|e| period.contains(e.date.date()))
        .collect();

    let mut by_currency: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut by_category: BTreeMap<i64, Decimal> = BTreeMap::new();
    let mut by_payment_method: BTreeMap<String, Decimal> = BTreeMap::new();
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut total = Decimal::ZERO;
    let mut unconverted = Vec::new();

    for e in &in_period {
        add_to(by_currency.entry(e.from_currency.clone()).or_default(), e.amount)?;

        let amount = match display_amount(e, display_currency, fx) {
            Ok(a) => a,
            Err(err) => {
                tracing::warn!(expense = e.id, error = %err, "expense left out of converted totals");
                unconverted.push(e.id);
                continue;
            }
        };
        add_to(by_category.entry(e.category_id).or_default(), amount)?;
        add_to(by_payment_method.entry(e.payment_method.label()).or_default(), amount)?;
        add_to(daily.entry(e.date.date()).or_default(), amount)?;
        add_to(&mut total, amount)?;
    }

    let days = day_count(period, &in_period, now);
    let daily_average = total / Decimal::from(days);

    Ok(ReportSummary {
        period: period.to_string(),
        display_currency: display_currency.to_string(),
        by_currency,
        by_category,
        by_payment_method,
        total,
        day_count: days,
        daily_average,
        daily_series: daily
            .into_iter()
            .map(|(date, amount)| DailyPoint { date, amount })
            .collect(),
        expense_count: in_period.len(),
        unconverted,
    })
}
