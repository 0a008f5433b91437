// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Debt balance engine. The outstanding balance is always derived by replaying
//! the full transaction history from the original principal, never patched
//! incrementally.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{FinanceError, FinanceResult};
use crate::models::{DebtTransaction, DebtTxKind};
use crate::utils::{days_in_month, round_minor};

/// One row of a replayed ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerLine {
    pub transaction_id: i64,
    pub date: NaiveDateTime,
    pub kind: DebtTxKind,
    pub amount: Decimal,
    pub balance_after: Decimal,
}

/// Entries in non-decreasing date order. Equal dates keep their input order.
pub fn chronological(transactions: &[DebtTransaction]) -> Vec<&DebtTransaction> {
    let mut out: Vec<&DebtTransaction> = transactions.iter().collect();
    // sort_by_key is stable
    out.sort_by_key(|t| t.date);
    out
}

/// Balance after one entry. Fails with `Overflow` instead of wrapping or
/// panicking when the result leaves the decimal range.
pub fn apply(balance: Decimal, tx: &DebtTransaction) -> FinanceResult<Decimal> {
    let next = match tx.kind {
        DebtTxKind::Payment | DebtTxKind::Repayment => balance.checked_sub(tx.amount),
        DebtTxKind::Interest => balance.checked_add(tx.amount),
    };
    next.ok_or_else(|| {
        FinanceError::overflow(format!("debt balance after transaction {}", tx.id))
    })
}

/// Replays `transactions` against `original_principal` in date order and
/// returns the running balance after each entry.
pub fn statement(
    original_principal: Decimal,
    transactions: &[DebtTransaction],
) -> FinanceResult<Vec<LedgerLine>> {
    let mut balance = original_principal;
    chronological(transactions)
        .into_iter()
        .map(|tx| {
            balance = apply(balance, tx)?;
            Ok(LedgerLine {
                transaction_id: tx.id,
                date: tx.date,
                kind: tx.kind,
                amount: tx.amount,
                balance_after: balance,
            })
        })
        .collect()
}

/// Current outstanding balance. Input order does not matter; entries are
/// sorted by date before folding.
pub fn recompute(
    original_principal: Decimal,
    transactions: &[DebtTransaction],
) -> FinanceResult<Decimal> {
    let balance = chronological(transactions)
        .into_iter()
        .try_fold(original_principal, apply)?;
    tracing::debug!(
        %original_principal,
        entries = transactions.len(),
        %balance,
        "recomputed debt balance"
    );
    Ok(balance)
}

/// Interest for one accrual: `balance * yearly_rate_percent / 100`, rounded
/// to the minor unit of `currency`. Each call produces exactly one accrual;
/// nothing is scheduled.
pub fn accrue_interest(
    current_balance: Decimal,
    yearly_rate_percent: Decimal,
    currency: &str,
) -> FinanceResult<Decimal> {
    let raw = current_balance
        .checked_mul(yearly_rate_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| FinanceError::overflow("interest accrual"))?;
    Ok(round_minor(raw, currency))
}

/// Next date on or after `today` that falls on `repayment_day`. Days past the
/// end of a short month land on that month's last day.
pub fn next_repayment_date(repayment_day: u32, today: NaiveDate) -> NaiveDate {
    let day = repayment_day.clamp(1, 31);
    let in_month = |year: i32, month: u32| {
        let d = day.min(days_in_month(year, month));
        NaiveDate::from_ymd_opt(year, month, d)
    };

    if let Some(candidate) = in_month(today.year(), today.month()) {
        if candidate >= today {
            return candidate;
        }
    }
    let (y, m) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };
    in_month(y, m).unwrap_or(today)
}
