// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::errors::{FinanceError, FinanceResult};
use crate::fx::Convert;
use crate::models::{Investment, Sale};
use crate::utils::fmt_money;

/// A native amount shown in another currency, or the native amount with a
/// marker when the conversion could not be made.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Converted {
    Value {
        amount: Decimal,
        currency: String,
    },
    Unavailable {
        original: Decimal,
        currency: String,
        reason: String,
    },
}

impl Converted {
    pub fn from_result(
        result: FinanceResult<Decimal>,
        original: Decimal,
        native: &str,
        target: &str,
    ) -> Self {
        match result {
            Ok(amount) => Converted::Value {
                amount,
                currency: target.to_string(),
            },
            Err(e) => Converted::Unavailable {
                original,
                currency: native.to_string(),
                reason: e.to_string(),
            },
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            Converted::Value { amount, .. } => Some(*amount),
            Converted::Unavailable { .. } => None,
        }
    }
}

impl fmt::Display for Converted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Converted::Value { amount, currency } => f.write_str(&fmt_money(amount, currency)),
            Converted::Unavailable {
                original, currency, ..
            } => write!(f, "{} (conversion unavailable)", fmt_money(original, currency)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvestmentView {
    pub total_amount: Converted,
    pub sold_amount: Option<Converted>,
    pub profit: Option<Converted>,
}

impl Investment {
    pub fn is_sold(&self) -> bool {
        self.sale.is_some()
    }

    /// Active -> Sold. Selling twice is refused; the sold state is terminal.
    pub fn sell(
        &mut self,
        sold_amount: Decimal,
        sold_date: NaiveDateTime,
    ) -> FinanceResult<Decimal> {
        if self.sale.is_some() {
            return Err(FinanceError::AlreadySold(self.id));
        }
        let profit = sold_amount - self.total_amount;
        self.sale = Some(Sale {
            sold_amount,
            sold_date,
            profit,
        });
        tracing::info!(investment = self.id, %sold_amount, %profit, "investment sold");
        Ok(profit)
    }

    /// Edits never touch `profit`; call this after changing `total_amount`
    /// or the sold amount of a sold investment.
    pub fn recompute_profit(&mut self) -> Option<Decimal> {
        let total = self.total_amount;
        self.sale.as_mut().map(|sale| {
            sale.profit = sale.sold_amount - total;
            sale.profit
        })
    }

    /// Converts each native figure on its own; one failed conversion leaves
    /// the others intact.
    pub fn converted_view(&self, display_currency: &str, fx: &impl Convert) -> InvestmentView {
        let conv = |amount: Decimal| {
            Converted::from_result(
                fx.convert(amount, &self.currency, display_currency),
                amount,
                &self.currency,
                display_currency,
            )
        };
        InvestmentView {
            total_amount: conv(self.total_amount),
            sold_amount: self.sale.as_ref().map(|s| conv(s.sold_amount)),
            profit: self.sale.as_ref().map(|s| conv(s.profit)),
        }
    }
}
