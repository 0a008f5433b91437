// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;

use crate::errors::{FinanceError, FinanceResult};
use crate::models::{RateTable, BASE_CURRENCY};

use super::provider::RateProvider;
use super::store::RateStore;

/// Converts an amount between two currency codes.
///
/// A missing rate is an error. Implementations never hand back the input
/// amount as a stand-in for a failed conversion; falling back to the
/// unconverted figure is a presentation decision made by the caller.
pub trait Convert {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> FinanceResult<Decimal>;
}

fn required_rate(table: &RateTable, code: &str) -> FinanceResult<Decimal> {
    table
        .rate(code)
        .ok_or_else(|| FinanceError::rate_unavailable(code))
}

/// Pure conversion against an already loaded table. Load once and reuse the
/// table when converting many amounts.
impl Convert for RateTable {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> FinanceResult<Decimal> {
        let from = from.trim().to_uppercase();
        let to = to.trim().to_uppercase();
        if from == to {
            return Ok(amount);
        }
        let out_of_range = || FinanceError::overflow(format!("{} {} in {}", from, amount, to));
        if from == BASE_CURRENCY {
            return amount
                .checked_mul(required_rate(self, &to)?)
                .ok_or_else(out_of_range);
        }
        if to == BASE_CURRENCY {
            return amount
                .checked_div(required_rate(self, &from)?)
                .ok_or_else(out_of_range);
        }
        // Cross rate through the base currency
        let from_rate = required_rate(self, &from)?;
        let to_rate = required_rate(self, &to)?;
        amount
            .checked_div(from_rate)
            .and_then(|usd| usd.checked_mul(to_rate))
            .ok_or_else(out_of_range)
    }
}

/// Resolves a rate table on every call: the stored table first, a freshly
/// fetched one if nothing was ever stored. Results are not cached.
pub struct CurrencyConverter<S, P> {
    store: S,
    provider: P,
}

impl<S: RateStore, P: RateProvider> CurrencyConverter<S, P> {
    pub fn new(store: S, provider: P) -> Self {
        Self { store, provider }
    }

    /// Stored rates, or fresh ones when the store has never been populated.
    /// The fetched table is not written back; saving rates stays an explicit
    /// administrative action.
    pub fn resolve_table(&self) -> FinanceResult<RateTable> {
        match self.store.load() {
            Ok(table) => Ok(table),
            Err(FinanceError::NotFound(_)) => {
                tracing::warn!("no stored rates, falling back to the rate provider");
                self.provider.fetch_latest(BASE_CURRENCY)
            }
            Err(e) => Err(e),
        }
    }
}

impl<S: RateStore, P: RateProvider> Convert for CurrencyConverter<S, P> {
    fn convert(&self, amount: Decimal, from: &str, to: &str) -> FinanceResult<Decimal> {
        if from.trim().eq_ignore_ascii_case(to.trim()) {
            return Ok(amount);
        }
        let table = self.resolve_table()?;
        table.convert(amount, from, to).inspect_err(|e| {
            tracing::debug!(%amount, from, to, error = %e, "conversion failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::store::MemoryRateStore;
    use chrono::Utc;
    use std::cell::Cell;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn sample_table() -> RateTable {
        RateTable::new(
            [
                ("MYR".to_string(), d("4.40")),
                ("EUR".to_string(), d("0.90")),
                ("JPY".to_string(), d("150")),
            ],
            Utc::now(),
        )
        .unwrap()
    }

    struct CountingProvider {
        calls: Cell<u32>,
        result: fn() -> FinanceResult<RateTable>,
    }

    impl RateProvider for CountingProvider {
        fn fetch_latest(&self, base: &str) -> FinanceResult<RateTable> {
            assert_eq!(base, BASE_CURRENCY);
            self.calls.set(self.calls.get() + 1);
            (self.result)()
        }
    }

    #[test]
    fn identity_conversion_is_exact() {
        let t = sample_table();
        let a = d("123.456789");
        assert_eq!(t.convert(a, "MYR", "MYR").unwrap(), a);
        assert_eq!(t.convert(a, "XXX", "XXX").unwrap(), a);
    }

    #[test]
    fn base_direct_inverse_and_cross_rates() {
        let t = sample_table();
        assert_eq!(t.convert(d("10"), "USD", "MYR").unwrap(), d("44"));
        assert_eq!(t.convert(d("44"), "MYR", "USD").unwrap(), d("10"));
        // 90 EUR -> 100 USD -> 440 MYR
        assert_eq!(t.convert(d("90"), "EUR", "MYR").unwrap(), d("440"));
    }

    #[test]
    fn round_trip_stays_within_tolerance() {
        let t = sample_table();
        let pairs = [("MYR", "EUR"), ("EUR", "JPY"), ("USD", "JPY"), ("JPY", "MYR")];
        for a in ["1", "0.01", "1234.56", "98765.4321"] {
            for (c1, c2) in pairs {
                let a = d(a);
                let back = t
                    .convert(t.convert(a, c1, c2).unwrap(), c2, c1)
                    .unwrap();
                let rel = ((back - a) / a).abs();
                assert!(rel < d("0.000001"), "{a} {c1}->{c2}->{c1} gave {back}");
            }
        }
    }

    #[test]
    fn missing_rate_fails_instead_of_echoing_amount() {
        let t = sample_table();
        match t.convert(d("100"), "XXX", "USD") {
            Err(FinanceError::RateUnavailable { currency }) => assert_eq!(currency, "XXX"),
            other => panic!("expected RateUnavailable, got {:?}", other),
        }
        assert!(t.convert(d("100"), "USD", "XXX").is_err());
        assert!(t.convert(d("100"), "EUR", "XXX").is_err());
    }

    #[test]
    fn stored_table_preferred_over_provider() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            result: || Err(FinanceError::NetworkFailure("offline".into())),
        };
        let store = MemoryRateStore::with_table(sample_table());
        let conv = CurrencyConverter::new(&store, &provider);
        assert_eq!(conv.convert(d("10"), "USD", "MYR").unwrap(), d("44"));
        assert_eq!(provider.calls.get(), 0);
    }

    #[test]
    fn empty_store_falls_back_to_provider_every_call() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            result: || Ok(sample_table()),
        };
        let store = MemoryRateStore::new();
        let conv = CurrencyConverter::new(&store, &provider);
        assert_eq!(conv.convert(d("10"), "USD", "EUR").unwrap(), d("9"));
        assert_eq!(conv.convert(d("10"), "USD", "EUR").unwrap(), d("9"));
        assert_eq!(provider.calls.get(), 2);
        // Fallback does not populate the store
        assert!(store.load().is_err());
    }

    #[test]
    fn provider_failure_propagates_but_identity_needs_no_rates() {
        let provider = CountingProvider {
            calls: Cell::new(0),
            result: || Err(FinanceError::ApiQuotaExceeded),
        };
        let conv = CurrencyConverter::new(MemoryRateStore::new(), &provider);
        assert!(matches!(
            conv.convert(d("5"), "USD", "EUR"),
            Err(FinanceError::ApiQuotaExceeded)
        ));
        assert_eq!(conv.convert(d("5"), "EUR", "eur").unwrap(), d("5"));
        assert_eq!(provider.calls.get(), 1);
    }

    #[test]
    fn out_of_range_amounts_error_instead_of_panicking() {
        let t = sample_table();
        assert!(matches!(
            t.convert(Decimal::MAX, "USD", "JPY"),
            Err(FinanceError::Overflow(_))
        ));
        assert!(matches!(
            t.convert(Decimal::MAX, "EUR", "USD"),
            Err(FinanceError::Overflow(_))
        ));
        assert!(matches!(
            t.convert(Decimal::MAX, "EUR", "JPY"),
            Err(FinanceError::Overflow(_))
        ));
        // Shrinking conversions of the same amount still succeed
        assert!(t.convert(Decimal::MAX, "JPY", "USD").is_ok());
    }
}
