// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Exchange-rate plumbing: persisting the last saved rate table, fetching a
//! fresh one, converting amounts, and comparing two tables.

pub mod compare;
pub mod converter;
pub mod provider;
pub mod store;

pub use compare::compare;
pub use converter::{Convert, CurrencyConverter};
pub use provider::{HttpRateProvider, RateProvider};
pub use store::{MemoryRateStore, RateStore, SqliteRateStore};
