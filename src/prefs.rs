// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Per-session user preferences.
//!
//! Core calculations take the display currency as an argument; this context
//! only saves the presentation layer from re-reading settings for every call.

use std::sync::RwLock;

use anyhow::Result;
use once_cell::sync::Lazy;
use rusqlite::Connection;

use crate::models::BASE_CURRENCY;
use crate::utils::get_main_currency;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub main_currency: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            main_currency: BASE_CURRENCY.to_string(),
        }
    }
}

impl Preferences {
    pub fn load(conn: &Connection) -> Result<Self> {
        Ok(Self {
            main_currency: get_main_currency(conn)?,
        })
    }
}

static SESSION: Lazy<RwLock<Option<Preferences>>> = Lazy::new(|| RwLock::new(None));

/// Installs `prefs` for the current session, replacing any previous one.
pub fn begin_session(prefs: Preferences) {
    let mut slot = SESSION.write().unwrap_or_else(|e| e.into_inner());
    tracing::debug!(main_currency = %prefs.main_currency, "session started");
    *slot = Some(prefs);
}

pub fn end_session() {
    let mut slot = SESSION.write().unwrap_or_else(|e| e.into_inner());
    *slot = None;
}

pub fn current() -> Option<Preferences> {
    SESSION.read().unwrap_or_else(|e| e.into_inner()).clone()
}
