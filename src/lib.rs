// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod debt;
pub mod errors;
pub mod fx;
pub mod investment;
pub mod logging;
pub mod models;
pub mod prefs;
pub mod report;
pub mod repo;
pub mod utils;
