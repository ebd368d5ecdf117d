//! Core domain types and logic. No I/O happens below this module.

pub mod error;
pub mod price_bar;
pub mod statement;
pub mod align;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod portfolio;
pub mod execution;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod config_validation;
