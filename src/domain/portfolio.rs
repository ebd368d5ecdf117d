//! Portfolio state, equity curve points and the trade log.

use chrono::NaiveDate;
use serde::Serialize;

use super::position::Position;
use super::signal::Action;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

/// One executed fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: Action,
    pub price: f64,
    pub shares: f64,
    /// Transaction cost charged on this fill.
    pub cost: f64,
    /// Set on sells: proceeds net of cost minus the cost basis sold.
    pub realized_pnl: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub initial_capital: f64,
    pub position: Position,
    /// Equity at the most recent mark.
    pub equity: f64,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            initial_capital,
            position: Position::default(),
            equity: initial_capital,
        }
    }

    pub fn total_equity(&self, price: f64) -> f64 {
        self.cash + self.position.market_value(price)
    }

    /// Mark to `price` and remember the result.
    pub fn mark(&mut self, price: f64) -> f64 {
        self.equity = self.total_equity(price);
        self.equity
    }
}
