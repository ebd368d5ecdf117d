//! Fill simulation at the daily close with a proportional cost rate.
//!
//! Buys spend cash, of which `cost_rate` goes to costs and the rest buys
//! shares. Sells receive `shares * price` minus `cost_rate` of that amount.
//! Neither can drive cash or the share count below zero.

use chrono::NaiveDate;

use super::portfolio::{PortfolioState, TradeRecord};
use super::position::SHARE_EPSILON;
use super::signal::{Action, Signal};

/// Cash amounts below this are not worth a fill.
const MIN_TRADE_VALUE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionConfig {
    /// Fraction of traded value charged per fill.
    pub cost_rate: f64,
    /// Fraction of cash a BUY without a target weight spends.
    pub buy_fraction: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            cost_rate: 0.0,
            buy_fraction: 1.0,
        }
    }
}

pub fn transaction_cost(trade_value: f64, config: &ExecutionConfig) -> f64 {
    trade_value * config.cost_rate
}

/// Why a BUY or SELL signal produced no fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoCash,
    NoPosition,
    AtTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Filled(TradeRecord),
    Skipped(SkipReason),
    NoAction,
}

/// Spend `spend` of cash (fees included) on shares at `price`.
pub fn execute_buy(
    portfolio: &mut PortfolioState,
    date: NaiveDate,
    price: f64,
    spend: f64,
    config: &ExecutionConfig,
) -> ExecutionOutcome {
    let spend = spend.min(portfolio.cash);
    if spend <= MIN_TRADE_VALUE {
        return ExecutionOutcome::Skipped(SkipReason::NoCash);
    }

    let cost = transaction_cost(spend, config);
    let shares = (spend - cost) / price;

    portfolio.cash -= spend;
    portfolio.position.add(shares, spend);

    ExecutionOutcome::Filled(TradeRecord {
        date,
        action: Action::Buy,
        price,
        shares,
        cost,
        realized_pnl: None,
    })
}

/// Sell up to `shares` at `price`.
pub fn execute_sell(
    portfolio: &mut PortfolioState,
    date: NaiveDate,
    price: f64,
    shares: f64,
    config: &ExecutionConfig,
) -> ExecutionOutcome {
    if portfolio.position.is_flat() {
        return ExecutionOutcome::Skipped(SkipReason::NoPosition);
    }
    if shares <= SHARE_EPSILON {
        return ExecutionOutcome::Skipped(SkipReason::AtTarget);
    }

    let (sold, basis) = portfolio.position.reduce(shares);
    let gross = sold * price;
    let cost = transaction_cost(gross, config);
    let proceeds = gross - cost;
    portfolio.cash += proceeds;

    ExecutionOutcome::Filled(TradeRecord {
        date,
        action: Action::Sell,
        price,
        shares: sold,
        cost,
        realized_pnl: Some(proceeds - basis),
    })
}

/// Apply a signal at `price`, sizing against the portfolio's last mark.
///
/// BUY spends `buy_fraction` of cash, or with a target weight enough to bring
/// the position to that share of equity. SELL liquidates, or with a target
/// weight trims down to it.
pub fn apply_signal(
    portfolio: &mut PortfolioState,
    signal: &Signal,
    price: f64,
    config: &ExecutionConfig,
) -> ExecutionOutcome {
    let held_value = portfolio.position.market_value(price);
    match (signal.action, signal.target_weight) {
        (Action::Hold, _) => ExecutionOutcome::NoAction,
        (Action::Buy, None) => {
            let spend = portfolio.cash * config.buy_fraction;
            execute_buy(portfolio, signal.date, price, spend, config)
        }
        (Action::Buy, Some(weight)) => {
            let shortfall = weight * portfolio.equity - held_value;
            if shortfall <= MIN_TRADE_VALUE {
                return ExecutionOutcome::Skipped(SkipReason::AtTarget);
            }
            let spend = shortfall / (1.0 - config.cost_rate);
            execute_buy(portfolio, signal.date, price, spend, config)
        }
        (Action::Sell, None) => {
            let shares = portfolio.position.shares;
            execute_sell(portfolio, signal.date, price, shares, config)
        }
        (Action::Sell, Some(weight)) => {
            if portfolio.position.is_flat() {
                return ExecutionOutcome::Skipped(SkipReason::NoPosition);
            }
            let excess = held_value - weight * portfolio.equity;
            execute_sell(portfolio, signal.date, price, excess / price, config)
        }
    }
}
