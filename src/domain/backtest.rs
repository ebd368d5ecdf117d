//! Backtest configuration and the end-to-end pipeline.
//!
//! `run_backtest` windows the price series, aligns fundamentals, replays the
//! strategy and summarises the curve. It is deterministic: the same inputs
//! always produce the same result.

use chrono::NaiveDate;
use tracing::info;

use super::align::{LagPolicy, align};
use super::error::FundtraderError;
use super::execution::ExecutionConfig;
use super::metrics::Stats;
use super::price_bar::{PriceBar, check_price_series, window};
use super::simulator::{RebalanceFrequency, SimulationResult, SimulatorConfig, simulate};
use super::statement::FinancialStatementRow;
use super::strategy::SignalGenerator;

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub initial_capital: f64,
    pub cost_rate: f64,
    pub buy_fraction: f64,
    pub risk_free_rate: f64,
    pub liquidate_at_end: bool,
    pub lag: LagPolicy,
    pub rebalance: RebalanceFrequency,
}

impl BacktestConfig {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        BacktestConfig {
            start_date,
            end_date,
            initial_capital: 100_000.0,
            cost_rate: 0.0,
            buy_fraction: 1.0,
            risk_free_rate: 0.0,
            liquidate_at_end: true,
            lag: LagPolicy::default(),
            rebalance: RebalanceFrequency::Daily,
        }
    }

    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), FundtraderError> {
        if self.start_date >= self.end_date {
            return Err(invalid("start_date", "start_date must be before end_date"));
        }
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(invalid("initial_capital", "initial_capital must be positive"));
        }
        if !(0.0..1.0).contains(&self.cost_rate) {
            return Err(invalid("cost_rate", "cost_rate must be in [0, 1)"));
        }
        if !(self.buy_fraction > 0.0 && self.buy_fraction <= 1.0) {
            return Err(invalid("buy_fraction", "buy_fraction must be in (0, 1]"));
        }
        if !(0.0..1.0).contains(&self.risk_free_rate) {
            return Err(invalid("risk_free_rate", "risk_free_rate must be in [0, 1)"));
        }
        Ok(())
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        SimulatorConfig {
            initial_capital: self.initial_capital,
            execution: ExecutionConfig {
                cost_rate: self.cost_rate,
                buy_fraction: self.buy_fraction,
            },
            liquidate_at_end: self.liquidate_at_end,
            rebalance: self.rebalance,
        }
    }
}

fn invalid(key: &str, reason: &str) -> FundtraderError {
    FundtraderError::ConfigInvalid {
        section: "backtest".to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub simulation: SimulationResult,
    pub stats: Stats,
}

impl BacktestResult {
    pub fn has_trades(&self) -> bool {
        !self.simulation.trades.is_empty()
    }
}

pub fn run_backtest(
    prices: &[PriceBar],
    statements: &[FinancialStatementRow],
    config: &BacktestConfig,
    strategy: &dyn SignalGenerator,
) -> Result<BacktestResult, FundtraderError> {
    config.validate()?;
    check_price_series(prices)?;

    let windowed = window(prices, config.start_date, config.end_date);
    let records = align(&windowed, statements, config.lag)?;
    info!(
        strategy = strategy.name(),
        days = records.len(),
        statements = statements.len(),
        "aligned series"
    );

    let simulation = simulate(&records, strategy, config.simulator_config())?;
    let stats = Stats::compute(
        &simulation.equity_curve,
        &simulation.trades,
        config.risk_free_rate,
    );
    info!(
        trades = stats.trade_count,
        final_equity = stats.final_equity,
        "simulation finished"
    );

    Ok(BacktestResult {
        strategy_name: strategy.name().to_string(),
        simulation,
        stats,
    })
}
