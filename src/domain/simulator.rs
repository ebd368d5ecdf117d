//! Day-by-day replay of a strategy over the aligned series.
//!
//! A run moves INITIALIZED → RUNNING → FINISHED. Each step handles exactly one
//! trading day in this order: mark the position to the close, ask the
//! strategy for a signal on the prefix ending today, apply it, and append the
//! post-trade equity to the curve. A step enters RUNNING before its day is
//! processed, so a one-day run passes through RUNNING inside its only step.
//!
//! Signals are applied only on rebalance days. On other days the latest BUY
//! or SELL is held back and applied at the next rebalance day's close.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::align::{AlignedRecord, History};
use super::error::FundtraderError;
use super::execution::{ExecutionConfig, ExecutionOutcome, apply_signal, execute_sell};
use super::portfolio::{EquityPoint, PortfolioState, TradeRecord};
use super::signal::{Action, Signal};
use super::strategy::SignalGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorState {
    Initialized,
    Running,
    Finished,
}

/// Which trading days may trade. The first day of a run always may.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebalanceFrequency {
    #[default]
    Daily,
    /// First trading day of each ISO week.
    Weekly,
    /// First trading day of each calendar month.
    Monthly,
    /// Every `n`th trading day, counting the first day as day zero.
    EveryNDays(u32),
}

impl RebalanceFrequency {
    /// `daily`, `weekly`, `monthly`, or a whole number of trading days.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "daily" => Some(RebalanceFrequency::Daily),
            "weekly" => Some(RebalanceFrequency::Weekly),
            "monthly" => Some(RebalanceFrequency::Monthly),
            other => other
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .map(RebalanceFrequency::EveryNDays),
        }
    }

    pub fn is_rebalance_day(
        &self,
        index: usize,
        date: NaiveDate,
        previous: Option<NaiveDate>,
    ) -> bool {
        let Some(previous) = previous else {
            return true;
        };
        match *self {
            RebalanceFrequency::Daily => true,
            RebalanceFrequency::Weekly => date.iso_week() != previous.iso_week(),
            RebalanceFrequency::Monthly => {
                (date.year(), date.month()) != (previous.year(), previous.month())
            }
            RebalanceFrequency::EveryNDays(n) => n <= 1 || index % n as usize == 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
    /// Close any open position at the final close.
    pub liquidate_at_end: bool,
    pub rebalance: RebalanceFrequency,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            initial_capital: 100_000.0,
            execution: ExecutionConfig::default(),
            liquidate_at_end: true,
            rebalance: RebalanceFrequency::Daily,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeRecord>,
    pub signals: Vec<Signal>,
    pub portfolio: PortfolioState,
}

pub struct Simulator<'a> {
    records: &'a [AlignedRecord],
    strategy: &'a dyn SignalGenerator,
    config: SimulatorConfig,
    state: SimulatorState,
    cursor: usize,
    portfolio: PortfolioState,
    equity_curve: Vec<EquityPoint>,
    trades: Vec<TradeRecord>,
    signals: Vec<Signal>,
    /// Latest BUY or SELL not yet applied.
    pending: Option<Signal>,
}

impl<'a> Simulator<'a> {
    pub fn new(
        records: &'a [AlignedRecord],
        strategy: &'a dyn SignalGenerator,
        config: SimulatorConfig,
    ) -> Self {
        Simulator {
            records,
            strategy,
            portfolio: PortfolioState::new(config.initial_capital),
            config,
            state: SimulatorState::Initialized,
            cursor: 0,
            equity_curve: Vec::with_capacity(records.len()),
            trades: Vec::new(),
            signals: Vec::with_capacity(records.len()),
            pending: None,
        }
    }

    pub fn state(&self) -> SimulatorState {
        self.state
    }

    pub fn portfolio(&self) -> &PortfolioState {
        &self.portfolio
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    /// Process the next trading day.
    pub fn step(&mut self) -> Result<SimulatorState, FundtraderError> {
        if self.state == SimulatorState::Finished {
            return Err(FundtraderError::SimulationFinished);
        }
        let records = self.records;
        let (Some(record), Some(history)) = (
            records.get(self.cursor),
            History::prefix(records, self.cursor),
        ) else {
            self.state = SimulatorState::Finished;
            return Ok(self.state);
        };
        self.state = SimulatorState::Running;
        let is_last_day = self.cursor + 1 == records.len();
        let price = record.close();

        self.portfolio.mark(price);

        let signal = self.strategy.evaluate(record, history);
        if signal.action != Action::Hold {
            self.pending = Some(signal);
        }
        let previous = self
            .cursor
            .checked_sub(1)
            .and_then(|i| records.get(i))
            .map(AlignedRecord::date);
        if self
            .config
            .rebalance
            .is_rebalance_day(self.cursor, record.date(), previous)
        {
            if let Some(order) = self.pending.take() {
                let order = Signal {
                    date: record.date(),
                    ..order
                };
                match apply_signal(&mut self.portfolio, &order, price, &self.config.execution) {
                    ExecutionOutcome::Filled(trade) => self.record_fill(trade),
                    ExecutionOutcome::Skipped(reason) => {
                        debug!(date = %record.date(), action = %order.action, ?reason, "signal skipped");
                    }
                    ExecutionOutcome::NoAction => {}
                }
            }
        } else if signal.action != Action::Hold {
            debug!(date = %record.date(), action = %signal.action, "deferred to next rebalance day");
        }
        self.signals.push(signal);

        if is_last_day && self.config.liquidate_at_end && !self.portfolio.position.is_flat() {
            let shares = self.portfolio.position.shares;
            if let ExecutionOutcome::Filled(trade) = execute_sell(
                &mut self.portfolio,
                record.date(),
                price,
                shares,
                &self.config.execution,
            ) {
                self.record_fill(trade);
            }
        }

        let equity = self.portfolio.mark(price);
        self.equity_curve.push(EquityPoint {
            date: record.date(),
            equity,
        });

        self.cursor += 1;
        self.state = if self.cursor == records.len() {
            SimulatorState::Finished
        } else {
            SimulatorState::Running
        };
        Ok(self.state)
    }

    fn record_fill(&mut self, trade: TradeRecord) {
        debug!(
            date = %trade.date,
            action = %trade.action,
            price = trade.price,
            shares = trade.shares,
            cost = trade.cost,
            "fill"
        );
        self.trades.push(trade);
    }

    /// Step until FINISHED and hand back the owned results.
    pub fn run(mut self) -> Result<SimulationResult, FundtraderError> {
        while self.state != SimulatorState::Finished {
            self.step()?;
        }
        Ok(self.into_result())
    }

    pub fn into_result(self) -> SimulationResult {
        SimulationResult {
            equity_curve: self.equity_curve,
            trades: self.trades,
            signals: self.signals,
            portfolio: self.portfolio,
        }
    }
}

pub fn simulate(
    records: &[AlignedRecord],
    strategy: &dyn SignalGenerator,
    config: SimulatorConfig,
) -> Result<SimulationResult, FundtraderError> {
    Simulator::new(records, strategy, config).run()
}
