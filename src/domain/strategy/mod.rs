//! Strategy variants and the contract they share.
//!
//! Every variant sees the current record and a read-only prefix of the
//! aligned series ending at that record. Fundamental strategies are
//! edge-triggered: they buy when their screen starts passing, sell when it
//! stops passing, and hold when the screen cannot be evaluated.

pub mod fundamental_value;
pub mod multi_factor;
pub mod price_only;
pub mod valuation;
pub mod value_roe;

use crate::domain::align::{AlignedRecord, History};
use crate::domain::signal::Signal;

pub use fundamental_value::{FundamentalValue, FundamentalValueParams};
pub use multi_factor::{FactorWeights, MultiFactor, MultiFactorParams};
pub use price_only::{AlwaysHold, BuyAndHold};
pub use value_roe::{ValueRoe, ValueRoeParams};

pub trait SignalGenerator: Send + Sync {
    fn name(&self) -> &str;

    /// Decide for `record`, the last entry of `history`.
    fn evaluate(&self, record: &AlignedRecord, history: History<'_>) -> Signal;
}

/// Strategy selection as read from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyConfig {
    ValueRoe(ValueRoeParams),
    FundamentalValue(FundamentalValueParams),
    MultiFactor(MultiFactorParams),
    BuyAndHold,
    AlwaysHold,
}

impl StrategyConfig {
    pub const NAMES: [&'static str; 5] = [
        value_roe::NAME,
        fundamental_value::NAME,
        multi_factor::NAME,
        price_only::BUY_AND_HOLD,
        price_only::ALWAYS_HOLD,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyConfig::ValueRoe(_) => value_roe::NAME,
            StrategyConfig::FundamentalValue(_) => fundamental_value::NAME,
            StrategyConfig::MultiFactor(_) => multi_factor::NAME,
            StrategyConfig::BuyAndHold => price_only::BUY_AND_HOLD,
            StrategyConfig::AlwaysHold => price_only::ALWAYS_HOLD,
        }
    }

    /// Default parameters for a variant name.
    pub fn with_defaults(name: &str) -> Option<Self> {
        match name {
            value_roe::NAME => Some(StrategyConfig::ValueRoe(ValueRoeParams::default())),
            fundamental_value::NAME => Some(StrategyConfig::FundamentalValue(
                FundamentalValueParams::default(),
            )),
            multi_factor::NAME => Some(StrategyConfig::MultiFactor(MultiFactorParams::default())),
            price_only::BUY_AND_HOLD => Some(StrategyConfig::BuyAndHold),
            price_only::ALWAYS_HOLD => Some(StrategyConfig::AlwaysHold),
            _ => None,
        }
    }

    pub fn build(&self) -> Box<dyn SignalGenerator> {
        match self {
            StrategyConfig::ValueRoe(p) => Box::new(ValueRoe::new(p.clone())),
            StrategyConfig::FundamentalValue(p) => Box::new(FundamentalValue::new(p.clone())),
            StrategyConfig::MultiFactor(p) => Box::new(MultiFactor::new(p.clone())),
            StrategyConfig::BuyAndHold => Box::new(BuyAndHold),
            StrategyConfig::AlwaysHold => Box::new(AlwaysHold),
        }
    }
}

/// Turn a screen into transition signals.
///
/// `screen` returns `None` when its inputs are missing for the last record of
/// the prefix it is given. Days where it is `None` are skipped when looking
/// for the previous state.
pub(crate) fn edge_signal<F>(history: History<'_>, screen: F) -> Signal
where
    F: Fn(History<'_>) -> Option<bool>,
{
    let date = history.current().date();
    let Some(now) = screen(history) else {
        return Signal::hold(date);
    };
    // compare against the last day the screen could be evaluated
    let before = std::iter::successors(history.before_current(), |prefix| {
        prefix.before_current()
    })
    .find_map(|prefix| screen(prefix))
    .unwrap_or(false);

    match (before, now) {
        (false, true) => Signal::buy(date),
        (true, false) => Signal::sell(date),
        _ => Signal::hold(date),
    }
}
