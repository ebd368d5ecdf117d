//! Performance statistics over an equity curve and trade log.
//!
//! Statistics that cannot be computed (too few points, zero elapsed time,
//! zero variance) are `None` rather than NaN or infinity.

use super::portfolio::{EquityPoint, TradeRecord};
use super::signal::Action;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub final_equity: Option<f64>,
    pub total_return: Option<f64>,
    /// Annualised over elapsed calendar time.
    pub cagr: Option<f64>,
    /// Largest peak-to-trough decline as a positive fraction of the peak.
    pub max_drawdown: f64,
    /// Longest run of trading days spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    /// `None` below two daily returns. A flat curve has a volatility of zero,
    /// while its Sharpe and Sortino are `None`.
    pub annualized_volatility: Option<f64>,
    pub trade_count: usize,
    pub win_rate: Option<f64>,
    pub trading_days: usize,
    pub elapsed_days: i64,
}

impl Stats {
    pub fn compute(equity_curve: &[EquityPoint], trades: &[TradeRecord], risk_free_rate: f64) -> Self {
        let first = equity_curve.first();
        let last = equity_curve.last();

        let final_equity = last.map(|p| p.equity);
        let total_return = match (first, last) {
            (Some(f), Some(l)) if f.equity > 0.0 => Some(l.equity / f.equity - 1.0),
            _ => None,
        };

        let elapsed_days = match (first, last) {
            (Some(f), Some(l)) => (l.date - f.date).num_days(),
            _ => 0,
        };
        let cagr = match total_return {
            Some(r) if elapsed_days > 0 && r > -1.0 => {
                let years = elapsed_days as f64 / DAYS_PER_YEAR;
                Some((1.0 + r).powf(1.0 / years) - 1.0).filter(|v| v.is_finite())
            }
            _ => None,
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity_curve);

        let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
        let risk = compute_risk_adjusted(equity_curve, daily_rf);

        let sells: Vec<f64> = trades
            .iter()
            .filter(|t| t.action == Action::Sell)
            .filter_map(|t| t.realized_pnl)
            .collect();
        let win_rate = if sells.is_empty() {
            None
        } else {
            let wins = sells.iter().filter(|&&pnl| pnl > 0.0).count();
            Some(wins as f64 / sells.len() as f64)
        };

        Stats {
            final_equity,
            total_return,
            cagr,
            max_drawdown,
            max_drawdown_duration,
            sharpe_ratio: risk.sharpe,
            sortino_ratio: risk.sortino,
            annualized_volatility: risk.volatility,
            trade_count: trades.len(),
            win_rate,
            trading_days: equity_curve.len(),
            elapsed_days,
        }
    }
}

/// Statistics with a zero risk-free rate.
pub fn summarize(equity_curve: &[EquityPoint], trades: &[TradeRecord]) -> Stats {
    Stats::compute(equity_curve, trades, 0.0)
}

fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

struct RiskAdjusted {
    sharpe: Option<f64>,
    sortino: Option<f64>,
    volatility: Option<f64>,
}

fn daily_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| w[1].equity / w[0].equity - 1.0)
        .collect()
}

fn compute_risk_adjusted(equity_curve: &[EquityPoint], daily_rf: f64) -> RiskAdjusted {
    let returns = daily_returns(equity_curve);
    let none = RiskAdjusted {
        sharpe: None,
        sortino: None,
        volatility: None,
    };
    if returns.len() < 2 {
        return none;
    }

    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    // sample standard deviation
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let stddev = variance.sqrt();
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();
    let excess = mean - daily_rf;

    let positive = |v: f64| (v > f64::EPSILON * mean.abs().max(1.0)).then_some(v);

    let sharpe = positive(stddev).map(|sd| excess / sd * annualizer);

    let downside_variance = returns
        .iter()
        .filter(|&&r| r < daily_rf)
        .map(|&r| (r - daily_rf).powi(2))
        .sum::<f64>()
        / n;
    let sortino = positive(downside_variance.sqrt()).map(|dd| excess / dd * annualizer);

    RiskAdjusted {
        sharpe,
        sortino,
        volatility: Some(stddev * annualizer),
    }
}
