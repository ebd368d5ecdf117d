//! CSV report writer: `equity.csv`, `trades.csv` and `summary.csv`.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::FundtraderError;
use crate::domain::metrics::Stats;
use crate::domain::portfolio::{EquityPoint, TradeRecord};
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;
use tracing::info;

pub const EQUITY_FILE: &str = "equity.csv";
pub const TRADES_FILE: &str = "trades.csv";
pub const SUMMARY_FILE: &str = "summary.csv";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvReportAdapter;

fn csv_error(e: impl std::fmt::Display) -> FundtraderError {
    FundtraderError::Io(std::io::Error::other(e.to_string()))
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, FundtraderError> {
    let data = wtr.into_inner().map_err(csv_error)?;
    String::from_utf8(data).map_err(csv_error)
}

pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String, FundtraderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for point in equity_curve {
        wtr.serialize(point).map_err(csv_error)?;
    }
    if equity_curve.is_empty() {
        wtr.write_record(["date", "equity"]).map_err(csv_error)?;
    }
    finish(wtr)
}

pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String, FundtraderError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "action", "price", "shares", "cost", "realized_pnl"])
        .map_err(csv_error)?;
    for t in trades {
        wtr.write_record([
            t.date.to_string(),
            t.action.to_string(),
            format!("{:.6}", t.price),
            format!("{:.6}", t.shares),
            format!("{:.2}", t.cost),
            t.realized_pnl.map(|p| format!("{p:.2}")).unwrap_or_default(),
        ])
        .map_err(csv_error)?;
    }
    finish(wtr)
}

/// One `statistic,value` row per figure; undefined statistics are left empty.
pub fn export_summary_csv(
    strategy_name: &str,
    stats: &Stats,
    config: &BacktestConfig,
) -> Result<String, FundtraderError> {
    let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    let rows: Vec<(&str, String)> = vec![
        ("strategy", strategy_name.to_string()),
        ("start_date", config.start_date.to_string()),
        ("end_date", config.end_date.to_string()),
        ("initial_capital", format!("{:.2}", config.initial_capital)),
        ("cost_rate", format!("{}", config.cost_rate)),
        ("risk_free_rate", format!("{}", config.risk_free_rate)),
        ("final_equity", stats.final_equity.map(|x| format!("{x:.2}")).unwrap_or_default()),
        ("total_return", opt(stats.total_return)),
        ("cagr", opt(stats.cagr)),
        ("max_drawdown", format!("{:.6}", stats.max_drawdown)),
        ("max_drawdown_duration", stats.max_drawdown_duration.to_string()),
        ("sharpe_ratio", opt(stats.sharpe_ratio)),
        ("sortino_ratio", opt(stats.sortino_ratio)),
        ("annualized_volatility", opt(stats.annualized_volatility)),
        ("trade_count", stats.trade_count.to_string()),
        ("win_rate", opt(stats.win_rate)),
        ("trading_days", stats.trading_days.to_string()),
        ("elapsed_days", stats.elapsed_days.to_string()),
    ];

    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["statistic", "value"]).map_err(csv_error)?;
    for (name, value) in rows {
        wtr.write_record([name, value.as_str()]).map_err(csv_error)?;
    }
    finish(wtr)
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), FundtraderError> {
        fs::create_dir_all(output_dir)?;

        let simulation = &result.simulation;
        fs::write(
            output_dir.join(EQUITY_FILE),
            export_equity_csv(&simulation.equity_curve)?,
        )?;
        fs::write(
            output_dir.join(TRADES_FILE),
            export_trades_csv(&simulation.trades)?,
        )?;
        fs::write(
            output_dir.join(SUMMARY_FILE),
            export_summary_csv(&result.strategy_name, &result.stats, config)?,
        )?;

        info!(dir = %output_dir.display(), "report written");
        Ok(())
    }
}
