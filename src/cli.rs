//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::align::{DEFAULT_LAG_DAYS, LagPolicy};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{
    parse_date, read_bool, read_double, read_rebalance, strategy_name, validate_backtest_config,
    validate_strategy_params,
};
use crate::domain::error::FundtraderError;
use crate::domain::strategy::{
    FactorWeights, FundamentalValueParams, MultiFactorParams, SignalGenerator, StrategyConfig,
    ValueRoeParams,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "fundtrader",
    about = "Point-in-time fundamental strategy backtester"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overrides [data] prices
        #[arg(long)]
        prices: Option<PathBuf>,
        /// Statement CSV, overrides [data] statements
        #[arg(long)]
        statements: Option<PathBuf>,
        /// Report directory, overrides [report] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Strategy name, overrides [strategy] name
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long)]
        symbol: Option<String>,
    },
    /// Validate a configuration file without running it
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List strategy variants and their parameters
    Strategies,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            prices,
            statements,
            output,
            strategy,
            symbol,
        } => run_backtest(
            &config,
            &DataOverrides {
                prices,
                statements,
                symbol,
            },
            output.as_deref(),
            strategy.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::Strategies => run_strategies(),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, FundtraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| FundtraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Command-line replacements for `[data]` and `[backtest] symbol`.
#[derive(Debug, Default, Clone)]
pub struct DataOverrides {
    pub prices: Option<PathBuf>,
    pub statements: Option<PathBuf>,
    pub symbol: Option<String>,
}

fn fail(err: &FundtraderError) -> ExitCode {
    error!("{err}");
    err.into()
}

fn run_backtest(
    config_path: &Path,
    overrides: &DataOverrides,
    output_override: Option<&Path>,
    strategy_override: Option<&str>,
) -> ExitCode {
    info!(path = %config_path.display(), "loading config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let prepared = validate_backtest_config(&adapter)
        .and_then(|()| build_backtest_config(&adapter))
        .and_then(|bt| Ok((bt, build_strategy_config(&adapter, strategy_override)?)))
        .and_then(|(bt, strategy)| {
            let data_port = build_data_port(&adapter, overrides)?;
            let symbol = resolve_symbol(overrides.symbol.as_deref(), &adapter)?;
            Ok((bt, strategy, data_port, symbol))
        });
    let (bt_config, strategy_config, data_port, symbol) = match prepared {
        Ok(p) => p,
        Err(e) => return fail(&e),
    };

    let strategy = strategy_config.build();
    info!(
        strategy = strategy.name(),
        symbol = %symbol,
        start = %bt_config.start_date,
        end = %bt_config.end_date,
        "running backtest"
    );

    let outcome = match run_backtest_pipeline(&data_port, &symbol, strategy.as_ref(), &bt_config) {
        Ok(o) => o,
        Err(e) => return fail(&e),
    };

    print!("{}", format_summary(&symbol, &bt_config, &outcome));

    let output_dir = output_override
        .map(Path::to_path_buf)
        .or_else(|| adapter.get_string("report", "output_dir").map(PathBuf::from));
    match (&outcome, output_dir) {
        (RunOutcome::Completed(result), Some(dir)) => {
            if let Err(e) = CsvReportAdapter.write(result, &bt_config, &dir) {
                return fail(&e);
            }
            println!("\nReport written to: {}", dir.display());
        }
        (RunOutcome::NoData, Some(_)) => warn!("no data, report skipped"),
        (_, None) => {}
    }
    ExitCode::SUCCESS
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FundtraderError> {
    let start_date = parse_date(adapter, "backtest", "start_date")?;
    let end_date = parse_date(adapter, "backtest", "end_date")?;

    let config = BacktestConfig {
        start_date,
        end_date,
        initial_capital: read_double(adapter, "backtest", "initial_capital", 100_000.0)?,
        cost_rate: read_double(adapter, "backtest", "cost_rate", 0.0)?,
        buy_fraction: read_double(adapter, "backtest", "buy_fraction", 1.0)?,
        risk_free_rate: read_double(adapter, "backtest", "risk_free_rate", 0.0)?,
        liquidate_at_end: read_bool(adapter, "backtest", "liquidate_at_end", true)?,
        lag: build_lag_policy(adapter)?,
        rebalance: read_rebalance(adapter)?,
    };
    config.validate()?;
    Ok(config)
}

pub fn build_lag_policy(adapter: &dyn ConfigPort) -> Result<LagPolicy, FundtraderError> {
    let days = adapter.get_int("lag", "days", i64::from(DEFAULT_LAG_DAYS));
    let days = u32::try_from(days).map_err(|_| FundtraderError::ConfigInvalid {
        section: "lag".into(),
        key: "days".into(),
        reason: "days must be a non-negative whole number".into(),
    })?;
    let policy = adapter
        .get_string("lag", "policy")
        .map(|p| p.trim().to_lowercase())
        .unwrap_or_else(|| "fixed".to_string());
    match policy.as_str() {
        "fixed" => Ok(LagPolicy::Fixed { days }),
        "filed" => Ok(LagPolicy::PreferFiled {
            fallback_days: days,
        }),
        other => Err(FundtraderError::ConfigInvalid {
            section: "lag".into(),
            key: "policy".into(),
            reason: format!("unknown lag policy '{other}', expected fixed or filed"),
        }),
    }
}

/// Read `[strategy]` into a typed selection; absent parameters take the
/// variant's defaults.
pub fn build_strategy_config(
    adapter: &dyn ConfigPort,
    name_override: Option<&str>,
) -> Result<StrategyConfig, FundtraderError> {
    let name = match name_override {
        Some(n) => n.trim().to_lowercase(),
        None => strategy_name(adapter)?,
    };
    let Some(defaults) = StrategyConfig::with_defaults(&name) else {
        return Err(FundtraderError::UnknownStrategy { name });
    };
    validate_strategy_params(adapter, &name)?;

    let get = |key: &str, default: f64| read_double(adapter, "strategy", key, default);
    Ok(match defaults {
        StrategyConfig::ValueRoe(d) => StrategyConfig::ValueRoe(ValueRoeParams {
            pb_max: get("pb_max", d.pb_max)?,
            roe_min: get("roe_min", d.roe_min)?,
        }),
        StrategyConfig::FundamentalValue(d) => {
            StrategyConfig::FundamentalValue(FundamentalValueParams {
                pb_max: get("pb_max", d.pb_max)?,
                pe_max: get("pe_max", d.pe_max)?,
                roe_min: get("roe_min", d.roe_min)?,
            })
        }
        StrategyConfig::MultiFactor(d) => StrategyConfig::MultiFactor(MultiFactorParams {
            max_market_cap: get("max_market_cap", d.max_market_cap)?,
            min_roe: get("min_roe", d.min_roe)?,
            min_growth: get("min_growth", d.min_growth)?,
            max_ps: get("max_ps", d.max_ps)?,
            weights: FactorWeights {
                market_cap: get("w_market_cap", d.weights.market_cap)?,
                free_cash_flow: get("w_fcf", d.weights.free_cash_flow)?,
                roe: get("w_roe", d.weights.roe)?,
                growth: get("w_growth", d.weights.growth)?,
                price_to_sales: get("w_ps", d.weights.price_to_sales)?,
            },
            min_score: get("min_score", d.min_score)?,
        }),
        other => other,
    })
}

pub fn build_data_port(
    adapter: &dyn ConfigPort,
    overrides: &DataOverrides,
) -> Result<CsvAdapter, FundtraderError> {
    let prices = overrides
        .prices
        .clone()
        .or_else(|| adapter.get_string("data", "prices").map(PathBuf::from))
        .ok_or_else(|| FundtraderError::ConfigMissing {
            section: "data".into(),
            key: "prices".into(),
        })?;
    let statements = overrides
        .statements
        .clone()
        .or_else(|| adapter.get_string("data", "statements").map(PathBuf::from));
    if statements.is_none() {
        warn!("no statements configured, fundamentals will be empty");
    }
    Ok(CsvAdapter::new(prices, statements))
}

pub fn resolve_symbol(
    symbol_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<String, FundtraderError> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| FundtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        })
}

/// What a run produced. Both variants are successful outcomes.
#[derive(Debug)]
pub enum RunOutcome {
    /// The data source had no prices inside the date range.
    NoData,
    Completed(BacktestResult),
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    symbol: &str,
    strategy: &dyn SignalGenerator,
    bt_config: &BacktestConfig,
) -> Result<RunOutcome, FundtraderError> {
    let prices = data_port.fetch_prices(symbol, bt_config.start_date, bt_config.end_date)?;
    if prices.is_empty() {
        warn!(symbol, "no prices in range");
        return Ok(RunOutcome::NoData);
    }
    let statements = data_port.fetch_statements(symbol)?;
    info!(
        bars = prices.len(),
        statements = statements.len(),
        "data loaded"
    );

    backtest_engine::run_backtest(&prices, &statements, bt_config, strategy)
        .map(RunOutcome::Completed)
}

fn pct(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| "n/a".to_string())
}

fn ratio(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn format_summary(symbol: &str, bt_config: &BacktestConfig, outcome: &RunOutcome) -> String {
    let result = match outcome {
        RunOutcome::NoData => {
            return format!(
                "No data available for {} between {} and {}.\n",
                symbol, bt_config.start_date, bt_config.end_date
            );
        }
        RunOutcome::Completed(result) => result,
    };
    let stats = &result.stats;

    let mut out = String::new();
    out.push_str(&format!("=== {} on {} ===\n", result.strategy_name, symbol));
    out.push_str(&format!(
        "Period:           {} to {} ({} trading days)\n",
        bt_config.start_date, bt_config.end_date, stats.trading_days
    ));
    out.push_str(&format!(
        "Final Equity:     {}\n",
        stats
            .final_equity
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    ));
    out.push_str(&format!("Total Return:     {}\n", pct(stats.total_return)));
    out.push_str(&format!("CAGR:             {}\n", pct(stats.cagr)));
    out.push_str(&format!("Sharpe Ratio:     {}\n", ratio(stats.sharpe_ratio)));
    out.push_str(&format!("Sortino Ratio:    {}\n", ratio(stats.sortino_ratio)));
    out.push_str(&format!(
        "Max Drawdown:     -{:.1}% ({} days)\n",
        stats.max_drawdown * 100.0,
        stats.max_drawdown_duration
    ));
    if result.has_trades() {
        out.push_str(&format!("Total Trades:     {}\n", stats.trade_count));
        out.push_str(&format!("Win Rate:         {}\n", pct(stats.win_rate)));
    } else {
        out.push_str("Strategy produced no trades.\n");
    }
    out
}

fn run_validate(config_path: &Path) -> ExitCode {
    info!(path = %config_path.display(), "validating config");
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(&e),
    };

    let checked = validate_backtest_config(&adapter)
        .and_then(|()| build_backtest_config(&adapter))
        .and_then(|bt| Ok((bt, build_strategy_config(&adapter, None)?)));
    let (bt_config, strategy) = match checked {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };

    println!("Backtest: {} to {}", bt_config.start_date, bt_config.end_date);
    println!("  initial_capital: {:.2}", bt_config.initial_capital);
    println!("  cost_rate:       {}", bt_config.cost_rate);
    println!("  lag:             {:?}", bt_config.lag);
    println!("  rebalance:       {:?}", bt_config.rebalance);
    println!("Strategy: {}", strategy.name());
    println!("  {strategy:?}");
    if let Ok(symbol) = resolve_symbol(None, &adapter) {
        println!("Symbol:   {symbol}");
    }
    println!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_strategies() -> ExitCode {
    for name in StrategyConfig::NAMES {
        if let Some(config) = StrategyConfig::with_defaults(name) {
            println!("{name}");
            println!("  defaults: {config:?}");
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn lag_policy_defaults_to_fixed_sixty() {
        let policy = build_lag_policy(&adapter("[backtest]\n")).unwrap();
        assert_eq!(policy, LagPolicy::Fixed { days: 60 });
    }

    #[test]
    fn lag_policy_filed() {
        let policy = build_lag_policy(&adapter("[lag]\npolicy = filed\ndays = 30\n")).unwrap();
        assert_eq!(policy, LagPolicy::PreferFiled { fallback_days: 30 });
    }

    #[test]
    fn lag_policy_rejects_negative_days() {
        assert!(build_lag_policy(&adapter("[lag]\ndays = -1\n")).is_err());
    }

    #[test]
    fn strategy_override_wins() {
        let config = build_strategy_config(
            &adapter("[strategy]\nname = value_roe\n"),
            Some("always_hold"),
        )
        .unwrap();
        assert_eq!(config, StrategyConfig::AlwaysHold);
    }

    #[test]
    fn unknown_override_rejected() {
        let err = build_strategy_config(&adapter("[strategy]\n"), Some("magic")).unwrap_err();
        assert!(matches!(err, FundtraderError::UnknownStrategy { .. }));
    }

    #[test]
    fn resolve_symbol_prefers_override() {
        let config = adapter("[backtest]\nsymbol = acme\n");
        assert_eq!(resolve_symbol(None, &config).unwrap(), "ACME");
        assert_eq!(resolve_symbol(Some("xyz"), &config).unwrap(), "XYZ");
        assert!(resolve_symbol(None, &adapter("[backtest]\n")).is_err());
    }

    #[test]
    fn no_data_summary() {
        let bt = BacktestConfig::new(
            chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        );
        let text = format_summary("ACME", &bt, &RunOutcome::NoData);
        assert!(text.contains("No data available"));
    }
}
