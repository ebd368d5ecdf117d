//! Configuration validation.
//!
//! Runs against the raw key/value port before any data is fetched, so bad
//! configuration never reaches the simulator.

use crate::domain::error::FundtraderError;
use crate::domain::simulator::RebalanceFrequency;
use crate::domain::strategy::{MultiFactorParams, StrategyConfig};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const LAG_POLICIES: [&str; 2] = ["fixed", "filed"];

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    validate_dates(config)?;
    validate_initial_capital(config)?;
    validate_cost_rate(config)?;
    validate_buy_fraction(config)?;
    validate_risk_free_rate(config)?;
    validate_lag(config)?;
    read_bool(config, "backtest", "liquidate_at_end", true)?;
    read_rebalance(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let name = strategy_name(config)?;
    validate_strategy_params(config, &name)
}

/// Range checks for the `[strategy]` parameters of variant `name`.
pub fn validate_strategy_params(config: &dyn ConfigPort, name: &str) -> Result<(), FundtraderError> {
    match name {
        "value_roe" => {
            positive(config, "strategy", "pb_max")?;
            finite(config, "strategy", "roe_min")?;
        }
        "fundamental_value" => {
            positive(config, "strategy", "pb_max")?;
            positive(config, "strategy", "pe_max")?;
            finite(config, "strategy", "roe_min")?;
        }
        "multi_factor" => validate_multi_factor(config)?,
        _ => {}
    }
    Ok(())
}

/// The configured strategy name, checked against the known variants.
pub fn strategy_name(config: &dyn ConfigPort) -> Result<String, FundtraderError> {
    let name = match config.get_string("strategy", "name") {
        Some(s) if !s.trim().is_empty() => s.trim().to_lowercase(),
        _ => {
            return Err(FundtraderError::ConfigMissing {
                section: "strategy".to_string(),
                key: "name".to_string(),
            });
        }
    };
    if StrategyConfig::with_defaults(&name).is_none() {
        return Err(FundtraderError::UnknownStrategy { name });
    }
    Ok(name)
}

pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<NaiveDate, FundtraderError> {
    match config.get_string(section, key) {
        None => Err(FundtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FundtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("invalid {key} format, expected YYYY-MM-DD"),
            }
        }),
    }
}

/// A float value, or `default` when the key is absent. Present but
/// unparseable values are rejected rather than silently defaulted.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, FundtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| FundtraderError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{}' is not a number", raw.trim()),
            }),
    }
}

/// A boolean flag, or `default` when the key is absent.
pub fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, FundtraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(default);
    };
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(invalid(
            section,
            key,
            &format!("'{other}' is not a boolean, expected true or false"),
        )),
    }
}

/// `[backtest] rebalance`, daily when absent.
pub fn read_rebalance(config: &dyn ConfigPort) -> Result<RebalanceFrequency, FundtraderError> {
    let Some(raw) = config.get_string("backtest", "rebalance") else {
        return Ok(RebalanceFrequency::Daily);
    };
    RebalanceFrequency::parse(&raw).ok_or_else(|| {
        invalid(
            "backtest",
            "rebalance",
            &format!(
                "unknown rebalance '{}', expected daily, weekly, monthly or a positive number of days",
                raw.trim()
            ),
        )
    })
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let start_date = parse_date(config, "backtest", "start_date")?;
    let end_date = parse_date(config, "backtest", "end_date")?;
    if start_date >= end_date {
        return Err(invalid(
            "backtest",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let value = read_double(config, "backtest", "initial_capital", 100_000.0)?;
    if value <= 0.0 {
        return Err(invalid(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_cost_rate(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let value = read_double(config, "backtest", "cost_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "cost_rate",
            "cost_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_buy_fraction(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let value = read_double(config, "backtest", "buy_fraction", 1.0)?;
    if value <= 0.0 || value > 1.0 {
        return Err(invalid(
            "backtest",
            "buy_fraction",
            "buy_fraction must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    let value = read_double(config, "backtest", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "backtest",
            "risk_free_rate",
            "risk_free_rate must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_lag(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    if let Some(policy) = config.get_string("lag", "policy") {
        let policy = policy.trim().to_lowercase();
        if !LAG_POLICIES.contains(&policy.as_str()) {
            return Err(invalid(
                "lag",
                "policy",
                &format!("unknown lag policy '{policy}', expected fixed or filed"),
            ));
        }
    }
    if let Some(raw) = config.get_string("lag", "days") {
        match raw.trim().parse::<i64>() {
            Ok(days) if (0..=i64::from(u32::MAX)).contains(&days) => {}
            _ => {
                return Err(invalid(
                    "lag",
                    "days",
                    "days must be a non-negative whole number",
                ));
            }
        }
    }
    Ok(())
}

fn validate_multi_factor(config: &dyn ConfigPort) -> Result<(), FundtraderError> {
    positive(config, "strategy", "max_market_cap")?;
    finite(config, "strategy", "min_roe")?;
    finite(config, "strategy", "min_growth")?;
    positive(config, "strategy", "max_ps")?;

    let defaults = MultiFactorParams::default().weights;
    let mut total = 0.0;
    for (key, default) in [
        ("w_market_cap", defaults.market_cap),
        ("w_fcf", defaults.free_cash_flow),
        ("w_roe", defaults.roe),
        ("w_growth", defaults.growth),
        ("w_ps", defaults.price_to_sales),
    ] {
        let weight = read_double(config, "strategy", key, default)?;
        if weight < 0.0 {
            return Err(invalid("strategy", key, "weights must be non-negative"));
        }
        total += weight;
    }
    if total <= 0.0 {
        return Err(invalid(
            "strategy",
            "w_market_cap",
            "at least one factor weight must be positive",
        ));
    }

    let min_score = read_double(config, "strategy", "min_score", 1.0)?;
    if !(0.0..=1.0).contains(&min_score) {
        return Err(invalid(
            "strategy",
            "min_score",
            "min_score must be between 0 and 1",
        ));
    }
    Ok(())
}

fn positive(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FundtraderError> {
    if let Some(value) = optional(config, section, key)? {
        if value <= 0.0 {
            return Err(invalid(section, key, &format!("{key} must be positive")));
        }
    }
    Ok(())
}

fn finite(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FundtraderError> {
    optional(config, section, key).map(|_| ())
}

fn optional(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, FundtraderError> {
    if config.get_string(section, key).is_none() {
        return Ok(None);
    }
    read_double(config, section, key, 0.0).map(Some)
}

fn invalid(section: &str, key: &str, reason: &str) -> FundtraderError {
    FundtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const DATES: &str = "[backtest]\nstart_date = 2020-01-01\nend_date = 2024-12-31\n";

    fn with_dates(extra: &str) -> FileConfigAdapter {
        make_config(&format!("{DATES}{extra}"))
    }

    #[test]
    fn valid_backtest_config_passes() {
        let config = make_config(
            r#"
[backtest]
start_date = 2020-01-01
end_date = 2024-12-31
initial_capital = 250000
cost_rate = 0.001
buy_fraction = 0.5
risk_free_rate = 0.03
liquidate_at_end = false

[lag]
policy = filed
days = 45
"#,
        );
        assert!(validate_backtest_config(&config).is_ok());
    }

    #[test]
    fn dates_alone_are_enough() {
        assert!(validate_backtest_config(&with_dates("")).is_ok());
    }

    #[test]
    fn missing_start_date_fails() {
        let config = make_config("[backtest]\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigMissing { key, .. } if key == "start_date"));
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config("[backtest]\nstart_date = 2020/01/01\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_not_before_end_fails() {
        let config = make_config("[backtest]\nstart_date = 2024-12-31\nend_date = 2024-12-31\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn initial_capital_must_be_positive() {
        for value in ["0", "-100"] {
            let config = with_dates(&format!("initial_capital = {value}\n"));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
            );
        }
    }

    #[test]
    fn non_numeric_capital_is_rejected() {
        let config = with_dates("initial_capital = lots\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "initial_capital")
        );
    }

    #[test]
    fn cost_rate_out_of_range_fails() {
        for value in ["-0.01", "1.0"] {
            let config = with_dates(&format!("cost_rate = {value}\n"));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "cost_rate"));
        }
    }

    #[test]
    fn buy_fraction_out_of_range_fails() {
        for value in ["0", "1.5"] {
            let config = with_dates(&format!("buy_fraction = {value}\n"));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "buy_fraction")
            );
        }
    }

    #[test]
    fn risk_free_rate_out_of_range_fails() {
        let config = with_dates("risk_free_rate = 1.5\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "risk_free_rate")
        );
    }

    #[test]
    fn unknown_lag_policy_fails() {
        let config = with_dates("[lag]\npolicy = psychic\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "policy"));
    }

    #[test]
    fn negative_lag_days_fails() {
        let config = with_dates("[lag]\ndays = -5\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "days"));
    }

    #[test]
    fn unparseable_liquidate_flag_fails() {
        let config = with_dates("liquidate_at_end = maybe\n");
        let err = validate_backtest_config(&config).unwrap_err();
        assert!(
            matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "liquidate_at_end")
        );
        assert!(validate_backtest_config(&with_dates("liquidate_at_end = no\n")).is_ok());
    }

    #[test]
    fn rebalance_values() {
        for (raw, expected) in [
            ("daily", RebalanceFrequency::Daily),
            ("Weekly", RebalanceFrequency::Weekly),
            ("monthly", RebalanceFrequency::Monthly),
            ("10", RebalanceFrequency::EveryNDays(10)),
        ] {
            let config = with_dates(&format!("rebalance = {raw}\n"));
            assert!(validate_backtest_config(&config).is_ok(), "{raw}");
            assert_eq!(read_rebalance(&config).unwrap(), expected);
        }
        assert_eq!(read_rebalance(&with_dates("")).unwrap(), RebalanceFrequency::Daily);
    }

    #[test]
    fn bad_rebalance_fails() {
        for raw in ["0", "-3", "hourly"] {
            let config = with_dates(&format!("rebalance = {raw}\n"));
            let err = validate_backtest_config(&config).unwrap_err();
            assert!(
                matches!(err, FundtraderError::ConfigInvalid { ref key, .. } if key == "rebalance"),
                "{raw}"
            );
        }
    }

    #[test]
    fn zero_lag_days_allowed() {
        assert!(validate_backtest_config(&with_dates("[lag]\ndays = 0\n")).is_ok());
    }

    #[test]
    fn missing_strategy_name_fails() {
        let config = make_config("[strategy]\npb_max = 1.0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigMissing { key, .. } if key == "name"));
    }

    #[test]
    fn unknown_strategy_fails() {
        let config = make_config("[strategy]\nname = momentum\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::UnknownStrategy { name } if name == "momentum"));
    }

    #[test]
    fn strategy_name_is_case_insensitive() {
        let config = make_config("[strategy]\nname = Value_ROE\n");
        assert_eq!(strategy_name(&config).unwrap(), "value_roe");
    }

    #[test]
    fn each_known_strategy_passes_with_defaults() {
        for name in StrategyConfig::NAMES {
            let config = make_config(&format!("[strategy]\nname = {name}\n"));
            assert!(validate_strategy_config(&config).is_ok(), "{name}");
        }
    }

    #[test]
    fn value_roe_pb_max_must_be_positive() {
        let config = make_config("[strategy]\nname = value_roe\npb_max = 0\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "pb_max"));
    }

    #[test]
    fn fundamental_value_pe_max_must_be_positive() {
        let config = make_config("[strategy]\nname = fundamental_value\npe_max = -3\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "pe_max"));
    }

    #[test]
    fn multi_factor_negative_weight_fails() {
        let config = make_config("[strategy]\nname = multi_factor\nw_roe = -1\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "w_roe"));
    }

    #[test]
    fn multi_factor_all_zero_weights_fails() {
        let config = make_config(
            "[strategy]\nname = multi_factor\nw_market_cap = 0\nw_fcf = 0\nw_roe = 0\n",
        );
        assert!(validate_strategy_config(&config).is_err());
    }

    #[test]
    fn multi_factor_min_score_range() {
        let config = make_config("[strategy]\nname = multi_factor\nmin_score = 1.2\n");
        let err = validate_strategy_config(&config).unwrap_err();
        assert!(matches!(err, FundtraderError::ConfigInvalid { key, .. } if key == "min_score"));
    }
}
