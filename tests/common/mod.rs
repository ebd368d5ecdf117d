#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use fundtrader::domain::backtest::BacktestConfig;
use fundtrader::domain::error::FundtraderError;
use fundtrader::domain::price_bar::PriceBar;
use fundtrader::domain::statement::{FinancialStatementRow, items};
use fundtrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub prices: HashMap<String, Vec<PriceBar>>,
    pub statements: HashMap<String, Vec<FinancialStatementRow>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            prices: HashMap::new(),
            statements: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.prices.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_statements(mut self, symbol: &str, rows: Vec<FinancialStatementRow>) -> Self {
        self.statements.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }

    fn check(&self, symbol: &str) -> Result<(), FundtraderError> {
        match self.errors.get(symbol) {
            Some(reason) => Err(FundtraderError::DataSource {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, FundtraderError> {
        self.check(symbol)?;
        Ok(self
            .prices
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn fetch_statements(&self, symbol: &str) -> Result<Vec<FinancialStatementRow>, FundtraderError> {
        self.check(symbol)?;
        Ok(self.statements.get(symbol).cloned().unwrap_or_default())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000,
    }
}

/// One bar per consecutive calendar day.
pub fn bars_from_closes(start: NaiveDate, closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        })
        .collect()
}

pub fn generate_bars(start: NaiveDate, count: usize, start_price: f64) -> Vec<PriceBar> {
    let closes: Vec<f64> = (0..count).map(|i| start_price + i as f64).collect();
    bars_from_closes(start, &closes)
}

/// A statement row with book value and quarterly earnings filled in.
pub fn make_statement(period_end: NaiveDate, equity: f64, net_income: f64, shares: f64) -> FinancialStatementRow {
    FinancialStatementRow::new(period_end)
        .with_field(items::STOCKHOLDERS_EQUITY, equity)
        .with_field(items::NET_INCOME, net_income)
        .with_field(items::SHARES_OUTSTANDING, shares)
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig::new(date(2020, 1, 1), date(2024, 12, 31))
}
