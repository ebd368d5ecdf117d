//! Financial statement rows and the line items strategies read from them.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::FundtraderError;

/// Standard line-item names.
pub mod items {
    pub const STOCKHOLDERS_EQUITY: &str = "stockholders_equity";
    pub const NET_INCOME: &str = "net_income";
    pub const SHARES_OUTSTANDING: &str = "shares_outstanding";
    pub const TOTAL_REVENUE: &str = "total_revenue";
    pub const OPERATING_INCOME: &str = "operating_income";
    pub const OPERATING_CASH_FLOW: &str = "operating_cash_flow";
    pub const CAPITAL_EXPENDITURE: &str = "capital_expenditure";
    pub const TOTAL_ASSETS: &str = "total_assets";
}

/// One fiscal period's disclosure. `filed_date` is absent when the provider
/// only reports the period end.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancialStatementRow {
    pub period_end: NaiveDate,
    pub filed_date: Option<NaiveDate>,
    pub fields: BTreeMap<String, f64>,
}

impl FinancialStatementRow {
    pub fn new(period_end: NaiveDate) -> Self {
        FinancialStatementRow {
            period_end,
            filed_date: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_filed_date(mut self, filed: NaiveDate) -> Self {
        self.filed_date = Some(filed);
        self
    }

    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// The value of a line item, skipping NaN placeholders.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields.get(name).copied().filter(|v| !v.is_nan())
    }

    pub fn equity(&self) -> Option<f64> {
        self.get(items::STOCKHOLDERS_EQUITY)
    }

    pub fn net_income(&self) -> Option<f64> {
        self.get(items::NET_INCOME)
    }

    pub fn shares(&self) -> Option<f64> {
        self.get(items::SHARES_OUTSTANDING)
    }

    pub fn revenue(&self) -> Option<f64> {
        self.get(items::TOTAL_REVENUE)
    }

    pub fn operating_income(&self) -> Option<f64> {
        self.get(items::OPERATING_INCOME)
    }

    /// Operating cash flow plus capital expenditure (reported negative).
    pub fn free_cash_flow(&self) -> Option<f64> {
        let ocf = self.get(items::OPERATING_CASH_FLOW)?;
        let capex = self.get(items::CAPITAL_EXPENDITURE)?;
        Some(ocf + capex)
    }
}

/// Period ends must strictly increase; duplicates count as malformed.
pub fn check_statement_series(rows: &[FinancialStatementRow]) -> Result<(), FundtraderError> {
    for pair in rows.windows(2) {
        if pair[1].period_end <= pair[0].period_end {
            return Err(FundtraderError::MalformedStatements {
                previous: pair[0].period_end,
                current: pair[1].period_end,
            });
        }
    }
    Ok(())
}
