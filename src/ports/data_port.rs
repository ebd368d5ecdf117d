//! Inbound data from the fetch layer.

use crate::domain::error::FundtraderError;
use crate::domain::price_bar::PriceBar;
use crate::domain::statement::FinancialStatementRow;
use chrono::NaiveDate;

/// Source of daily prices and periodic statements for one instrument.
///
/// Implementations return rows sorted by date. Validation of ordering and
/// duplicates happens in the domain, not here.
pub trait DataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, FundtraderError>;

    /// All statements on record; earlier periods may already be visible on the
    /// first backtest day.
    fn fetch_statements(&self, symbol: &str) -> Result<Vec<FinancialStatementRow>, FundtraderError>;
}
