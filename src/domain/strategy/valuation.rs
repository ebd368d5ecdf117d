//! Valuation ratios derived from a price and a statement row.
//!
//! Every ratio is `None` when an input is missing, a divisor is zero, or the
//! result is not finite.

use crate::domain::align::History;
use crate::domain::statement::FinancialStatementRow;

/// Quarterly figures are annualised by this factor.
const QUARTERS_PER_YEAR: f64 = 4.0;

/// Year-over-year comparisons look this many statements back.
const YOY_STATEMENTS: usize = 4;

fn ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy)]
pub struct Valuation<'a> {
    pub price: f64,
    pub row: &'a FinancialStatementRow,
}

impl<'a> Valuation<'a> {
    pub fn new(price: f64, row: &'a FinancialStatementRow) -> Self {
        Valuation { price, row }
    }

    pub fn book_value_per_share(&self) -> Option<f64> {
        ratio(self.row.equity()?, self.row.shares()?)
    }

    pub fn price_to_book(&self) -> Option<f64> {
        ratio(self.price, self.book_value_per_share()?)
    }

    pub fn roe(&self) -> Option<f64> {
        ratio(self.row.net_income()?, self.row.equity()?)
    }

    pub fn annualized_roe(&self) -> Option<f64> {
        self.roe().map(|r| r * QUARTERS_PER_YEAR)
    }

    /// Latest quarterly net income run-rate per share.
    pub fn annualized_eps(&self) -> Option<f64> {
        ratio(self.row.net_income()? * QUARTERS_PER_YEAR, self.row.shares()?)
    }

    pub fn price_to_earnings(&self) -> Option<f64> {
        ratio(self.price, self.annualized_eps()?)
    }

    pub fn market_cap(&self) -> Option<f64> {
        let shares = self.row.shares().filter(|s| *s != 0.0)?;
        Some(self.price * shares).filter(|v| v.is_finite())
    }

    pub fn price_to_sales(&self) -> Option<f64> {
        ratio(self.market_cap()?, self.row.revenue()?)
    }

    pub fn free_cash_flow(&self) -> Option<f64> {
        self.row.free_cash_flow()
    }
}

/// Operating income growth in percent versus the statement published a year
/// earlier, as far as the prefix can see.
pub fn operating_income_growth(history: History<'_>) -> Option<f64> {
    let current = history.prior_snapshot(0)?.row.operating_income()?;
    let year_ago = history.prior_snapshot(YOY_STATEMENTS)?.row.operating_income()?;
    ratio(current, year_ago).map(|r| (r - 1.0) * 100.0)
}
