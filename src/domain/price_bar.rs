//! Daily price bar.

use chrono::NaiveDate;

use super::error::FundtraderError;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

/// Reject empty series, dates that do not strictly increase, and closes that
/// cannot be traded at.
pub fn check_price_series(prices: &[PriceBar]) -> Result<(), FundtraderError> {
    if prices.is_empty() {
        return Err(FundtraderError::EmptyPriceSeries);
    }
    if let Some(bar) = prices
        .iter()
        .find(|bar| !bar.close.is_finite() || bar.close <= 0.0)
    {
        return Err(FundtraderError::InvalidPrice {
            date: bar.date,
            close: bar.close,
        });
    }
    for pair in prices.windows(2) {
        if pair[1].date <= pair[0].date {
            return Err(FundtraderError::NonMonotonicPrices {
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}

/// Bars whose date falls within `[start, end]`, inclusive.
pub fn window(prices: &[PriceBar], start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    prices
        .iter()
        .filter(|bar| bar.date >= start && bar.date <= end)
        .cloned()
        .collect()
}
