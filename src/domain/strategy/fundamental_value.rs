//! Low P/B or low positive P/E, gated on annualised ROE.

use super::valuation::Valuation;
use super::{SignalGenerator, edge_signal};
use crate::domain::align::{AlignedRecord, History};
use crate::domain::signal::Signal;

pub const NAME: &str = "fundamental_value";

#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalValueParams {
    pub pb_max: f64,
    pub pe_max: f64,
    pub roe_min: f64,
}

impl Default for FundamentalValueParams {
    fn default() -> Self {
        FundamentalValueParams {
            pb_max: 0.7,
            pe_max: 13.0,
            roe_min: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FundamentalValue {
    params: FundamentalValueParams,
}

impl FundamentalValue {
    pub fn new(params: FundamentalValueParams) -> Self {
        FundamentalValue { params }
    }

    /// (P/B < pb_max OR 0 < P/E < pe_max) AND annualised ROE > roe_min.
    ///
    /// Book value, net income and shares must all be present. Zero or
    /// negative earnings fail the earnings leg rather than counting as
    /// missing.
    fn screen(&self, history: History<'_>) -> Option<bool> {
        let record = history.current();
        let v = Valuation::new(record.close(), record.statement()?);
        let pb = v.price_to_book()?;
        let eps = v.annualized_eps()?;
        let roe = v.annualized_roe()?;

        let cheap_book = pb < self.params.pb_max;
        let cheap_earnings = eps > 0.0 && record.close() / eps < self.params.pe_max;
        Some((cheap_book || cheap_earnings) && roe > self.params.roe_min)
    }
}

impl SignalGenerator for FundamentalValue {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, _record: &AlignedRecord, history: History<'_>) -> Signal {
        edge_signal(history, |prefix| self.screen(prefix))
    }
}
