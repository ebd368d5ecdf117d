//! Cheap on book value and profitable on equity.

use super::valuation::Valuation;
use super::{SignalGenerator, edge_signal};
use crate::domain::align::{AlignedRecord, History};
use crate::domain::signal::Signal;

pub const NAME: &str = "value_roe";

#[derive(Debug, Clone, PartialEq)]
pub struct ValueRoeParams {
    pub pb_max: f64,
    pub roe_min: f64,
}

impl Default for ValueRoeParams {
    fn default() -> Self {
        ValueRoeParams {
            pb_max: 1.5,
            roe_min: 0.10,
        }
    }
}

/// Long while P/B < `pb_max` and quarterly ROE > `roe_min`.
#[derive(Debug, Clone)]
pub struct ValueRoe {
    params: ValueRoeParams,
}

impl ValueRoe {
    pub fn new(params: ValueRoeParams) -> Self {
        ValueRoe { params }
    }

    fn screen(&self, history: History<'_>) -> Option<bool> {
        let record = history.current();
        let v = Valuation::new(record.close(), record.statement()?);
        let pb = v.price_to_book()?;
        let roe = v.roe()?;
        Some(pb < self.params.pb_max && roe > self.params.roe_min)
    }
}

impl SignalGenerator for ValueRoe {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, _record: &AlignedRecord, history: History<'_>) -> Signal {
        edge_signal(history, |prefix| self.screen(prefix))
    }
}
