//! Strategies that ignore fundamentals.

use super::SignalGenerator;
use crate::domain::align::{AlignedRecord, History};
use crate::domain::signal::Signal;

pub const BUY_AND_HOLD: &str = "buy_and_hold";
pub const ALWAYS_HOLD: &str = "always_hold";

/// Buy on the first day, hold afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuyAndHold;

impl SignalGenerator for BuyAndHold {
    fn name(&self) -> &str {
        BUY_AND_HOLD
    }

    fn evaluate(&self, record: &AlignedRecord, history: History<'_>) -> Signal {
        if history.previous().is_none() {
            Signal::buy(record.date())
        } else {
            Signal::hold(record.date())
        }
    }
}

/// Never trades. Useful as a cash baseline.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHold;

impl SignalGenerator for AlwaysHold {
    fn name(&self) -> &str {
        ALWAYS_HOLD
    }

    fn evaluate(&self, record: &AlignedRecord, _history: History<'_>) -> Signal {
        Signal::hold(record.date())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use crate::domain::strategy::test_support::record;

    #[test]
    fn buy_and_hold_buys_once() {
        let records: Vec<_> = (0..4).map(|i| record(i, 10.0, None)).collect();
        let actions: Vec<_> = (0..4)
            .map(|i| {
                BuyAndHold
                    .evaluate(&records[i], History::prefix(&records, i).unwrap())
                    .action
            })
            .collect();
        assert_eq!(
            actions,
            vec![Action::Buy, Action::Hold, Action::Hold, Action::Hold]
        );
    }

    #[test]
    fn always_hold_holds() {
        let records: Vec<_> = (0..3).map(|i| record(i, 10.0, None)).collect();
        for i in 0..3 {
            let signal = AlwaysHold.evaluate(&records[i], History::prefix(&records, i).unwrap());
            assert_eq!(signal.action, Action::Hold);
            assert_eq!(signal.date, records[i].date());
        }
    }
}
