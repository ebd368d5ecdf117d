//! Daily trading decisions.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        };
        f.write_str(s)
    }
}

/// Advisory: the simulator decides what is actually feasible.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signal {
    pub date: NaiveDate,
    pub action: Action,
    pub target_weight: Option<f64>,
}

impl Signal {
    pub fn buy(date: NaiveDate) -> Self {
        Signal {
            date,
            action: Action::Buy,
            target_weight: None,
        }
    }

    pub fn sell(date: NaiveDate) -> Self {
        Signal {
            date,
            action: Action::Sell,
            target_weight: None,
        }
    }

    pub fn hold(date: NaiveDate) -> Self {
        Signal {
            date,
            action: Action::Hold,
            target_weight: None,
        }
    }

    /// Attach a target weight, clamped to `[0, 1]`.
    pub fn with_target_weight(mut self, weight: f64) -> Self {
        self.target_weight = Some(weight.clamp(0.0, 1.0));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn constructors_set_action() {
        assert_eq!(Signal::buy(day()).action, Action::Buy);
        assert_eq!(Signal::sell(day()).action, Action::Sell);
        assert_eq!(Signal::hold(day()).action, Action::Hold);
        assert!(Signal::hold(day()).target_weight.is_none());
    }

    #[test]
    fn target_weight_clamped() {
        assert_eq!(Signal::buy(day()).with_target_weight(1.7).target_weight, Some(1.0));
        assert_eq!(Signal::sell(day()).with_target_weight(-0.2).target_weight, Some(0.0));
        assert_eq!(Signal::buy(day()).with_target_weight(0.4).target_weight, Some(0.4));
    }

    #[test]
    fn action_display() {
        assert_eq!(Action::Buy.to_string(), "BUY");
        assert_eq!(Action::Sell.to_string(), "SELL");
        assert_eq!(Action::Hold.to_string(), "HOLD");
    }
}
