//! Weighted composite of five fundamental criteria.
//!
//! Each criterion carries a weight. The screen passes when the weight of the
//! passing criteria, as a share of the total weight, reaches `min_score`.
//! A criterion with zero weight is neither required nor evaluated.

use super::valuation::{Valuation, operating_income_growth};
use super::{SignalGenerator, edge_signal};
use crate::domain::align::{AlignedRecord, History};
use crate::domain::signal::Signal;

pub const NAME: &str = "multi_factor";

#[derive(Debug, Clone, PartialEq)]
pub struct FactorWeights {
    pub market_cap: f64,
    pub free_cash_flow: f64,
    pub roe: f64,
    pub growth: f64,
    pub price_to_sales: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        FactorWeights {
            market_cap: 1.0,
            free_cash_flow: 1.0,
            roe: 1.0,
            growth: 0.0,
            price_to_sales: 0.0,
        }
    }
}

impl FactorWeights {
    pub fn total(&self) -> f64 {
        self.market_cap + self.free_cash_flow + self.roe + self.growth + self.price_to_sales
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultiFactorParams {
    pub max_market_cap: f64,
    pub min_roe: f64,
    /// Year-over-year operating income growth, in percent.
    pub min_growth: f64,
    pub max_ps: f64,
    pub weights: FactorWeights,
    pub min_score: f64,
}

impl Default for MultiFactorParams {
    fn default() -> Self {
        MultiFactorParams {
            max_market_cap: 1e12,
            min_roe: 0.05,
            min_growth: 0.0,
            max_ps: 50.0,
            weights: FactorWeights::default(),
            min_score: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultiFactor {
    params: MultiFactorParams,
}

impl MultiFactor {
    pub fn new(params: MultiFactorParams) -> Self {
        MultiFactor { params }
    }

    /// Weighted share of passing criteria, `None` if any weighted criterion
    /// cannot be evaluated.
    pub fn score(&self, history: History<'_>) -> Option<f64> {
        let p = &self.params;
        let w = &p.weights;
        let total = w.total();
        if total <= 0.0 {
            return None;
        }

        let record = history.current();
        let v = Valuation::new(record.close(), record.statement()?);

        let criteria: [(f64, &dyn Fn() -> Option<bool>); 5] = [
            (w.market_cap, &|| Some(v.market_cap()? < p.max_market_cap)),
            (w.free_cash_flow, &|| Some(v.free_cash_flow()? > 0.0)),
            (w.roe, &|| Some(v.roe()? > p.min_roe)),
            (w.growth, &|| Some(operating_income_growth(history)? > p.min_growth)),
            (w.price_to_sales, &|| Some(v.price_to_sales()? < p.max_ps)),
        ];

        let mut passed = 0.0;
        for (weight, check) in criteria {
            if weight == 0.0 {
                continue;
            }
            if check()? {
                passed += weight;
            }
        }
        Some(passed / total)
    }

    fn screen(&self, history: History<'_>) -> Option<bool> {
        // tolerance keeps an all-criteria pass at exactly 1.0
        self.score(history)
            .map(|s| s + 1e-12 >= self.params.min_score)
    }
}

impl SignalGenerator for MultiFactor {
    fn name(&self) -> &str {
        NAME
    }

    fn evaluate(&self, _record: &AlignedRecord, history: History<'_>) -> Signal {
        edge_signal(history, |prefix| self.screen(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Action;
    use crate::domain::statement::{FinancialStatementRow, items};
    use crate::domain::strategy::test_support::{day, record};
    use approx::assert_relative_eq;

    fn row(operating_income: f64) -> FinancialStatementRow {
        FinancialStatementRow::new(day(0))
            .with_field(items::STOCKHOLDERS_EQUITY, 1_000.0)
            .with_field(items::NET_INCOME, 100.0)
            .with_field(items::SHARES_OUTSTANDING, 100.0)
            .with_field(items::OPERATING_CASH_FLOW, 80.0)
            .with_field(items::CAPITAL_EXPENDITURE, -30.0)
            .with_field(items::TOTAL_REVENUE, 500.0)
            .with_field(items::OPERATING_INCOME, operating_income)
    }

    fn score_at(params: MultiFactorParams, close: f64, r: FinancialStatementRow) -> Option<f64> {
        let records = vec![record(0, close, Some(r))];
        MultiFactor::new(params).score(History::prefix(&records, 0).unwrap())
    }

    #[test]
    fn default_weights_require_size_cash_and_roe() {
        let score = score_at(MultiFactorParams::default(), 20.0, row(10.0)).unwrap();
        assert_relative_eq!(score, 1.0);
    }

    #[test]
    fn negative_free_cash_flow_fails_default_screen() {
        let r = row(10.0).with_field(items::CAPITAL_EXPENDITURE, -100.0);
        let score = score_at(MultiFactorParams::default(), 20.0, r).unwrap();
        assert_relative_eq!(score, 2.0 / 3.0);
    }

    #[test]
    fn partial_score_meets_lower_threshold() {
        let params = MultiFactorParams {
            min_score: 0.6,
            ..MultiFactorParams::default()
        };
        let r = row(10.0).with_field(items::CAPITAL_EXPENDITURE, -100.0);
        let records = vec![record(0, 20.0, Some(r))];
        let screen = MultiFactor::new(params).screen(History::prefix(&records, 0).unwrap());
        assert_eq!(screen, Some(true));
    }

    #[test]
    fn price_to_sales_weight_applies() {
        let params = MultiFactorParams {
            max_ps: 3.0,
            weights: FactorWeights {
                price_to_sales: 1.0,
                ..FactorWeights::default()
            },
            ..MultiFactorParams::default()
        };
        // market cap 2000, revenue 500: P/S 4
        let score = score_at(params, 20.0, row(10.0)).unwrap();
        assert_relative_eq!(score, 0.75);
    }

    #[test]
    fn weighted_growth_needs_a_year_of_statements() {
        let params = MultiFactorParams {
            weights: FactorWeights {
                growth: 1.0,
                ..FactorWeights::default()
            },
            ..MultiFactorParams::default()
        };
        assert_eq!(score_at(params, 20.0, row(10.0)), None);
    }

    #[test]
    fn growth_compares_four_statements_back() {
        let params = MultiFactorParams {
            weights: FactorWeights {
                market_cap: 0.0,
                free_cash_flow: 0.0,
                roe: 0.0,
                growth: 1.0,
                price_to_sales: 0.0,
            },
            ..MultiFactorParams::default()
        };
        let incomes = [10.0, 11.0, 12.0, 13.0, 15.0];
        let records: Vec<_> = incomes
            .iter()
            .enumerate()
            .map(|(i, &oi)| {
                let mut r = row(oi);
                r.period_end = day(i);
                record(i, 20.0, Some(r))
            })
            .collect();
        let strategy = MultiFactor::new(params);

        assert_eq!(strategy.score(History::prefix(&records, 3).unwrap()), None);
        assert_eq!(strategy.score(History::prefix(&records, 4).unwrap()), Some(1.0));

        let actions: Vec<_> = (0..records.len())
            .map(|i| {
                strategy
                    .evaluate(&records[i], History::prefix(&records, i).unwrap())
                    .action
            })
            .collect();
        assert_eq!(actions.last(), Some(&Action::Buy));
    }

    #[test]
    fn zero_total_weight_is_unevaluable() {
        let params = MultiFactorParams {
            weights: FactorWeights {
                market_cap: 0.0,
                free_cash_flow: 0.0,
                roe: 0.0,
                growth: 0.0,
                price_to_sales: 0.0,
            },
            ..MultiFactorParams::default()
        };
        assert_eq!(score_at(params, 20.0, row(10.0)), None);
    }

    #[test]
    fn no_fundamentals_holds() {
        let strategy = MultiFactor::new(MultiFactorParams::default());
        let records = vec![record(0, 20.0, None), record(1, 21.0, None)];
        for i in 0..2 {
            let signal = strategy.evaluate(&records[i], History::prefix(&records, i).unwrap());
            assert_eq!(signal.action, Action::Hold);
        }
    }
}
