//! Point-in-time alignment of sparse fundamentals onto the daily price series.
//!
//! Each statement row becomes visible on its availability date, computed by a
//! [`LagPolicy`]. The record for day D carries the most recent row (greatest
//! period end) among those available on or before D, and nothing else.

use chrono::{Duration, NaiveDate};
use std::sync::Arc;
use tracing::debug;

use super::error::FundtraderError;
use super::price_bar::{PriceBar, check_price_series};
use super::statement::{FinancialStatementRow, check_statement_series};

/// Availability lag used when nothing else is configured.
pub const DEFAULT_LAG_DAYS: u32 = 60;

/// How the availability date of a statement row is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagPolicy {
    /// `period_end + days`, ignoring any filed date.
    Fixed { days: u32 },
    /// The filed date when present, otherwise `period_end + fallback_days`.
    PreferFiled { fallback_days: u32 },
}

impl Default for LagPolicy {
    fn default() -> Self {
        LagPolicy::Fixed {
            days: DEFAULT_LAG_DAYS,
        }
    }
}

impl LagPolicy {
    pub fn available_on(&self, row: &FinancialStatementRow) -> NaiveDate {
        match *self {
            LagPolicy::Fixed { days } => row.period_end + Duration::days(i64::from(days)),
            LagPolicy::PreferFiled { fallback_days } => match row.filed_date {
                // a filing cannot precede the period it describes
                Some(filed) => filed.max(row.period_end),
                None => row.period_end + Duration::days(i64::from(fallback_days)),
            },
        }
    }
}

/// A statement row together with the date it became visible.
#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalSnapshot {
    pub row: FinancialStatementRow,
    pub available_on: NaiveDate,
}

/// One trading day: the bar plus whatever fundamentals were public that day.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRecord {
    pub bar: PriceBar,
    pub fundamentals: Option<Arc<FundamentalSnapshot>>,
}

impl AlignedRecord {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }

    pub fn snapshot(&self) -> Option<&FundamentalSnapshot> {
        self.fundamentals.as_deref()
    }

    pub fn statement(&self) -> Option<&FinancialStatementRow> {
        self.snapshot().map(|s| &s.row)
    }
}

/// Merge `statements` into `prices` without look-ahead.
///
/// Fails when prices are empty or not strictly increasing, or when statement
/// period ends are not strictly increasing.
pub fn align(
    prices: &[PriceBar],
    statements: &[FinancialStatementRow],
    lag: LagPolicy,
) -> Result<Vec<AlignedRecord>, FundtraderError> {
    check_price_series(prices)?;
    check_statement_series(statements)?;

    let snapshots: Vec<Arc<FundamentalSnapshot>> = statements
        .iter()
        .map(|row| {
            Arc::new(FundamentalSnapshot {
                row: row.clone(),
                available_on: lag.available_on(row),
            })
        })
        .collect();

    // Filed dates can reorder availability relative to period order, so walk
    // rows by availability and keep the latest period seen so far.
    let mut schedule: Vec<(NaiveDate, usize)> = snapshots
        .iter()
        .enumerate()
        .map(|(i, snap)| (snap.available_on, i))
        .collect();
    schedule.sort_unstable();

    let mut next = 0;
    let mut visible: Option<usize> = None;
    let mut records = Vec::with_capacity(prices.len());

    for bar in prices {
        while next < schedule.len() && schedule[next].0 <= bar.date {
            let idx = schedule[next].1;
            if visible.is_none_or(|v| idx > v) {
                visible = Some(idx);
            }
            next += 1;
        }
        records.push(AlignedRecord {
            bar: bar.clone(),
            fundamentals: visible.map(|i| Arc::clone(&snapshots[i])),
        });
    }

    if next < schedule.len() {
        debug!(
            unused = schedule.len() - next,
            "statement rows never become visible within the price window"
        );
    }

    Ok(records)
}

/// Read-only prefix of the aligned series ending at the day being evaluated.
///
/// There is no way to reach a record after [`History::current`] through this
/// type.
#[derive(Debug, Clone, Copy)]
pub struct History<'a> {
    records: &'a [AlignedRecord],
}

impl<'a> History<'a> {
    /// The prefix `records[..=end]`, or `None` when `end` is out of range.
    pub fn prefix(records: &'a [AlignedRecord], end: usize) -> Option<Self> {
        records.get(..=end).map(|records| History { records })
    }

    pub fn current(&self) -> &'a AlignedRecord {
        // non-empty by construction
        &self.records[self.records.len() - 1]
    }

    pub fn previous(&self) -> Option<&'a AlignedRecord> {
        self.records.len().checked_sub(2).map(|i| &self.records[i])
    }

    /// The same prefix without its last day.
    pub fn before_current(&self) -> Option<History<'a>> {
        self.records
            .len()
            .checked_sub(2)
            .map(|end| History {
                records: &self.records[..=end],
            })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &'a [AlignedRecord] {
        self.records
    }

    /// The snapshot `steps` distinct statements before the current one, as
    /// seen within this prefix. `steps == 0` is the current snapshot.
    pub fn prior_snapshot(&self, steps: usize) -> Option<&'a FundamentalSnapshot> {
        let mut last_period: Option<NaiveDate> = None;
        let mut seen = 0usize;
        for record in self.records.iter().rev() {
            let Some(snap) = record.fundamentals.as_deref() else {
                break;
            };
            if last_period != Some(snap.row.period_end) {
                if last_period.is_some() {
                    seen += 1;
                }
                last_period = Some(snap.row.period_end);
                if seen == steps {
                    return Some(snap);
                }
            }
        }
        None
    }
}
