//! CSV file data adapter.
//!
//! Prices: `date,open,high,low,close,volume`.
//! Statements: `period_end[,filed_date],<line item>...`, one column per line
//! item. Empty cells mean the item was not reported.
//!
//! Paths may contain `{symbol}`, which is replaced by the requested symbol.

use crate::domain::error::FundtraderError;
use crate::domain::price_bar::PriceBar;
use crate::domain::statement::FinancialStatementRow;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

const PERIOD_END: &str = "period_end";
const FILED_DATE: &str = "filed_date";

#[derive(Debug, Deserialize)]
struct PriceRow {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: i64,
}

impl From<PriceRow> for PriceBar {
    fn from(row: PriceRow) -> Self {
        PriceBar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        }
    }
}

#[derive(Debug)]
pub struct CsvAdapter {
    prices: PathBuf,
    statements: Option<PathBuf>,
}

impl CsvAdapter {
    /// Without a statements path every fetch returns no statements.
    pub fn new(prices: PathBuf, statements: Option<PathBuf>) -> Self {
        Self { prices, statements }
    }

    fn resolve(template: &Path, symbol: &str) -> PathBuf {
        PathBuf::from(template.to_string_lossy().replace("{symbol}", symbol))
    }

    fn open(path: &Path) -> Result<csv::Reader<File>, FundtraderError> {
        csv::Reader::from_path(path).map_err(|e| FundtraderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })
    }
}

fn parse_error(path: &Path, line: Option<u64>, detail: impl std::fmt::Display) -> FundtraderError {
    let location = line.map(|l| format!(" line {l}")).unwrap_or_default();
    FundtraderError::DataSource {
        reason: format!("{}{}: {}", path.display(), location, detail),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, FundtraderError> {
        let path = Self::resolve(&self.prices, symbol);
        let mut rdr = Self::open(&path)?;

        let mut bars = Vec::new();
        for result in rdr.deserialize::<PriceRow>() {
            let row = result.map_err(|e| {
                let line = e.position().map(|p| p.line());
                parse_error(&path, line, e)
            })?;
            if row.date < start_date || row.date > end_date {
                continue;
            }
            bars.push(PriceBar::from(row));
        }

        bars.sort_by_key(|b| b.date);
        debug!(symbol, path = %path.display(), bars = bars.len(), "loaded prices");
        Ok(bars)
    }

    fn fetch_statements(&self, symbol: &str) -> Result<Vec<FinancialStatementRow>, FundtraderError> {
        let Some(template) = &self.statements else {
            return Ok(Vec::new());
        };
        let path = Self::resolve(template, symbol);
        let mut rdr = Self::open(&path)?;

        let headers = rdr
            .headers()
            .map_err(|e| parse_error(&path, Some(1), e))?
            .clone();
        let period_col = headers
            .iter()
            .position(|h| h.trim() == PERIOD_END)
            .ok_or_else(|| parse_error(&path, Some(1), "missing period_end column"))?;
        let filed_col = headers.iter().position(|h| h.trim() == FILED_DATE);

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| {
                let line = e.position().map(|p| p.line());
                parse_error(&path, line, e)
            })?;
            let line = record.position().map(|p| p.line());

            let period_end = parse_date(record.get(period_col), &path, line)?
                .ok_or_else(|| parse_error(&path, line, "empty period_end"))?;
            let mut row = FinancialStatementRow::new(period_end);
            if let Some(col) = filed_col {
                if let Some(filed) = parse_date(record.get(col), &path, line)? {
                    row = row.with_filed_date(filed);
                }
            }

            for (col, name) in headers.iter().enumerate() {
                if col == period_col || Some(col) == filed_col {
                    continue;
                }
                let cell = record.get(col).map(str::trim).unwrap_or("");
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell
                    .parse()
                    .map_err(|_| parse_error(&path, line, format!("invalid {name} value '{cell}'")))?;
                row = row.with_field(name.trim(), value);
            }
            rows.push(row);
        }

        // order is checked by the aligner, not repaired here
        debug!(symbol, path = %path.display(), rows = rows.len(), "loaded statements");
        Ok(rows)
    }
}

fn parse_date(
    cell: Option<&str>,
    path: &Path,
    line: Option<u64>,
) -> Result<Option<NaiveDate>, FundtraderError> {
    match cell.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| parse_error(path, line, format!("invalid date '{s}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::statement::items;
    use std::fs;
    use tempfile::TempDir;

    fn setup_test_data() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::write(
            dir.path().join("ACME_prices.csv"),
            "date,open,high,low,close,volume\n\
             2024-01-17,110.0,120.0,105.0,115.0,55000\n\
             2024-01-15,100.0,110.0,90.0,105.0,50000\n\
             2024-01-16,105.0,115.0,100.0,110.0,60000\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("ACME_statements.csv"),
            "period_end,filed_date,stockholders_equity,net_income,shares_outstanding\n\
             2023-09-30,2023-11-02,5000,120,100\n\
             2023-12-31,,5200,,100\n",
        )
        .unwrap();
        dir
    }

    fn adapter(dir: &TempDir) -> CsvAdapter {
        CsvAdapter::new(
            dir.path().join("{symbol}_prices.csv"),
            Some(dir.path().join("{symbol}_statements.csv")),
        )
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_prices_returns_sorted_bars() {
        let dir = setup_test_data();
        let bars = adapter(&dir)
            .fetch_prices("ACME", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(bars[0].date, date(2024, 1, 15));
        assert_eq!(bars[0].open, 100.0);
        assert_eq!(bars[0].close, 105.0);
        assert_eq!(bars[0].volume, 50000);
        assert_eq!(bars[2].date, date(2024, 1, 17));
    }

    #[test]
    fn fetch_prices_filters_by_date() {
        let dir = setup_test_data();
        let bars = adapter(&dir)
            .fetch_prices("ACME", date(2024, 1, 16), date(2024, 1, 16))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 110.0);
    }

    #[test]
    fn missing_price_file_is_data_source_error() {
        let dir = setup_test_data();
        let err = adapter(&dir)
            .fetch_prices("NOPE", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap_err();
        assert!(matches!(err, FundtraderError::DataSource { .. }));
    }

    #[test]
    fn bad_price_value_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(
            &path,
            "date,open,high,low,close,volume\n2024-01-15,1,1,1,abc,10\n",
        )
        .unwrap();
        let err = CsvAdapter::new(path, None)
            .fetch_prices("X", date(2024, 1, 1), date(2024, 1, 31))
            .unwrap_err();
        match err {
            FundtraderError::DataSource { reason } => {
                assert!(reason.contains("prices.csv"), "{reason}")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fetch_statements_reads_items_and_filed_dates() {
        let dir = setup_test_data();
        let rows = adapter(&dir).fetch_statements("ACME").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].period_end, date(2023, 9, 30));
        assert_eq!(rows[0].filed_date, Some(date(2023, 11, 2)));
        assert_eq!(rows[0].get(items::NET_INCOME), Some(120.0));
        assert_eq!(rows[1].filed_date, None);
        assert_eq!(rows[1].get(items::NET_INCOME), None);
        assert_eq!(rows[1].equity(), Some(5200.0));
    }

    #[test]
    fn no_statements_path_yields_empty() {
        let dir = setup_test_data();
        let adapter = CsvAdapter::new(dir.path().join("{symbol}_prices.csv"), None);
        assert!(adapter.fetch_statements("ACME").unwrap().is_empty());
    }

    #[test]
    fn statements_without_period_end_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.csv");
        fs::write(&path, "quarter,net_income\n2023-09-30,10\n").unwrap();
        let adapter = CsvAdapter::new(dir.path().join("p.csv"), Some(path));
        assert!(matches!(
            adapter.fetch_statements("X"),
            Err(FundtraderError::DataSource { .. })
        ));
    }

    #[test]
    fn statements_keep_file_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.csv");
        fs::write(&path, "period_end,net_income\n2023-12-31,1\n2023-09-30,2\n").unwrap();
        let rows = CsvAdapter::new(dir.path().join("p.csv"), Some(path))
            .fetch_statements("X")
            .unwrap();
        assert_eq!(rows[0].period_end, date(2023, 12, 31));
    }
}
