//! Outbound hand-off to the presentation layer.

use crate::domain::backtest::{BacktestConfig, BacktestResult};
use crate::domain::error::FundtraderError;
use std::path::Path;

pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        config: &BacktestConfig,
        output_dir: &Path,
    ) -> Result<(), FundtraderError>;
}
