//! Domain error types.
//!
//! Only fatal conditions live here. Missing fundamentals resolve to a HOLD
//! signal and degenerate statistics resolve to `None`; neither is an error.

use chrono::NaiveDate;

/// Top-level error type for fundtrader.
#[derive(Debug, thiserror::Error)]
pub enum FundtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy '{name}'")]
    UnknownStrategy { name: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("price series is empty")]
    EmptyPriceSeries,

    #[error("price dates not strictly increasing: {current} follows {previous}")]
    NonMonotonicPrices {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("invalid close price {close} on {date}")]
    InvalidPrice { date: NaiveDate, close: f64 },

    #[error("statement period ends not strictly increasing: {current} follows {previous}")]
    MalformedStatements {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("simulation already finished")]
    SimulationFinished,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundtraderError {
    /// Fatal input-data problems; the run is aborted before simulation.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            FundtraderError::DataSource { .. }
                | FundtraderError::EmptyPriceSeries
                | FundtraderError::NonMonotonicPrices { .. }
                | FundtraderError::InvalidPrice { .. }
                | FundtraderError::MalformedStatements { .. }
        )
    }

    /// Configuration rejected before any fetch or simulation work.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            FundtraderError::ConfigParse { .. }
                | FundtraderError::ConfigMissing { .. }
                | FundtraderError::ConfigInvalid { .. }
                | FundtraderError::UnknownStrategy { .. }
        )
    }
}

impl From<&FundtraderError> for std::process::ExitCode {
    fn from(err: &FundtraderError) -> Self {
        let code: u8 = match err {
            FundtraderError::Io(_) => 1,
            FundtraderError::ConfigParse { .. }
            | FundtraderError::ConfigMissing { .. }
            | FundtraderError::ConfigInvalid { .. }
            | FundtraderError::UnknownStrategy { .. } => 2,
            FundtraderError::DataSource { .. } => 3,
            FundtraderError::EmptyPriceSeries
            | FundtraderError::NonMonotonicPrices { .. }
            | FundtraderError::InvalidPrice { .. }
            | FundtraderError::MalformedStatements { .. } => 5,
            FundtraderError::SimulationFinished => 6,
        };
        std::process::ExitCode::from(code)
    }
}
