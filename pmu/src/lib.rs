pub mod catalog;
pub mod cpu_family;
mod driver;
pub mod series;

pub use catalog::{PlatformCatalog, StatDefinition};
pub use driver::{discover_cpus, parse_cpu_list, PerfStatDriver, PerfStatDriverBuilder};
pub use series::{DerivedRow, DerivedSeries, RawSample, SummaryStats};

use pmu_data::scale_parser::ScaleError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} is not supported")]
    UnsupportedPlatform(String),
    #[error("'{stat}' is not a known stat for {platform}")]
    UnknownStat { platform: String, stat: String },
    #[error("Failed to measure performance counters: {0}")]
    MeasurementFailed(String),
    #[error("invalid custom counter '{0}', expected 'name|numerator|denominator|scale'")]
    InvalidCustomCounter(String),
    #[error(transparent)]
    InvalidScale(#[from] ScaleError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}
