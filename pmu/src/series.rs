//! Turns `perf stat -x|` interval output into a ratio time series.

use std::{fmt, io::Read};

use tracing::{debug, warn};

use crate::{Error, StatDefinition};

/// One parsed line of interval output.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: f64,
    pub count: f64,
    pub event: String,
    pub fraction_running: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedRow {
    /// Position among the numerator/denominator samples before filtering.
    pub index: usize,
    pub ratio: f64,
    pub numerator: f64,
    pub denominator: f64,
}

#[derive(Debug, Clone)]
pub struct DerivedSeries {
    pub stat: StatDefinition,
    pub rows: Vec<DerivedRow>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryStats {
    pub geomean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

/// Parses pipe separated rows of
/// `timestamp|count|unit|event|run time|fraction running|metric|metric unit`.
///
/// Rows without a numeric timestamp are skipped, an unreadable count or
/// fraction becomes NaN.
pub fn parse_samples<R: Read>(reader: R) -> Result<Vec<RawSample>, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut samples = vec![];

    for record in reader.records() {
        let record = record?;

        let Some(timestamp) = record.get(0).and_then(|field| field.parse::<f64>().ok()) else {
            if record.iter().any(|field| !field.is_empty()) {
                warn!(?record, "skipping row without a timestamp");
            }
            continue;
        };

        samples.push(RawSample {
            timestamp,
            count: parse_or_nan(record.get(1)),
            event: record.get(3).unwrap_or_default().to_string(),
            fraction_running: parse_or_nan(record.get(5)),
        });
    }

    debug!(count = samples.len(), "parsed samples");

    Ok(samples)
}

fn parse_or_nan(field: Option<&str>) -> f64 {
    field
        .and_then(|field| field.parse().ok())
        .unwrap_or(f64::NAN)
}

/// `numerator / denominator * scale`, NaN when the denominator is zero.
fn ratio(numerator: f64, denominator: f64, scale: f64) -> f64 {
    if denominator == 0.0 {
        return f64::NAN;
    }

    numerator / denominator * scale
}

impl DerivedRow {
    fn is_finite(&self) -> bool {
        self.ratio.is_finite() && self.numerator.is_finite() && self.denominator.is_finite()
    }
}

impl DerivedSeries {
    /// Pairs the n-th numerator sample with the n-th denominator sample.
    ///
    /// There is no join on timestamp: perf emits both events of an interval
    /// next to each other and in a stable order. Positions where either side
    /// is missing or the ratio is not finite are dropped.
    pub fn derive(samples: &[RawSample], stat: &StatDefinition) -> Self {
        let counts = |event: &str| {
            samples
                .iter()
                .filter(|sample| sample.event == event)
                .map(|sample| sample.count)
                .collect::<Vec<_>>()
        };

        let numerators = counts(&stat.numerator);
        let denominators = counts(&stat.denominator);
        let len = numerators.len().max(denominators.len());

        let rows = (0..len)
            .map(|index| {
                let numerator = numerators.get(index).copied().unwrap_or(f64::NAN);
                let denominator = denominators.get(index).copied().unwrap_or(f64::NAN);

                DerivedRow {
                    index,
                    ratio: ratio(numerator, denominator, stat.scale),
                    numerator,
                    denominator,
                }
            })
            .filter(DerivedRow::is_finite)
            .collect::<Vec<_>>();

        if rows.len() < len {
            debug!(dropped = len - rows.len(), "dropped invalid rows");
        }

        DerivedSeries {
            stat: stat.clone(),
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ratios(&self) -> impl Iterator<Item = f64> + '_ {
        self.rows.iter().map(|row| row.ratio)
    }

    pub fn summary(&self) -> SummaryStats {
        SummaryStats::from_values(&self.ratios().collect::<Vec<_>>())
    }
}

impl SummaryStats {
    pub fn from_values(values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        SummaryStats {
            geomean: geometric_mean(&sorted),
            p50: score_at_percentile(&sorted, 50.0),
            p90: score_at_percentile(&sorted, 90.0),
            p99: score_at_percentile(&sorted, 99.0),
        }
    }
}

impl fmt::Display for SummaryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gmean:{:>6.2} p50:{:>6.2} p90:{:>6.2} p99:{:>6.2}",
            self.geomean, self.p50, self.p90, self.p99
        )
    }
}

/// `exp(mean(ln x))`. Zero in the input gives 0, an empty input gives NaN.
pub fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }

    let log_sum = values.iter().map(|value| value.ln()).sum::<f64>();
    (log_sum / values.len() as f64).exp()
}

/// Linear interpolation between the two closest ranks of `sorted`.
pub fn score_at_percentile(sorted: &[f64], percentile: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }

    let index = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    if lower == upper {
        sorted[lower]
    } else {
        let weight = index - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * weight
    }
}
