//! Ward price comparison.
//!
//! Fans out one observation fetch per ward of a council, keeps each ward's
//! latest price measures and ranks the complete wards by mean price.

use crate::analysis::aggregator::parse_price;
use crate::error::FetchError;
use crate::models::{Council, MeasureKind, ObservationRecord, Ward, WardComparisonEntry};
use crate::progress::ProgressCallback;
use crate::source::ObservationSource;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Limits for the ward fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonOptions {
    /// Maximum fetches in flight at once. Values below 1 are treated as 1.
    pub concurrency: usize,
    /// Per-ward fetch timeout. A timeout counts as a failed fetch.
    pub fetch_timeout: Duration,
}

impl Default for ComparisonOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout: Duration::from_secs(30),
        }
    }
}

/// What happened to one ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WardOutcome {
    /// All four prices present and positive.
    Ranked,
    /// Fetched, but some prices were missing or not positive.
    Incomplete { missing: Vec<MeasureKind> },
    /// The fetch failed or timed out.
    Failed { reason: String },
}

/// Per-ward diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardReport {
    pub ward_code: String,
    pub ward_name: String,
    pub outcome: WardOutcome,
}

/// Ranked comparison for one council.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WardComparison {
    pub council_code: String,
    pub council_name: String,
    /// Complete wards, highest mean price first.
    pub entries: Vec<WardComparisonEntry>,
    /// Every ward of the council in code order.
    pub outcomes: Vec<WardReport>,
}

impl WardComparison {
    pub fn failed_count(&self) -> usize {
        self.count_matching(|o| matches!(o, WardOutcome::Failed { .. }))
    }

    pub fn incomplete_count(&self) -> usize {
        self.count_matching(|o| matches!(o, WardOutcome::Incomplete { .. }))
    }

    fn count_matching(&self, predicate: impl Fn(&WardOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|w| predicate(&w.outcome)).count()
    }
}

/// Latest value of each price measure for one ward.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct LatestPrices {
    mean: Option<f64>,
    median: Option<f64>,
    lower_quartile: Option<f64>,
    upper_quartile: Option<f64>,
}

impl LatestPrices {
    /// Take the last record of each price measure after ordering by period.
    fn from_records(ward_code: &str, mut records: Vec<ObservationRecord>) -> Self {
        records.sort_by(|a, b| a.period.cmp(&b.period));

        let mut latest: [Option<&str>; 4] = [None; 4];
        for record in &records {
            if let Some(slot) = record.measure_kind().and_then(price_slot) {
                latest[slot] = Some(record.value.as_str());
            }
        }

        let [mean, median, lower_quartile, upper_quartile] = latest.map(|raw| {
            let raw = raw?;
            let value = parse_price(raw);
            if value.is_none() {
                warn!("Ward {}: ignoring unparsable price '{}'", ward_code, raw);
            }
            value
        });

        Self {
            mean,
            median,
            lower_quartile,
            upper_quartile,
        }
    }

    /// Build an entry, or list the measures that are absent or not positive.
    fn into_entry(self, ward: &Ward) -> Result<WardComparisonEntry, Vec<MeasureKind>> {
        let missing: Vec<MeasureKind> = [
            (MeasureKind::Mean, self.mean),
            (MeasureKind::Median, self.median),
            (MeasureKind::LowerQuartile, self.lower_quartile),
            (MeasureKind::UpperQuartile, self.upper_quartile),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_some_and(|v| v > 0.0))
        .map(|(kind, _)| kind)
        .collect();

        if !missing.is_empty() {
            return Err(missing);
        }

        Ok(WardComparisonEntry {
            ward_code: ward.code.clone(),
            ward_name: ward.name.clone(),
            mean_price: self.mean.unwrap_or_default(),
            median_price: self.median.unwrap_or_default(),
            lower_quartile: self.lower_quartile.unwrap_or_default(),
            upper_quartile: self.upper_quartile.unwrap_or_default(),
        })
    }
}

fn price_slot(kind: MeasureKind) -> Option<usize> {
    match kind {
        MeasureKind::Mean => Some(0),
        MeasureKind::Median => Some(1),
        MeasureKind::LowerQuartile => Some(2),
        MeasureKind::UpperQuartile => Some(3),
        MeasureKind::Count => None,
    }
}

/// Compare every ward of a council.
///
/// Fetches run concurrently up to `options.concurrency`, each bounded by
/// `options.fetch_timeout`. The call returns once every fetch has settled.
/// A failed, timed out or incomplete ward is left out of the ranking and
/// never fails the comparison as a whole.
pub async fn compare_wards(
    council: &Council,
    source: &dyn ObservationSource,
    options: &ComparisonOptions,
    progress: &dyn ProgressCallback,
) -> WardComparison {
    let concurrency = options.concurrency.max(1);
    let timeout = options.fetch_timeout;

    info!(
        "Comparing {} wards in {} (concurrency={})",
        council.wards.len(),
        council.name,
        concurrency
    );
    progress.set_total(council.wards.len() as u64);

    let settled: Vec<(&Ward, Result<Vec<ObservationRecord>, FetchError>)> =
        stream::iter(council.wards.values())
            .map(|ward| async move {
                let result =
                    match tokio::time::timeout(timeout, source.fetch_observations(&ward.code))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::Timeout(timeout)),
                    };
                progress.inc(1);
                (ward, result)
            })
            .buffered(concurrency)
            .collect()
            .await;

    progress.finish();

    let mut comparison = WardComparison {
        council_code: council.code.clone(),
        council_name: council.name.clone(),
        ..WardComparison::default()
    };

    for (ward, result) in settled {
        let outcome = match result {
            Ok(records) => {
                debug!("Ward {}: {} observations", ward.code, records.len());
                match LatestPrices::from_records(&ward.code, records).into_entry(ward) {
                    Ok(entry) => {
                        comparison.entries.push(entry);
                        WardOutcome::Ranked
                    }
                    Err(missing) => {
                        debug!("Ward {} incomplete, missing {:?}", ward.code, missing);
                        WardOutcome::Incomplete { missing }
                    }
                }
            }
            Err(e) => {
                warn!("Fetching data for ward {} failed: {}", ward.code, e);
                WardOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        comparison.outcomes.push(WardReport {
            ward_code: ward.code.clone(),
            ward_name: ward.name.clone(),
            outcome,
        });
    }

    rank_entries(&mut comparison.entries);

    info!(
        "Ranked {} of {} wards ({} failed, {} incomplete)",
        comparison.entries.len(),
        comparison.outcomes.len(),
        comparison.failed_count(),
        comparison.incomplete_count()
    );

    comparison
}

/// Sort by mean price, highest first; equal means by ward code.
pub fn rank_entries(entries: &mut [WardComparisonEntry]) {
    entries.sort_by(|a, b| {
        b.mean_price
            .total_cmp(&a.mean_price)
            .then_with(|| a.ward_code.cmp(&b.ward_code))
    });
}
