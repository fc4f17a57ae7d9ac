//! Observation aggregation and statistics.
//!
//! This module reduces raw price observations into one summary per
//! calendar year, and dwelling-type rows into totals per type.

use crate::models::{DwellingTypeRecord, MeasureKind, ObservationRecord, YearlySummary};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Counters for records that could not be applied cleanly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationDiagnostics {
    /// Records seen.
    pub records: usize,
    /// Records dropped because the period has no recognisable year.
    pub unparsable_periods: usize,
    /// Records dropped because the measure identifier has no known marker.
    pub unclassified_measures: usize,
    /// Records whose value failed to parse and was defaulted to 0.
    pub field_parse_failures: usize,
}

impl AggregationDiagnostics {
    pub fn has_warnings(&self) -> bool {
        self.unparsable_periods + self.unclassified_measures + self.field_parse_failures > 0
    }
}

/// Per-year summaries plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct YearlyAggregation {
    pub summaries: BTreeMap<i32, YearlySummary>,
    pub diagnostics: AggregationDiagnostics,
}

impl YearlyAggregation {
    /// Summaries in ascending year order.
    pub fn series(&self) -> Vec<YearlySummary> {
        self.summaries.values().copied().collect()
    }

    pub fn latest(&self) -> Option<&YearlySummary> {
        self.summaries.values().next_back()
    }
}

/// Aggregate observations into one summary per calendar year.
///
/// Later observations of the same year and measure overwrite earlier ones.
pub fn aggregate(observations: &[ObservationRecord]) -> YearlyAggregation {
    let mut result = YearlyAggregation::default();

    for record in observations {
        result.diagnostics.records += 1;

        let Some(year) = period_year(&record.period) else {
            warn!("Dropping observation with unparsable period '{}'", record.period);
            result.diagnostics.unparsable_periods += 1;
            continue;
        };

        let Some(kind) = record.measure_kind() else {
            warn!("Dropping observation with unknown measure '{}'", record.measure);
            result.diagnostics.unclassified_measures += 1;
            continue;
        };

        let summary = result
            .summaries
            .entry(year)
            .or_insert_with(|| YearlySummary::new(year));

        let applied = match kind {
            MeasureKind::Count => {
                let count = parse_count(&record.value);
                summary.sales_count = count.unwrap_or(0);
                count.is_some()
            }
            price => {
                let value = parse_price(&record.value);
                if let Some(field) = price_field(summary, price) {
                    *field = value.unwrap_or(0.0);
                }
                value.is_some()
            }
        };

        if !applied {
            warn!(
                "Could not parse {} value '{}' for {}, using 0",
                kind, record.value, year
            );
            result.diagnostics.field_parse_failures += 1;
        }
    }

    debug!(
        "Aggregated {} observations into {} years",
        result.diagnostics.records,
        result.summaries.len()
    );

    result
}

/// Reduce dwelling-type rows to a total per type label.
///
/// Rows repeating a label are summed.
pub fn dwelling_totals(records: &[DwellingTypeRecord]) -> BTreeMap<String, u64> {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();

    for record in records {
        match parse_count(&record.total) {
            Some(total) => *totals.entry(record.type_label.clone()).or_default() += total,
            None => warn!(
                "Skipping dwelling type '{}' with unparsable total '{}'",
                record.type_label, record.total
            ),
        }
    }

    totals
}

fn price_field(summary: &mut YearlySummary, kind: MeasureKind) -> Option<&mut f64> {
    match kind {
        MeasureKind::Mean => Some(&mut summary.mean_price),
        MeasureKind::Median => Some(&mut summary.median_price),
        MeasureKind::LowerQuartile => Some(&mut summary.lower_quartile),
        MeasureKind::UpperQuartile => Some(&mut summary.upper_quartile),
        MeasureKind::Count => None,
    }
}

/// Parse a currency amount.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a count, truncating any fractional part.
pub(crate) fn parse_count(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Ok(count) = raw.parse::<u64>() {
        return Some(count);
    }
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.trunc() as u64)
}

/// Calendar year of a period.
///
/// Accepts ISO dates and date-times, `YYYY`, `YYYY-MM`, `YYYY-Qn`, and
/// reference period URIs ending in one of those (e.g.
/// `http://reference.data.gov.uk/id/year/2019`).
pub fn period_year(period: &str) -> Option<i32> {
    period
        .trim()
        .rsplit('/')
        .filter(|segment| !segment.is_empty())
        .find_map(segment_year)
}

fn segment_year(segment: &str) -> Option<i32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(segment) {
        return Some(dt.year());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(segment, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.year());
    }
    if let Ok(date) = NaiveDate::parse_from_str(segment, "%Y-%m-%d") {
        return Some(date.year());
    }

    let (year, rest) = match segment.split_once('-') {
        Some((year, rest)) => (year, Some(rest)),
        None => (segment, None),
    };
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;

    match rest {
        None => Some(year),
        Some(month) if month.len() == 2 => NaiveDate::from_ymd_opt(year, month.parse().ok()?, 1)
            .map(|_| year),
        Some(quarter) if matches!(quarter, "Q1" | "Q2" | "Q3" | "Q4") => Some(year),
        Some(_) => None,
    }
}
