//! Data models for the housing statistics pipeline.
//!
//! This module contains the core data structures shared by the geography
//! builder, the observation aggregator and the ward comparison engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Level of a node in the geography hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeographyLevel {
    Country,
    Council,
    Ward,
}

impl fmt::Display for GeographyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeographyLevel::Country => write!(f, "country"),
            GeographyLevel::Council => write!(f, "council"),
            GeographyLevel::Ward => write!(f, "ward"),
        }
    }
}

/// Finest-grained geographic unit, nested under a ward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataZone {
    pub code: String,
    pub name: String,
}

/// A multi-member ward and the data zones it contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ward {
    pub code: String,
    pub name: String,
    /// Data zones in first-seen order, unique by code.
    pub data_zones: Vec<DataZone>,
}

impl Ward {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            data_zones: Vec::new(),
        }
    }

    /// Record a data zone unless its code is already present.
    ///
    /// Returns `true` if the zone was added.
    pub fn add_data_zone(&mut self, zone: DataZone) -> bool {
        if self.data_zones.iter().any(|dz| dz.code == zone.code) {
            return false;
        }
        self.data_zones.push(zone);
        true
    }
}

/// A local authority (council area).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Council {
    pub code: String,
    pub name: String,
    pub wards: BTreeMap<String, Ward>,
}

impl Council {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            wards: BTreeMap::new(),
        }
    }
}

/// Top level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub code: String,
    pub name: String,
    pub councils: BTreeMap<String, Council>,
}

impl Country {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            councils: BTreeMap::new(),
        }
    }
}

/// Country → council → ward → data zone tree.
///
/// Built once per load of the reference table and treated as read-only
/// afterwards. All lookups are by code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeographyHierarchy {
    pub countries: BTreeMap<String, Country>,
}

impl GeographyHierarchy {
    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    pub fn country(&self, code: &str) -> Option<&Country> {
        self.countries.get(code)
    }

    pub fn council(&self, country: &str, code: &str) -> Option<&Council> {
        self.country(country)?.councils.get(code)
    }

    /// Look up a council by code without knowing its country.
    pub fn find_council(&self, code: &str) -> Option<&Council> {
        self.countries
            .values()
            .find_map(|country| country.councils.get(code))
    }

    pub fn ward(&self, country: &str, council: &str, code: &str) -> Option<&Ward> {
        self.council(country, council)?.wards.get(code)
    }

    /// Iterate over every council in every country.
    pub fn councils(&self) -> impl Iterator<Item = &Council> {
        self.countries.values().flat_map(|c| c.councils.values())
    }

    /// Iterate over every ward in every council.
    pub fn wards(&self) -> impl Iterator<Item = &Ward> {
        self.councils().flat_map(|c| c.wards.values())
    }

    /// Number of distinct nodes at the given level.
    pub fn count(&self, level: GeographyLevel) -> usize {
        match level {
            GeographyLevel::Country => self.countries.len(),
            GeographyLevel::Council => self.councils().count(),
            GeographyLevel::Ward => self.wards().count(),
        }
    }

    pub fn data_zone_count(&self) -> usize {
        self.wards().map(|w| w.data_zones.len()).sum()
    }
}

/// Why a geography row was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RowRejection {
    /// The row has fewer columns than the layout needs.
    TooFewColumns { found: usize, required: usize },
    /// One of the required codes is blank.
    MissingCode { level: GeographyLevel },
    /// The row could not be tokenised at all.
    Unreadable { message: String },
}

impl fmt::Display for RowRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRejection::TooFewColumns { found, required } => {
                write!(f, "{} columns, need at least {}", found, required)
            }
            RowRejection::MissingCode { level } => write!(f, "missing {} code", level),
            RowRejection::Unreadable { message } => write!(f, "unreadable: {}", message),
        }
    }
}

/// A rejected geography row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Zero-based index among data rows (header excluded).
    pub row_index: usize,
    pub reason: RowRejection,
}

/// Diagnostics from one hierarchy build. Observable, not authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSummary {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub rejected_rows: usize,
    pub countries: usize,
    pub councils: usize,
    pub wards: usize,
    pub data_zones: usize,
    pub rejections: Vec<RejectedRow>,
}

/// Classification of an observation's measure identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeasureKind {
    Mean,
    Median,
    LowerQuartile,
    UpperQuartile,
    Count,
}

impl MeasureKind {
    /// Markers tested in priority order.
    const MARKERS: [(&'static str, MeasureKind); 5] = [
        ("mean", MeasureKind::Mean),
        ("median", MeasureKind::Median),
        ("lower-quartile", MeasureKind::LowerQuartile),
        ("upper-quartile", MeasureKind::UpperQuartile),
        ("count", MeasureKind::Count),
    ];

    /// Classify a measure identifier such as
    /// `http://statistics.gov.scot/def/measure-properties/median`.
    pub fn classify(identifier: &str) -> Option<Self> {
        Self::MARKERS
            .iter()
            .find(|(marker, _)| identifier.contains(marker))
            .map(|(_, kind)| *kind)
    }

    /// Whether this measure is a currency amount.
    pub fn is_price(&self) -> bool {
        !matches!(self, MeasureKind::Count)
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Mean => write!(f, "mean"),
            MeasureKind::Median => write!(f, "median"),
            MeasureKind::LowerQuartile => write!(f, "lower quartile"),
            MeasureKind::UpperQuartile => write!(f, "upper quartile"),
            MeasureKind::Count => write!(f, "count"),
        }
    }
}

/// One raw observation from the price feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationRecord {
    /// Timestamp-like period, e.g. `2020-01-01` or a reference period URI.
    pub period: String,
    /// URI-like measure identifier.
    pub measure: String,
    /// Value exactly as the feed returned it.
    pub value: String,
}

impl ObservationRecord {
    pub fn new(
        period: impl Into<String>,
        measure: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            period: period.into(),
            measure: measure.into(),
            value: value.into(),
        }
    }

    pub fn measure_kind(&self) -> Option<MeasureKind> {
        MeasureKind::classify(&self.measure)
    }
}

/// One row of the dwelling-type feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DwellingTypeRecord {
    pub type_label: String,
    pub total: String,
}

/// Price statistics for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlySummary {
    pub year: i32,
    pub mean_price: f64,
    pub median_price: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
    pub sales_count: u64,
}

impl YearlySummary {
    pub fn new(year: i32) -> Self {
        Self {
            year,
            ..Self::default()
        }
    }
}

/// A ward's latest price measures, used for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardComparisonEntry {
    pub ward_code: String,
    pub ward_name: String,
    pub mean_price: f64,
    pub median_price: f64,
    pub lower_quartile: f64,
    pub upper_quartile: f64,
}

impl WardComparisonEntry {
    /// All four price fields strictly positive.
    pub fn is_complete(&self) -> bool {
        [
            self.mean_price,
            self.median_price,
            self.lower_quartile,
            self.upper_quartile,
        ]
        .iter()
        .all(|v| *v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hierarchy() -> GeographyHierarchy {
        let mut ward = Ward::new("W01", "Ward One");
        ward.add_data_zone(DataZone {
            code: "DZ1".to_string(),
            name: "Zone 1".to_string(),
        });
        let mut council = Council::new("C01", "Council One");
        council.wards.insert(ward.code.clone(), ward);
        council
            .wards
            .insert("W02".to_string(), Ward::new("W02", "Ward Two"));
        let mut country = Country::new("S92000003", "Scotland");
        country.councils.insert(council.code.clone(), council);

        let mut hierarchy = GeographyHierarchy::default();
        hierarchy.countries.insert(country.code.clone(), country);
        hierarchy
    }

    #[test]
    fn test_measure_classification() {
        let base = "http://statistics.gov.scot/def/measure-properties/";
        assert_eq!(
            MeasureKind::classify(&format!("{}mean", base)),
            Some(MeasureKind::Mean)
        );
        assert_eq!(
            MeasureKind::classify(&format!("{}median", base)),
            Some(MeasureKind::Median)
        );
        assert_eq!(
            MeasureKind::classify(&format!("{}lower-quartile", base)),
            Some(MeasureKind::LowerQuartile)
        );
        assert_eq!(
            MeasureKind::classify(&format!("{}upper-quartile", base)),
            Some(MeasureKind::UpperQuartile)
        );
        assert_eq!(
            MeasureKind::classify(&format!("{}count", base)),
            Some(MeasureKind::Count)
        );
        assert_eq!(MeasureKind::classify(&format!("{}ratio", base)), None);
    }

    #[test]
    fn test_measure_is_price() {
        assert!(MeasureKind::Mean.is_price());
        assert!(MeasureKind::UpperQuartile.is_price());
        assert!(!MeasureKind::Count.is_price());
    }

    #[test]
    fn test_ward_deduplicates_data_zones() {
        let mut ward = Ward::new("W01", "Ward One");
        assert!(ward.add_data_zone(DataZone {
            code: "DZ1".to_string(),
            name: "First".to_string(),
        }));
        assert!(!ward.add_data_zone(DataZone {
            code: "DZ1".to_string(),
            name: "Second".to_string(),
        }));
        assert_eq!(ward.data_zones.len(), 1);
        assert_eq!(ward.data_zones[0].name, "First");
    }

    #[test]
    fn test_hierarchy_lookups() {
        let hierarchy = sample_hierarchy();
        assert!(hierarchy.country("S92000003").is_some());
        assert!(hierarchy.council("S92000003", "C01").is_some());
        assert!(hierarchy.council("S92000003", "C99").is_none());
        assert_eq!(
            hierarchy.find_council("C01").map(|c| c.name.as_str()),
            Some("Council One")
        );
        assert!(hierarchy.ward("S92000003", "C01", "W02").is_some());
        assert_eq!(hierarchy.count(GeographyLevel::Country), 1);
        assert_eq!(hierarchy.count(GeographyLevel::Council), 1);
        assert_eq!(hierarchy.count(GeographyLevel::Ward), 2);
        assert_eq!(hierarchy.data_zone_count(), 1);
    }

    #[test]
    fn test_entry_completeness() {
        let entry = WardComparisonEntry {
            ward_code: "W01".to_string(),
            ward_name: "Ward One".to_string(),
            mean_price: 200_000.0,
            median_price: 180_000.0,
            lower_quartile: 120_000.0,
            upper_quartile: 250_000.0,
        };
        assert!(entry.is_complete());

        let incomplete = WardComparisonEntry {
            lower_quartile: 0.0,
            ..entry
        };
        assert!(!incomplete.is_complete());
    }

    #[test]
    fn test_rejection_display() {
        let reason = RowRejection::TooFewColumns {
            found: 3,
            required: 35,
        };
        assert_eq!(reason.to_string(), "3 columns, need at least 35");
        let reason = RowRejection::MissingCode {
            level: GeographyLevel::Ward,
        };
        assert_eq!(reason.to_string(), "missing ward code");
    }
}
