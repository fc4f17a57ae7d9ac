//! Analysis of fetched observations.
//!
//! `aggregator` reduces an area's price feed to yearly summaries.
//! `comparison` ranks the wards of a council by their latest prices.

pub mod aggregator;
pub mod comparison;

pub use aggregator::{aggregate, dwelling_totals, period_year, AggregationDiagnostics, YearlyAggregation};
pub use comparison::{compare_wards, ComparisonOptions, WardComparison, WardOutcome, WardReport};
