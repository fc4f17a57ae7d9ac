//! Markdown and JSON report generation.
//!
//! This module renders a [`DashboardReport`] as a Markdown document or as
//! pretty-printed JSON.

use crate::analysis::{AggregationDiagnostics, WardComparison, WardOutcome, YearlyAggregation};
use crate::models::BuildSummary;
use crate::report::{DashboardReport, ReportMetadata};
use anyhow::Result;
use std::collections::BTreeMap;

/// Rejected rows listed individually before the rest are summarised.
const MAX_LISTED_REJECTIONS: usize = 10;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    output.push_str("# Housing Statistics Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));

    if let Some(ref summary) = report.geography {
        output.push_str(&generate_geography_section(summary));
    }

    if let Some(ref history) = report.price_history {
        output.push_str(&generate_price_section(
            history,
            report.metadata.area_code.as_deref(),
        ));
    }

    if !report.dwelling_types.is_empty() {
        output.push_str(&generate_dwelling_section(&report.dwelling_types));
    }

    if let Some(ref comparison) = report.ward_comparison {
        output.push_str(&generate_comparison_section(comparison));
    }

    output.push_str(&generate_diagnostics_section(report));

    output.push_str(&generate_footer());

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!("- **Endpoint:** {}\n", metadata.endpoint));
    if let Some(ref source) = metadata.geography_source {
        section.push_str(&format!("- **Geography Table:** {}\n", source));
    }
    if let Some(ref area) = metadata.area_code {
        section.push_str(&format!("- **Area:** `{}`\n", area));
    }
    if let Some(ref council) = metadata.council_code {
        section.push_str(&format!("- **Council:** `{}`\n", council));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_geography_section(summary: &BuildSummary) -> String {
    let mut section = String::new();

    section.push_str("## Geography\n\n");
    section.push_str("| Countries | Councils | Wards | Data Zones |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        summary.countries, summary.councils, summary.wards, summary.data_zones
    ));
    section.push_str(&format!(
        "{} of {} rows used, {} rejected.\n\n",
        summary.valid_rows, summary.total_rows, summary.rejected_rows
    ));

    if !summary.rejections.is_empty() {
        section.push_str("<details>\n<summary>Rejected rows</summary>\n\n");
        for rejected in summary.rejections.iter().take(MAX_LISTED_REJECTIONS) {
            section.push_str(&format!("- row {}: {}\n", rejected.row_index + 1, rejected.reason));
        }
        if summary.rejections.len() > MAX_LISTED_REJECTIONS {
            section.push_str(&format!(
                "- ... and {} more\n",
                summary.rejections.len() - MAX_LISTED_REJECTIONS
            ));
        }
        section.push_str("\n</details>\n\n");
    }

    section
}

fn generate_price_section(history: &YearlyAggregation, area: Option<&str>) -> String {
    let mut section = String::new();

    match area {
        Some(area) => section.push_str(&format!("## Price History: `{}`\n\n", area)),
        None => section.push_str("## Price History\n\n"),
    }

    if history.summaries.is_empty() {
        section.push_str("No price observations were returned for this area.\n\n");
        return section;
    }

    section.push_str("| Year | Mean | Median | Lower Quartile | Upper Quartile | Sales |\n");
    section.push_str("|:---|---:|---:|---:|---:|---:|\n");
    for summary in history.summaries.values() {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            summary.year,
            format_currency(summary.mean_price),
            format_currency(summary.median_price),
            format_currency(summary.lower_quartile),
            format_currency(summary.upper_quartile),
            group_thousands(summary.sales_count),
        ));
    }
    section.push('\n');

    section
}

fn generate_dwelling_section(totals: &BTreeMap<String, u64>) -> String {
    let mut section = String::new();

    section.push_str("## Dwelling Types\n\n");
    section.push_str("| Type | Dwellings | Share |\n");
    section.push_str("|:---|---:|---:|\n");

    let grand_total: u64 = totals.values().sum();
    let mut rows: Vec<_> = totals.iter().collect();
    rows.sort_by_key(|(_, total)| std::cmp::Reverse(**total));

    for (label, total) in rows {
        let share = if grand_total == 0 {
            0.0
        } else {
            *total as f64 * 100.0 / grand_total as f64
        };
        section.push_str(&format!(
            "| {} | {} | {:.1}% |\n",
            label,
            group_thousands(*total),
            share
        ));
    }
    section.push_str(&format!(
        "| **Total** | **{}** | |\n\n",
        group_thousands(grand_total)
    ));

    section
}

fn generate_comparison_section(comparison: &WardComparison) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "## Ward Comparison: {} (`{}`)\n\n",
        comparison.council_name, comparison.council_code
    ));

    if comparison.entries.is_empty() {
        section.push_str("No ward had a complete set of price measures.\n\n");
    } else {
        section.push_str("| Rank | Ward | Mean | Median | Lower Quartile | Upper Quartile |\n");
        section.push_str("|:---:|:---|---:|---:|---:|---:|\n");
        for (rank, entry) in comparison.entries.iter().enumerate() {
            section.push_str(&format!(
                "| {} | {} (`{}`) | {} | {} | {} | {} |\n",
                rank + 1,
                entry.ward_name,
                entry.ward_code,
                format_currency(entry.mean_price),
                format_currency(entry.median_price),
                format_currency(entry.lower_quartile),
                format_currency(entry.upper_quartile),
            ));
        }
        section.push('\n');
    }

    let excluded: Vec<_> = comparison
        .outcomes
        .iter()
        .filter(|w| w.outcome != WardOutcome::Ranked)
        .collect();

    if !excluded.is_empty() {
        section.push_str("### Excluded Wards\n\n");
        for ward in excluded {
            let reason = match &ward.outcome {
                WardOutcome::Ranked => continue,
                WardOutcome::Incomplete { missing } => {
                    let names: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
                    format!("incomplete, missing {}", names.join(", "))
                }
                WardOutcome::Failed { reason } => format!("fetch failed: {}", reason),
            };
            section.push_str(&format!(
                "- {} (`{}`): {}\n",
                ward.ward_name, ward.ward_code, reason
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_diagnostics_section(report: &DashboardReport) -> String {
    let diagnostics = report
        .price_history
        .as_ref()
        .map(|h| h.diagnostics)
        .unwrap_or_default();

    if !diagnostics.has_warnings() && report.warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Diagnostics\n\n");

    if diagnostics.has_warnings() {
        section.push_str(&aggregation_lines(&diagnostics));
    }

    for warning in &report.warnings {
        section.push_str(&format!("- {}\n", warning));
    }
    section.push('\n');

    section
}

fn aggregation_lines(diagnostics: &AggregationDiagnostics) -> String {
    let mut lines = String::new();
    let counters = [
        (diagnostics.unparsable_periods, "observations dropped for an unparsable period"),
        (diagnostics.unclassified_measures, "observations dropped for an unknown measure"),
        (diagnostics.field_parse_failures, "values could not be parsed and were set to 0"),
    ];
    for (count, what) in counters {
        if count > 0 {
            lines.push_str(&format!("- {} of {} {}\n", count, diagnostics.records, what));
        }
    }
    lines
}

fn generate_footer() -> String {
    "---\n\n*Data from statistics.gov.scot*\n".to_string()
}

/// Format a price as whole pounds with thousands separators.
fn format_currency(value: f64) -> String {
    if value <= 0.0 {
        return "-".to_string();
    }
    format!("£{}", group_thousands(value.round() as u64))
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{aggregate, WardReport};
    use crate::models::{
        MeasureKind, ObservationRecord, RejectedRow, RowRejection, WardComparisonEntry,
    };
    use chrono::Utc;

    fn metadata() -> ReportMetadata {
        ReportMetadata {
            generated_at: Utc::now(),
            endpoint: "https://statistics.gov.scot/sparql".to_string(),
            geography_source: Some("lookup.csv".to_string()),
            area_code: Some("S12000033".to_string()),
            council_code: Some("S12000033".to_string()),
            duration_seconds: 2.5,
        }
    }

    fn create_test_report() -> DashboardReport {
        let measures = "http://statistics.gov.scot/def/measure-properties/";
        let mut report = DashboardReport::new(metadata());

        report.geography = Some(BuildSummary {
            total_rows: 3,
            valid_rows: 2,
            rejected_rows: 1,
            countries: 1,
            councils: 1,
            wards: 2,
            data_zones: 2,
            rejections: vec![RejectedRow {
                row_index: 1,
                reason: RowRejection::TooFewColumns {
                    found: 3,
                    required: 35,
                },
            }],
        });

        report.price_history = Some(aggregate(&[
            ObservationRecord::new("2022-01-01", format!("{}mean", measures), "185000"),
            ObservationRecord::new("2022-01-01", format!("{}count", measures), "7123"),
            ObservationRecord::new("bad", format!("{}mean", measures), "1"),
        ]));

        report.dwelling_types = [("Flats".to_string(), 300), ("Detached".to_string(), 100)]
            .into_iter()
            .collect();

        report.ward_comparison = Some(WardComparison {
            council_code: "S12000033".to_string(),
            council_name: "Glasgow City".to_string(),
            entries: vec![WardComparisonEntry {
                ward_code: "S13002781".to_string(),
                ward_name: "Partick East/Kelvindale".to_string(),
                mean_price: 301_234.4,
                median_price: 260_000.0,
                lower_quartile: 180_000.0,
                upper_quartile: 350_000.0,
            }],
            outcomes: vec![
                WardReport {
                    ward_code: "S13002781".to_string(),
                    ward_name: "Partick East/Kelvindale".to_string(),
                    outcome: WardOutcome::Ranked,
                },
                WardReport {
                    ward_code: "S13002782".to_string(),
                    ward_name: "Hillhead".to_string(),
                    outcome: WardOutcome::Incomplete {
                        missing: vec![MeasureKind::LowerQuartile],
                    },
                },
                WardReport {
                    ward_code: "S13002783".to_string(),
                    ward_name: "Anderston/City".to_string(),
                    outcome: WardOutcome::Failed {
                        reason: "timed out after 30s".to_string(),
                    },
                },
            ],
        });

        report
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# Housing Statistics Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("## Geography"));
        assert!(markdown.contains("## Price History: `S12000033`"));
        assert!(markdown.contains("## Dwelling Types"));
        assert!(markdown.contains("## Ward Comparison: Glasgow City"));
        assert!(markdown.contains("## Diagnostics"));
    }

    #[test]
    fn test_price_table_rows() {
        let markdown = generate_markdown_report(&create_test_report());
        assert!(markdown.contains("| 2022 | £185,000 | - | - | - | 7,123 |"));
    }

    #[test]
    fn test_dwelling_shares() {
        let section = generate_dwelling_section(
            &[("Flats".to_string(), 300), ("Detached".to_string(), 100)]
                .into_iter()
                .collect(),
        );
        let flats = section.find("Flats").unwrap();
        let detached = section.find("Detached").unwrap();
        assert!(flats < detached);
        assert!(section.contains("| Flats | 300 | 75.0% |"));
        assert!(section.contains("**400**"));
    }

    #[test]
    fn test_comparison_section_lists_exclusions() {
        let report = create_test_report();
        let section = generate_comparison_section(report.ward_comparison.as_ref().unwrap());

        assert!(section.contains("| 1 | Partick East/Kelvindale (`S13002781`) | £301,234 |"));
        assert!(section.contains("Hillhead (`S13002782`): incomplete, missing lower quartile"));
        assert!(section.contains("Anderston/City (`S13002783`): fetch failed: timed out after 30s"));
    }

    #[test]
    fn test_geography_section_rejections() {
        let report = create_test_report();
        let section = generate_geography_section(report.geography.as_ref().unwrap());
        assert!(section.contains("2 of 3 rows used, 1 rejected."));
        assert!(section.contains("row 2: 3 columns, need at least 35"));
    }

    #[test]
    fn test_diagnostics_omitted_when_clean() {
        let report = DashboardReport::new(metadata());
        let markdown = generate_markdown_report(&report);
        assert!(!markdown.contains("## Diagnostics"));
        assert!(!markdown.contains("## Ward Comparison"));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
        assert_eq!(format_currency(0.0), "-");
        assert_eq!(format_currency(149999.6), "£150,000");
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"meanPrice\""));
        assert!(json.contains("\"wardCode\""));
        assert!(json.contains("\"status\": \"failed\""));
        assert!(json.contains("\"2022\""));
    }
}
