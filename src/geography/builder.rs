//! Geography hierarchy builder.
//!
//! Folds the rows of the data zone lookup table into a
//! country → council → ward → data zone tree. Malformed rows are skipped
//! and reported, never fatal.

use crate::models::{
    BuildSummary, Council, Country, DataZone, GeographyHierarchy, GeographyLevel, RejectedRow,
    RowRejection, Ward,
};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, warn};

/// Fixed column offsets of the lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub data_zone_code: usize,
    pub data_zone_name: usize,
    pub ward_code: usize,
    pub ward_name: usize,
    pub council_code: usize,
    pub council_name: usize,
    pub country_code: usize,
    pub country_name: usize,
    /// Rows shorter than this are rejected.
    pub min_columns: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            data_zone_code: 0,
            data_zone_name: 1,
            ward_code: 4,
            ward_name: 5,
            council_code: 6,
            council_name: 7,
            country_code: 33,
            country_name: 34,
            min_columns: 35,
        }
    }
}

/// One validated row of the lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GeographyRow<'a> {
    data_zone_code: &'a str,
    data_zone_name: &'a str,
    ward_code: &'a str,
    ward_name: &'a str,
    council_code: &'a str,
    council_name: &'a str,
    country_code: &'a str,
    country_name: &'a str,
}

/// Result of a hierarchy build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    pub hierarchy: GeographyHierarchy,
    pub summary: BuildSummary,
}

/// Builds a [`GeographyHierarchy`] from the lookup table.
#[derive(Debug, Clone, Default)]
pub struct HierarchyBuilder {
    layout: ColumnLayout,
}

impl HierarchyBuilder {
    pub fn new(layout: ColumnLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Build from the full text of the table. The first line is the header.
    pub fn build(&self, text: &str) -> BuildOutput {
        self.build_from_lines(text.lines())
    }

    /// Build from a header line followed by data lines.
    pub fn build_from_lines<'a, I>(&self, lines: I) -> BuildOutput
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut hierarchy = GeographyHierarchy::default();
        let mut summary = BuildSummary::default();

        for (row_index, line) in lines.into_iter().skip(1).enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            summary.total_rows += 1;

            let outcome = tokenize(line).and_then(|record| {
                let row = self.validate(&record)?;
                insert_row(&mut hierarchy, &row);
                Ok(())
            });

            match outcome {
                Ok(()) => summary.valid_rows += 1,
                Err(reason) => {
                    warn!("Skipping geography row {}: {}", row_index, reason);
                    summary.rejected_rows += 1;
                    summary.rejections.push(RejectedRow { row_index, reason });
                }
            }
        }

        summary.countries = hierarchy.count(GeographyLevel::Country);
        summary.councils = hierarchy.count(GeographyLevel::Council);
        summary.wards = hierarchy.count(GeographyLevel::Ward);
        summary.data_zones = hierarchy.data_zone_count();

        info!(
            "Built geography hierarchy: {} rows ({} valid, {} rejected), {} countries, {} councils, {} wards",
            summary.total_rows,
            summary.valid_rows,
            summary.rejected_rows,
            summary.countries,
            summary.councils,
            summary.wards
        );

        BuildOutput { hierarchy, summary }
    }

    fn validate<'r>(&self, record: &'r StringRecord) -> Result<GeographyRow<'r>, RowRejection> {
        let layout = &self.layout;
        if record.len() < layout.min_columns {
            return Err(RowRejection::TooFewColumns {
                found: record.len(),
                required: layout.min_columns,
            });
        }

        let field = |index: usize| record.get(index).map(clean_field).unwrap_or("");

        let row = GeographyRow {
            data_zone_code: field(layout.data_zone_code),
            data_zone_name: field(layout.data_zone_name),
            ward_code: field(layout.ward_code),
            ward_name: field(layout.ward_name),
            council_code: field(layout.council_code),
            council_name: field(layout.council_name),
            country_code: field(layout.country_code),
            country_name: field(layout.country_name),
        };

        let required = [
            (row.country_code, GeographyLevel::Country),
            (row.council_code, GeographyLevel::Council),
            (row.ward_code, GeographyLevel::Ward),
        ];
        if let Some((_, level)) = required.iter().find(|(code, _)| code.is_empty()) {
            return Err(RowRejection::MissingCode { level: *level });
        }

        Ok(row)
    }
}

/// Split one line into fields.
fn tokenize(line: &str) -> Result<StringRecord, RowRejection> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(line.as_bytes());

    match reader.records().next() {
        Some(Ok(record)) => Ok(record),
        Some(Err(e)) => Err(RowRejection::Unreadable {
            message: e.to_string(),
        }),
        None => Ok(StringRecord::new()),
    }
}

/// Strip whitespace and any stray surrounding quotes.
fn clean_field(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// Insert a validated row. First-seen names win for existing codes.
fn insert_row(hierarchy: &mut GeographyHierarchy, row: &GeographyRow<'_>) {
    let country = hierarchy
        .countries
        .entry(row.country_code.to_string())
        .or_insert_with(|| Country::new(row.country_code, row.country_name));

    let council = country
        .councils
        .entry(row.council_code.to_string())
        .or_insert_with(|| Council::new(row.council_code, row.council_name));

    let ward = council
        .wards
        .entry(row.ward_code.to_string())
        .or_insert_with(|| Ward::new(row.ward_code, row.ward_name));

    if row.data_zone_code.is_empty() {
        return;
    }

    let added = ward.add_data_zone(DataZone {
        code: row.data_zone_code.to_string(),
        name: row.data_zone_name.to_string(),
    });
    if !added {
        debug!(
            "Data zone {} already recorded under ward {}",
            row.data_zone_code, row.ward_code
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "DZ22_Code,DZ22_Name,IZ22_Code,IZ22_Name,MMWard_Code,MMWard_Name,LA_Code,LA_Name";

    /// Build a 35-column row with the default layout.
    fn row(dz: (&str, &str), ward: (&str, &str), council: (&str, &str), country: (&str, &str)) -> String {
        let mut cols = vec![String::new(); 35];
        cols[0] = dz.0.to_string();
        cols[1] = dz.1.to_string();
        cols[4] = ward.0.to_string();
        cols[5] = ward.1.to_string();
        cols[6] = council.0.to_string();
        cols[7] = council.1.to_string();
        cols[33] = country.0.to_string();
        cols[34] = country.1.to_string();
        cols.join(",")
    }

    fn table(rows: &[String]) -> String {
        let mut text = String::from(HEADER);
        for r in rows {
            text.push('\n');
            text.push_str(r);
        }
        text
    }

    #[test]
    fn test_single_row_builds_full_path() {
        let line = format!(
            "DZ001,DataZoneA,,, W01,WardOne,C01,CouncilOne{},COUNTRY1,Scotland",
            ",".repeat(25)
        );
        assert_eq!(line.split(',').count(), 35);

        let output = HierarchyBuilder::default().build(&table(&[line]));
        let ward = output
            .hierarchy
            .ward("COUNTRY1", "C01", "W01")
            .expect("ward should exist");

        assert_eq!(ward.name, "WardOne");
        assert_eq!(
            ward.data_zones,
            vec![DataZone {
                code: "DZ001".to_string(),
                name: "DataZoneA".to_string(),
            }]
        );
        assert_eq!(output.hierarchy.country("COUNTRY1").map(|c| c.name.as_str()), Some("Scotland"));
        assert_eq!(output.summary.valid_rows, 1);
        assert_eq!(output.summary.rejected_rows, 0);
    }

    #[test]
    fn test_short_row_is_rejected() {
        let good = row(("DZ1", "Zone"), ("W1", "Ward"), ("C1", "Council"), ("S1", "Scotland"));
        let baseline = HierarchyBuilder::default().build(&table(&[good.clone()]));

        let short = "DZ2,Zone Two,,,W2,Ward Two,C1,Council".to_string();
        let output = HierarchyBuilder::default().build(&table(&[good, short]));

        assert_eq!(output.summary.rejected_rows, 1);
        assert_eq!(output.summary.valid_rows, 1);
        assert_eq!(
            output.summary.rejections[0].reason,
            RowRejection::TooFewColumns {
                found: 8,
                required: 35
            }
        );
        assert_eq!(output.summary.rejections[0].row_index, 1);
        assert_eq!(output.hierarchy, baseline.hierarchy);
    }

    #[test]
    fn test_missing_codes_are_rejected() {
        let rows = vec![
            row(("DZ1", "Zone"), ("W1", "Ward"), ("C1", "Council"), ("", "Scotland")),
            row(("DZ2", "Zone"), ("W1", "Ward"), ("", "Council"), ("S1", "Scotland")),
            row(("DZ3", "Zone"), ("", "Ward"), ("C1", "Council"), ("S1", "Scotland")),
        ];
        let output = HierarchyBuilder::default().build(&table(&rows));

        assert!(output.hierarchy.is_empty());
        assert_eq!(output.summary.rejected_rows, 3);
        let levels: Vec<_> = output
            .summary
            .rejections
            .iter()
            .map(|r| r.reason.clone())
            .collect();
        assert_eq!(
            levels,
            vec![
                RowRejection::MissingCode { level: GeographyLevel::Country },
                RowRejection::MissingCode { level: GeographyLevel::Council },
                RowRejection::MissingCode { level: GeographyLevel::Ward },
            ]
        );
    }

    #[test]
    fn test_quoted_fields_are_cleaned() {
        let mut cols = vec!["\"\"".to_string(); 35];
        cols[0] = "\"DZ1\"".to_string();
        cols[1] = "\"Leith, North\"".to_string();
        cols[4] = " \"W1\" ".to_string();
        cols[5] = "\"Leith\"".to_string();
        cols[6] = "\"C1\"".to_string();
        cols[7] = "\"City of Edinburgh\"".to_string();
        cols[33] = "\"S1\"".to_string();
        cols[34] = "\"Scotland\"".to_string();
        let output = HierarchyBuilder::default().build(&table(&[cols.join(",")]));

        let ward = output.hierarchy.ward("S1", "C1", "W1").expect("ward should exist");
        assert_eq!(ward.data_zones[0].name, "Leith, North");
        assert_eq!(output.summary.rejected_rows, 0);
    }

    #[test]
    fn test_duplicate_codes_first_name_wins() {
        let rows = vec![
            row(("DZ1", "Zone One"), ("W1", "First Ward Name"), ("C1", "Council"), ("S1", "Scotland")),
            row(("DZ1", "Renamed Zone"), ("W1", "Second Ward Name"), ("C1", "Other"), ("S1", "Alba")),
            row(("DZ2", "Zone Two"), ("W1", "Third"), ("C1", "Council"), ("S1", "Scotland")),
        ];
        let output = HierarchyBuilder::default().build(&table(&rows));

        let council = output.hierarchy.council("S1", "C1").expect("council should exist");
        assert_eq!(council.name, "Council");
        let ward = &council.wards["W1"];
        assert_eq!(ward.name, "First Ward Name");
        assert_eq!(ward.data_zones.len(), 2);
        assert_eq!(ward.data_zones[0].name, "Zone One");
        assert_eq!(output.hierarchy.country("S1").map(|c| c.name.as_str()), Some("Scotland"));
    }

    #[test]
    fn test_codes_unique_regardless_of_row_order() {
        let rows = vec![
            row(("DZ1", "A"), ("W1", "Ward 1"), ("C1", "Council 1"), ("S1", "Scotland")),
            row(("DZ2", "B"), ("W2", "Ward 2"), ("C1", "Council 1"), ("S1", "Scotland")),
            row(("DZ3", "C"), ("W3", "Ward 3"), ("C2", "Council 2"), ("S1", "Scotland")),
            row(("DZ4", "D"), ("W1", "Ward 1"), ("C1", "Council 1"), ("S1", "Scotland")),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let forward = HierarchyBuilder::default().build(&table(&rows));
        let backward = HierarchyBuilder::default().build(&table(&reversed));

        for output in [&forward, &backward] {
            assert_eq!(output.summary.countries, 1);
            assert_eq!(output.summary.councils, 2);
            assert_eq!(output.summary.wards, 3);
            assert_eq!(output.summary.data_zones, 4);
        }

        let codes = |h: &GeographyHierarchy| -> Vec<String> { h.wards().map(|w| w.code.clone()).collect() };
        assert_eq!(codes(&forward.hierarchy), codes(&backward.hierarchy));
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let rows = vec![
            row(("DZ1", "A"), ("W1", "Ward 1"), ("C1", "Council 1"), ("S1", "Scotland")),
            row(("DZ2", "B"), ("W2", "Ward 2"), ("C2", "Council 2"), ("S1", "Scotland")),
        ];
        let text = table(&rows);
        let builder = HierarchyBuilder::default();
        assert_eq!(builder.build(&text), builder.build(&text));
    }

    #[test]
    fn test_blank_lines_and_empty_data_zone() {
        let rows = vec![
            String::new(),
            row(("", ""), ("W1", "Ward 1"), ("C1", "Council 1"), ("S1", "Scotland")),
            "   ".to_string(),
        ];
        let output = HierarchyBuilder::default().build(&table(&rows));

        assert_eq!(output.summary.total_rows, 1);
        let ward = output.hierarchy.ward("S1", "C1", "W1").expect("ward should exist");
        assert!(ward.data_zones.is_empty());
    }

    #[test]
    fn test_header_only_yields_empty_hierarchy() {
        let output = HierarchyBuilder::default().build(HEADER);
        assert!(output.hierarchy.is_empty());
        assert_eq!(output.summary, BuildSummary::default());
    }

    #[test]
    fn test_custom_layout() {
        let layout = ColumnLayout {
            data_zone_code: 0,
            data_zone_name: 1,
            ward_code: 2,
            ward_name: 3,
            council_code: 4,
            council_name: 5,
            country_code: 6,
            country_name: 7,
            min_columns: 8,
        };
        let text = "header\nDZ1,Zone,W1,Ward,C1,Council,S1,Scotland";
        let output = HierarchyBuilder::new(layout).build(text);
        assert!(output.hierarchy.ward("S1", "C1", "W1").is_some());
        assert_eq!(output.summary.valid_rows, 1);
    }
}
