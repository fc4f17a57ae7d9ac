//! Query templates for the statistics.gov.scot datasets.

use std::fmt;

const PREFIXES: &str = "PREFIX qb: <http://purl.org/linked-data/cube#>
PREFIX rdfs: <http://www.w3.org/2000/01/rdf-schema#>
PREFIX sdmx: <http://purl.org/linked-data/sdmx/2009/dimension#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
";

const GEOGRAPHY_BASE: &str = "http://statistics.gov.scot/id/statistical-geography/";
const PRICE_DATASET: &str =
    "http://statistics.gov.scot/data/residential-properties-sales-and-price";
const DWELLING_DATASET: &str = "http://statistics.gov.scot/data/dwellings-type";

/// Which query was sent, and so which result shape to expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// `?period ?value ?measure` price triples.
    Prices,
    /// `?type ?total` dwelling counts.
    DwellingTypes,
}

impl QueryKind {
    /// Variables every binding must carry.
    pub fn required_vars(&self) -> &'static [&'static str] {
        match self {
            QueryKind::Prices => &["period", "value", "measure"],
            QueryKind::DwellingTypes => &["type", "total"],
        }
    }

    /// Render the query for an area code.
    pub fn render(&self, area_code: &str) -> String {
        match self {
            QueryKind::Prices => price_query(area_code),
            QueryKind::DwellingTypes => dwelling_query(area_code),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Prices => write!(f, "prices"),
            QueryKind::DwellingTypes => write!(f, "dwelling types"),
        }
    }
}

/// Price observations for an area, ordered by period.
pub fn price_query(area_code: &str) -> String {
    let mut query = String::from(PREFIXES);
    query.push_str("\nSELECT ?period ?value ?measure\nWHERE {\n");
    query.push_str(&format!("  ?obs qb:dataSet <{}> ;\n", PRICE_DATASET));
    query.push_str(&format!(
        "       sdmx:refArea <{}{}> ;\n",
        GEOGRAPHY_BASE,
        area_code.trim()
    ));
    query.push_str("       sdmx:refPeriod ?period ;\n");
    query.push_str("       qb:measureType ?measure ;\n");
    query.push_str("       ?measure ?value .\n");
    query.push_str("}\nORDER BY ?period\n");
    query
}

/// Dwelling counts for an area, summed per dwelling type label.
pub fn dwelling_query(area_code: &str) -> String {
    let mut query = String::from(PREFIXES);
    query.push_str("\nSELECT ?type (SUM(?count) AS ?total)\nWHERE {\n");
    query.push_str(&format!("  ?obs qb:dataSet <{}> ;\n", DWELLING_DATASET));
    query.push_str(&format!(
        "       sdmx:refArea <{}{}> ;\n",
        GEOGRAPHY_BASE,
        area_code.trim()
    ));
    query.push_str("       <http://statistics.gov.scot/def/dimension/typeOfDwelling> ?typeUri ;\n");
    query.push_str("       <http://statistics.gov.scot/def/measure-properties/count> ?count .\n");
    query.push_str("  ?typeUri rdfs:label ?type .\n");
    query.push_str("}\nGROUP BY ?type\n");
    query
}
