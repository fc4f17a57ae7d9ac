//! SPARQL 1.1 JSON results decoding.

use crate::error::FetchError;
use crate::models::{DwellingTypeRecord, ObservationRecord};
use crate::sparql::query::QueryKind;
use serde::Deserialize;
use std::collections::HashMap;

/// `application/sparql-results+json` document.
#[derive(Debug, Deserialize)]
pub struct SparqlResponse {
    pub head: Head,
    pub results: Results,
}

#[derive(Debug, Default, Deserialize)]
pub struct Head {
    #[serde(default)]
    pub vars: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Results {
    pub bindings: Vec<HashMap<String, Binding>>,
}

/// One bound RDF term. Only the lexical value is used.
#[derive(Debug, Clone, Deserialize)]
pub struct Binding {
    #[serde(rename = "type", default)]
    pub term_type: String,
    pub value: String,
}

/// Decoded rows, shaped by the query that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResults {
    Prices(Vec<ObservationRecord>),
    DwellingTypes(Vec<DwellingTypeRecord>),
}

impl QueryResults {
    pub fn len(&self) -> usize {
        match self {
            QueryResults::Prices(rows) => rows.len(),
            QueryResults::DwellingTypes(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decode a response body for the given query kind.
///
/// Every binding must carry all of the kind's variables.
pub fn decode(kind: QueryKind, body: &str) -> Result<QueryResults, FetchError> {
    let response: SparqlResponse = serde_json::from_str(body)?;
    from_response(kind, response)
}

pub fn from_response(kind: QueryKind, response: SparqlResponse) -> Result<QueryResults, FetchError> {
    let required = kind.required_vars();

    if !response.head.vars.is_empty() {
        if let Some(var) = required
            .iter()
            .find(|var| !response.head.vars.iter().any(|v| v == *var))
        {
            return Err(FetchError::Malformed(format!(
                "{} result is missing variable '{}'",
                kind, var
            )));
        }
    }

    let mut rows = Vec::with_capacity(response.results.bindings.len());
    for (index, binding) in response.results.bindings.into_iter().enumerate() {
        rows.push(take_values(kind, index, binding)?);
    }

    Ok(match kind {
        QueryKind::Prices => QueryResults::Prices(
            rows.into_iter()
                .map(|[period, value, measure]| ObservationRecord {
                    period,
                    measure,
                    value,
                })
                .collect(),
        ),
        QueryKind::DwellingTypes => QueryResults::DwellingTypes(
            rows.into_iter()
                .map(|[type_label, total, _]| DwellingTypeRecord { type_label, total })
                .collect(),
        ),
    })
}

/// Pull the required variables out of one binding, in declaration order.
fn take_values(
    kind: QueryKind,
    index: usize,
    mut binding: HashMap<String, Binding>,
) -> Result<[String; 3], FetchError> {
    let mut values: [String; 3] = Default::default();
    for (slot, var) in kind.required_vars().iter().enumerate() {
        let term = binding.remove(*var).ok_or_else(|| {
            FetchError::Malformed(format!("row {} has no value for '{}'", index, var))
        })?;
        values[slot] = term.value;
    }
    Ok(values)
}
