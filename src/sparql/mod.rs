//! Statistics feed client.
//!
//! Builds the price and dwelling-type queries, posts them to a SPARQL
//! endpoint and decodes the result bindings.

pub mod client;
pub mod query;
pub mod response;

pub use client::{SparqlClient, SparqlConfig, DEFAULT_ENDPOINT};
pub use query::{dwelling_query, price_query, QueryKind};
pub use response::{decode, QueryResults};
