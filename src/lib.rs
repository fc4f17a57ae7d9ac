//! Housing statistics for Scottish small-area geographies.
//!
//! Builds the country → council → ward → data zone hierarchy from the
//! lookup table, aggregates house price observations per year and ranks the
//! wards of a council by their latest prices.

pub mod analysis;
pub mod error;
pub mod geography;
pub mod models;
pub mod progress;
pub mod report;
pub mod session;
pub mod source;
pub mod sparql;

pub use error::{FetchError, SourceError};
pub use session::DashboardSession;
pub use source::ObservationSource;
