//! The fetch collaborator consumed by the core.

use crate::error::FetchError;
use crate::models::{DwellingTypeRecord, ObservationRecord};
use async_trait::async_trait;

/// Supplies raw observations for an area code.
///
/// The core never builds transport queries itself; it only hands over the
/// area code and receives records or a typed failure.
#[async_trait]
pub trait ObservationSource: Send + Sync {
    /// Price observations for an area, in ascending period order where the
    /// source can provide it.
    async fn fetch_observations(&self, area_code: &str)
        -> Result<Vec<ObservationRecord>, FetchError>;

    /// Dwelling counts by type for an area.
    async fn fetch_dwelling_types(
        &self,
        area_code: &str,
    ) -> Result<Vec<DwellingTypeRecord>, FetchError>;
}
