use async_trait::async_trait;

use crate::contract::{
    error::RealEstatesError,
    model::{FilterCriteria, RealEstate},
};

/// Public API trait for the real_estates module that other modules (and the
/// REST layer) depend on.
#[async_trait]
pub trait RealEstateService: Send + Sync {
    /// All records, ascending by id.
    async fn find_all(&self) -> Result<Vec<RealEstate>, RealEstatesError>;

    /// Records matching every non-empty criterion.
    async fn find_all_by(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<RealEstate>, RealEstatesError>;

    async fn find_by_id(&self, id: i32) -> Result<RealEstate, RealEstatesError>;

    /// Persist a new record; the returned value carries the assigned id.
    async fn save(&self, real_estate: RealEstate) -> Result<RealEstate, RealEstatesError>;

    /// `true` if a stored record changed.
    async fn update(&self, real_estate: RealEstate) -> Result<bool, RealEstatesError>;

    /// `true` if a record was removed.
    async fn delete_by_id(&self, id: i32) -> Result<bool, RealEstatesError>;
}
