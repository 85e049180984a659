use crate::contract::model::RealEstate;
use async_trait::async_trait;

/// Outcome of a write that has to keep `cnpj` unique.
///
/// Implementations decide `CnpjTaken` in the same step as the write, so two
/// concurrent writers of one cnpj cannot both succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write<T> {
    Done(T),
    CnpjTaken,
}

/// Port for the domain layer: persistence operations the domain needs.
#[async_trait]
pub trait RealEstatesRepository: Send + Sync {
    /// All records, ascending by id.
    async fn list_all(&self) -> anyhow::Result<Vec<RealEstate>>;
    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<RealEstate>>;
    /// Insert with a freshly assigned id unless another record holds the cnpj.
    async fn insert(&self, real_estate: RealEstate) -> anyhow::Result<Write<RealEstate>>;
    /// Replace the record with the same id. `Done(false)` if there is none or
    /// nothing changed; `CnpjTaken` if another record holds the cnpj.
    async fn update(&self, real_estate: RealEstate) -> anyhow::Result<Write<bool>>;
    /// Returns true if a record was deleted.
    async fn delete(&self, id: i32) -> anyhow::Result<bool>;
}
