use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::RealEstateService,
    error::RealEstatesError,
    model::{FilterCriteria, RealEstate},
};
use crate::domain::service::Service;

/// Local implementation of `RealEstateService` that delegates to the domain service
pub struct RealEstatesLocalClient {
    service: Arc<Service>,
}

impl RealEstatesLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl RealEstateService for RealEstatesLocalClient {
    async fn find_all(&self) -> Result<Vec<RealEstate>, RealEstatesError> {
        self.service.find_all().await.map_err(Into::into)
    }

    async fn find_all_by(
        &self,
        criteria: &FilterCriteria,
    ) -> Result<Vec<RealEstate>, RealEstatesError> {
        self.service.find_all_by(criteria).await.map_err(Into::into)
    }

    async fn find_by_id(&self, id: i32) -> Result<RealEstate, RealEstatesError> {
        self.service.find_by_id(id).await.map_err(Into::into)
    }

    async fn save(&self, real_estate: RealEstate) -> Result<RealEstate, RealEstatesError> {
        self.service.save(real_estate).await.map_err(Into::into)
    }

    async fn update(&self, real_estate: RealEstate) -> Result<bool, RealEstatesError> {
        self.service.update(real_estate).await.map_err(Into::into)
    }

    async fn delete_by_id(&self, id: i32) -> Result<bool, RealEstatesError> {
        self.service.delete_by_id(id).await.map_err(Into::into)
    }
}
