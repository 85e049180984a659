use std::sync::Arc;

use crate::contract::model::{FilterCriteria, RealEstate};
use crate::domain::error::DomainError;
use crate::domain::repo::{RealEstatesRepository, Write};
use tracing::{debug, info, instrument};

/// Domain service with the business rules for real estate records.
/// Depends only on the repository port.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn RealEstatesRepository>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_name_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_name_length: 100,
        }
    }
}

/// Parsed form of [`FilterCriteria`].
#[derive(Debug)]
struct Filter {
    name: Option<String>,
    cnpj: Option<String>,
    state_id: Option<i32>,
    city_id: Option<i32>,
}

impl Filter {
    fn parse(criteria: &FilterCriteria) -> Result<Self, DomainError> {
        let id = |key: &str| -> Result<Option<i32>, DomainError> {
            criteria
                .constraint(key)
                .map(|raw| {
                    raw.trim().parse::<i32>().map_err(|_| DomainError::InvalidFilter {
                        key: key.to_string(),
                        value: raw.to_string(),
                    })
                })
                .transpose()
        };

        Ok(Self {
            name: criteria.constraint("name").map(str::to_lowercase),
            cnpj: criteria.constraint("cnpj").map(str::to_owned),
            state_id: id("stateId")?,
            city_id: id("cityId")?,
        })
    }

    fn matches(&self, r: &RealEstate) -> bool {
        self.name
            .as_deref()
            .map_or(true, |n| r.name.to_lowercase().contains(n))
            && self.cnpj.as_deref().map_or(true, |c| r.cnpj.contains(c))
            && self.state_id.map_or(true, |s| r.state_id == Some(s))
            && self.city_id.map_or(true, |c| r.city_id == Some(c))
    }
}

impl Service {
    pub fn new(repo: Arc<dyn RealEstatesRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "real_estates.service.find_all", skip(self))]
    pub async fn find_all(&self) -> Result<Vec<RealEstate>, DomainError> {
        debug!("Listing all real estates");
        let all = self
            .repo
            .list_all()
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        debug!("Found {} real estates", all.len());
        Ok(all)
    }

    #[instrument(name = "real_estates.service.find_all_by", skip(self, criteria))]
    pub async fn find_all_by(&self, criteria: &FilterCriteria) -> Result<Vec<RealEstate>, DomainError> {
        let filter = Filter::parse(criteria)?;
        debug!(?filter, "Filtering real estates");

        let all = self
            .repo
            .list_all()
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        let matched: Vec<RealEstate> = all.into_iter().filter(|r| filter.matches(r)).collect();
        debug!("Filter matched {} real estates", matched.len());
        Ok(matched)
    }

    #[instrument(name = "real_estates.service.find_by_id", skip(self), fields(real_estate_id = id))]
    pub async fn find_by_id(&self, id: i32) -> Result<RealEstate, DomainError> {
        debug!("Getting real estate by id");
        self.repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?
            .ok_or_else(|| DomainError::not_found(id))
    }

    #[instrument(
        name = "real_estates.service.save",
        skip(self, real_estate),
        fields(cnpj = %real_estate.cnpj)
    )]
    pub async fn save(&self, real_estate: RealEstate) -> Result<RealEstate, DomainError> {
        info!("Creating new real estate");
        self.validate(&real_estate)?;

        // The id is always assigned here, whatever the client sent.
        let new = RealEstate {
            id: None,
            ..real_estate
        };
        let cnpj = new.cnpj.clone();
        let stored = match self
            .repo
            .insert(new)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?
        {
            Write::Done(stored) => stored,
            Write::CnpjTaken => return Err(DomainError::cnpj_already_exists(cnpj)),
        };

        info!(real_estate_id = ?stored.id, "Successfully created real estate");
        Ok(stored)
    }

    #[instrument(
        name = "real_estates.service.update",
        skip(self, real_estate),
        fields(real_estate_id = ?real_estate.id)
    )]
    pub async fn update(&self, real_estate: RealEstate) -> Result<bool, DomainError> {
        info!("Updating real estate");
        if real_estate.id.is_none() {
            return Err(DomainError::MissingId);
        }
        self.validate(&real_estate)?;

        let cnpj = real_estate.cnpj.clone();
        let changed = match self
            .repo
            .update(real_estate)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?
        {
            Write::Done(changed) => changed,
            Write::CnpjTaken => return Err(DomainError::cnpj_already_exists(cnpj)),
        };
        if changed {
            info!("Successfully updated real estate");
        } else {
            debug!("No real estate to update");
        }
        Ok(changed)
    }

    #[instrument(name = "real_estates.service.delete_by_id", skip(self), fields(real_estate_id = id))]
    pub async fn delete_by_id(&self, id: i32) -> Result<bool, DomainError> {
        info!("Deleting real estate");
        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        debug!(deleted, "Delete finished");
        Ok(deleted)
    }

    fn validate(&self, r: &RealEstate) -> Result<(), DomainError> {
        let name = r.name.trim();
        if name.is_empty() {
            return Err(DomainError::EmptyName);
        }
        let len = name.chars().count();
        if len > self.config.max_name_length {
            return Err(DomainError::NameTooLong {
                len,
                max: self.config.max_name_length,
            });
        }
        if r.cnpj.trim().is_empty() {
            return Err(DomainError::EmptyCnpj);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::memory_repo::InMemoryRealEstatesRepository;

    fn service() -> Service {
        Service::new(
            Arc::new(InMemoryRealEstatesRepository::default()),
            ServiceConfig { max_name_length: 10 },
        )
    }

    fn estate(name: &str, cnpj: &str) -> RealEstate {
        RealEstate {
            name: name.to_string(),
            cnpj: cnpj.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn save_validates_fields() {
        let svc = service();
        assert!(matches!(svc.save(estate("  ", "1")).await, Err(DomainError::EmptyName)));
        assert!(matches!(svc.save(estate("Acme", "")).await, Err(DomainError::EmptyCnpj)));
        assert!(matches!(
            svc.save(estate("Way Too Long Name", "1")).await,
            Err(DomainError::NameTooLong { len: 17, max: 10 })
        ));
    }

    #[tokio::test]
    async fn update_requires_id() {
        let svc = service();
        assert!(matches!(svc.update(estate("Acme", "1")).await, Err(DomainError::MissingId)));
    }

    #[tokio::test]
    async fn non_numeric_id_filter_is_rejected() {
        let svc = service();
        let criteria = FilterCriteria::default().with_value("cityId", "abc");
        match svc.find_all_by(&criteria).await {
            Err(DomainError::InvalidFilter { key, value }) => {
                assert_eq!(key, "cityId");
                assert_eq!(value, "abc");
            }
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }

    /// Yields before every call so concurrent service calls interleave.
    struct Interleaving(InMemoryRealEstatesRepository);

    #[async_trait::async_trait]
    impl RealEstatesRepository for Interleaving {
        async fn list_all(&self) -> anyhow::Result<Vec<RealEstate>> {
            tokio::task::yield_now().await;
            self.0.list_all().await
        }

        async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<RealEstate>> {
            tokio::task::yield_now().await;
            self.0.find_by_id(id).await
        }

        async fn insert(&self, real_estate: RealEstate) -> anyhow::Result<Write<RealEstate>> {
            tokio::task::yield_now().await;
            self.0.insert(real_estate).await
        }

        async fn update(&self, real_estate: RealEstate) -> anyhow::Result<Write<bool>> {
            tokio::task::yield_now().await;
            self.0.update(real_estate).await
        }

        async fn delete(&self, id: i32) -> anyhow::Result<bool> {
            tokio::task::yield_now().await;
            self.0.delete(id).await
        }
    }

    #[tokio::test]
    async fn concurrent_saves_of_one_cnpj_store_a_single_record() {
        let repo = Arc::new(Interleaving(InMemoryRealEstatesRepository::default()));
        let svc = Service::new(repo.clone(), ServiceConfig::default());

        let (a, b) = tokio::join!(svc.save(estate("A", "123")), svc.save(estate("B", "123")));

        assert_eq!(
            [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(),
            1,
            "exactly one save may win: {a:?} / {b:?}"
        );
        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(loser, Err(DomainError::CnpjAlreadyExists { .. })));

        let stored = repo.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].cnpj, "123");
    }

    #[tokio::test]
    async fn concurrent_updates_cannot_share_a_cnpj() {
        let repo = Arc::new(Interleaving(InMemoryRealEstatesRepository::with_rows([
            estate("A", "1"),
            estate("B", "2"),
        ])));
        let svc = Service::new(repo.clone(), ServiceConfig::default());

        let to_shared = |id: i32, name: &str| RealEstate {
            id: Some(id),
            ..estate(name, "777")
        };
        let (a, b) = tokio::join!(svc.update(to_shared(1, "A")), svc.update(to_shared(2, "B")));
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

        let shared = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.cnpj == "777")
            .count();
        assert_eq!(shared, 1);
    }

    #[test]
    fn filter_parses_numeric_ids() {
        let filter = Filter::parse(&FilterCriteria::from_params("ACME", "", Some(3), None)).unwrap();
        assert_eq!(filter.name.as_deref(), Some("acme"));
        assert_eq!(filter.cnpj, None);
        assert_eq!(filter.state_id, Some(3));
        assert_eq!(filter.city_id, None);
    }
}
