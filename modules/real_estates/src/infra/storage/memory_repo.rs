use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::contract::model::RealEstate;
use crate::domain::repo::{RealEstatesRepository, Write};

/// Process-local repository. Ids come from a monotonic sequence starting at 1
/// and are never reused, even after a delete.
pub struct InMemoryRealEstatesRepository {
    rows: RwLock<BTreeMap<i32, RealEstate>>,
    next_id: AtomicI32,
}

impl Default for InMemoryRealEstatesRepository {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            next_id: AtomicI32::new(1),
        }
    }
}

impl InMemoryRealEstatesRepository {
    /// Repository pre-filled with `rows`; stored ids are reassigned in order.
    pub fn with_rows(rows: impl IntoIterator<Item = RealEstate>) -> Self {
        let repo = Self::default();
        {
            let mut map = repo.rows.write();
            for mut row in rows {
                let id = repo.next_id.fetch_add(1, Ordering::SeqCst);
                row.id = Some(id);
                map.insert(id, row);
            }
        }
        repo
    }
}

fn cnpj_held(rows: &BTreeMap<i32, RealEstate>, cnpj: &str, except: Option<i32>) -> bool {
    rows.iter().any(|(id, r)| Some(*id) != except && r.cnpj == cnpj)
}

#[async_trait]
impl RealEstatesRepository for InMemoryRealEstatesRepository {
    async fn list_all(&self) -> anyhow::Result<Vec<RealEstate>> {
        Ok(self.rows.read().values().cloned().collect())
    }

    async fn find_by_id(&self, id: i32) -> anyhow::Result<Option<RealEstate>> {
        Ok(self.rows.read().get(&id).cloned())
    }

    async fn insert(&self, mut real_estate: RealEstate) -> anyhow::Result<Write<RealEstate>> {
        let mut rows = self.rows.write();
        if cnpj_held(&rows, &real_estate.cnpj, None) {
            return Ok(Write::CnpjTaken);
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        if id <= 0 {
            anyhow::bail!("real estate id sequence exhausted");
        }
        real_estate.id = Some(id);
        rows.insert(id, real_estate.clone());
        Ok(Write::Done(real_estate))
    }

    async fn update(&self, real_estate: RealEstate) -> anyhow::Result<Write<bool>> {
        let Some(id) = real_estate.id else {
            anyhow::bail!("update requires an id");
        };
        let mut rows = self.rows.write();
        if cnpj_held(&rows, &real_estate.cnpj, Some(id)) {
            return Ok(Write::CnpjTaken);
        }
        match rows.get_mut(&id) {
            Some(slot) if *slot == real_estate => Ok(Write::Done(false)),
            Some(slot) => {
                *slot = real_estate;
                Ok(Write::Done(true))
            }
            None => Ok(Write::Done(false)),
        }
    }

    async fn delete(&self, id: i32) -> anyhow::Result<bool> {
        Ok(self.rows.write().remove(&id).is_some())
    }
}
