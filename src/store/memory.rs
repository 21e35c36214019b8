//! In-process brand store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::brand::{Brand, BrandId, FieldUpdate, OwnerId};

use super::{BrandStore, StoreError};

/// DashMap-backed [`BrandStore`]. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemoryBrandStore {
    brands: DashMap<BrandId, Brand>,
}

impl MemoryBrandStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.brands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brands.is_empty()
    }
}

#[async_trait]
impl BrandStore for MemoryBrandStore {
    async fn create_brand(
        &self,
        owner: &OwnerId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Brand, StoreError> {
        let brand = Brand::new(owner.clone(), name, description.map(str::to_string));
        self.brands.insert(brand.id.clone(), brand.clone());
        log::debug!("Created brand {} for owner {}", brand.id, owner);
        Ok(brand)
    }

    async fn find_brand(&self, id: &BrandId, owner: &OwnerId) -> Result<Option<Brand>, StoreError> {
        Ok(self
            .brands
            .get(id)
            .filter(|b| &b.owner_id == owner)
            .map(|b| b.value().clone()))
    }

    async fn list_brands(&self, owner: &OwnerId) -> Result<Vec<Brand>, StoreError> {
        let mut brands: Vec<Brand> = self
            .brands
            .iter()
            .filter(|entry| &entry.owner_id == owner)
            .map(|entry| entry.value().clone())
            .collect();
        brands.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(brands)
    }

    async fn upsert_brand_field(
        &self,
        id: &BrandId,
        owner: &OwnerId,
        update: FieldUpdate,
    ) -> Result<Option<Brand>, StoreError> {
        // The entry guard is held across the read-modify-write.
        let Some(mut entry) = self.brands.get_mut(id) else {
            return Ok(None);
        };
        if &entry.owner_id != owner {
            return Ok(None);
        }
        entry.apply(update);
        Ok(Some(entry.value().clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn backend(&self) -> &str {
        "memory"
    }
}
