//! Brand persistence.
//!
//! - [`memory`] - In-process DashMap store (default, tests)
//! - [`sqlite`] - rusqlite store, one JSON row per brand
//! - [`pg_store`] - PostgreSQL store (feature `postgres`)
//!
//! Every read and write is scoped by brand id AND owner. A brand owned by
//! someone else is indistinguishable from one that does not exist.

pub mod memory;
pub mod pg_store;
pub mod sqlite;

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::brand::{Brand, BrandId, FieldUpdate, OwnerId};

pub use memory::MemoryBrandStore;
pub use sqlite::SqliteBrandStore;

/// Store failure.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend rejected the operation.
    #[error("store backend error: {0}")]
    Backend(String),

    /// A stored record could not be encoded or decoded.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref code, _)
                if matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy
                        | rusqlite::ErrorCode::DatabaseLocked
                        | rusqlite::ErrorCode::CannotOpen
                ) =>
            {
                Self::Unavailable(e.to_string())
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for StoreError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Backend(format!("store task failed: {e}"))
    }
}

/// Owner-scoped key-value store of [`Brand`] aggregates.
#[async_trait]
pub trait BrandStore: Send + Sync + fmt::Debug {
    /// Create an empty brand for `owner`.
    async fn create_brand(
        &self,
        owner: &OwnerId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Brand, StoreError>;

    /// Load a brand, `None` when it does not exist for `owner`.
    async fn find_brand(&self, id: &BrandId, owner: &OwnerId) -> Result<Option<Brand>, StoreError>;

    /// All brands of `owner`, newest first.
    async fn list_brands(&self, owner: &OwnerId) -> Result<Vec<Brand>, StoreError>;

    /// Overwrite the field(s) named by `update` and return the stored brand.
    ///
    /// `None` when the brand does not exist for `owner`; nothing is written
    /// in that case.
    async fn upsert_brand_field(
        &self,
        id: &BrandId,
        owner: &OwnerId,
        update: FieldUpdate,
    ) -> Result<Option<Brand>, StoreError>;

    /// Cheap connectivity probe.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Backend name for logs and health output.
    fn backend(&self) -> &str;
}
