//! SQLite brand store.
//!
//! One row per brand; the aggregate itself is stored as a JSON payload next
//! to the id and owner columns used for scoping. rusqlite is synchronous, so
//! every operation opens its connection inside `spawn_blocking`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::brand::{Brand, BrandId, FieldUpdate, OwnerId};

use super::{BrandStore, StoreError};

/// rusqlite-backed [`BrandStore`].
#[derive(Debug, Clone)]
pub struct SqliteBrandStore {
    db_path: PathBuf,
}

impl SqliteBrandStore {
    /// Open (creating if needed) the database at `db_path`.
    pub fn new(db_path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let db_path = db_path.into();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
            }
        }
        let store = Self { db_path };
        store.initialize_db()?;
        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn initialize_db(&self) -> Result<(), StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS brands (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS brands_owner_idx ON brands (owner_id, created_at);",
        )?;
        log::debug!("SQLite brand store ready at {}", self.db_path.display());
        Ok(())
    }

    /// Run `f` on a fresh connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = Connection::open(&db_path)?;
            f(&mut conn)
        })
        .await?
    }
}

fn load(conn: &Connection, id: &str, owner: &str) -> Result<Option<Brand>, StoreError> {
    let payload: Option<String> = conn
        .query_row(
            "SELECT payload FROM brands WHERE id = ?1 AND owner_id = ?2",
            params![id, owner],
            |row| row.get(0),
        )
        .optional()?;
    payload
        .map(|p| serde_json::from_str(&p).map_err(StoreError::from))
        .transpose()
}

#[async_trait]
impl BrandStore for SqliteBrandStore {
    async fn create_brand(
        &self,
        owner: &OwnerId,
        name: &str,
        description: Option<&str>,
    ) -> Result<Brand, StoreError> {
        let brand = Brand::new(owner.clone(), name, description.map(str::to_string));
        let payload = serde_json::to_string(&brand)?;
        let row = (
            brand.id.to_string(),
            owner.to_string(),
            brand.created_at.to_rfc3339(),
            brand.updated_at.to_rfc3339(),
        );

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO brands (id, owner_id, payload, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![row.0, row.1, payload, row.2, row.3],
            )?;
            Ok(())
        })
        .await?;

        log::debug!("Created brand {} for owner {}", brand.id, owner);
        Ok(brand)
    }

    async fn find_brand(&self, id: &BrandId, owner: &OwnerId) -> Result<Option<Brand>, StoreError> {
        let id = id.to_string();
        let owner = owner.to_string();
        self.with_conn(move |conn| load(conn, &id, &owner)).await
    }

    async fn list_brands(&self, owner: &OwnerId) -> Result<Vec<Brand>, StoreError> {
        let owner = owner.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT payload FROM brands WHERE owner_id = ?1
                 ORDER BY created_at DESC, id ASC",
            )?;
            let rows = stmt.query_map(params![owner], |row| row.get::<_, String>(0))?;

            let mut brands = Vec::new();
            for row in rows {
                brands.push(serde_json::from_str(&row?)?);
            }
            Ok(brands)
        })
        .await
    }

    async fn upsert_brand_field(
        &self,
        id: &BrandId,
        owner: &OwnerId,
        update: FieldUpdate,
    ) -> Result<Option<Brand>, StoreError> {
        let id = id.to_string();
        let owner = owner.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let Some(mut brand) = load(&tx, &id, &owner)? else {
                return Ok(None);
            };
            brand.apply(update);
            tx.execute(
                "UPDATE brands SET payload = ?1, updated_at = ?2 WHERE id = ?3 AND owner_id = ?4",
                params![
                    serde_json::to_string(&brand)?,
                    brand.updated_at.to_rfc3339(),
                    id,
                    owner
                ],
            )?;
            tx.commit()?;
            Ok(Some(brand))
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
            Ok(())
        })
        .await
    }

    fn backend(&self) -> &str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{BrandDna, JsonField};
    use serde_json::json;

    fn store() -> (tempfile::TempDir, SqliteBrandStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteBrandStore::new(dir.path().join("nested").join("brands.db")).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_roundtrip_through_disk() {
        let (_dir, store) = store();
        let owner = OwnerId::new("alice");
        let brand = store.create_brand(&owner, "Acme", Some("Rockets")).await.unwrap();

        let found = store.find_brand(&brand.id, &owner).await.unwrap().unwrap();
        assert_eq!(found, brand);
        assert!(store
            .find_brand(&brand.id, &OwnerId::new("bob"))
            .await
            .unwrap()
            .is_none());
        store.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_upsert_overwrites_and_survives_reopen() {
        let (dir, store) = store();
        let owner = OwnerId::new("alice");
        let brand = store.create_brand(&owner, "Acme", None).await.unwrap();

        store
            .upsert_brand_field(
                &brand.id,
                &owner,
                FieldUpdate::Dna(BrandDna {
                    mission: "Deliver joy".into(),
                    vision: Some("Everywhere".into()),
                    values: None,
                    target_audience: None,
                    usp: None,
                    personality_traits: None,
                }),
            )
            .await
            .unwrap()
            .unwrap();
        store
            .upsert_brand_field(
                &brand.id,
                &owner,
                FieldUpdate::Json(JsonField::MessagingMatrix, json!({"masterTagline": "Go"})),
            )
            .await
            .unwrap()
            .unwrap();

        let reopened = SqliteBrandStore::new(dir.path().join("nested").join("brands.db")).unwrap();
        let stored = reopened.find_brand(&brand.id, &owner).await.unwrap().unwrap();
        assert_eq!(stored.mission.as_deref(), Some("Deliver joy"));
        assert_eq!(stored.messaging_matrix, Some(json!({"masterTagline": "Go"})));
    }

    #[tokio::test]
    async fn test_upsert_for_other_owner_writes_nothing() {
        let (_dir, store) = store();
        let owner = OwnerId::new("alice");
        let brand = store.create_brand(&owner, "Acme", None).await.unwrap();

        let result = store
            .upsert_brand_field(
                &brand.id,
                &OwnerId::new("mallory"),
                FieldUpdate::Json(JsonField::LogoIdeas, json!([])),
            )
            .await
            .unwrap();
        assert!(result.is_none());
        let stored = store.find_brand(&brand.id, &owner).await.unwrap().unwrap();
        assert_eq!(stored, brand);
    }

    #[tokio::test]
    async fn test_list_is_owner_scoped() {
        let (_dir, store) = store();
        let alice = OwnerId::new("alice");
        store.create_brand(&alice, "One", None).await.unwrap();
        store.create_brand(&alice, "Two", None).await.unwrap();
        store.create_brand(&OwnerId::new("bob"), "Three", None).await.unwrap();

        let brands = store.list_brands(&alice).await.unwrap();
        assert_eq!(brands.len(), 2);
        assert!(brands.iter().all(|b| b.owner_id == alice));
    }
}
