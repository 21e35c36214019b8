//! PostgreSQL brand store.
//!
//! Requires the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! brandforge = { features = ["postgres"] }
//! ```
//!
//! The aggregate lives in a JSONB `payload` column. Field updates are a
//! single `payload || patch` statement, so each write is atomic per brand
//! without an explicit lock.

#[cfg(feature = "postgres")]
mod inner {
    use async_trait::async_trait;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use sqlx::{PgPool, Row};

    use crate::brand::{Brand, BrandId, FieldUpdate, OwnerId};
    use crate::store::{BrandStore, StoreError};

    impl From<sqlx::Error> for StoreError {
        fn from(e: sqlx::Error) -> Self {
            match e {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                    StoreError::Unavailable(e.to_string())
                }
                other => StoreError::Backend(other.to_string()),
            }
        }
    }

    /// PostgreSQL-backed [`BrandStore`].
    #[derive(Debug, Clone)]
    pub struct PgBrandStore {
        pool: PgPool,
    }

    impl PgBrandStore {
        pub fn new(pool: PgPool) -> Self {
            Self { pool }
        }

        /// Connect to `database_url` and run migrations.
        pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            let store = Self::new(pool);
            store.migrate().await?;
            Ok(store)
        }

        /// Create the brands table if it does not exist.
        pub async fn migrate(&self) -> Result<(), StoreError> {
            sqlx::query(
                r#"
                CREATE TABLE IF NOT EXISTS brands (
                    id TEXT PRIMARY KEY,
                    owner_id TEXT NOT NULL,
                    payload JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#,
            )
            .execute(&self.pool)
            .await?;

            sqlx::query(
                "CREATE INDEX IF NOT EXISTS brands_owner_idx ON brands (owner_id, created_at DESC)",
            )
            .execute(&self.pool)
            .await?;

            log::debug!("Brand tables migrated");
            Ok(())
        }
    }

    fn decode(payload: Value) -> Result<Brand, StoreError> {
        Ok(serde_json::from_value(payload)?)
    }

    #[async_trait]
    impl BrandStore for PgBrandStore {
        async fn create_brand(
            &self,
            owner: &OwnerId,
            name: &str,
            description: Option<&str>,
        ) -> Result<Brand, StoreError> {
            let brand = Brand::new(owner.clone(), name, description.map(str::to_string));
            sqlx::query(
                r#"
                INSERT INTO brands (id, owner_id, payload, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(brand.id.as_str())
            .bind(owner.as_str())
            .bind(serde_json::to_value(&brand)?)
            .bind(brand.created_at)
            .bind(brand.updated_at)
            .execute(&self.pool)
            .await?;

            log::debug!("Created brand {} for owner {}", brand.id, owner);
            Ok(brand)
        }

        async fn find_brand(
            &self,
            id: &BrandId,
            owner: &OwnerId,
        ) -> Result<Option<Brand>, StoreError> {
            let row = sqlx::query("SELECT payload FROM brands WHERE id = $1 AND owner_id = $2")
                .bind(id.as_str())
                .bind(owner.as_str())
                .fetch_optional(&self.pool)
                .await?;
            row.map(|r| decode(r.try_get("payload")?)).transpose()
        }

        async fn list_brands(&self, owner: &OwnerId) -> Result<Vec<Brand>, StoreError> {
            let rows = sqlx::query(
                "SELECT payload FROM brands WHERE owner_id = $1 ORDER BY created_at DESC, id ASC",
            )
            .bind(owner.as_str())
            .fetch_all(&self.pool)
            .await?;
            rows.into_iter()
                .map(|r| decode(r.try_get("payload")?))
                .collect()
        }

        async fn upsert_brand_field(
            &self,
            id: &BrandId,
            owner: &OwnerId,
            update: FieldUpdate,
        ) -> Result<Option<Brand>, StoreError> {
            let now = chrono::Utc::now();
            let mut patch = update.patch();
            if let Value::Object(ref mut fields) = patch {
                fields.insert("updatedAt".to_string(), Value::String(now.to_rfc3339()));
            }

            let row = sqlx::query(
                r#"
                UPDATE brands
                SET payload = payload || $3::jsonb,
                    updated_at = $4
                WHERE id = $1 AND owner_id = $2
                RETURNING payload
                "#,
            )
            .bind(id.as_str())
            .bind(owner.as_str())
            .bind(patch)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;
            row.map(|r| decode(r.try_get("payload")?)).transpose()
        }

        async fn ping(&self) -> Result<(), StoreError> {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        }

        fn backend(&self) -> &str {
            "postgres"
        }
    }
}

#[cfg(feature = "postgres")]
pub use inner::*;
