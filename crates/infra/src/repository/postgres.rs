//! Postgres-backed inventory repository.
//!
//! Each unit is one row in `inventory_units`, keyed by `(unit_number, product_code)`.
//! The unit itself is stored as a JSONB document; `version` and `quarantined`
//! are real columns so the concurrency check happens in SQL.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError | Scenario |
//! |------------|----------------------|-----------------|----------|
//! | Database (unique violation) | `23505` | `Conflict` | Two first-saves of the same unit raced |
//! | Database (other) | Any other | `Backend` | Constraint or SQL failure |
//! | PoolClosed / Io / other | N/A | `Backend` | Network errors, connection failures, etc. |
//!
//! A stale `UPDATE ... WHERE version = $expected` affects zero rows and is
//! reported as `Conflict` as well.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::instrument;

use unitrack_core::{ExpectedVersion, UnitKey};
use unitrack_inventory::{InventoryAggregate, InventoryUnit};

use super::{InventoryRepository, RepositoryError, StoredUnit};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_units (
    unit_number   TEXT        NOT NULL,
    product_code  TEXT        NOT NULL,
    version       BIGINT      NOT NULL CHECK (version > 0),
    quarantined   BOOLEAN     NOT NULL DEFAULT FALSE,
    status        TEXT        NOT NULL,
    location      TEXT        NOT NULL,
    document      JSONB       NOT NULL,
    updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (unit_number, product_code)
)
"#;

/// Postgres-backed repository.
///
/// `PostgresInventoryRepository` is `Send + Sync` and cheap to clone; all
/// operations go through the SQLx connection pool.
#[derive(Debug, Clone)]
pub struct PostgresInventoryRepository {
    pool: Arc<PgPool>,
}

impl PostgresInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the backing table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), RepositoryError> {
        sqlx::query(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }

    async fn insert(&self, stored: &StoredUnit, document: serde_json::Value) -> Result<u64, RepositoryError> {
        let key = stored.unit.key();
        sqlx::query(
            r#"
            INSERT INTO inventory_units (
                unit_number, product_code, version, quarantined, status, location, document
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(key.unit_number.as_str())
        .bind(key.product_code.as_str())
        .bind(stored.version as i64)
        .bind(stored.quarantined)
        .bind(stored.unit.status().as_str())
        .bind(stored.unit.location())
        .bind(document)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_unit", e))?;

        Ok(stored.version)
    }

    async fn update(
        &self,
        stored: &StoredUnit,
        document: serde_json::Value,
        expected: Option<u64>,
    ) -> Result<u64, RepositoryError> {
        let key = stored.unit.key();
        let result = sqlx::query(
            r#"
            UPDATE inventory_units
            SET version = CASE WHEN $3::bigint IS NULL THEN version + 1 ELSE $3 + 1 END,
                quarantined = $4,
                status = $5,
                location = $6,
                document = $7,
                updated_at = NOW()
            WHERE unit_number = $1
              AND product_code = $2
              AND ($3::bigint IS NULL OR version = $3)
            RETURNING version
            "#,
        )
        .bind(key.unit_number.as_str())
        .bind(key.product_code.as_str())
        .bind(expected.map(|v| v as i64))
        .bind(stored.quarantined)
        .bind(stored.unit.status().as_str())
        .bind(stored.unit.location())
        .bind(document)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_unit", e))?;

        match result {
            Some(row) => {
                let version: i64 = row
                    .try_get("version")
                    .map_err(|e| RepositoryError::Backend(format!("failed to read version: {e}")))?;
                Ok(version as u64)
            }
            None => Err(RepositoryError::Conflict(format!(
                "{key} is not at expected version {expected:?}"
            ))),
        }
    }
}

#[async_trait]
impl InventoryRepository for PostgresInventoryRepository {
    #[instrument(skip(self), fields(unit = %key), err)]
    async fn find(&self, key: &UnitKey) -> Result<Option<InventoryAggregate>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT version, quarantined, document
            FROM inventory_units
            WHERE unit_number = $1 AND product_code = $2
            "#,
        )
        .bind(key.unit_number.as_str())
        .bind(key.product_code.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_unit", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let corrupt = |reason: String| RepositoryError::Corrupt {
            key: key.to_string(),
            reason,
        };
        let version: i64 = row.try_get("version").map_err(|e| corrupt(e.to_string()))?;
        let quarantined: bool = row.try_get("quarantined").map_err(|e| corrupt(e.to_string()))?;
        let document: serde_json::Value = row.try_get("document").map_err(|e| corrupt(e.to_string()))?;
        let unit: InventoryUnit =
            serde_json::from_value(document).map_err(|e| corrupt(format!("document does not decode: {e}")))?;

        if unit.key() != key {
            return Err(corrupt(format!("document belongs to {}", unit.key())));
        }

        StoredUnit {
            version: version as u64,
            quarantined,
            unit,
        }
        .into_aggregate()
        .map(Some)
    }

    #[instrument(
        skip(self, aggregate),
        fields(unit = %aggregate.key(), expected = ?expected),
        err
    )]
    async fn save(
        &self,
        aggregate: &InventoryAggregate,
        expected: ExpectedVersion,
    ) -> Result<u64, RepositoryError> {
        let document = serde_json::to_value(aggregate.unit())
            .map_err(|e| RepositoryError::Backend(format!("unit serialization failed: {e}")))?;

        match expected {
            ExpectedVersion::Exact(0) => {
                let stored = StoredUnit::capture(aggregate, 1);
                self.insert(&stored, document).await
            }
            ExpectedVersion::Exact(v) => {
                let stored = StoredUnit::capture(aggregate, v + 1);
                self.update(&stored, document, Some(v)).await
            }
            ExpectedVersion::Any => {
                let stored = StoredUnit::capture(aggregate, 0);
                match self.update(&stored, document.clone(), None).await {
                    Err(RepositoryError::Conflict(_)) => {
                        let stored = StoredUnit::capture(aggregate, 1);
                        self.insert(&stored, document).await
                    }
                    other => other,
                }
            }
        }
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // Unique violation: another writer created the row first.
                Some("23505") => RepositoryError::Conflict(msg),
                _ => RepositoryError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => RepositoryError::Backend(format!("connection pool closed in {operation}")),
        _ => RepositoryError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
