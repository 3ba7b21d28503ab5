//! `PostgreSQL` storage gateway for parkzone.
//!
//! Implements [`Storage`] / [`StorageTx`] from `parkzone-core` over a sqlx
//! connection pool. Every [`PgTx`] wraps one database transaction at the
//! default READ COMMITTED isolation; capacity deltas are made safe by
//! `SELECT ... FOR UPDATE` on the zone rows they touch.
//!
//! # Example
//!
//! ```no_run
//! use parkzone_postgres::{PoolSettings, PostgresStorage};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let storage = PostgresStorage::connect("postgres://localhost/parkzone", &PoolSettings::default()).await?;
//! storage.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use parkzone_core::error::StorageError;
use parkzone_core::space::{Space, SpaceFilter, SpaceId, SpaceStatus};
use parkzone_core::storage::{Storage, StorageTx};
use parkzone_core::zone::{Zone, ZoneId, ZoneType};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;
use uuid::Uuid;

/// Connection pool tunables.
#[derive(Clone, Debug)]
pub struct PoolSettings {
    /// Upper bound on open connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long `begin` may wait for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

/// `PostgreSQL`-backed [`Storage`].
#[derive(Clone, Debug)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connect a new pool.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the database is unreachable.
    pub async fn connect(url: &str, settings: &PoolSettings) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| StorageError::Database(format!("Failed to connect: {e}")))?;
        tracing::info!(
            max_connections = settings.max_connections,
            "Connected to PostgreSQL"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub const fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StorageError::Database(format!("Migration failed: {e}")))?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

impl Storage for PostgresStorage {
    type Tx = PgTx;

    async fn begin(&self) -> Result<PgTx, StorageError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;
        Ok(PgTx { tx })
    }

    async fn ping(&self) -> Result<(), StorageError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Ping failed", e))?;
        Ok(())
    }
}

/// One `PostgreSQL` transaction. Dropping it without `commit` rolls back.
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

const ZONE_COLUMNS: &str =
    "id, name, description, capacity, available_capacity, zone_type, is_active";
const SPACE_COLUMNS: &str = "id, code, status, is_reserved, priority, zone_id";

impl StorageTx for PgTx {
    async fn find_zone(&mut self, id: ZoneId) -> Result<Option<Zone>, StorageError> {
        let row: Option<ZoneRow> =
            sqlx::query_as(&format!("SELECT {ZONE_COLUMNS} FROM zones WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| db_error("Failed to load zone", e))?;
        row.map(Zone::try_from).transpose()
    }

    async fn lock_zones(&mut self, ids: &[ZoneId]) -> Result<Vec<Zone>, StorageError> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();

        // One row at a time so the acquisition order is exactly ascending.
        let mut zones = Vec::with_capacity(ids.len());
        for id in ids {
            let row: Option<ZoneRow> = sqlx::query_as(&format!(
                "SELECT {ZONE_COLUMNS} FROM zones WHERE id = $1 FOR UPDATE"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to lock zone", e))?;
            if let Some(row) = row {
                zones.push(Zone::try_from(row)?);
            }
        }
        Ok(zones)
    }

    async fn find_all_zones(&mut self) -> Result<Vec<Zone>, StorageError> {
        let rows: Vec<ZoneRow> =
            sqlx::query_as(&format!("SELECT {ZONE_COLUMNS} FROM zones ORDER BY name"))
                .fetch_all(&mut *self.tx)
                .await
                .map_err(|e| db_error("Failed to list zones", e))?;
        rows.into_iter().map(Zone::try_from).collect()
    }

    async fn save_zone(&mut self, zone: &Zone) -> Result<(), StorageError> {
        let available = zone.available_capacity.map(to_i32).transpose()?;
        sqlx::query(
            r"
            INSERT INTO zones (id, name, description, capacity, available_capacity, zone_type, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                capacity = EXCLUDED.capacity,
                available_capacity = EXCLUDED.available_capacity,
                zone_type = EXCLUDED.zone_type,
                is_active = EXCLUDED.is_active
            ",
        )
        .bind(zone.id.as_uuid())
        .bind(&zone.name)
        .bind(&zone.description)
        .bind(to_i32(zone.capacity)?)
        .bind(available)
        .bind(zone.zone_type.as_str())
        .bind(zone.is_active)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to save zone", e))?;
        Ok(())
    }

    async fn delete_zone(&mut self, id: ZoneId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM zones WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to delete zone", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn find_space(&mut self, id: SpaceId) -> Result<Option<Space>, StorageError> {
        let row: Option<SpaceRow> =
            sqlx::query_as(&format!("SELECT {SPACE_COLUMNS} FROM spaces WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(|e| db_error("Failed to load space", e))?;
        row.map(Space::try_from).transpose()
    }

    async fn lock_space(&mut self, id: SpaceId) -> Result<Option<Space>, StorageError> {
        let row: Option<SpaceRow> = sqlx::query_as(&format!(
            "SELECT {SPACE_COLUMNS} FROM spaces WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to lock space", e))?;
        row.map(Space::try_from).transpose()
    }

    async fn find_spaces(&mut self, filter: SpaceFilter) -> Result<Vec<Space>, StorageError> {
        let rows: Vec<SpaceRow> = sqlx::query_as(&format!(
            r"
            SELECT {SPACE_COLUMNS} FROM spaces
            WHERE ($1::uuid IS NULL OR zone_id = $1)
              AND ($2::text IS NULL OR status = $2)
            ORDER BY code
            "
        ))
        .bind(filter.zone_id.map(|z| *z.as_uuid()))
        .bind(filter.status.map(|s| s.as_str()))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to list spaces", e))?;
        rows.into_iter().map(Space::try_from).collect()
    }

    async fn save_space(&mut self, space: &Space) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO spaces (id, code, status, is_reserved, priority, zone_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                code = EXCLUDED.code,
                status = EXCLUDED.status,
                is_reserved = EXCLUDED.is_reserved,
                priority = EXCLUDED.priority,
                zone_id = EXCLUDED.zone_id
            ",
        )
        .bind(space.id.as_uuid())
        .bind(&space.code)
        .bind(space.status.as_str())
        .bind(space.is_reserved)
        .bind(space.priority)
        .bind(space.zone_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| db_error("Failed to save space", e))?;
        Ok(())
    }

    async fn delete_space(&mut self, id: SpaceId) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM spaces WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| db_error("Failed to delete space", e))?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.tx
            .commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))
    }

    async fn rollback(self) -> Result<(), StorageError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| db_error("Failed to roll back transaction", e))
    }
}

#[derive(sqlx::FromRow)]
struct ZoneRow {
    id: Uuid,
    name: String,
    description: String,
    capacity: i32,
    available_capacity: Option<i32>,
    zone_type: String,
    is_active: bool,
}

impl TryFrom<ZoneRow> for Zone {
    type Error = StorageError;

    fn try_from(row: ZoneRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ZoneId::from_uuid(row.id),
            name: row.name,
            description: row.description,
            capacity: to_u32(row.capacity)?,
            available_capacity: row.available_capacity.map(to_u32).transpose()?,
            zone_type: row.zone_type.parse::<ZoneType>().map_err(StorageError::Corrupt)?,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SpaceRow {
    id: Uuid,
    code: String,
    status: String,
    is_reserved: bool,
    priority: Option<i32>,
    zone_id: Uuid,
}

impl TryFrom<SpaceRow> for Space {
    type Error = StorageError;

    fn try_from(row: SpaceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: SpaceId::from_uuid(row.id),
            code: row.code,
            status: row.status.parse::<SpaceStatus>().map_err(StorageError::Corrupt)?,
            is_reserved: row.is_reserved,
            priority: row.priority,
            zone_id: ZoneId::from_uuid(row.zone_id),
        })
    }
}

fn to_i32(value: u32) -> Result<i32, StorageError> {
    i32::try_from(value).map_err(|_| StorageError::Corrupt(format!("{value} exceeds i32::MAX")))
}

fn to_u32(value: i32) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| StorageError::Corrupt(format!("negative counter {value}")))
}

/// Classify a sqlx error, keeping constraint names for the services.
fn db_error(context: &str, e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &e {
        let constraint = db_err.constraint().unwrap_or_default().to_string();
        if db_err.is_unique_violation() {
            return StorageError::UniqueViolation { constraint };
        }
        if db_err.is_foreign_key_violation() {
            return StorageError::ForeignKeyViolation(constraint);
        }
    }
    metrics::counter!("parkzone_storage_errors_total").increment(1);
    tracing::error!(error = %e, "{context}");
    StorageError::Database(format!("{context}: {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[test]
    fn rows_decode_into_domain() {
        let id = Uuid::new_v4();
        let zone = Zone::try_from(ZoneRow {
            id,
            name: "VIP-1".to_string(),
            description: String::new(),
            capacity: 20,
            available_capacity: None,
            zone_type: "VIP".to_string(),
            is_active: true,
        })
        .unwrap();
        assert_eq!(zone.id, ZoneId::from_uuid(id));
        assert_eq!(zone.available(), 20);
    }

    #[test]
    fn unknown_enum_values_are_corrupt() {
        let result = Space::try_from(SpaceRow {
            id: Uuid::new_v4(),
            code: "A".to_string(),
            status: "PARKED".to_string(),
            is_reserved: false,
            priority: None,
            zone_id: Uuid::new_v4(),
        });
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn negative_counters_are_corrupt() {
        assert!(to_u32(-1).is_err());
        assert_eq!(to_i32(25).unwrap(), 25);
    }
}
