//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, plus the Postgres
//! implementations of [`ItemRepository`] and [`UserStore`].
//!
//! Name and username uniqueness are enforced by table constraints; a
//! violation surfaces as `StorageError::UniqueViolation`.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime, Timeouts};
use inventron_core::{
    InventoryItem, InventronError, InventronResult, ItemDraft, ItemId, StorageError, User, UserId,
};
use inventron_storage::{ItemRepository, UserStore};
use std::time::Duration;
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

/// Schema bootstrap, idempotent.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS inventory_items (
    id               BIGSERIAL PRIMARY KEY,
    item_name        VARCHAR(100) NOT NULL,
    item_description TEXT NOT NULL,
    item_quantity    INTEGER NOT NULL DEFAULT 0 CHECK (item_quantity >= 0),
    created_at       TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT inventory_items_item_name_key UNIQUE (item_name)
);

CREATE TABLE IF NOT EXISTS users (
    id            BIGSERIAL PRIMARY KEY,
    username      VARCHAR(150) NOT NULL,
    password_hash TEXT NOT NULL,
    date_joined   TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT users_username_key UNIQUE (username)
);
"#;

const ITEM_COLUMNS: &str = "id, item_name, item_description, item_quantity, created_at";
const USER_COLUMNS: &str = "id, username, password_hash, date_joined";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long a request waits for a pooled connection
    pub timeout: Duration,
}

impl std::fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("max_size", &self.max_size)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "inventron".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("INVENTRON_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("INVENTRON_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("INVENTRON_DB_NAME").unwrap_or_else(|_| "inventron".to_string()),
            user: std::env::var("INVENTRON_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("INVENTRON_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("INVENTRON_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("INVENTRON_DB_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        cfg.pool = Some(PoolConfig {
            max_size: self.max_size,
            timeouts: Timeouts {
                wait: Some(self.timeout),
                ..Timeouts::default()
            },
            ..PoolConfig::default()
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// Database client that wraps a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    async fn get_conn(&self) -> ApiResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(ApiError::from)
    }

    /// Create the tables if they do not exist yet.
    pub async fn bootstrap_schema(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(SCHEMA).await?;
        tracing::info!("Database schema ready");
        Ok(())
    }

    /// Health check - verifies database connectivity.
    pub async fn health_check(&self) -> ApiResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await?;
        Ok(())
    }

    pub fn item_repository(&self) -> PgItemRepository {
        PgItemRepository {
            pool: self.pool.clone(),
        }
    }

    pub fn user_store(&self) -> PgUserStore {
        PgUserStore {
            pool: self.pool.clone(),
        }
    }
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn backend(reason: impl std::fmt::Display) -> InventronError {
    StorageError::Backend {
        reason: reason.to_string(),
    }
    .into()
}

/// Map a query error, turning unique violations into `UniqueViolation`.
fn query_error(err: tokio_postgres::Error, value: &str) -> InventronError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        let constraint = err
            .as_db_error()
            .and_then(|db| db.constraint())
            .unwrap_or("unique")
            .to_string();
        return StorageError::UniqueViolation {
            constraint,
            value: value.to_string(),
        }
        .into();
    }
    tracing::error!("Database error: {:?}", err);
    backend(err)
}

async fn pooled(pool: &Pool) -> InventronResult<deadpool_postgres::Object> {
    pool.get().await.map_err(|e| {
        tracing::error!("Connection pool error: {:?}", e);
        backend(e)
    })
}

fn item_from_row(row: &Row) -> InventronResult<InventoryItem> {
    Ok(InventoryItem {
        id: ItemId::new(row.try_get("id").map_err(backend)?),
        item_name: row.try_get("item_name").map_err(backend)?,
        item_description: row.try_get("item_description").map_err(backend)?,
        item_quantity: row.try_get("item_quantity").map_err(backend)?,
        created_at: row
            .try_get::<_, DateTime<Utc>>("created_at")
            .map_err(backend)?,
    })
}

fn user_from_row(row: &Row) -> InventronResult<User> {
    Ok(User {
        id: UserId(row.try_get("id").map_err(backend)?),
        username: row.try_get("username").map_err(backend)?,
        password_hash: row.try_get("password_hash").map_err(backend)?,
        date_joined: row
            .try_get::<_, DateTime<Utc>>("date_joined")
            .map_err(backend)?,
    })
}

// ============================================================================
// ITEM REPOSITORY
// ============================================================================

/// Postgres-backed item repository.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: Pool,
}

#[async_trait]
impl ItemRepository for PgItemRepository {
    async fn list(&self) -> InventronResult<Vec<InventoryItem>> {
        let conn = pooled(&self.pool).await?;
        let rows = conn
            .query(
                &format!("SELECT {ITEM_COLUMNS} FROM inventory_items ORDER BY id ASC"),
                &[],
            )
            .await
            .map_err(|e| query_error(e, ""))?;
        rows.iter().map(item_from_row).collect()
    }

    async fn get(&self, id: ItemId) -> InventronResult<Option<InventoryItem>> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_opt(
                &format!("SELECT {ITEM_COLUMNS} FROM inventory_items WHERE id = $1"),
                &[&id.get()],
            )
            .await
            .map_err(|e| query_error(e, ""))?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn exists_by_name(&self, name: &str) -> InventronResult<bool> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM inventory_items WHERE item_name = $1)",
                &[&name],
            )
            .await
            .map_err(|e| query_error(e, name))?;
        row.try_get(0).map_err(backend)
    }

    async fn insert(&self, draft: &ItemDraft) -> InventronResult<InventoryItem> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO inventory_items (item_name, item_description, item_quantity) \
                     VALUES ($1, $2, $3) RETURNING {ITEM_COLUMNS}"
                ),
                &[&draft.item_name, &draft.item_description, &draft.item_quantity],
            )
            .await
            .map_err(|e| query_error(e, &draft.item_name))?;
        item_from_row(&row)
    }

    async fn update(&self, id: ItemId, draft: &ItemDraft) -> InventronResult<Option<InventoryItem>> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_opt(
                &format!(
                    "UPDATE inventory_items \
                     SET item_name = $2, item_description = $3, item_quantity = $4 \
                     WHERE id = $1 RETURNING {ITEM_COLUMNS}"
                ),
                &[
                    &id.get(),
                    &draft.item_name,
                    &draft.item_description,
                    &draft.item_quantity,
                ],
            )
            .await
            .map_err(|e| query_error(e, &draft.item_name))?;
        row.as_ref().map(item_from_row).transpose()
    }

    async fn delete(&self, id: ItemId) -> InventronResult<bool> {
        let conn = pooled(&self.pool).await?;
        let removed = conn
            .execute("DELETE FROM inventory_items WHERE id = $1", &[&id.get()])
            .await
            .map_err(|e| query_error(e, ""))?;
        Ok(removed > 0)
    }

    async fn health_check(&self) -> InventronResult<()> {
        let conn = pooled(&self.pool).await?;
        conn.query_one("SELECT 1", &[])
            .await
            .map_err(|e| query_error(e, ""))?;
        Ok(())
    }
}

// ============================================================================
// USER STORE
// ============================================================================

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: Pool,
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> InventronResult<Option<User>> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_opt(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"),
                &[&username],
            )
            .await
            .map_err(|e| query_error(e, username))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, username: &str, password_hash: &str) -> InventronResult<User> {
        let conn = pooled(&self.pool).await?;
        let row = conn
            .query_one(
                &format!(
                    "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
                     RETURNING {USER_COLUMNS}"
                ),
                &[&username, &password_hash],
            )
            .await
            .map_err(|e| query_error(e, username))?;
        user_from_row(&row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_defaults() {
        let config = DbConfig::default();
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "inventron");
        assert_eq!(config.max_size, 16);
    }

    #[test]
    fn test_db_config_debug_redacts_password() {
        let config = DbConfig {
            password: "hunter2".to_string(),
            ..DbConfig::default()
        };
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[test]
    fn test_schema_declares_unique_constraints() {
        assert!(SCHEMA.contains("inventory_items_item_name_key UNIQUE (item_name)"));
        assert!(SCHEMA.contains("users_username_key UNIQUE (username)"));
    }

    #[tokio::test]
    async fn test_pool_creation_is_lazy() -> ApiResult<()> {
        // No server is contacted until the first checkout.
        let client = DbClient::from_config(&DbConfig::default())?;
        assert_eq!(client.pool_size(), 0);
        Ok(())
    }
}
