//! Storage layer for the query node projection.
//!
//! [`Storage`] owns the connection pool and the bootstrap concerns (connect,
//! migrate, stats). Event handlers never touch the pool: they receive a
//! [`Store`] bound to the transaction of the block being projected, so every
//! write of a block commits or rolls back together.

use anyhow::{Context, Result};
use querynode_core::{AssetAvailability, AssetRef, ContentId, EventId, Variant};
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use std::error::Error as StdError;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod content;
pub mod events;
pub mod forum;
pub mod sync;
pub mod types;
pub mod workers;

pub use content::CategoryTable;
pub use types::*;

/// Database storage for the projector.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Connect to the database, creating the file if it does not exist.
    ///
    /// # Arguments
    /// * `database_url` - SQLite database URL (e.g., "sqlite://querynode.db")
    /// * `max_connections` - Pool upper bound (default 5)
    /// * `min_connections` - Connections kept open (default 1)
    pub async fn new(
        database_url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(5))
            .min_connections(min_connections.unwrap_or(1))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Connect to a database file.
    pub async fn new_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let database_url = format!("sqlite://{}", path.as_ref().display());
        Self::new(&database_url, None, None).await
    }

    /// Run the embedded migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Migrations completed successfully");

        Ok(())
    }

    /// Open the transaction a block is projected in.
    pub async fn begin(&self) -> crate::error::Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Check out a connection for read-only use of [`Store`].
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire connection")
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection");
        self.pool.close().await;
    }

    /// Get database statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let sync_state = self.get_sync_state().await?;

        Ok(DatabaseStats {
            event_count: self.count("events").await?,
            category_count: self.count("forum_categories").await?,
            thread_count: self.count("forum_threads").await?,
            post_count: self.count("forum_posts").await?,
            channel_count: self.count("channels").await?,
            video_count: self.count("videos").await?,
            last_block_number: sync_state.last_block_number,
        })
    }

    async fn count(&self, table: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .with_context(|| format!("Failed to count {}", table))?;

        Ok(count as u64)
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Recorded events
    pub event_count: u64,

    /// Forum categories
    pub category_count: u64,

    /// Forum threads
    pub thread_count: u64,

    /// Forum posts
    pub post_count: u64,

    /// Channels
    pub channel_count: u64,

    /// Videos
    pub video_count: u64,

    /// Last projected block
    pub last_block_number: Option<u64>,
}

/// Entity access within one connection or transaction.
///
/// Reads return `None` for missing rows; deciding whether that is fatal is
/// left to the caller.
pub struct Store<'c> {
    pub(crate) conn: &'c mut SqliteConnection,
}

impl<'c> Store<'c> {
    /// Wrap a connection (usually a block transaction).
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        Self { conn }
    }
}

/// Wrap a domain error surfacing while reading a row.
pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: StdError + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Read a variant stored as `(kind, event id)` columns.
pub(crate) fn variant_from_row<V: Variant>(
    row: &SqliteRow,
    kind_column: &str,
    event_column: &str,
) -> std::result::Result<V, sqlx::Error> {
    let kind: String = row.try_get(kind_column)?;
    let event_id: Option<String> = row.try_get(event_column)?;
    V::from_parts(&kind, event_id.map(EventId::from_stored)).map_err(decode_error)
}

/// Read a nullable unsigned column, rejecting values out of range.
pub(crate) fn opt_u64(value: Option<i64>) -> std::result::Result<Option<u64>, sqlx::Error> {
    value.map(u64::try_from).transpose().map_err(decode_error)
}

pub(crate) fn opt_u32(value: Option<i64>) -> std::result::Result<Option<u32>, sqlx::Error> {
    value.map(u32::try_from).transpose().map_err(decode_error)
}

/// Block numbers are stored as SQLite integers.
pub(crate) fn block_number(value: u64) -> std::result::Result<i64, sqlx::Error> {
    i64::try_from(value).map_err(|err| sqlx::Error::Encode(Box::new(err)))
}

/// The three columns an asset slot is stored in.
#[derive(Debug, Default)]
pub(crate) struct SlotColumns {
    pub urls: Option<String>,
    pub data_object: Option<String>,
    pub availability: Option<&'static str>,
}

impl SlotColumns {
    pub fn from_slot(slot: Option<&AssetRef>) -> crate::error::Result<Self> {
        let Some(slot) = slot else {
            return Ok(Self::default());
        };

        let availability = Some(slot.availability().as_str());
        Ok(match slot {
            AssetRef::Urls(urls) => Self {
                urls: Some(serde_json::to_string(urls)?),
                data_object: None,
                availability,
            },
            AssetRef::DataObject { id, .. } => Self {
                urls: None,
                data_object: Some(id.to_string()),
                availability,
            },
        })
    }
}

/// Read the slot stored under `{prefix}_urls`, `{prefix}_data_object_id`
/// and `{prefix}_availability`.
pub(crate) fn slot_from_row(
    row: &SqliteRow,
    prefix: &str,
) -> std::result::Result<Option<AssetRef>, sqlx::Error> {
    let urls: Option<String> = row.try_get(format!("{}_urls", prefix).as_str())?;
    let data_object: Option<String> = row.try_get(format!("{}_data_object_id", prefix).as_str())?;
    let availability: Option<String> = row.try_get(format!("{}_availability", prefix).as_str())?;

    if let Some(urls) = urls {
        let urls: Vec<String> = serde_json::from_str(&urls).map_err(decode_error)?;
        return Ok(Some(AssetRef::Urls(urls)));
    }

    match data_object {
        Some(id) => {
            let availability = availability
                .as_deref()
                .unwrap_or(AssetAvailability::Pending.as_str())
                .parse::<AssetAvailability>()
                .map_err(decode_error)?;
            Ok(Some(AssetRef::DataObject {
                id: ContentId::from(id),
                availability,
            }))
        }
        None => Ok(None),
    }
}
