//! Sync state storage operations.

use anyhow::{Context, Result};
use sqlx::Row;

use super::{block_number, Storage, Store, SyncState};

impl Storage {
    /// Get the current sync state.
    pub async fn get_sync_state(&self) -> Result<SyncState> {
        let row = sqlx::query(
            r#"
            SELECT last_block_number, updated_at
            FROM sync_state
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch sync state")?;

        Ok(SyncState {
            last_block_number: row
                .get::<Option<i64>, _>("last_block_number")
                .map(u64::try_from)
                .transpose()
                .context("Negative block number in sync cursor")?,
            updated_at: row.get("updated_at"),
        })
    }
}

impl Store<'_> {
    /// Advance the cursor. Called inside the block's transaction.
    pub async fn set_sync_state(&mut self, state: &SyncState) -> crate::error::Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_state
            SET last_block_number = ?,
                updated_at = ?
            WHERE id = 1
            "#,
        )
        .bind(state.last_block_number.map(block_number).transpose()?)
        .bind(state.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}
