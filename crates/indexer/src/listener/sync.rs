//! Sync engine: feeds blocks to the projector in order.

use anyhow::{Context, Result};
use tokio::io::AsyncBufRead;
use tracing::{debug, info};

use super::BlockFeed;
use crate::dispatcher::Projector;

/// Totals of one sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Blocks committed
    pub blocks: u64,

    /// Events routed to a handler
    pub events: u64,

    /// Blocks at or below the cursor, or before the start block
    pub skipped_blocks: u64,
}

/// Drives a [`BlockFeed`] through a [`Projector`].
pub struct SyncEngine {
    projector: Projector,
    start_block: u64,
}

impl SyncEngine {
    /// Create a new sync engine.
    pub fn new(projector: Projector, start_block: u64) -> Self {
        Self {
            projector,
            start_block,
        }
    }

    /// Project the feed until it ends.
    ///
    /// Blocks already covered by the sync cursor are skipped, so a run can be
    /// restarted over the same feed. A failing block stops the run; its
    /// writes are rolled back and the cursor stays on the previous block.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, feed: &mut BlockFeed<R>) -> Result<SyncReport> {
        let state = self.projector.storage().get_sync_state().await?;
        let mut last_block = state.last_block_number;
        let mut report = SyncReport::default();

        info!(
            "Sync engine starting: last={:?}, start_block={}",
            last_block, self.start_block
        );

        while let Some(block) = feed.next_block().await? {
            let projected = last_block.is_some_and(|last| block.block_number <= last);
            if block.block_number < self.start_block || projected {
                debug!(block = block.block_number, "Skipping already projected block");
                report.skipped_blocks += 1;
                continue;
            }

            let summary = self
                .projector
                .apply_block(&block)
                .await
                .with_context(|| format!("Failed to project block {}", block.block_number))?;

            last_block = Some(block.block_number);
            report.blocks += 1;
            report.events += summary.handled as u64;
        }

        info!(
            "Sync complete: {} blocks, {} events, {} blocks skipped, last block {:?}",
            report.blocks, report.events, report.skipped_blocks, last_block
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::setup_storage;

    const BLOCK_ZERO: &str = concat!(
        r#"{"block_number": 0, "block_timestamp": 0, "events": [{"#,
        r#""name": "forum.CategoryCreated", "index_in_block": 0, "#,
        r#""params": [1, null, "0x47656e6572616c", "0x"]}]}"#,
        "\n",
    );

    #[tokio::test]
    async fn test_rerun_skips_projected_block_zero() {
        let (storage, _temp_db) = setup_storage().await;
        let engine = SyncEngine::new(Projector::new(storage.clone()), 0);

        let first = engine
            .run(&mut BlockFeed::new(BLOCK_ZERO.as_bytes()))
            .await
            .unwrap();
        assert_eq!(first.blocks, 1);
        assert_eq!(first.events, 1);
        assert_eq!(storage.get_sync_state().await.unwrap().last_block_number, Some(0));

        let second = engine
            .run(&mut BlockFeed::new(BLOCK_ZERO.as_bytes()))
            .await
            .unwrap();
        assert_eq!(second.blocks, 0);
        assert_eq!(second.skipped_blocks, 1);
        assert_eq!(storage.stats().await.unwrap().event_count, 1);
    }

    #[tokio::test]
    async fn test_start_block_skips_earlier_blocks() {
        let (storage, _temp_db) = setup_storage().await;
        let engine = SyncEngine::new(Projector::new(storage.clone()), 5);

        let report = engine
            .run(&mut BlockFeed::new(BLOCK_ZERO.as_bytes()))
            .await
            .unwrap();
        assert_eq!(report.blocks, 0);
        assert_eq!(report.skipped_blocks, 1);
        assert_eq!(storage.get_sync_state().await.unwrap().last_block_number, None);
    }
}
