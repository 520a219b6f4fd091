//! Event dispatch and per-block projection.

use tracing::{debug, info};

use crate::error::Result;
use crate::event::{BlockEvents, EventContext};
use crate::handlers::{content, forum, storage};
use crate::storage::{Storage, Store, SyncState};

/// Route one event to its handler.
///
/// Returns `false` for events the projection does not cover; those leave no
/// trace besides a debug log.
pub async fn dispatch(store: &mut Store<'_>, ctx: &EventContext) -> Result<bool> {
    match ctx.name.as_str() {
        // Forum
        "forum.CategoryCreated" => forum::category_created(store, ctx).await?,
        "forum.CategoryUpdated" => forum::category_updated(store, ctx).await?,
        "forum.CategoryDeleted" => forum::category_deleted(store, ctx).await?,
        "forum.ThreadCreated" => forum::thread_created(store, ctx).await?,
        "forum.ThreadModerated" => forum::thread_moderated(store, ctx).await?,
        "forum.ThreadTitleUpdated" => forum::thread_title_updated(store, ctx).await?,
        "forum.ThreadDeleted" => forum::thread_deleted(store, ctx).await?,
        "forum.ThreadMoved" => forum::thread_moved(store, ctx).await?,
        "forum.VoteOnPoll" => forum::vote_on_poll(store, ctx).await?,
        "forum.PostAdded" => forum::post_added(store, ctx).await?,
        "forum.PostModerated" => forum::post_moderated(store, ctx).await?,
        "forum.PostDeleted" => forum::post_deleted(store, ctx).await?,
        "forum.PostTextUpdated" => forum::post_text_updated(store, ctx).await?,
        "forum.CategoryStickyThreadUpdate" => {
            forum::category_sticky_thread_update(store, ctx).await?
        }
        "forum.CategoryMembershipOfModeratorUpdated" => {
            forum::category_membership_of_moderator_updated(store, ctx).await?
        }

        // Content
        "content.ChannelCreated" => content::channel_created(store, ctx).await?,
        "content.ChannelUpdated" => content::channel_updated(store, ctx).await?,
        "content.ChannelCensored" => content::channel_censorship(store, ctx, true).await?,
        "content.ChannelUncensored" => content::channel_censorship(store, ctx, false).await?,
        "content.ChannelCategoryCreated" => content::channel_category_created(store, ctx).await?,
        "content.ChannelCategoryUpdated" => content::channel_category_updated(store, ctx).await?,
        "content.ChannelCategoryDeleted" => content::channel_category_deleted(store, ctx).await?,
        "content.VideoCategoryCreated" => content::video_category_created(store, ctx).await?,
        "content.VideoCategoryUpdated" => content::video_category_updated(store, ctx).await?,
        "content.VideoCategoryDeleted" => content::video_category_deleted(store, ctx).await?,
        "content.VideoCreated" => content::video_created(store, ctx).await?,
        "content.VideoUpdated" => content::video_updated(store, ctx).await?,
        "content.VideoDeleted" => content::video_deleted(store, ctx).await?,
        "content.VideoCensored" => content::video_censorship(store, ctx, true).await?,
        "content.VideoUncensored" => content::video_censorship(store, ctx, false).await?,
        "content.FeaturedVideosSet" => content::featured_videos_set(store, ctx).await?,

        // Storage
        "storage.ContentAccepted" => storage::content_accepted(store, ctx).await?,

        other => {
            debug!(event = other, event_id = %ctx.event_id, "Skipping unhandled event");
            return Ok(false);
        }
    }

    debug!(event = %ctx.name, event_id = %ctx.event_id, "Event projected");
    Ok(true)
}

/// Outcome of projecting one block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Events routed to a handler
    pub handled: usize,

    /// Events without a handler
    pub skipped: usize,
}

/// Applies blocks to the store, one transaction per block.
#[derive(Debug, Clone)]
pub struct Projector {
    storage: Storage,
}

impl Projector {
    /// Create a projector writing to `storage`.
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Borrow the underlying storage.
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Project every event of `block` and advance the sync cursor.
    ///
    /// Either all writes of the block, cursor included, become visible or
    /// none do. On error the transaction is dropped and rolled back.
    pub async fn apply_block(&self, block: &BlockEvents) -> Result<BlockSummary> {
        let mut tx = self.storage.begin().await?;
        let mut summary = BlockSummary::default();

        {
            let mut store = Store::new(&mut tx);

            for event in &block.events {
                let ctx = EventContext::new(block, event);
                if dispatch(&mut store, &ctx).await? {
                    summary.handled += 1;
                } else {
                    summary.skipped += 1;
                }
            }

            store
                .set_sync_state(&SyncState {
                    last_block_number: Some(block.block_number),
                    updated_at: chrono::Utc::now().timestamp(),
                })
                .await?;
        }

        tx.commit().await?;

        if summary.handled > 0 {
            info!(
                block = block.block_number,
                handled = summary.handled,
                skipped = summary.skipped,
                "Block projected"
            );
        } else {
            debug!(block = block.block_number, skipped = summary.skipped, "Block projected");
        }

        Ok(summary)
    }
}
