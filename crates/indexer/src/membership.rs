//! Diff-based recompute of set-membership flags.
//!
//! An event carries the complete desired set. The stored flags are replaced
//! wholesale from it: current members outside the set are cleared, non-members
//! inside the set are flagged. Recomputing twice with the same set is a no-op
//! the second time.

use std::collections::BTreeSet;

use querynode_core::CategoryId;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

use crate::error::Result;
use crate::event::EventContext;
use crate::guard;
use crate::storage::Store;

/// A membership flag and the scope it is computed in.
#[derive(Debug, Clone, Copy)]
pub enum MembershipSet<'a> {
    /// Sticky threads of one forum category.
    StickyThreads(&'a CategoryId),
    /// The global featured-video set.
    FeaturedVideos,
}

impl MembershipSet<'_> {
    fn table(&self) -> &'static str {
        match self {
            MembershipSet::StickyThreads(_) => "forum_threads",
            MembershipSet::FeaturedVideos => "videos",
        }
    }

    fn flag(&self) -> &'static str {
        match self {
            MembershipSet::StickyThreads(_) => "is_sticky",
            MembershipSet::FeaturedVideos => "is_featured",
        }
    }

    fn describe(&self) -> String {
        match self {
            MembershipSet::StickyThreads(category) => format!("Forum thread in category {}", category),
            MembershipSet::FeaturedVideos => "Video".to_string(),
        }
    }

    fn push_scope(&self, query: &mut QueryBuilder<'_, Sqlite>) {
        if let MembershipSet::StickyThreads(category) = self {
            query.push(" AND category_id = ");
            query.push_bind(category.as_str().to_string());
        }
    }
}

/// Outcome of a recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    /// Ids newly flagged
    pub added: Vec<String>,

    /// Ids no longer flagged
    pub removed: Vec<String>,
}

async fn select_ids(
    store: &mut Store<'_>,
    set: MembershipSet<'_>,
    flagged: bool,
    within: Option<&BTreeSet<String>>,
) -> Result<BTreeSet<String>> {
    let mut query = QueryBuilder::<Sqlite>::new(format!(
        "SELECT id FROM {} WHERE {} = ",
        set.table(),
        set.flag()
    ));
    query.push_bind(flagged);
    set.push_scope(&mut query);

    if let Some(ids) = within {
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }
        query.push(" AND id IN (");
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id.clone());
        }
        separated.push_unseparated(")");
    }

    let ids: Vec<String> = query
        .build_query_scalar::<String>()
        .fetch_all(&mut *store.conn)
        .await?;

    Ok(ids.into_iter().collect())
}

async fn set_flag(
    store: &mut Store<'_>,
    set: MembershipSet<'_>,
    ids: &[String],
    flagged: bool,
    updated_at: i64,
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut query = QueryBuilder::<Sqlite>::new(format!("UPDATE {} SET {} = ", set.table(), set.flag()));
    query.push_bind(flagged);
    query.push(", updated_at = ");
    query.push_bind(updated_at);
    query.push(" WHERE id IN (");
    let mut separated = query.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");

    query.build().execute(&mut *store.conn).await?;

    Ok(())
}

/// Replace the membership of `set` with `desired`.
///
/// Every desired id must name an entity within the set's scope; otherwise
/// nothing is written and the event is a fatal inconsistency.
pub async fn recompute<I: AsRef<str>>(
    store: &mut Store<'_>,
    ctx: &EventContext,
    set: MembershipSet<'_>,
    desired: &[I],
) -> Result<MembershipDiff> {
    let desired: BTreeSet<String> = desired.iter().map(|id| id.as_ref().to_string()).collect();

    let current = select_ids(store, set, true, None).await?;
    let candidates = select_ids(store, set, false, Some(&desired)).await?;

    let missing: Vec<&String> = desired
        .iter()
        .filter(|id| !current.contains(*id) && !candidates.contains(*id))
        .collect();
    if !missing.is_empty() {
        return Err(guard::inconsistent(
            ctx,
            format!("{} not found by id: {:?}", set.describe(), missing),
        ));
    }

    let removed: Vec<String> = current.difference(&desired).cloned().collect();
    let added: Vec<String> = candidates.into_iter().collect();

    set_flag(store, set, &removed, false, ctx.block_timestamp).await?;
    set_flag(store, set, &added, true, ctx.block_timestamp).await?;

    debug!(
        event_id = %ctx.event_id,
        flag = set.flag(),
        added = added.len(),
        removed = removed.len(),
        "Recomputed membership"
    );

    Ok(MembershipDiff { added, removed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BlockEvents, SubstrateEvent};
    use crate::storage::tests::setup_storage;
    use crate::storage::{Thread, Video};
    use querynode_core::{ChannelId, MemberId, ThreadId, ThreadStatus, VideoId};

    fn ctx() -> EventContext {
        let block = BlockEvents {
            block_number: 6,
            block_timestamp: 6_000,
            events: vec![],
        };
        let event = SubstrateEvent {
            name: "forum.CategoryStickyThreadUpdate".to_string(),
            index_in_block: 0,
            extrinsic_hash: None,
            params: vec![],
        };
        EventContext::new(&block, &event)
    }

    fn thread(id: u64, category: u64, sticky: bool) -> Thread {
        Thread {
            id: ThreadId::from(id),
            category: CategoryId::from(category),
            author: MemberId::from(1),
            title: format!("t{}", id),
            is_sticky: sticky,
            status: ThreadStatus::Active,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[tokio::test]
    async fn test_sticky_recompute_is_idempotent() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        store.save_thread(&thread(1, 1, true)).await.unwrap();
        store.save_thread(&thread(2, 1, false)).await.unwrap();
        store.save_thread(&thread(3, 1, false)).await.unwrap();
        // Sticky in another category: out of scope.
        store.save_thread(&thread(4, 2, true)).await.unwrap();

        let category = CategoryId::from(1);
        let desired = vec![ThreadId::from(2), ThreadId::from(3)];

        let diff = recompute(&mut store, &ctx, MembershipSet::StickyThreads(&category), &desired)
            .await
            .unwrap();
        assert_eq!(diff.added, vec!["2".to_string(), "3".to_string()]);
        assert_eq!(diff.removed, vec!["1".to_string()]);

        let again = recompute(&mut store, &ctx, MembershipSet::StickyThreads(&category), &desired)
            .await
            .unwrap();
        assert_eq!(again, MembershipDiff::default());

        assert!(!store.thread(&ThreadId::from(1)).await.unwrap().unwrap().is_sticky);
        assert!(store.thread(&ThreadId::from(2)).await.unwrap().unwrap().is_sticky);
        assert!(store.thread(&ThreadId::from(4)).await.unwrap().unwrap().is_sticky);
        assert_eq!(store.thread(&ThreadId::from(3)).await.unwrap().unwrap().updated_at, 6_000);
    }

    #[tokio::test]
    async fn test_thread_outside_category_is_fatal() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        store.save_thread(&thread(1, 1, true)).await.unwrap();
        store.save_thread(&thread(4, 2, false)).await.unwrap();

        let category = CategoryId::from(1);
        let err = recompute(
            &mut store,
            &ctx,
            MembershipSet::StickyThreads(&category),
            &[ThreadId::from(4)],
        )
        .await
        .unwrap_err();
        assert!(err.is_inconsistency());

        // Nothing was cleared.
        assert!(store.thread(&ThreadId::from(1)).await.unwrap().unwrap().is_sticky);
    }

    #[tokio::test]
    async fn test_featured_videos_empty_set_clears_all() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        for id in 1..=2 {
            let mut video = Video::new(VideoId::from(id), ChannelId::from(1), 1, 0);
            video.is_featured = true;
            store.save_video(&video).await.unwrap();
        }

        let none: [VideoId; 0] = [];
        let diff = recompute(&mut store, &ctx, MembershipSet::FeaturedVideos, &none)
            .await
            .unwrap();
        assert_eq!(diff.removed.len(), 2);
        assert!(!store.video(&VideoId::from(1)).await.unwrap().unwrap().is_featured);
    }
}
