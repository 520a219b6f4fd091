//! Entity resolution.
//!
//! `get` is for references the chain guarantees: a miss is a fatal
//! inconsistency. `get_optional` is for soft references. Stub references
//! (members, languages) are upserted by key instead of being looked up.

use std::fmt;

use querynode_core::language::validate_iso_639_1;
use querynode_core::{
    CategoryId, ChannelCategoryId, ChannelId, ContentId, MemberId, PostId, PrivilegedActor,
    ThreadId, VideoCategoryId, VideoId,
};

use crate::error::Result;
use crate::event::EventContext;
use crate::guard;
use crate::storage::{
    CategoryTable, Category, Channel, ChannelCategory, DataObject, Post, PollAlternative, Store,
    Thread, Video, VideoCategory, Worker,
};

/// Working group whose workers act on the forum.
pub const FORUM_WORKING_GROUP: &str = "forumWorkingGroup";

/// An entity addressable by id.
#[allow(async_fn_in_trait)]
pub trait Entity: Sized {
    /// Id type.
    type Id: fmt::Display;

    /// Human-readable name used in inconsistency reports.
    const NAME: &'static str;

    /// Load the entity, `None` if absent.
    async fn load(store: &mut Store<'_>, id: &Self::Id) -> Result<Option<Self>>;
}

macro_rules! entity {
    ($ty:ty, $id:ty, $name:literal, |$store:ident, $key:ident| $load:expr) => {
        impl Entity for $ty {
            type Id = $id;
            const NAME: &'static str = $name;

            async fn load($store: &mut Store<'_>, $key: &Self::Id) -> Result<Option<Self>> {
                $load.await
            }
        }
    };
}

entity!(Category, CategoryId, "Forum category", |store, id| store.category(id));
entity!(Thread, ThreadId, "Forum thread", |store, id| store.thread(id));
entity!(Post, PostId, "Forum post", |store, id| store.post(id));
entity!(Channel, ChannelId, "Channel", |store, id| store.channel(id));
entity!(Video, VideoId, "Video", |store, id| store.video(id));
entity!(DataObject, ContentId, "Data object", |store, id| store.data_object(id));
entity!(ChannelCategory, ChannelCategoryId, "Channel category", |store, id| store
    .content_category(CategoryTable::Channel, id));
entity!(VideoCategory, VideoCategoryId, "Video category", |store, id| store
    .content_category(CategoryTable::Video, id));

/// Load an entity the event guarantees to exist.
pub async fn get<E: Entity>(store: &mut Store<'_>, ctx: &EventContext, id: &E::Id) -> Result<E> {
    let found = E::load(store, id).await?;
    guard::require(ctx, found, || format!("{} not found by id: {}", E::NAME, id))
}

/// Load an entity that may legitimately be absent.
pub async fn get_optional<E: Entity>(store: &mut Store<'_>, id: &E::Id) -> Result<Option<E>> {
    E::load(store, id).await
}

/// Resolve the forum worker behind a privileged actor.
pub async fn actor_worker(
    store: &mut Store<'_>,
    ctx: &EventContext,
    actor: PrivilegedActor,
) -> Result<Worker> {
    let worker = match actor {
        PrivilegedActor::Lead => store.group_lead(FORUM_WORKING_GROUP).await?,
        PrivilegedActor::Moderator(runtime_id) => {
            store.group_worker(FORUM_WORKING_GROUP, runtime_id).await?
        }
    };

    guard::require(ctx, worker, || {
        format!("Corresponding worker not found by forum privileged actor: {:?}", actor)
    })
}

/// Resolve a forum worker by runtime id.
pub async fn forum_worker(
    store: &mut Store<'_>,
    ctx: &EventContext,
    runtime_id: u64,
) -> Result<Worker> {
    let worker = store.group_worker(FORUM_WORKING_GROUP, runtime_id).await?;
    guard::require(ctx, worker, || {
        format!(
            "Worker not found by id: {}-{}",
            FORUM_WORKING_GROUP, runtime_id
        )
    })
}

/// Resolve a poll alternative of a thread's poll.
pub async fn poll_alternative(
    store: &mut Store<'_>,
    ctx: &EventContext,
    thread: &ThreadId,
    index: u32,
) -> Result<PollAlternative> {
    let alternative = store.poll_alternative(thread, index).await?;
    guard::require(ctx, alternative, || {
        format!(
            "Forum poll alternative not found by index {} in thread {}",
            index, thread
        )
    })
}

/// Membership referenced by id: upserted as a stub.
pub async fn member(store: &mut Store<'_>, ctx: &EventContext, id: MemberId) -> Result<MemberId> {
    store.ensure_member(&id, ctx.block_number).await?;
    Ok(id)
}

/// Validate an ISO-639-1 code and get-or-create its language row.
pub async fn language(store: &mut Store<'_>, ctx: &EventContext, iso: &str) -> Result<String> {
    let iso = guard::check(ctx, validate_iso_639_1(iso))?;
    store.ensure_language(iso, ctx.block_number).await?;
    Ok(iso.to_string())
}
