//! Forum event handlers.

use querynode_core::{
    Bytes, CategoryId, CategoryStatus, MemberId, PostId, PostOrigin, PostStatus, PrivilegedActor,
    ThreadId, ThreadStatus,
};
use serde::Deserialize;
use tracing::{debug, info};

use super::{record, text_param};
use crate::error::Result;
use crate::event::{self, EventContext, EventData};
use crate::guard;
use crate::membership::{self, MembershipSet};
use crate::metadata::PostContent;
use crate::resolver;
use crate::storage::{Category, Poll, Post, Store, Thread};

/// Poll supplied with a new thread.
#[derive(Debug, Clone, Deserialize)]
struct PollInput {
    description: Bytes,
    end_time: u64,
    #[serde(default)]
    alternatives: Vec<Bytes>,
}

/// `forum.CategoryCreated(category_id, parent_id?, title, description)`
pub async fn category_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: CategoryId = ctx.param(0, "category_id")?;
    let parent: Option<CategoryId> = ctx.param(1, "parent_id")?;
    let title = text_param(ctx, 2, "title")?;
    let description = text_param(ctx, 3, "description")?;

    let category = Category {
        id: id.clone(),
        parent,
        title,
        description,
        status: CategoryStatus::Active,
        created_at: ctx.block_timestamp,
        updated_at: ctx.block_timestamp,
    };
    store.save_category(&category).await?;

    info!(category = %id, "Forum category created");

    record(store, ctx, EventData::CategoryCreated { category: id }).await
}

/// `forum.CategoryUpdated(category_id, new_archival_status, actor)`
pub async fn category_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: CategoryId = ctx.param(0, "category_id")?;
    let archived: bool = ctx.param(1, "new_archival_status")?;
    let actor: PrivilegedActor = ctx.param(2, "actor")?;

    let mut category: Category = resolver::get(store, ctx, &id).await?;
    let worker = resolver::actor_worker(store, ctx, actor).await?;

    category.status = guard::check(
        ctx,
        category.status.with_archival(archived, ctx.event_id.clone()),
    )?;
    category.updated_at = ctx.block_timestamp;
    store.save_category(&category).await?;

    record(
        store,
        ctx,
        EventData::CategoryUpdated {
            category: id,
            new_archival_status: archived,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.CategoryDeleted(category_id, actor)`
pub async fn category_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: CategoryId = ctx.param(0, "category_id")?;
    let actor: PrivilegedActor = ctx.param(1, "actor")?;

    let mut category: Category = resolver::get(store, ctx, &id).await?;
    let worker = resolver::actor_worker(store, ctx, actor).await?;

    category.status = CategoryStatus::removed(ctx.event_id.clone());
    category.updated_at = ctx.block_timestamp;
    store.save_category(&category).await?;

    record(
        store,
        ctx,
        EventData::CategoryDeleted {
            category: id,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.ThreadCreated(category_id, thread_id, post_id, member_id, title, text, poll?)`
///
/// Creates the thread, its optional poll and its initial post.
pub async fn thread_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let category_id: CategoryId = ctx.param(0, "category_id")?;
    let thread_id: ThreadId = ctx.param(1, "thread_id")?;
    let post_id: PostId = ctx.param(2, "post_id")?;
    let member_id: MemberId = ctx.param(3, "member_id")?;
    let title = text_param(ctx, 4, "title")?;
    let text = text_param(ctx, 5, "text")?;
    let poll: Option<PollInput> = ctx.param(6, "poll")?;

    let category: Category = resolver::get(store, ctx, &category_id).await?;
    let author = resolver::member(store, ctx, member_id).await?;

    let poll = match poll {
        Some(poll) => {
            let end_time = i64::try_from(poll.end_time).map_err(|_| {
                guard::inconsistent(ctx, format!("Poll end time {} out of range", poll.end_time))
            })?;
            Some(Poll {
                thread: thread_id.clone(),
                description: event::text(&poll.description),
                end_time,
                alternatives: poll.alternatives.iter().map(event::text).collect(),
            })
        }
        None => None,
    };

    let thread = Thread {
        id: thread_id.clone(),
        category: category.id,
        author: author.clone(),
        title: title.clone(),
        is_sticky: false,
        status: ThreadStatus::Active,
        created_at: ctx.block_timestamp,
        updated_at: ctx.block_timestamp,
    };
    store.save_thread(&thread).await?;

    if let Some(poll) = poll {
        let poll_id = store.insert_poll(&poll, ctx.block_timestamp).await?;
        debug!(thread = %thread_id, poll = poll_id, alternatives = poll.alternatives.len(), "Poll created");
    }

    store
        .save_post(&Post {
            id: post_id,
            thread: thread_id.clone(),
            author,
            text: text.clone(),
            status: PostStatus::Active,
            origin: PostOrigin::ThreadInitial {
                thread_created_event: ctx.event_id.clone(),
            },
            replies_to: None,
            created_at: ctx.block_timestamp,
            updated_at: ctx.block_timestamp,
        })
        .await?;

    record(
        store,
        ctx,
        EventData::ThreadCreated {
            thread: thread_id,
            title,
            text,
        },
    )
    .await
}

/// `forum.ThreadModerated(thread_id, rationale, actor)`
pub async fn thread_moderated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let thread_id: ThreadId = ctx.param(0, "thread_id")?;
    let rationale = text_param(ctx, 1, "rationale")?;
    let actor: PrivilegedActor = ctx.param(2, "actor")?;

    let worker = resolver::actor_worker(store, ctx, actor).await?;
    let mut thread: Thread = resolver::get(store, ctx, &thread_id).await?;

    thread.status = guard::check(ctx, thread.status.moderated(ctx.event_id.clone()))?;
    thread.updated_at = ctx.block_timestamp;
    store.save_thread(&thread).await?;

    record(
        store,
        ctx,
        EventData::ThreadModerated {
            thread: thread_id,
            rationale,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.ThreadTitleUpdated(thread_id, member_id, category_id, new_title)`
pub async fn thread_title_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let thread_id: ThreadId = ctx.param(0, "thread_id")?;
    let new_title = text_param(ctx, 3, "new_title")?;

    let mut thread: Thread = resolver::get(store, ctx, &thread_id).await?;
    thread.title = new_title.clone();
    thread.updated_at = ctx.block_timestamp;
    store.save_thread(&thread).await?;

    record(
        store,
        ctx,
        EventData::ThreadTitleUpdated {
            thread: thread_id,
            new_title,
        },
    )
    .await
}

/// `forum.ThreadDeleted(thread_id, member_id, category_id, hide)`
pub async fn thread_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let thread_id: ThreadId = ctx.param(0, "thread_id")?;
    let hide: bool = ctx.param(3, "hide")?;

    let mut thread: Thread = resolver::get(store, ctx, &thread_id).await?;
    thread.status = guard::check(ctx, thread.status.deleted(hide, ctx.event_id.clone()))?;
    thread.updated_at = ctx.block_timestamp;
    store.save_thread(&thread).await?;

    record(store, ctx, EventData::ThreadDeleted { thread: thread_id }).await
}

/// `forum.ThreadMoved(thread_id, new_category_id, actor, old_category_id)`
pub async fn thread_moved(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let thread_id: ThreadId = ctx.param(0, "thread_id")?;
    let new_category_id: CategoryId = ctx.param(1, "new_category_id")?;
    let actor: PrivilegedActor = ctx.param(2, "actor")?;
    let old_category_id: CategoryId = ctx.param(3, "old_category_id")?;

    let mut thread: Thread = resolver::get(store, ctx, &thread_id).await?;
    let worker = resolver::actor_worker(store, ctx, actor).await?;
    let new_category: Category = resolver::get(store, ctx, &new_category_id).await?;

    if thread.category != old_category_id {
        return Err(guard::inconsistent(
            ctx,
            format!(
                "Forum thread {} is in category {}, not {}",
                thread_id, thread.category, old_category_id
            ),
        ));
    }

    thread.category = new_category.id;
    thread.updated_at = ctx.block_timestamp;
    store.save_thread(&thread).await?;

    record(
        store,
        ctx,
        EventData::ThreadMoved {
            thread: thread_id,
            old_category: old_category_id,
            new_category: new_category_id,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.VoteOnPoll(thread_id, alternative_index, member_id)`
pub async fn vote_on_poll(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let thread_id: ThreadId = ctx.param(0, "thread_id")?;
    let index: u32 = ctx.param(1, "alternative_index")?;
    let member_id: MemberId = ctx.param(2, "member_id")?;

    let alternative = resolver::poll_alternative(store, ctx, &thread_id, index).await?;
    let voter = resolver::member(store, ctx, member_id).await?;

    record(
        store,
        ctx,
        EventData::VoteOnPoll {
            poll_alternative: alternative.id,
            voting_member: voter,
        },
    )
    .await
}

/// `forum.PostAdded(post_id, member_id, category_id, thread_id, metadata, editable)`
pub async fn post_added(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let post_id: PostId = ctx.param(0, "post_id")?;
    let member_id: MemberId = ctx.param(1, "member_id")?;
    let thread_id: ThreadId = ctx.param(3, "thread_id")?;
    let metadata: Bytes = ctx.param(4, "metadata")?;
    let editable: bool = ctx.param(5, "editable")?;

    let thread: Thread = resolver::get(store, ctx, &thread_id).await?;
    let content = PostContent::decode(metadata.as_slice());

    let replies_to = match content.replies_to {
        Some(target) => match resolver::get_optional::<Post>(store, &target).await? {
            Some(post) => Some(post.id),
            None => guard::omission(ctx, "replies_to", format!("post {} not found", target)),
        },
        None => None,
    };

    let author = resolver::member(store, ctx, member_id).await?;

    store
        .save_post(&Post {
            id: post_id.clone(),
            thread: thread.id,
            author,
            text: content.text.clone(),
            status: PostStatus::initial(editable),
            origin: PostOrigin::ThreadReply {
                post_added_event: ctx.event_id.clone(),
            },
            replies_to,
            created_at: ctx.block_timestamp,
            updated_at: ctx.block_timestamp,
        })
        .await?;

    record(
        store,
        ctx,
        EventData::PostAdded {
            post: post_id,
            is_editable: editable,
            text: content.text,
        },
    )
    .await
}

/// `forum.PostModerated(post_id, rationale, actor)`
pub async fn post_moderated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let post_id: PostId = ctx.param(0, "post_id")?;
    let rationale = text_param(ctx, 1, "rationale")?;
    let actor: PrivilegedActor = ctx.param(2, "actor")?;

    let worker = resolver::actor_worker(store, ctx, actor).await?;
    let mut post: Post = resolver::get(store, ctx, &post_id).await?;

    post.status = PostStatus::moderated(ctx.event_id.clone());
    post.updated_at = ctx.block_timestamp;
    store.save_post(&post).await?;

    record(
        store,
        ctx,
        EventData::PostModerated {
            post: post_id,
            rationale,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.PostDeleted(rationale, member_id, post_ids, hide)`
pub async fn post_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let rationale = text_param(ctx, 0, "rationale")?;
    let member_id: MemberId = ctx.param(1, "member_id")?;
    let post_ids: Vec<PostId> = ctx.param(2, "post_ids")?;
    let hide: bool = ctx.param(3, "hide")?;

    let mut posts = Vec::with_capacity(post_ids.len());
    for id in &post_ids {
        let mut post: Post = resolver::get(store, ctx, id).await?;
        post.status = guard::check(ctx, post.status.deleted(hide, ctx.event_id.clone()))?;
        post.updated_at = ctx.block_timestamp;
        posts.push(post);
    }

    let actor = resolver::member(store, ctx, member_id).await?;
    for post in &posts {
        store.save_post(post).await?;
    }

    record(
        store,
        ctx,
        EventData::PostDeleted {
            posts: post_ids,
            rationale,
            actor,
        },
    )
    .await
}

/// `forum.PostTextUpdated(post_id, member_id, category_id, thread_id, new_text)`
pub async fn post_text_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let post_id: PostId = ctx.param(0, "post_id")?;
    let new_text = text_param(ctx, 4, "new_text")?;

    let mut post: Post = resolver::get(store, ctx, &post_id).await?;
    post.text = new_text.clone();
    post.updated_at = ctx.block_timestamp;
    store.save_post(&post).await?;

    record(
        store,
        ctx,
        EventData::PostTextUpdated {
            post: post_id,
            new_text,
        },
    )
    .await
}

/// `forum.CategoryStickyThreadUpdate(category_id, thread_ids, actor)`
pub async fn category_sticky_thread_update(
    store: &mut Store<'_>,
    ctx: &EventContext,
) -> Result<()> {
    let category_id: CategoryId = ctx.param(0, "category_id")?;
    let thread_ids: Vec<ThreadId> = ctx.param(1, "thread_ids")?;
    let actor: PrivilegedActor = ctx.param(2, "actor")?;

    let category: Category = resolver::get(store, ctx, &category_id).await?;
    let worker = resolver::actor_worker(store, ctx, actor).await?;

    membership::recompute(
        store,
        ctx,
        MembershipSet::StickyThreads(&category.id),
        &thread_ids,
    )
    .await?;

    record(
        store,
        ctx,
        EventData::CategoryStickyThreadUpdate {
            category: category_id,
            new_sticky_threads: thread_ids,
            actor: worker.id,
        },
    )
    .await
}

/// `forum.CategoryMembershipOfModeratorUpdated(moderator_id, category_id, can_moderate)`
pub async fn category_membership_of_moderator_updated(
    store: &mut Store<'_>,
    ctx: &EventContext,
) -> Result<()> {
    let moderator_id: u64 = ctx.param(0, "moderator_id")?;
    let category_id: CategoryId = ctx.param(1, "category_id")?;
    let can_moderate: bool = ctx.param(2, "can_moderate")?;

    let moderator = resolver::forum_worker(store, ctx, moderator_id).await?;
    let mut category: Category = resolver::get(store, ctx, &category_id).await?;

    if can_moderate {
        store
            .add_category_moderator(&category.id, &moderator.id)
            .await?;
    } else if !store
        .remove_category_moderator(&category.id, &moderator.id)
        .await?
    {
        guard::omission::<()>(
            ctx,
            "moderators",
            format!("worker {} does not moderate category {}", moderator.id, category.id),
        );
    }

    category.updated_at = ctx.block_timestamp;
    store.save_category(&category).await?;

    record(
        store,
        ctx,
        EventData::CategoryMembershipOfModeratorUpdated {
            category: category_id,
            moderator: moderator.id,
            new_can_moderate_value: can_moderate,
        },
    )
    .await
}
