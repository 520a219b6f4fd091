//! Content directory event handlers.

use querynode_core::{
    Bytes, ChannelCategoryId, ChannelId, ChannelOwner, ContentActor, RawAsset, VideoCategoryId,
    VideoId,
};
use serde::Deserialize;
use tracing::info;

use super::{record, text_param};
use crate::error::Result;
use crate::event::{EventContext, EventData};
use crate::membership::{self, MembershipSet};
use crate::metadata::{CategoryChanges, ChannelChanges, VideoChanges};
use crate::resolver;
use crate::storage::{
    CategoryTable, Channel, ChannelCategory, ContentCategory, Store, Video, VideoCategory,
};

/// On-chain channel record; only the owner is projected.
#[derive(Debug, Deserialize)]
struct ChannelRecord {
    owner: ChannelOwner,
}

#[derive(Debug, Deserialize)]
struct ChannelCreationParameters {
    #[serde(default)]
    assets: Vec<RawAsset>,
    meta: Bytes,
    #[serde(default)]
    reward_account: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelUpdateParameters {
    #[serde(default)]
    assets: Option<Vec<RawAsset>>,
    #[serde(default)]
    new_meta: Option<Bytes>,
    #[serde(default)]
    reward_account: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CategoryCreationParameters {
    meta: Bytes,
}

#[derive(Debug, Deserialize)]
struct CategoryUpdateParameters {
    new_meta: Bytes,
}

#[derive(Debug, Deserialize)]
struct VideoCreationParameters {
    #[serde(default)]
    assets: Vec<RawAsset>,
    meta: Bytes,
}

#[derive(Debug, Deserialize)]
struct VideoUpdateParameters {
    #[serde(default)]
    assets: Option<Vec<RawAsset>>,
    #[serde(default)]
    new_meta: Option<Bytes>,
}

/// `content.ChannelCreated(actor, channel_id, channel, params)`
pub async fn channel_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let actor: ContentActor = ctx.param(0, "actor")?;
    let channel_id: ChannelId = ctx.param(1, "channel_id")?;
    let record_param: ChannelRecord = ctx.param(2, "channel")?;
    let params: ChannelCreationParameters = ctx.param(3, "params")?;

    let changes =
        ChannelChanges::decode(store, ctx, params.meta.as_slice(), &params.assets).await?;

    if let ChannelOwner::Member(member) = &record_param.owner {
        resolver::member(store, ctx, member.clone()).await?;
    }

    let mut channel = Channel::new(channel_id.clone(), ctx.block_number, ctx.block_timestamp);
    channel.owner = Some(record_param.owner);
    channel.reward_account = params.reward_account;

    if let Some(changes) = changes {
        let owner = actor.asset_owner(&channel_id);
        changes.apply(store, ctx, &mut channel, &owner).await?;
    }
    store.save_channel(&channel).await?;

    info!(channel = %channel_id, "Channel created");

    record(store, ctx, EventData::ChannelCreated { channel: channel_id }).await
}

/// `content.ChannelUpdated(actor, channel_id, channel, params)`
pub async fn channel_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let actor: ContentActor = ctx.param(0, "actor")?;
    let channel_id: ChannelId = ctx.param(1, "channel_id")?;
    let params: ChannelUpdateParameters = ctx.param(3, "params")?;

    let mut channel: Channel = resolver::get(store, ctx, &channel_id).await?;

    let assets = params.assets.unwrap_or_default();
    let changes = match &params.new_meta {
        Some(meta) => ChannelChanges::decode(store, ctx, meta.as_slice(), &assets).await?,
        None => None,
    };

    if let Some(changes) = changes {
        let owner = actor.asset_owner(&channel_id);
        changes.apply(store, ctx, &mut channel, &owner).await?;
    }
    if let Some(account) = params.reward_account {
        channel.reward_account = Some(account);
    }
    channel.updated_at = ctx.block_timestamp;
    store.save_channel(&channel).await?;

    record(store, ctx, EventData::ChannelUpdated { channel: channel_id }).await
}

/// `content.ChannelCensored` / `content.ChannelUncensored(actor, channel_id, rationale)`
pub async fn channel_censorship(
    store: &mut Store<'_>,
    ctx: &EventContext,
    is_censored: bool,
) -> Result<()> {
    let channel_id: ChannelId = ctx.param(1, "channel_id")?;
    let rationale = text_param(ctx, 2, "rationale")?;

    let mut channel: Channel = resolver::get(store, ctx, &channel_id).await?;
    channel.is_censored = is_censored;
    channel.updated_at = ctx.block_timestamp;
    store.save_channel(&channel).await?;

    record(
        store,
        ctx,
        EventData::ChannelCensorshipUpdated {
            channel: channel_id,
            is_censored,
            rationale,
        },
    )
    .await
}

/// `content.ChannelCategoryCreated(category_id, category, params)`
pub async fn channel_category_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: ChannelCategoryId = ctx.param(0, "category_id")?;
    let params: CategoryCreationParameters = ctx.param(2, "params")?;

    let mut category = ContentCategory {
        id: id.clone(),
        name: None,
        created_in_block: ctx.block_number,
        created_at: ctx.block_timestamp,
        updated_at: ctx.block_timestamp,
    };
    if let Some(changes) = CategoryChanges::decode_channel(ctx, params.meta.as_slice()) {
        changes.apply(&mut category);
    }
    store
        .save_content_category(CategoryTable::Channel, &category)
        .await?;

    record(store, ctx, EventData::ChannelCategoryCreated { category: id }).await
}

/// `content.ChannelCategoryUpdated(actor, category_id, params)`
pub async fn channel_category_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: ChannelCategoryId = ctx.param(1, "category_id")?;
    let params: CategoryUpdateParameters = ctx.param(2, "params")?;

    let mut category: ChannelCategory = resolver::get(store, ctx, &id).await?;
    if let Some(changes) = CategoryChanges::decode_channel(ctx, params.new_meta.as_slice()) {
        changes.apply(&mut category);
    }
    category.updated_at = ctx.block_timestamp;
    store
        .save_content_category(CategoryTable::Channel, &category)
        .await?;

    record(store, ctx, EventData::ChannelCategoryUpdated { category: id }).await
}

/// `content.ChannelCategoryDeleted(actor, category_id)`
pub async fn channel_category_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: ChannelCategoryId = ctx.param(1, "category_id")?;

    let category: ChannelCategory = resolver::get(store, ctx, &id).await?;
    store
        .remove_content_category(CategoryTable::Channel, category.id.as_str())
        .await?;

    record(store, ctx, EventData::ChannelCategoryDeleted { category: id }).await
}

/// `content.VideoCategoryCreated(actor, category_id, params)`
pub async fn video_category_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: VideoCategoryId = ctx.param(1, "category_id")?;
    let params: CategoryCreationParameters = ctx.param(2, "params")?;

    let mut category = ContentCategory {
        id: id.clone(),
        name: None,
        created_in_block: ctx.block_number,
        created_at: ctx.block_timestamp,
        updated_at: ctx.block_timestamp,
    };
    if let Some(changes) = CategoryChanges::decode_video(ctx, params.meta.as_slice()) {
        changes.apply(&mut category);
    }
    store
        .save_content_category(CategoryTable::Video, &category)
        .await?;

    record(store, ctx, EventData::VideoCategoryCreated { category: id }).await
}

/// `content.VideoCategoryUpdated(actor, category_id, params)`
pub async fn video_category_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: VideoCategoryId = ctx.param(1, "category_id")?;
    let params: CategoryUpdateParameters = ctx.param(2, "params")?;

    let mut category: VideoCategory = resolver::get(store, ctx, &id).await?;
    if let Some(changes) = CategoryChanges::decode_video(ctx, params.new_meta.as_slice()) {
        changes.apply(&mut category);
    }
    category.updated_at = ctx.block_timestamp;
    store
        .save_content_category(CategoryTable::Video, &category)
        .await?;

    record(store, ctx, EventData::VideoCategoryUpdated { category: id }).await
}

/// `content.VideoCategoryDeleted(actor, category_id)`
pub async fn video_category_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let id: VideoCategoryId = ctx.param(1, "category_id")?;

    let category: VideoCategory = resolver::get(store, ctx, &id).await?;
    store
        .remove_content_category(CategoryTable::Video, category.id.as_str())
        .await?;

    record(store, ctx, EventData::VideoCategoryDeleted { category: id }).await
}

/// `content.VideoCreated(actor, channel_id, video_id, params)`
pub async fn video_created(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let actor: ContentActor = ctx.param(0, "actor")?;
    let channel_id: ChannelId = ctx.param(1, "channel_id")?;
    let video_id: VideoId = ctx.param(2, "video_id")?;
    let params: VideoCreationParameters = ctx.param(3, "params")?;

    let channel: Channel = resolver::get(store, ctx, &channel_id).await?;
    let changes = VideoChanges::decode(store, ctx, params.meta.as_slice(), &params.assets).await?;

    let mut video = Video::new(
        video_id.clone(),
        channel.id.clone(),
        ctx.block_number,
        ctx.block_timestamp,
    );
    if let Some(changes) = changes {
        let owner = actor.asset_owner(&channel.id);
        changes.apply(store, ctx, &mut video, &owner).await?;
    }
    store.save_video(&video).await?;

    info!(video = %video_id, channel = %channel_id, "Video created");

    record(
        store,
        ctx,
        EventData::VideoCreated {
            channel: channel_id,
            video: video_id,
        },
    )
    .await
}

/// `content.VideoUpdated(actor, video_id, params)`
pub async fn video_updated(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let actor: ContentActor = ctx.param(0, "actor")?;
    let video_id: VideoId = ctx.param(1, "video_id")?;
    let params: VideoUpdateParameters = ctx.param(2, "params")?;

    let mut video: Video = resolver::get(store, ctx, &video_id).await?;

    let assets = params.assets.unwrap_or_default();
    let changes = match &params.new_meta {
        Some(meta) => VideoChanges::decode(store, ctx, meta.as_slice(), &assets).await?,
        None => None,
    };

    if let Some(changes) = changes {
        let owner = actor.asset_owner(&video.channel);
        changes.apply(store, ctx, &mut video, &owner).await?;
    }
    video.updated_at = ctx.block_timestamp;
    store.save_video(&video).await?;

    record(store, ctx, EventData::VideoUpdated { video: video_id }).await
}

/// `content.VideoDeleted(actor, video_id)`
pub async fn video_deleted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let video_id: VideoId = ctx.param(1, "video_id")?;

    let video: Video = resolver::get(store, ctx, &video_id).await?;
    store.remove_video(&video.id).await?;

    record(store, ctx, EventData::VideoDeleted { video: video_id }).await
}

/// `content.VideoCensored` / `content.VideoUncensored(actor, video_id, rationale)`
pub async fn video_censorship(
    store: &mut Store<'_>,
    ctx: &EventContext,
    is_censored: bool,
) -> Result<()> {
    let video_id: VideoId = ctx.param(1, "video_id")?;
    let rationale = text_param(ctx, 2, "rationale")?;

    let mut video: Video = resolver::get(store, ctx, &video_id).await?;
    video.is_censored = is_censored;
    video.updated_at = ctx.block_timestamp;
    store.save_video(&video).await?;

    record(
        store,
        ctx,
        EventData::VideoCensorshipUpdated {
            video: video_id,
            is_censored,
            rationale,
        },
    )
    .await
}

/// `content.FeaturedVideosSet(actor, video_ids)`
pub async fn featured_videos_set(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let video_ids: Vec<VideoId> = ctx.param(1, "video_ids")?;

    let diff = membership::recompute(store, ctx, MembershipSet::FeaturedVideos, &video_ids).await?;

    info!(
        added = diff.added.len(),
        removed = diff.removed.len(),
        "Featured videos updated"
    );

    record(store, ctx, EventData::FeaturedVideosSet { videos: video_ids }).await
}
