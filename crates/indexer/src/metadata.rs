//! Metadata decode pipeline.
//!
//! A payload decodes into a sparse changeset: only fields present in the
//! payload are touched when the changeset is applied. Decoding is read-only
//! and performs every consistency check (asset positions, language codes,
//! category existence), so a fatal problem surfaces before anything is
//! written. Applying the changeset performs the writes (languages, licenses,
//! data objects) and merges into the entity.

use chrono::{DateTime, NaiveDate};
use querynode_core::language::validate_iso_639_1;
use querynode_core::metadata::{self, ChannelMetadata, ForumPostMetadata, MediaType, VideoMetadata};
use querynode_core::{
    ChannelCategoryId, DataObjectOwner, PostId, RawAsset, VideoCategoryId,
};
use tracing::debug;

use crate::assets::{self, Extracted};
use crate::error::Result;
use crate::event::EventContext;
use crate::guard;
use crate::resolver;
use crate::storage::{
    Channel, ChannelCategory, ContentCategory, MediaMetadata, NewLicense, Store, Video,
    VideoCategory,
};

fn decode_or_omit<M: prost::Message + Default>(
    ctx: &EventContext,
    field: &str,
    bytes: &[u8],
) -> Option<M> {
    match metadata::decode::<M>(bytes) {
        Ok(message) => Some(message),
        Err(e) => guard::omission(ctx, field, e),
    }
}

fn language_code(ctx: &EventContext, language: Option<String>) -> Result<Option<String>> {
    match language {
        Some(code) if !code.is_empty() => {
            guard::check(ctx, validate_iso_639_1(&code))?;
            Ok(Some(code))
        }
        _ => Ok(None),
    }
}

/// Parse an RFC 3339 timestamp or a plain `YYYY-MM-DD` date into unix
/// milliseconds.
pub fn parse_date(input: &str) -> Option<i64> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(input) {
        return Some(datetime.timestamp_millis());
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc().timestamp_millis())
}

/// Changes carried by a channel metadata payload.
#[derive(Debug, Default)]
pub struct ChannelChanges<'a> {
    title: Option<String>,
    description: Option<String>,
    is_public: Option<bool>,
    language: Option<String>,
    category: Option<ChannelCategoryId>,
    cover_photo: Option<&'a RawAsset>,
    avatar_photo: Option<&'a RawAsset>,
}

impl<'a> ChannelChanges<'a> {
    /// Decode and validate a channel payload.
    ///
    /// An undecodable payload yields `None`: nothing is changed.
    pub async fn decode(
        store: &mut Store<'_>,
        ctx: &EventContext,
        bytes: &[u8],
        assets: &'a [RawAsset],
    ) -> Result<Option<Self>> {
        let Some(meta) = decode_or_omit::<ChannelMetadata>(ctx, "channel metadata", bytes) else {
            return Ok(None);
        };

        let category = match meta.category {
            Some(id) => {
                let category: ChannelCategory =
                    resolver::get(store, ctx, &ChannelCategoryId::from(id)).await?;
                Some(category.id)
            }
            None => None,
        };

        Ok(Some(Self {
            title: meta.title,
            description: meta.description,
            is_public: meta.is_public,
            language: language_code(ctx, meta.language)?,
            category,
            cover_photo: meta
                .cover_photo
                .map(|index| assets::select(ctx, index, assets))
                .transpose()?,
            avatar_photo: meta
                .avatar_photo
                .map(|index| assets::select(ctx, index, assets))
                .transpose()?,
        }))
    }

    /// Merge into `channel`, registering languages and data objects.
    pub async fn apply(
        self,
        store: &mut Store<'_>,
        ctx: &EventContext,
        channel: &mut Channel,
        owner: &DataObjectOwner,
    ) -> Result<()> {
        if let Some(title) = self.title {
            channel.title = Some(title);
        }
        if let Some(description) = self.description {
            channel.description = Some(description);
        }
        if let Some(is_public) = self.is_public {
            channel.is_public = Some(is_public);
        }
        if let Some(category) = self.category {
            channel.category = Some(category);
        }
        if let Some(code) = self.language {
            channel.language = Some(resolver::language(store, ctx, &code).await?);
        }
        if let Some(asset) = self.cover_photo {
            channel.cover_photo = Some(assets::materialize(store, ctx, asset, owner).await?.slot);
        }
        if let Some(asset) = self.avatar_photo {
            channel.avatar_photo = Some(assets::materialize(store, ctx, asset, owner).await?.slot);
        }

        Ok(())
    }
}

/// Changes carried by a video metadata payload.
#[derive(Debug, Default)]
pub struct VideoChanges<'a> {
    title: Option<String>,
    description: Option<String>,
    duration: Option<u32>,
    language: Option<String>,
    license: Option<NewLicense>,
    category: Option<VideoCategoryId>,
    thumbnail_photo: Option<&'a RawAsset>,
    media: Option<&'a RawAsset>,
    media_type: Option<MediaType>,
    media_pixel_width: Option<u32>,
    media_pixel_height: Option<u32>,
    has_marketing: Option<bool>,
    is_public: Option<bool>,
    is_explicit: Option<bool>,
    published_before_joystream: Option<i64>,
}

impl<'a> VideoChanges<'a> {
    /// Decode and validate a video payload.
    ///
    /// An undecodable payload yields `None`: nothing is changed.
    pub async fn decode(
        store: &mut Store<'_>,
        ctx: &EventContext,
        bytes: &[u8],
        assets: &'a [RawAsset],
    ) -> Result<Option<Self>> {
        let Some(meta) = decode_or_omit::<VideoMetadata>(ctx, "video metadata", bytes) else {
            return Ok(None);
        };

        let category = match meta.category {
            Some(id) => {
                let category: VideoCategory =
                    resolver::get(store, ctx, &VideoCategoryId::from(id)).await?;
                Some(category.id)
            }
            None => None,
        };

        let published_before_joystream = meta
            .published_before_joystream
            .and_then(|published| published.date)
            .and_then(|date| match parse_date(&date) {
                Some(ms) => Some(ms),
                None => guard::omission(ctx, "published_before_joystream", format!("unparsable date {:?}", date)),
            });

        Ok(Some(Self {
            title: meta.title,
            description: meta.description,
            duration: meta.duration,
            language: language_code(ctx, meta.language)?,
            license: meta.license.map(|license| NewLicense {
                code: license.code,
                attribution: license.attribution,
                custom_text: license.custom_text,
            }),
            category,
            thumbnail_photo: meta
                .thumbnail_photo
                .map(|index| assets::select(ctx, index, assets))
                .transpose()?,
            media: meta
                .video
                .map(|index| assets::select(ctx, index, assets))
                .transpose()?,
            media_type: meta.media_type,
            media_pixel_width: meta.media_pixel_width,
            media_pixel_height: meta.media_pixel_height,
            has_marketing: meta.has_marketing,
            is_public: meta.is_public,
            is_explicit: meta.is_explicit,
            published_before_joystream,
        }))
    }

    /// Merge into `video`, registering languages, licenses and data objects.
    pub async fn apply(
        self,
        store: &mut Store<'_>,
        ctx: &EventContext,
        video: &mut Video,
        owner: &DataObjectOwner,
    ) -> Result<()> {
        if let Some(title) = self.title {
            video.title = Some(title);
        }
        if let Some(description) = self.description {
            video.description = Some(description);
        }
        if let Some(duration) = self.duration {
            video.duration = Some(duration);
        }
        if let Some(has_marketing) = self.has_marketing {
            video.has_marketing = Some(has_marketing);
        }
        if let Some(is_public) = self.is_public {
            video.is_public = Some(is_public);
        }
        if let Some(is_explicit) = self.is_explicit {
            video.is_explicit = Some(is_explicit);
        }
        if let Some(category) = self.category {
            video.category = Some(category);
        }
        if let Some(code) = self.language {
            video.language = Some(resolver::language(store, ctx, &code).await?);
        }
        if let Some(license) = self.license {
            let id = store.insert_license(&license, ctx.block_number).await?;
            debug!(license = id, video = %video.id, "Created license");
            video.license = Some(id);
        }

        // Cleared on every application, set only from a parsable date.
        video.published_before_joystream = self.published_before_joystream;

        if let Some(asset) = self.thumbnail_photo {
            video.thumbnail_photo =
                Some(assets::materialize(store, ctx, asset, owner).await?.slot);
        }

        let mut media_size = video.media_metadata.as_ref().and_then(|m| m.size);
        if let Some(asset) = self.media {
            let Extracted { slot, size } = assets::materialize(store, ctx, asset, owner).await?;
            video.media = Some(slot);
            media_size = size;
            if let Some(existing) = video.media_metadata.as_mut() {
                existing.size = media_size;
            }
        }

        if let Some(media_type) = self.media_type {
            video.media_metadata = Some(MediaMetadata {
                codec_name: media_type.codec_name,
                container: media_type.container,
                mime_media_type: media_type.mime_media_type,
                pixel_width: self.media_pixel_width,
                pixel_height: self.media_pixel_height,
                size: media_size,
            });
        }

        Ok(())
    }
}

/// Name change carried by a channel or video category payload.
#[derive(Debug, Default)]
pub struct CategoryChanges {
    name: Option<String>,
}

impl CategoryChanges {
    /// Decode a channel category payload.
    pub fn decode_channel(ctx: &EventContext, bytes: &[u8]) -> Option<Self> {
        decode_or_omit::<metadata::ChannelCategoryMetadata>(ctx, "channel category metadata", bytes)
            .map(|meta| Self { name: meta.name })
    }

    /// Decode a video category payload.
    pub fn decode_video(ctx: &EventContext, bytes: &[u8]) -> Option<Self> {
        decode_or_omit::<metadata::VideoCategoryMetadata>(ctx, "video category metadata", bytes)
            .map(|meta| Self { name: meta.name })
    }

    /// Merge into a category.
    pub fn apply<Id>(self, category: &mut ContentCategory<Id>) {
        if let Some(name) = self.name {
            category.name = Some(name);
        }
    }
}

/// Text and reply target of a forum post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostContent {
    /// Post text
    pub text: String,

    /// Post replied to, if the payload names one
    pub replies_to: Option<PostId>,
}

impl PostContent {
    /// Decode a forum post payload.
    ///
    /// Payloads that are not post metadata are taken as the raw post text.
    pub fn decode(bytes: &[u8]) -> Self {
        match metadata::decode::<ForumPostMetadata>(bytes) {
            Ok(ForumPostMetadata {
                text: None,
                replies_to: None,
            })
            | Err(_) => Self {
                text: String::from_utf8_lossy(bytes).into_owned(),
                replies_to: None,
            },
            Ok(meta) => Self {
                text: meta.text.unwrap_or_default(),
                replies_to: meta.replies_to.map(|id| PostId::from(u64::from(id))),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BlockEvents, SubstrateEvent};
    use crate::storage::tests::setup_storage;
    use prost::Message;
    use querynode_core::metadata::PublishedBeforeJoystream;
    use querynode_core::{AssetRef, Bytes, ChannelId, ContentParameters, VideoId};

    fn ctx() -> EventContext {
        let block = BlockEvents {
            block_number: 4,
            block_timestamp: 4_000,
            events: vec![],
        };
        let event = SubstrateEvent {
            name: "content.VideoUpdated".to_string(),
            index_in_block: 0,
            extrinsic_hash: None,
            params: vec![],
        };
        EventContext::new(&block, &event)
    }

    fn owner() -> DataObjectOwner {
        DataObjectOwner::Channel(ChannelId::from(1))
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("1970-01-01T00:00:01Z"), Some(1_000));
        assert_eq!(parse_date("1970-01-02"), Some(86_400_000));
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn test_post_content_fallbacks() {
        let meta = ForumPostMetadata {
            text: Some("hi".to_string()),
            replies_to: Some(4),
        }
        .encode_to_vec();
        assert_eq!(
            PostContent::decode(&meta),
            PostContent {
                text: "hi".to_string(),
                replies_to: Some(PostId::from(4)),
            }
        );

        // Not protobuf at all.
        let raw = PostContent::decode(&[0xff, 0xff, 0xff]);
        assert_eq!(raw.replies_to, None);
        assert_eq!(raw.text, String::from_utf8_lossy(&[0xff, 0xff, 0xff]));

        // Decodes, but carries no post fields: plain text.
        let plain = PostContent::decode(b"");
        assert_eq!(plain.text, "");
    }

    #[tokio::test]
    async fn test_video_changes_are_sparse() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        let mut video = Video::new(VideoId::from(1), ChannelId::from(1), 1, 1_000);
        video.title = Some("Old".to_string());
        video.description = Some("Kept".to_string());
        video.published_before_joystream = Some(5);

        let payload = VideoMetadata {
            title: Some("New".to_string()),
            language: Some("en".to_string()),
            ..Default::default()
        }
        .encode_to_vec();

        let changes = VideoChanges::decode(&mut store, &ctx, &payload, &[])
            .await
            .unwrap()
            .unwrap();
        changes.apply(&mut store, &ctx, &mut video, &owner()).await.unwrap();

        assert_eq!(video.title.as_deref(), Some("New"));
        assert_eq!(video.description.as_deref(), Some("Kept"));
        assert_eq!(video.language.as_deref(), Some("en"));
        // Omitted publication date clears the stored one.
        assert_eq!(video.published_before_joystream, None);
    }

    #[tokio::test]
    async fn test_published_before_survives_when_present() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        let mut video = Video::new(VideoId::from(1), ChannelId::from(1), 1, 1_000);
        let payload = VideoMetadata {
            published_before_joystream: Some(PublishedBeforeJoystream {
                is_published: Some(true),
                date: Some("1970-01-01T00:00:02Z".to_string()),
            }),
            ..Default::default()
        }
        .encode_to_vec();

        VideoChanges::decode(&mut store, &ctx, &payload, &[])
            .await
            .unwrap()
            .unwrap()
            .apply(&mut store, &ctx, &mut video, &owner())
            .await
            .unwrap();
        assert_eq!(video.published_before_joystream, Some(2_000));
    }

    #[tokio::test]
    async fn test_media_metadata_takes_upload_size() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        let assets = vec![RawAsset::Upload(ContentParameters {
            content_id: Bytes(vec![1]),
            type_id: 1,
            size: 4096,
            ipfs_content_id: Bytes(b"Qm".to_vec()),
        })];
        let payload = VideoMetadata {
            video: Some(0),
            media_pixel_width: Some(1920),
            media_pixel_height: Some(1080),
            media_type: Some(MediaType {
                codec_name: Some("h264".to_string()),
                container: Some("mp4".to_string()),
                mime_media_type: Some("video/mp4".to_string()),
            }),
            license: Some(querynode_core::metadata::License {
                code: Some(1001),
                ..Default::default()
            }),
            ..Default::default()
        }
        .encode_to_vec();

        let mut video = Video::new(VideoId::from(1), ChannelId::from(1), 1, 1_000);
        VideoChanges::decode(&mut store, &ctx, &payload, &assets)
            .await
            .unwrap()
            .unwrap()
            .apply(&mut store, &ctx, &mut video, &owner())
            .await
            .unwrap();

        let meta = video.media_metadata.unwrap();
        assert_eq!(meta.size, Some(4096));
        assert_eq!(meta.pixel_width, Some(1920));
        assert_eq!(meta.codec_name.as_deref(), Some("h264"));
        assert!(matches!(video.media, Some(AssetRef::DataObject { .. })));

        let license = store.license(video.license.unwrap()).await.unwrap().unwrap();
        assert_eq!(license.code, Some(1001));
    }

    #[tokio::test]
    async fn test_fatal_checks_happen_before_writes() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        let bad_index = ChannelMetadata {
            language: Some("en".to_string()),
            cover_photo: Some(1),
            ..Default::default()
        }
        .encode_to_vec();
        let assets = vec![RawAsset::Urls(vec![])];
        let err = ChannelChanges::decode(&mut store, &ctx, &bad_index, &assets)
            .await
            .unwrap_err();
        assert!(err.is_inconsistency());
        assert!(!store.language_exists("en").await.unwrap());

        let bad_language = ChannelMetadata {
            language: Some("xx".to_string()),
            ..Default::default()
        }
        .encode_to_vec();
        assert!(ChannelChanges::decode(&mut store, &ctx, &bad_language, &[])
            .await
            .is_err());

        let missing_category = VideoMetadata {
            category: Some(9),
            ..Default::default()
        }
        .encode_to_vec();
        assert!(VideoChanges::decode(&mut store, &ctx, &missing_category, &[])
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_undecodable_payload_changes_nothing() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);
        let ctx = ctx();

        let changes = ChannelChanges::decode(&mut store, &ctx, &[0xff, 0xff], &[])
            .await
            .unwrap();
        assert!(changes.is_none());
        assert!(CategoryChanges::decode_video(&ctx, &[0xff, 0xff]).is_none());
    }
}
