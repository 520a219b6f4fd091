//! Content directory storage operations.

use querynode_core::{
    AssetAvailability, ChannelCategoryId, ChannelId, ChannelOwner, ContentId, CuratorGroupId,
    DataObjectOwner, LiaisonJudgement, MemberId, VideoCategoryId, VideoId,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{
    decode_error, opt_u32, opt_u64, slot_from_row, Channel, ContentCategory, DataObject,
    MediaMetadata, NewLicense, SlotColumns, Store, Video,
};
use crate::error::Result;

/// Which content category table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryTable {
    /// `channel_categories`
    Channel,
    /// `video_categories`
    Video,
}

impl CategoryTable {
    fn name(self) -> &'static str {
        match self {
            CategoryTable::Channel => "channel_categories",
            CategoryTable::Video => "video_categories",
        }
    }
}

/// Slot columns of every asset-bearing table, as `(table, prefix)`.
const ASSET_SLOTS: &[(&str, &str)] = &[
    ("channels", "cover_photo"),
    ("channels", "avatar_photo"),
    ("videos", "thumbnail_photo"),
    ("videos", "media"),
];

fn channel_from_row(row: &SqliteRow) -> std::result::Result<Channel, sqlx::Error> {
    let owner_member: Option<String> = row.try_get("owner_member_id")?;
    let owner_group: Option<String> = row.try_get("owner_curator_group_id")?;
    let owner = match (owner_member, owner_group) {
        (Some(member), _) => Some(ChannelOwner::Member(MemberId::from(member))),
        (None, Some(group)) => Some(ChannelOwner::CuratorGroup(CuratorGroupId::from(group))),
        (None, None) => None,
    };

    Ok(Channel {
        id: ChannelId::from(row.try_get::<String, _>("id")?),
        owner,
        category: row
            .try_get::<Option<String>, _>("category_id")?
            .map(ChannelCategoryId::from),
        reward_account: row.try_get("reward_account")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        is_public: row.try_get("is_public")?,
        is_censored: row.try_get("is_censored")?,
        language: row.try_get("language_id")?,
        cover_photo: slot_from_row(row, "cover_photo")?,
        avatar_photo: slot_from_row(row, "avatar_photo")?,
        created_in_block: row.try_get::<i64, _>("created_in_block")? as u64,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn video_from_row(row: &SqliteRow) -> std::result::Result<Video, sqlx::Error> {
    let media_metadata = if row.try_get::<bool, _>("has_media_metadata")? {
        Some(MediaMetadata {
            codec_name: row.try_get("media_codec_name")?,
            container: row.try_get("media_container")?,
            mime_media_type: row.try_get("media_mime_type")?,
            pixel_width: opt_u32(row.try_get("media_pixel_width")?)?,
            pixel_height: opt_u32(row.try_get("media_pixel_height")?)?,
            size: opt_u64(row.try_get("media_size")?)?,
        })
    } else {
        None
    };

    Ok(Video {
        id: VideoId::from(row.try_get::<String, _>("id")?),
        channel: ChannelId::from(row.try_get::<String, _>("channel_id")?),
        category: row
            .try_get::<Option<String>, _>("category_id")?
            .map(VideoCategoryId::from),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        duration: opt_u32(row.try_get("duration")?)?,
        language: row.try_get("language_id")?,
        license: row.try_get("license_id")?,
        has_marketing: row.try_get("has_marketing")?,
        published_before_joystream: row.try_get("published_before_joystream")?,
        is_public: row.try_get("is_public")?,
        is_explicit: row.try_get("is_explicit")?,
        is_censored: row.try_get("is_censored")?,
        is_featured: row.try_get("is_featured")?,
        thumbnail_photo: slot_from_row(row, "thumbnail_photo")?,
        media: slot_from_row(row, "media")?,
        media_metadata,
        created_in_block: row.try_get::<i64, _>("created_in_block")? as u64,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn category_from_row<Id: From<String>>(
    row: &SqliteRow,
) -> std::result::Result<ContentCategory<Id>, sqlx::Error> {
    Ok(ContentCategory {
        id: Id::from(row.try_get::<String, _>("id")?),
        name: row.try_get("name")?,
        created_in_block: row.try_get::<i64, _>("created_in_block")? as u64,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn data_object_from_row(row: &SqliteRow) -> std::result::Result<DataObject, sqlx::Error> {
    let owner_kind: String = row.try_get("owner_kind")?;
    let owner_id: String = row.try_get("owner_id")?;
    let judgement: String = row.try_get("liaison_judgement")?;

    Ok(DataObject {
        id: ContentId::from(row.try_get::<String, _>("id")?),
        owner: DataObjectOwner::from_parts(&owner_kind, &owner_id).map_err(decode_error)?,
        created_in_block: row.try_get::<i64, _>("created_in_block")? as u64,
        type_id: row.try_get::<i64, _>("type_id")? as u64,
        size: row.try_get::<i64, _>("size")? as u64,
        liaison_judgement: judgement
            .parse::<LiaisonJudgement>()
            .map_err(decode_error)?,
        ipfs_content_id: row.try_get("ipfs_content_id")?,
    })
}

impl Store<'_> {
    /// Get a channel.
    pub async fn channel(&mut self, id: &ChannelId) -> Result<Option<Channel>> {
        let row = sqlx::query("SELECT * FROM channels WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.as_ref().map(channel_from_row).transpose()?)
    }

    /// Insert or replace a channel.
    pub async fn save_channel(&mut self, channel: &Channel) -> Result<()> {
        let cover = SlotColumns::from_slot(channel.cover_photo.as_ref())?;
        let avatar = SlotColumns::from_slot(channel.avatar_photo.as_ref())?;
        let owner_member = channel.owner.as_ref().and_then(|o| o.member());
        let owner_group = channel.owner.as_ref().and_then(|o| o.curator_group());

        sqlx::query(
            r#"
            INSERT INTO channels (
                id, owner_member_id, owner_curator_group_id, category_id, reward_account,
                title, description, is_public, is_censored, language_id,
                cover_photo_urls, cover_photo_data_object_id, cover_photo_availability,
                avatar_photo_urls, avatar_photo_data_object_id, avatar_photo_availability,
                created_in_block, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_member_id = excluded.owner_member_id,
                owner_curator_group_id = excluded.owner_curator_group_id,
                category_id = excluded.category_id,
                reward_account = excluded.reward_account,
                title = excluded.title,
                description = excluded.description,
                is_public = excluded.is_public,
                is_censored = excluded.is_censored,
                language_id = excluded.language_id,
                cover_photo_urls = excluded.cover_photo_urls,
                cover_photo_data_object_id = excluded.cover_photo_data_object_id,
                cover_photo_availability = excluded.cover_photo_availability,
                avatar_photo_urls = excluded.avatar_photo_urls,
                avatar_photo_data_object_id = excluded.avatar_photo_data_object_id,
                avatar_photo_availability = excluded.avatar_photo_availability,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(channel.id.as_str())
        .bind(owner_member.map(|m| m.as_str()))
        .bind(owner_group.map(|g| g.as_str()))
        .bind(channel.category.as_ref().map(|c| c.as_str()))
        .bind(channel.reward_account.as_deref())
        .bind(channel.title.as_deref())
        .bind(channel.description.as_deref())
        .bind(channel.is_public)
        .bind(channel.is_censored)
        .bind(channel.language.as_deref())
        .bind(cover.urls)
        .bind(cover.data_object)
        .bind(cover.availability)
        .bind(avatar.urls)
        .bind(avatar.data_object)
        .bind(avatar.availability)
        .bind(channel.created_in_block as i64)
        .bind(channel.created_at)
        .bind(channel.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Get a video.
    pub async fn video(&mut self, id: &VideoId) -> Result<Option<Video>> {
        let row = sqlx::query("SELECT * FROM videos WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(row.as_ref().map(video_from_row).transpose()?)
    }

    /// Insert or replace a video.
    pub async fn save_video(&mut self, video: &Video) -> Result<()> {
        let thumbnail = SlotColumns::from_slot(video.thumbnail_photo.as_ref())?;
        let media = SlotColumns::from_slot(video.media.as_ref())?;
        let meta = video.media_metadata.clone().unwrap_or_default();

        sqlx::query(
            r#"
            INSERT INTO videos (
                id, channel_id, category_id, title, description, duration, language_id,
                license_id, has_marketing, published_before_joystream, is_public, is_explicit,
                is_censored, is_featured,
                thumbnail_photo_urls, thumbnail_photo_data_object_id, thumbnail_photo_availability,
                media_urls, media_data_object_id, media_availability,
                has_media_metadata, media_codec_name, media_container, media_mime_type,
                media_pixel_width, media_pixel_height, media_size,
                created_in_block, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                channel_id = excluded.channel_id,
                category_id = excluded.category_id,
                title = excluded.title,
                description = excluded.description,
                duration = excluded.duration,
                language_id = excluded.language_id,
                license_id = excluded.license_id,
                has_marketing = excluded.has_marketing,
                published_before_joystream = excluded.published_before_joystream,
                is_public = excluded.is_public,
                is_explicit = excluded.is_explicit,
                is_censored = excluded.is_censored,
                is_featured = excluded.is_featured,
                thumbnail_photo_urls = excluded.thumbnail_photo_urls,
                thumbnail_photo_data_object_id = excluded.thumbnail_photo_data_object_id,
                thumbnail_photo_availability = excluded.thumbnail_photo_availability,
                media_urls = excluded.media_urls,
                media_data_object_id = excluded.media_data_object_id,
                media_availability = excluded.media_availability,
                has_media_metadata = excluded.has_media_metadata,
                media_codec_name = excluded.media_codec_name,
                media_container = excluded.media_container,
                media_mime_type = excluded.media_mime_type,
                media_pixel_width = excluded.media_pixel_width,
                media_pixel_height = excluded.media_pixel_height,
                media_size = excluded.media_size,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(video.id.as_str())
        .bind(video.channel.as_str())
        .bind(video.category.as_ref().map(|c| c.as_str()))
        .bind(video.title.as_deref())
        .bind(video.description.as_deref())
        .bind(video.duration.map(i64::from))
        .bind(video.language.as_deref())
        .bind(video.license)
        .bind(video.has_marketing)
        .bind(video.published_before_joystream)
        .bind(video.is_public)
        .bind(video.is_explicit)
        .bind(video.is_censored)
        .bind(video.is_featured)
        .bind(thumbnail.urls)
        .bind(thumbnail.data_object)
        .bind(thumbnail.availability)
        .bind(media.urls)
        .bind(media.data_object)
        .bind(media.availability)
        .bind(video.media_metadata.is_some())
        .bind(meta.codec_name)
        .bind(meta.container)
        .bind(meta.mime_media_type)
        .bind(meta.pixel_width.map(i64::from))
        .bind(meta.pixel_height.map(i64::from))
        .bind(meta.size.map(|s| s as i64))
        .bind(video.created_in_block as i64)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Physically remove a video. Returns `false` if it did not exist.
    pub async fn remove_video(&mut self, id: &VideoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(id.as_str())
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a channel or video category.
    pub async fn content_category<Id>(
        &mut self,
        table: CategoryTable,
        id: &Id,
    ) -> Result<Option<ContentCategory<Id>>>
    where
        Id: From<String> + AsRef<str>,
    {
        let row = sqlx::query(&format!(
            "SELECT id, name, created_in_block, created_at, updated_at FROM {} WHERE id = ?",
            table.name()
        ))
        .bind(id.as_ref())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(category_from_row).transpose()?)
    }

    /// Insert or replace a channel or video category.
    pub async fn save_content_category<Id: AsRef<str>>(
        &mut self,
        table: CategoryTable,
        category: &ContentCategory<Id>,
    ) -> Result<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO {} (id, name, created_in_block, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                updated_at = excluded.updated_at
            "#,
            table.name()
        ))
        .bind(category.id.as_ref())
        .bind(category.name.as_deref())
        .bind(category.created_in_block as i64)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Physically remove a channel or video category.
    pub async fn remove_content_category(
        &mut self,
        table: CategoryTable,
        id: &str,
    ) -> Result<bool> {
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", table.name()))
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a data object.
    pub async fn data_object(&mut self, id: &ContentId) -> Result<Option<DataObject>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner_kind, owner_id, created_in_block, type_id, size,
                   liaison_judgement, ipfs_content_id
            FROM data_objects
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(data_object_from_row).transpose()?)
    }

    /// Insert or replace a data object.
    pub async fn save_data_object(&mut self, object: &DataObject) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO data_objects (
                id, owner_kind, owner_id, created_in_block, type_id, size,
                liaison_judgement, ipfs_content_id
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                owner_kind = excluded.owner_kind,
                owner_id = excluded.owner_id,
                type_id = excluded.type_id,
                size = excluded.size,
                liaison_judgement = excluded.liaison_judgement,
                ipfs_content_id = excluded.ipfs_content_id
            "#,
        )
        .bind(object.id.as_str())
        .bind(object.owner.kind())
        .bind(object.owner.id())
        .bind(object.created_in_block as i64)
        .bind(object.type_id as i64)
        .bind(object.size as i64)
        .bind(object.liaison_judgement.as_str())
        .bind(&object.ipfs_content_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Rewrite the denormalized availability of every slot pointing at a
    /// data object. Returns the number of slots touched.
    pub async fn set_slot_availability(
        &mut self,
        id: &ContentId,
        availability: AssetAvailability,
        updated_at: i64,
    ) -> Result<u64> {
        let mut touched = 0;

        for (table, prefix) in ASSET_SLOTS {
            let result = sqlx::query(&format!(
                "UPDATE {table} SET {prefix}_availability = ?, updated_at = ? WHERE {prefix}_data_object_id = ?"
            ))
            .bind(availability.as_str())
            .bind(updated_at)
            .bind(id.as_str())
            .execute(&mut *self.conn)
            .await?;

            touched += result.rows_affected();
        }

        Ok(touched)
    }

    /// True if a language row exists for the ISO code.
    pub async fn language_exists(&mut self, iso: &str) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM languages WHERE id = ?")
            .bind(iso)
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// Insert a language keyed by its ISO code, if missing.
    pub async fn ensure_language(&mut self, iso: &str, block: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO languages (id, created_in_block)
            VALUES (?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(iso)
        .bind(block as i64)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Insert a license. Returns the new row id.
    pub async fn insert_license(&mut self, license: &NewLicense, block: u64) -> Result<i64> {
        let id = sqlx::query(
            r#"
            INSERT INTO licenses (code, attribution, custom_text, created_in_block)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(license.code.map(i64::from))
        .bind(license.attribution.as_deref())
        .bind(license.custom_text.as_deref())
        .bind(block as i64)
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Get a stored license.
    pub async fn license(&mut self, id: i64) -> Result<Option<NewLicense>> {
        let row = sqlx::query("SELECT code, attribution, custom_text FROM licenses WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(NewLicense {
            code: opt_u32(row.get("code"))?,
            attribution: row.get("attribution"),
            custom_text: row.get("custom_text"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::setup_storage;
    use querynode_core::AssetRef;

    #[tokio::test]
    async fn test_channel_round_trip_with_slots() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        let mut channel = Channel::new(ChannelId::from(1), 10, 1_000);
        channel.owner = Some(ChannelOwner::Member(MemberId::from(3)));
        channel.title = Some("News".to_string());
        channel.cover_photo = Some(AssetRef::Urls(vec!["https://a".to_string()]));
        channel.avatar_photo = Some(AssetRef::DataObject {
            id: ContentId::from("0x01"),
            availability: AssetAvailability::Pending,
        });
        store.save_channel(&channel).await.unwrap();

        assert_eq!(store.channel(&channel.id).await.unwrap().unwrap(), channel);
    }

    #[tokio::test]
    async fn test_slot_availability_follows_data_object() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        let object = ContentId::from("0xaa");
        let mut video = Video::new(VideoId::from(1), ChannelId::from(1), 10, 1_000);
        video.media = Some(AssetRef::DataObject {
            id: object.clone(),
            availability: AssetAvailability::Pending,
        });
        video.media_metadata = Some(MediaMetadata {
            size: Some(2048),
            ..Default::default()
        });
        store.save_video(&video).await.unwrap();

        let touched = store
            .set_slot_availability(&object, AssetAvailability::Accepted, 2_000)
            .await
            .unwrap();
        assert_eq!(touched, 1);

        let loaded = store.video(&video.id).await.unwrap().unwrap();
        assert_eq!(loaded.media.unwrap().availability(), AssetAvailability::Accepted);
        assert_eq!(loaded.media_metadata.unwrap().size, Some(2048));
        assert_eq!(loaded.updated_at, 2_000);
    }

    #[tokio::test]
    async fn test_categories_and_removal() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        let category = ContentCategory {
            id: VideoCategoryId::from(2),
            name: Some("Music".to_string()),
            created_in_block: 1,
            created_at: 1_000,
            updated_at: 1_000,
        };
        store
            .save_content_category(CategoryTable::Video, &category)
            .await
            .unwrap();

        let loaded = store
            .content_category(CategoryTable::Video, &category.id)
            .await
            .unwrap();
        assert_eq!(loaded, Some(category.clone()));

        // Same id in the other table is unrelated.
        assert!(store
            .content_category(CategoryTable::Channel, &ChannelCategoryId::from(2))
            .await
            .unwrap()
            .is_none());

        assert!(store
            .remove_content_category(CategoryTable::Video, category.id.as_str())
            .await
            .unwrap());
        assert!(!store
            .remove_content_category(CategoryTable::Video, category.id.as_str())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_language_and_license() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        store.ensure_language("en", 1).await.unwrap();
        store.ensure_language("en", 2).await.unwrap();
        assert!(store.language_exists("en").await.unwrap());

        let license = NewLicense {
            code: Some(1002),
            attribution: None,
            custom_text: Some("custom".to_string()),
        };
        let first = store.insert_license(&license, 1).await.unwrap();
        let second = store.insert_license(&license, 1).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.license(first).await.unwrap(), Some(license));
    }
}
