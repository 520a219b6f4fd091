//! Projected entities as stored in the database.
//!
//! Timestamps are unix milliseconds taken from the block that caused the
//! write. References to entities that may never be created separately
//! (authors, parent categories) are bare ids.

use querynode_core::{
    AssetRef, CategoryId, CategoryStatus, ChannelCategoryId, ChannelId, ChannelOwner, ContentId,
    DataObjectOwner, LiaisonJudgement, MemberId, PostId, PostOrigin, PostStatus, ThreadId,
    ThreadStatus, VideoCategoryId, VideoId, WorkerId,
};
use serde::{Deserialize, Serialize};

/// Forum category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Category id
    pub id: CategoryId,

    /// Parent category (not cycle-checked)
    pub parent: Option<CategoryId>,

    /// Title
    pub title: String,

    /// Description
    pub description: String,

    /// Lifecycle status
    pub status: CategoryStatus,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

/// Forum thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thread {
    /// Thread id
    pub id: ThreadId,

    /// Category the thread currently lives in
    pub category: CategoryId,

    /// Author membership
    pub author: MemberId,

    /// Title
    pub title: String,

    /// Pinned within its category
    pub is_sticky: bool,

    /// Lifecycle status
    pub status: ThreadStatus,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

/// Forum post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post id
    pub id: PostId,

    /// Owning thread
    pub thread: ThreadId,

    /// Author membership
    pub author: MemberId,

    /// Post text
    pub text: String,

    /// Lifecycle status
    pub status: PostStatus,

    /// How the post was created
    pub origin: PostOrigin,

    /// Post this one replies to
    pub replies_to: Option<PostId>,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

/// Poll attached to a thread at creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    /// Thread the poll belongs to
    pub thread: ThreadId,

    /// Description
    pub description: String,

    /// End time (unix milliseconds)
    pub end_time: i64,

    /// Alternatives, in index order
    pub alternatives: Vec<String>,
}

/// A stored poll alternative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAlternative {
    /// Row id
    pub id: i64,

    /// Position within the poll
    pub index: u32,

    /// Alternative text
    pub text: String,
}

/// Working group worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Worker {
    /// `"{group}-{runtimeId}"`
    pub id: WorkerId,

    /// Working group id, e.g. `forumWorkingGroup`
    pub group_id: String,

    /// Worker id within the group
    pub runtime_id: u64,

    /// Membership backing the worker
    pub membership: Option<MemberId>,

    /// Group lead
    pub is_lead: bool,

    /// Currently employed
    pub is_active: bool,
}

/// Content channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    /// Channel id
    pub id: ChannelId,

    /// On-chain owner
    pub owner: Option<ChannelOwner>,

    /// Channel category
    pub category: Option<ChannelCategoryId>,

    /// Reward account
    pub reward_account: Option<String>,

    /// Title
    pub title: Option<String>,

    /// Description
    pub description: Option<String>,

    /// Public visibility
    pub is_public: Option<bool>,

    /// Censored by a curator
    pub is_censored: bool,

    /// ISO-639-1 language code
    pub language: Option<String>,

    /// Cover photo slot
    pub cover_photo: Option<AssetRef>,

    /// Avatar photo slot
    pub avatar_photo: Option<AssetRef>,

    /// Block the channel was created in
    pub created_in_block: u64,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

impl Channel {
    /// A channel with no metadata applied yet.
    pub fn new(id: ChannelId, block: u64, at: i64) -> Self {
        Self {
            id,
            owner: None,
            category: None,
            reward_account: None,
            title: None,
            description: None,
            is_public: None,
            is_censored: false,
            language: None,
            cover_photo: None,
            avatar_photo: None,
            created_in_block: block,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Encoding and dimensions of a video's media.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaMetadata {
    /// Codec name
    pub codec_name: Option<String>,

    /// Container format
    pub container: Option<String>,

    /// MIME media type
    pub mime_media_type: Option<String>,

    /// Width in pixels
    pub pixel_width: Option<u32>,

    /// Height in pixels
    pub pixel_height: Option<u32>,

    /// Size in bytes, from the uploaded media asset
    pub size: Option<u64>,
}

/// Video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Video {
    /// Video id
    pub id: VideoId,

    /// Owning channel
    pub channel: ChannelId,

    /// Video category
    pub category: Option<VideoCategoryId>,

    /// Title
    pub title: Option<String>,

    /// Description
    pub description: Option<String>,

    /// Duration in seconds
    pub duration: Option<u32>,

    /// ISO-639-1 language code
    pub language: Option<String>,

    /// License row id
    pub license: Option<i64>,

    /// Contains paid promotion
    pub has_marketing: Option<bool>,

    /// First publication elsewhere (unix milliseconds)
    pub published_before_joystream: Option<i64>,

    /// Public visibility
    pub is_public: Option<bool>,

    /// Explicit content
    pub is_explicit: Option<bool>,

    /// Censored by a curator
    pub is_censored: bool,

    /// Member of the featured set
    pub is_featured: bool,

    /// Thumbnail slot
    pub thumbnail_photo: Option<AssetRef>,

    /// Media slot
    pub media: Option<AssetRef>,

    /// Media encoding and dimensions
    pub media_metadata: Option<MediaMetadata>,

    /// Block the video was created in
    pub created_in_block: u64,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

impl Video {
    /// A video with no metadata applied yet.
    pub fn new(id: VideoId, channel: ChannelId, block: u64, at: i64) -> Self {
        Self {
            id,
            channel,
            category: None,
            title: None,
            description: None,
            duration: None,
            language: None,
            license: None,
            has_marketing: None,
            published_before_joystream: None,
            is_public: None,
            is_explicit: None,
            is_censored: false,
            is_featured: false,
            thumbnail_photo: None,
            media: None,
            media_metadata: None,
            created_in_block: block,
            created_at: at,
            updated_at: at,
        }
    }
}

/// Channel or video category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCategory<Id> {
    /// Category id
    pub id: Id,

    /// Display name
    pub name: Option<String>,

    /// Block the category was created in
    pub created_in_block: u64,

    /// Creation time
    pub created_at: i64,

    /// Last update time
    pub updated_at: i64,
}

/// Channel category.
pub type ChannelCategory = ContentCategory<ChannelCategoryId>;

/// Video category.
pub type VideoCategory = ContentCategory<VideoCategoryId>;

/// Data object registered for an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataObject {
    /// `0x`-hex content id
    pub id: ContentId,

    /// Owner
    pub owner: DataObjectOwner,

    /// Block the object was registered in
    pub created_in_block: u64,

    /// Data object type id
    pub type_id: u64,

    /// Size in bytes
    pub size: u64,

    /// Liaison judgement
    pub liaison_judgement: LiaisonJudgement,

    /// Content-addressed id
    pub ipfs_content_id: String,
}

/// License to insert for a video.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewLicense {
    /// Known license code
    pub code: Option<u32>,

    /// Attribution
    pub attribution: Option<String>,

    /// Custom text
    pub custom_text: Option<String>,
}

/// Indexer progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Last block whose events were fully projected; `None` before the first
    pub last_block_number: Option<u64>,

    /// When the cursor last moved (unix seconds)
    pub updated_at: i64,
}
