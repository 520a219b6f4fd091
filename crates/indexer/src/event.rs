//! Inbound runtime events and the immutable event records derived from them.

use querynode_core::{
    Bytes, CategoryId, ChannelCategoryId, ChannelId, ContentId, EventId, MemberId, PostId,
    ThreadId, VideoCategoryId, VideoId, WorkerId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::guard;

/// All events of one block, in on-chain order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockEvents {
    /// Block number.
    pub block_number: u64,
    /// Block timestamp (unix milliseconds).
    pub block_timestamp: i64,
    /// Events emitted in the block.
    #[serde(default)]
    pub events: Vec<SubstrateEvent>,
}

/// A runtime event as delivered by the event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateEvent {
    /// `section.Method`, e.g. `forum.CategoryCreated`.
    pub name: String,
    /// Position of the event within its block.
    pub index_in_block: u32,
    /// Hash of the extrinsic that emitted the event.
    #[serde(default)]
    pub extrinsic_hash: Option<String>,
    /// Positional, chain-encoded parameters.
    #[serde(default)]
    pub params: Vec<Value>,
}

/// Everything a handler knows about the event it is projecting.
#[derive(Debug, Clone)]
pub struct EventContext {
    /// `section.Method`.
    pub name: String,
    /// Id of the event record this event produces.
    pub event_id: EventId,
    /// Block number.
    pub block_number: u64,
    /// Block timestamp (unix milliseconds).
    pub block_timestamp: i64,
    /// Position within the block.
    pub index_in_block: u32,
    /// Emitting extrinsic.
    pub extrinsic_hash: Option<String>,
    params: Vec<Value>,
}

impl EventContext {
    /// Build the context for `event` within `block`.
    pub fn new(block: &BlockEvents, event: &SubstrateEvent) -> Self {
        Self {
            name: event.name.clone(),
            event_id: EventId::new(block.block_number, event.index_in_block),
            block_number: block.block_number,
            block_timestamp: block.block_timestamp,
            index_in_block: event.index_in_block,
            extrinsic_hash: event.extrinsic_hash.clone(),
            params: event.params.clone(),
        }
    }

    /// Decode the positional parameter at `index`.
    ///
    /// A missing parameter decodes as `null`, so optional parameters may be
    /// omitted. A parameter that does not decode means the runtime and the
    /// projector disagree on the event shape.
    pub fn param<T: DeserializeOwned>(&self, index: usize, name: &str) -> Result<T> {
        let value = self.params.get(index).cloned().unwrap_or(Value::Null);
        serde_json::from_value(value).map_err(|e| {
            guard::inconsistent(
                self,
                format!("parameter #{} ({}) does not decode: {}", index, name, e),
            )
        })
    }

    /// Build the immutable record for this event.
    pub fn record(&self, data: EventData) -> EventRecord {
        EventRecord {
            id: self.event_id.clone(),
            event_type: self.name.clone(),
            in_block: self.block_number,
            index_in_block: self.index_in_block,
            in_extrinsic: self.extrinsic_hash.clone(),
            created_at: self.block_timestamp,
            data,
        }
    }
}

/// Immutable audit record of a projected event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// `"{block}-{index}"`.
    pub id: EventId,
    /// `section.Method` of the runtime event.
    pub event_type: String,
    /// Block number.
    pub in_block: u64,
    /// Position within the block.
    pub index_in_block: u32,
    /// Emitting extrinsic.
    pub in_extrinsic: Option<String>,
    /// Block timestamp (unix milliseconds).
    pub created_at: i64,
    /// Event-specific payload.
    pub data: EventData,
}

/// Event-specific payload of an [`EventRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[allow(missing_docs)]
pub enum EventData {
    // Forum
    CategoryCreated {
        category: CategoryId,
    },
    CategoryUpdated {
        category: CategoryId,
        new_archival_status: bool,
        actor: WorkerId,
    },
    CategoryDeleted {
        category: CategoryId,
        actor: WorkerId,
    },
    ThreadCreated {
        thread: ThreadId,
        title: String,
        text: String,
    },
    ThreadModerated {
        thread: ThreadId,
        rationale: String,
        actor: WorkerId,
    },
    ThreadTitleUpdated {
        thread: ThreadId,
        new_title: String,
    },
    ThreadDeleted {
        thread: ThreadId,
    },
    ThreadMoved {
        thread: ThreadId,
        old_category: CategoryId,
        new_category: CategoryId,
        actor: WorkerId,
    },
    VoteOnPoll {
        poll_alternative: i64,
        voting_member: MemberId,
    },
    PostAdded {
        post: PostId,
        is_editable: bool,
        text: String,
    },
    PostModerated {
        post: PostId,
        rationale: String,
        actor: WorkerId,
    },
    PostDeleted {
        posts: Vec<PostId>,
        rationale: String,
        actor: MemberId,
    },
    PostTextUpdated {
        post: PostId,
        new_text: String,
    },
    CategoryStickyThreadUpdate {
        category: CategoryId,
        new_sticky_threads: Vec<ThreadId>,
        actor: WorkerId,
    },
    CategoryMembershipOfModeratorUpdated {
        category: CategoryId,
        moderator: WorkerId,
        new_can_moderate_value: bool,
    },

    // Content
    ChannelCreated {
        channel: ChannelId,
    },
    ChannelUpdated {
        channel: ChannelId,
    },
    ChannelCensorshipUpdated {
        channel: ChannelId,
        is_censored: bool,
        rationale: String,
    },
    ChannelCategoryCreated {
        category: ChannelCategoryId,
    },
    ChannelCategoryUpdated {
        category: ChannelCategoryId,
    },
    ChannelCategoryDeleted {
        category: ChannelCategoryId,
    },
    VideoCategoryCreated {
        category: VideoCategoryId,
    },
    VideoCategoryUpdated {
        category: VideoCategoryId,
    },
    VideoCategoryDeleted {
        category: VideoCategoryId,
    },
    VideoCreated {
        channel: ChannelId,
        video: VideoId,
    },
    VideoUpdated {
        video: VideoId,
    },
    VideoDeleted {
        video: VideoId,
    },
    VideoCensorshipUpdated {
        video: VideoId,
        is_censored: bool,
        rationale: String,
    },
    FeaturedVideosSet {
        videos: Vec<VideoId>,
    },

    // Storage
    ContentAccepted {
        content: ContentId,
        storage_provider: u64,
    },
}

/// Text of a byte parameter, as the runtime stores free-form text.
pub fn text(bytes: &Bytes) -> String {
    bytes.to_text()
}
