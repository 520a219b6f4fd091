//! Actors named by runtime events.

use serde::{Deserialize, Serialize};

use crate::types::{ChannelId, CuratorGroupId, MemberId};

/// Actor allowed to perform forum moderation.
///
/// Serialized externally tagged, as the runtime emits it: `"Lead"` or
/// `{"Moderator": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivilegedActor {
    /// The forum working group lead.
    Lead,
    /// A forum moderator, by runtime worker id.
    Moderator(u64),
}

/// Actor performing a content directory action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentActor {
    /// The content working group lead.
    Lead,
    /// A curator `(curator group id, curator id)`.
    Curator(u64, u64),
    /// A member.
    Member(u64),
}

/// Owner of a channel as stored on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOwner {
    /// Member-owned channel.
    Member(MemberId),
    /// Channel owned by a curator group.
    CuratorGroup(CuratorGroupId),
}

impl ChannelOwner {
    /// Member id, for member-owned channels.
    pub fn member(&self) -> Option<&MemberId> {
        match self {
            ChannelOwner::Member(id) => Some(id),
            ChannelOwner::CuratorGroup(_) => None,
        }
    }

    /// Curator group id, for curator-owned channels.
    pub fn curator_group(&self) -> Option<&CuratorGroupId> {
        match self {
            ChannelOwner::Member(_) => None,
            ChannelOwner::CuratorGroup(id) => Some(id),
        }
    }
}

impl ContentActor {
    /// Data object owner for assets uploaded by this actor into `channel`.
    ///
    /// Channel content always belongs to the channel, whoever uploads it.
    pub fn asset_owner(&self, channel: &ChannelId) -> crate::asset::DataObjectOwner {
        crate::asset::DataObjectOwner::Channel(channel.clone())
    }
}
