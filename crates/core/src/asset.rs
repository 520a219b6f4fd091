//! Asset descriptors and stored data objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{Bytes, ChannelId, ContentId, CuratorGroupId, MemberId};

/// Raw asset descriptor supplied alongside content metadata.
///
/// Metadata refers to these by position within the event's asset vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawAsset {
    /// Asset hosted elsewhere, as an ordered list of URLs.
    Urls(Vec<String>),
    /// Asset uploaded to the storage system.
    Upload(ContentParameters),
}

/// Parameters of an uploaded asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentParameters {
    /// Content id assigned by the uploader.
    pub content_id: Bytes,
    /// Data object type id.
    pub type_id: u64,
    /// Size in bytes.
    pub size: u64,
    /// Content-addressed (IPFS) id.
    pub ipfs_content_id: Bytes,
}

/// A storage provider's judgement on an uploaded data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiaisonJudgement {
    /// Not yet accepted.
    Pending,
    /// Accepted by the liaison.
    Accepted,
}

/// Availability of an asset slot as seen by readers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetAvailability {
    /// Waiting for storage acceptance.
    Pending,
    /// Ready to be served.
    Accepted,
}

impl From<LiaisonJudgement> for AssetAvailability {
    fn from(judgement: LiaisonJudgement) -> Self {
        match judgement {
            LiaisonJudgement::Pending => AssetAvailability::Pending,
            LiaisonJudgement::Accepted => AssetAvailability::Accepted,
        }
    }
}

macro_rules! string_enum {
    ($name:ident, $field:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// Stored form.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(CoreError::UnknownVariant {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(LiaisonJudgement, "liaison judgement", {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
});

string_enum!(AssetAvailability, "asset availability", {
    Pending => "PENDING",
    Accepted => "ACCEPTED",
});

/// Owner of a data object.
///
/// Content uploads are always channel-owned today; member and curator group
/// ownership is part of the storage model for other upload paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataObjectOwner {
    /// Owned by a member.
    Member(MemberId),
    /// Owned by a channel.
    Channel(ChannelId),
    /// Owned by a curator group.
    CuratorGroup(CuratorGroupId),
}

impl DataObjectOwner {
    /// Stored tag.
    pub fn kind(&self) -> &'static str {
        match self {
            DataObjectOwner::Member(_) => "Member",
            DataObjectOwner::Channel(_) => "Channel",
            DataObjectOwner::CuratorGroup(_) => "CuratorGroup",
        }
    }

    /// Stored owner id.
    pub fn id(&self) -> &str {
        match self {
            DataObjectOwner::Member(id) => id.as_str(),
            DataObjectOwner::Channel(id) => id.as_str(),
            DataObjectOwner::CuratorGroup(id) => id.as_str(),
        }
    }

    /// Rebuild an owner from its stored columns.
    pub fn from_parts(kind: &str, id: &str) -> Result<Self, CoreError> {
        match kind {
            "Member" => Ok(DataObjectOwner::Member(MemberId::from(id))),
            "Channel" => Ok(DataObjectOwner::Channel(ChannelId::from(id))),
            "CuratorGroup" => Ok(DataObjectOwner::CuratorGroup(CuratorGroupId::from(id))),
            other => Err(CoreError::UnknownVariant {
                field: "data object owner",
                value: other.to_string(),
            }),
        }
    }
}

/// Content of one asset slot (cover photo, avatar, thumbnail, media).
///
/// A slot holds either a URL list or a stored data object, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetRef {
    /// Hosted elsewhere.
    Urls(Vec<String>),
    /// Stored data object and its derived availability.
    DataObject {
        /// Data object id.
        id: ContentId,
        /// Availability derived from the liaison judgement.
        availability: AssetAvailability,
    },
}

impl AssetRef {
    /// Availability readers should report for this slot.
    ///
    /// URL assets are always considered available.
    pub fn availability(&self) -> AssetAvailability {
        match self {
            AssetRef::Urls(_) => AssetAvailability::Accepted,
            AssetRef::DataObject { availability, .. } => *availability,
        }
    }

    /// URL list, when the slot is URL-backed.
    pub fn urls(&self) -> Option<&[String]> {
        match self {
            AssetRef::Urls(urls) => Some(urls),
            AssetRef::DataObject { .. } => None,
        }
    }

    /// Data object id, when the slot is storage-backed.
    pub fn data_object(&self) -> Option<&ContentId> {
        match self {
            AssetRef::Urls(_) => None,
            AssetRef::DataObject { id, .. } => Some(id),
        }
    }
}
