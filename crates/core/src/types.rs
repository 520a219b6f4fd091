//! Core identifier and byte types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Defines a chain entity identifier.
///
/// Runtime ids arrive as JSON numbers, stored ids come back as strings; both
/// deserialize into the same newtype.
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create an id from its string form.
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            /// Borrow the string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                $name(value.to_string())
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                #[derive(Deserialize)]
                #[serde(untagged)]
                enum Raw {
                    Number(u64),
                    Text(String),
                }

                Ok(match Raw::deserialize(deserializer)? {
                    Raw::Number(n) => $name(n.to_string()),
                    Raw::Text(s) => $name(s),
                })
            }
        }
    };
}

entity_id!(
    /// Forum category id.
    CategoryId
);
entity_id!(
    /// Forum thread id.
    ThreadId
);
entity_id!(
    /// Forum post id.
    PostId
);
entity_id!(
    /// Membership id (forum user ids are membership ids).
    MemberId
);
entity_id!(
    /// Worker id, `"{group}-{runtimeId}"`.
    WorkerId
);
entity_id!(
    /// Content channel id.
    ChannelId
);
entity_id!(
    /// Channel category id.
    ChannelCategoryId
);
entity_id!(
    /// Video id.
    VideoId
);
entity_id!(
    /// Video category id.
    VideoCategoryId
);
entity_id!(
    /// Curator group id.
    CuratorGroupId
);
entity_id!(
    /// Data object id: the `0x`-hex joystream content id.
    ContentId
);

impl WorkerId {
    /// Build the worker id for a runtime worker id within a working group.
    pub fn for_group(group: &str, runtime_id: u64) -> Self {
        WorkerId(format!("{}-{}", group, runtime_id))
    }
}

impl ContentId {
    /// Build a content id from the raw content id bytes.
    pub fn from_bytes(bytes: &Bytes) -> Self {
        ContentId(bytes.to_hex())
    }
}

/// Id of an immutable event record.
///
/// Derived from the block coordinates, so it is known before the record is
/// written and status variants can carry it in the same write.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    /// Create the id of the event at `index_in_block` within `block_number`.
    pub fn new(block_number: u64, index_in_block: u32) -> Self {
        EventId(format!("{}-{}", block_number, index_in_block))
    }

    /// Wrap an id loaded from storage.
    pub fn from_stored(id: impl Into<String>) -> Self {
        EventId(id.into())
    }

    /// Borrow the string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Chain-encoded byte vector, `0x`-hex on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    /// Parse a `0x`-prefixed (or bare) hex string.
    pub fn from_hex(input: &str) -> Result<Self, CoreError> {
        let trimmed = input.trim_start_matches("0x");
        hex::decode(trimmed)
            .map(Bytes)
            .map_err(|e| CoreError::InvalidHex(e.to_string()))
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Interpret the bytes as text, replacing invalid UTF-8 sequences.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }

    /// Raw bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// True when no bytes are present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&[u8]> for Bytes {
    fn from(value: &[u8]) -> Self {
        Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(value: Vec<u8>) -> Self {
        Bytes(value)
    }
}

impl Serialize for Bytes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Bytes::from_hex(&s).map_err(|e| serde::de::Error::custom(format!("{}", e)))
    }
}
