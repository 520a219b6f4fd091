//! Protobuf metadata payloads.
//!
//! Every field is optional so that presence is observable: an update only
//! touches the fields its payload actually carries. Unknown fields are skipped
//! by the decoder.

use prost::Message;

use crate::error::CoreError;

/// Channel metadata.
#[derive(Clone, PartialEq, Message)]
pub struct ChannelMetadata {
    /// Channel title.
    #[prost(string, optional, tag = "1")]
    pub title: Option<String>,
    /// Channel description.
    #[prost(string, optional, tag = "2")]
    pub description: Option<String>,
    /// Public visibility.
    #[prost(bool, optional, tag = "3")]
    pub is_public: Option<bool>,
    /// ISO-639-1 language code.
    #[prost(string, optional, tag = "4")]
    pub language: Option<String>,
    /// Index of the cover photo in the event's asset vector.
    #[prost(uint32, optional, tag = "5")]
    pub cover_photo: Option<u32>,
    /// Index of the avatar photo in the event's asset vector.
    #[prost(uint32, optional, tag = "6")]
    pub avatar_photo: Option<u32>,
    /// Channel category id.
    #[prost(uint64, optional, tag = "7")]
    pub category: Option<u64>,
}

/// Channel category metadata.
#[derive(Clone, PartialEq, Message)]
pub struct ChannelCategoryMetadata {
    /// Category name.
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
}

/// Video category metadata.
#[derive(Clone, PartialEq, Message)]
pub struct VideoCategoryMetadata {
    /// Category name.
    #[prost(string, optional, tag = "1")]
    pub name: Option<String>,
}

/// Media encoding of a video.
#[derive(Clone, PartialEq, Message)]
pub struct MediaType {
    /// Codec name.
    #[prost(string, optional, tag = "1")]
    pub codec_name: Option<String>,
    /// Container format.
    #[prost(string, optional, tag = "2")]
    pub container: Option<String>,
    /// MIME media type.
    #[prost(string, optional, tag = "3")]
    pub mime_media_type: Option<String>,
}

/// Video license.
#[derive(Clone, PartialEq, Message)]
pub struct License {
    /// Known license code.
    #[prost(uint32, optional, tag = "1")]
    pub code: Option<u32>,
    /// Attribution text.
    #[prost(string, optional, tag = "2")]
    pub attribution: Option<String>,
    /// Custom license text.
    #[prost(string, optional, tag = "3")]
    pub custom_text: Option<String>,
}

/// Publication elsewhere before the video was uploaded here.
#[derive(Clone, PartialEq, Message)]
pub struct PublishedBeforeJoystream {
    /// Whether the video was published before.
    #[prost(bool, optional, tag = "1")]
    pub is_published: Option<bool>,
    /// RFC 3339 publication date.
    #[prost(string, optional, tag = "2")]
    pub date: Option<String>,
}

/// Video metadata.
#[derive(Clone, PartialEq, Message)]
pub struct VideoMetadata {
    /// Video title.
    #[prost(string, optional, tag = "1")]
    pub title: Option<String>,
    /// Video description.
    #[prost(string, optional, tag = "2")]
    pub description: Option<String>,
    /// Index of the media asset.
    #[prost(uint32, optional, tag = "3")]
    pub video: Option<u32>,
    /// Index of the thumbnail asset.
    #[prost(uint32, optional, tag = "4")]
    pub thumbnail_photo: Option<u32>,
    /// Duration in seconds.
    #[prost(uint32, optional, tag = "5")]
    pub duration: Option<u32>,
    /// Media height in pixels.
    #[prost(uint32, optional, tag = "6")]
    pub media_pixel_height: Option<u32>,
    /// Media width in pixels.
    #[prost(uint32, optional, tag = "7")]
    pub media_pixel_width: Option<u32>,
    /// Media encoding.
    #[prost(message, optional, tag = "8")]
    pub media_type: Option<MediaType>,
    /// ISO-639-1 language code.
    #[prost(string, optional, tag = "9")]
    pub language: Option<String>,
    /// License.
    #[prost(message, optional, tag = "10")]
    pub license: Option<License>,
    /// Prior publication.
    #[prost(message, optional, tag = "11")]
    pub published_before_joystream: Option<PublishedBeforeJoystream>,
    /// Contains paid promotion.
    #[prost(bool, optional, tag = "12")]
    pub has_marketing: Option<bool>,
    /// Public visibility.
    #[prost(bool, optional, tag = "13")]
    pub is_public: Option<bool>,
    /// Explicit content.
    #[prost(bool, optional, tag = "14")]
    pub is_explicit: Option<bool>,
    /// Video category id.
    #[prost(uint64, optional, tag = "16")]
    pub category: Option<u64>,
}

/// Forum post metadata.
#[derive(Clone, PartialEq, Message)]
pub struct ForumPostMetadata {
    /// Post text.
    #[prost(string, optional, tag = "1")]
    pub text: Option<String>,
    /// Id of the post this one replies to.
    #[prost(uint32, optional, tag = "2")]
    pub replies_to: Option<u32>,
}

/// Decode a metadata payload.
pub fn decode<M: Message + Default>(bytes: &[u8]) -> Result<M, CoreError> {
    Ok(M::decode(bytes)?)
}
