//! Error types for the core crate.

use thiserror::Error;

/// Core error type.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Language code is not a valid ISO-639-1 code.
    #[error("Invalid ISO-639-1 language code: {0:?}")]
    InvalidLanguage(String),

    /// Stored variant tag is not known for this field.
    #[error("Unknown {field} variant: {value:?}")]
    UnknownVariant {
        /// Field the variant belongs to (e.g. "thread status").
        field: &'static str,
        /// The unrecognized tag.
        value: String,
    },

    /// Variant requires a causing event id but none was stored.
    #[error("{field} variant {kind} is missing its event back-reference")]
    MissingBackReference {
        /// Field the variant belongs to.
        field: &'static str,
        /// Variant tag.
        kind: &'static str,
    },

    /// Lifecycle transition is not allowed from the current variant.
    #[error("Illegal {field} transition from {from} to {to}")]
    IllegalTransition {
        /// Field the variant belongs to.
        field: &'static str,
        /// Current variant tag.
        from: &'static str,
        /// Requested variant tag.
        to: &'static str,
    },

    /// Invalid hex encoding.
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),

    /// Protobuf payload could not be decoded.
    #[error("Metadata decode failed: {0}")]
    MetadataDecode(#[from] prost::DecodeError),
}

/// Result type alias for CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
