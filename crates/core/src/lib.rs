//! # querynode core
//!
//! Domain types shared by the querynode projection crates.
//!
//! The runtime emits forum and content events whose parameters only make sense
//! together with the entity graph the indexer maintains. This crate holds the
//! pieces of that graph that need no storage to be understood:
//!
//! - **Identifiers**: chain ids as typed newtypes, event ids derived from block coordinates
//! - **Status variants**: lifecycle sum types that carry the causing event id
//! - **Actors**: privileged forum actors and content actors
//! - **Assets**: raw asset descriptors, data object owners, availability
//! - **Metadata**: protobuf payload messages attached to content and forum events
//! - **Languages**: ISO-639-1 validation

#![warn(missing_docs)]

pub mod actor;
pub mod asset;
pub mod error;
pub mod language;
pub mod metadata;
pub mod status;
pub mod types;

pub use actor::{ChannelOwner, ContentActor, PrivilegedActor};
pub use asset::{
    AssetAvailability, AssetRef, ContentParameters, DataObjectOwner, LiaisonJudgement, RawAsset,
};
pub use error::{CoreError, Result};
pub use status::{CategoryStatus, PostOrigin, PostStatus, ThreadStatus, Variant};
pub use types::*;
