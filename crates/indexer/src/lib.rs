//! Projection of forum and content runtime events into SQLite.
//!
//! This crate provides:
//! - Storage of the projected entity graph and the immutable event log
//! - Handlers turning each runtime event into entity writes
//! - Per-block transactional projection with a resumable sync cursor
//!
//! # Architecture
//!
//! ```text
//!  blocks.ndjson ──► BlockFeed ──► SyncEngine ──► Projector
//!                                                   │  one transaction per block
//!                                                   ▼
//!                                                dispatch ──► handlers::{forum, content, storage}
//!                                                   │             │
//!                                                   │     resolver / guard / metadata / assets / membership
//!                                                   ▼             ▼
//!                                                 Store ─────────► SQLite
//! ```
//!
//! Handlers never deduplicate and never retry. A fatal inconsistency aborts
//! the block; nothing of it is written and the cursor stays put.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod guard;
pub mod handlers;
pub mod listener;
pub mod membership;
pub mod metadata;
pub mod resolver;
pub mod storage;

pub use dispatcher::{dispatch, BlockSummary, Projector};
pub use error::{ProjectionError, Result};
pub use event::{BlockEvents, EventContext, EventData, EventRecord, SubstrateEvent};
