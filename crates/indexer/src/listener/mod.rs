//! Block intake.
//!
//! This module provides:
//! - A newline-delimited JSON reader of block events
//! - The sync engine that projects them in order and resumes from the cursor

pub mod feed;
pub mod sync;

pub use feed::BlockFeed;
pub use sync::SyncEngine;
