//! Event handlers.
//!
//! Each handler is a function of (current store state, event) to next state.
//! Handlers read and validate everything the event references first, then
//! write the entity changes and the event record. They run inside the
//! transaction of the enclosing block and never deduplicate.

use querynode_core::Bytes;

use crate::error::Result;
use crate::event::{self, EventContext, EventData};
use crate::storage::Store;

pub mod content;
pub mod forum;
pub mod storage;

/// Append the immutable record of the event being handled.
pub(crate) async fn record(store: &mut Store<'_>, ctx: &EventContext, data: EventData) -> Result<()> {
    store.insert_event(&ctx.record(data)).await
}

/// Decode a byte parameter as text.
pub(crate) fn text_param(ctx: &EventContext, index: usize, name: &str) -> Result<String> {
    let bytes: Bytes = ctx.param(index, name)?;
    Ok(event::text(&bytes))
}
