//! Consistency guard.
//!
//! Every lookup and asset-index check reports through here, so a problem is
//! classified exactly one way:
//!
//! - **Fatal inconsistency**: the chain guarantees something the projection
//!   does not have (missing entity, out-of-range asset index, invalid language
//!   code, illegal status transition). Logged with the full event context; the
//!   handler returns the error before writing anything and the enclosing block
//!   is rolled back.
//! - **Recoverable omission**: an optional nested field is absent or
//!   malformed. Logged, the projection field stays empty, processing continues.

use std::fmt;

use querynode_core::CoreError;
use tracing::{error, warn};

use crate::error::{ProjectionError, Result};
use crate::event::EventContext;

/// Report a fatal inconsistency and build the error to return.
pub fn inconsistent(ctx: &EventContext, message: impl Into<String>) -> ProjectionError {
    let message = message.into();

    error!(
        event = %ctx.name,
        event_id = %ctx.event_id,
        block = ctx.block_number,
        index_in_block = ctx.index_in_block,
        extrinsic = ctx.extrinsic_hash.as_deref().unwrap_or("-"),
        "Inconsistent state: {}",
        message
    );

    ProjectionError::Inconsistent {
        event: ctx.name.clone(),
        event_id: ctx.event_id.clone(),
        block: ctx.block_number,
        message,
    }
}

/// Report a recoverable omission. Always yields `None`.
pub fn omission<T>(ctx: &EventContext, field: &str, reason: impl fmt::Display) -> Option<T> {
    warn!(
        event = %ctx.name,
        event_id = %ctx.event_id,
        block = ctx.block_number,
        field,
        "Omitting field: {}",
        reason
    );
    None
}

/// Require a value the event guarantees to exist.
pub fn require<T>(
    ctx: &EventContext,
    value: Option<T>,
    describe: impl FnOnce() -> String,
) -> Result<T> {
    match value {
        Some(value) => Ok(value),
        None => Err(inconsistent(ctx, describe())),
    }
}

/// Classify a domain rule violation (illegal transition, invalid code) as fatal.
pub fn check<T>(ctx: &EventContext, result: std::result::Result<T, CoreError>) -> Result<T> {
    result.map_err(|e| inconsistent(ctx, e.to_string()))
}

/// Validate a positional asset reference: `0 <= index < len`.
pub fn asset_index(ctx: &EventContext, index: u32, len: usize) -> Result<usize> {
    let index = index as usize;
    if index < len {
        Ok(index)
    } else {
        Err(inconsistent(
            ctx,
            format!(
                "Non-existing asset extraction requested (asset index {}, {} assets provided)",
                index, len
            ),
        ))
    }
}
