//! Storage event handlers.

use querynode_core::{AssetAvailability, Bytes, ContentId, LiaisonJudgement};
use tracing::info;

use super::record;
use crate::error::Result;
use crate::event::{EventContext, EventData};
use crate::resolver;
use crate::storage::{DataObject, Store};

/// `storage.ContentAccepted(content_id, storage_provider_id)`
///
/// Accepts the data object and re-derives the availability of every slot
/// that points at it.
pub async fn content_accepted(store: &mut Store<'_>, ctx: &EventContext) -> Result<()> {
    let content_id: Bytes = ctx.param(0, "content_id")?;
    let provider: u64 = ctx.param(1, "storage_provider_id")?;
    let id = ContentId::from_bytes(&content_id);

    let mut object: DataObject = resolver::get(store, ctx, &id).await?;
    object.liaison_judgement = LiaisonJudgement::Accepted;
    store.save_data_object(&object).await?;

    let slots = store
        .set_slot_availability(
            &id,
            AssetAvailability::from(object.liaison_judgement),
            ctx.block_timestamp,
        )
        .await?;

    info!(data_object = %id, provider, slots, "Content accepted");

    record(
        store,
        ctx,
        EventData::ContentAccepted {
            content: id,
            storage_provider: provider,
        },
    )
    .await
}
