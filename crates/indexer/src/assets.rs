//! Asset extraction.
//!
//! Content metadata refers to assets by position in the asset vector that
//! accompanies the event. Selection validates the position and happens while
//! the changeset is being decoded; materialization writes data objects and
//! happens only once the whole changeset is known to be consistent.

use querynode_core::{
    AssetAvailability, AssetRef, ContentId, DataObjectOwner, LiaisonJudgement, RawAsset,
};
use tracing::debug;

use crate::error::Result;
use crate::event::EventContext;
use crate::guard;
use crate::storage::{DataObject, Store};

/// Pick the asset at `index`, failing on an out-of-range position.
pub fn select<'a>(ctx: &EventContext, index: u32, assets: &'a [RawAsset]) -> Result<&'a RawAsset> {
    let index = guard::asset_index(ctx, index, assets.len())?;
    Ok(&assets[index])
}

/// An asset slot ready to be stored, with the byte size of uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    /// Slot content
    pub slot: AssetRef,

    /// Upload size, `None` for URL assets
    pub size: Option<u64>,
}

/// Turn a selected asset into a slot.
///
/// Uploads register a data object owned by `owner` with a pending liaison
/// judgement. An already registered object keeps its judgement. URL assets
/// create nothing and are always available.
pub async fn materialize(
    store: &mut Store<'_>,
    ctx: &EventContext,
    asset: &RawAsset,
    owner: &DataObjectOwner,
) -> Result<Extracted> {
    match asset {
        RawAsset::Urls(urls) => Ok(Extracted {
            slot: AssetRef::Urls(urls.clone()),
            size: None,
        }),
        RawAsset::Upload(params) => {
            let id = ContentId::from_bytes(&params.content_id);

            let judgement = match store.data_object(&id).await? {
                Some(existing) => existing.liaison_judgement,
                None => LiaisonJudgement::Pending,
            };

            store
                .save_data_object(&DataObject {
                    id: id.clone(),
                    owner: owner.clone(),
                    created_in_block: ctx.block_number,
                    type_id: params.type_id,
                    size: params.size,
                    liaison_judgement: judgement,
                    ipfs_content_id: params.ipfs_content_id.to_text(),
                })
                .await?;

            debug!(data_object = %id, owner = owner.id(), size = params.size, "Registered data object");

            Ok(Extracted {
                slot: AssetRef::DataObject {
                    id,
                    availability: AssetAvailability::from(judgement),
                },
                size: Some(params.size),
            })
        }
    }
}
