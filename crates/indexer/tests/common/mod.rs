#![allow(dead_code)]

use querynode_core::{Bytes, MemberId, WorkerId};
use querynode_indexer::storage::{Storage, Store, Worker};
use querynode_indexer::{BlockEvents, Projector, SubstrateEvent};
use serde_json::{json, Value};
use tempfile::NamedTempFile;

pub const FORUM_GROUP: &str = "forumWorkingGroup";

pub async fn setup() -> (Projector, NamedTempFile) {
    let temp_db = NamedTempFile::new().unwrap();
    let storage = Storage::new_with_path(temp_db.path()).await.unwrap();
    storage.run_migrations().await.unwrap();
    (Projector::new(storage), temp_db)
}

/// Seed the forum lead and a moderator with runtime id 7.
pub async fn seed_forum_workers(projector: &Projector) {
    let mut conn = projector.storage().acquire().await.unwrap();
    let mut store = Store::new(&mut conn);

    for (runtime_id, is_lead) in [(0u64, true), (7, false)] {
        store
            .save_worker(&Worker {
                id: WorkerId::for_group(FORUM_GROUP, runtime_id),
                group_id: FORUM_GROUP.to_string(),
                runtime_id,
                membership: Some(MemberId::from(runtime_id + 100)),
                is_lead,
                is_active: true,
            })
            .await
            .unwrap();
    }
}

pub fn block(number: u64, events: Vec<SubstrateEvent>) -> BlockEvents {
    BlockEvents {
        block_number: number,
        block_timestamp: number as i64 * 6_000,
        events,
    }
}

pub fn event(name: &str, index: u32, params: Vec<Value>) -> SubstrateEvent {
    SubstrateEvent {
        name: name.to_string(),
        index_in_block: index,
        extrinsic_hash: Some(format!("0x{:064x}", index)),
        params,
    }
}

/// Chain-encoded text parameter.
pub fn text(s: &str) -> Value {
    json!(Bytes::from(s.as_bytes()).to_hex())
}

/// Chain-encoded byte parameter.
pub fn bytes(b: Vec<u8>) -> Value {
    json!(Bytes::from(b).to_hex())
}

pub fn category_created(id: u64, parent: Option<u64>, title: &str) -> Vec<Value> {
    vec![json!(id), json!(parent), text(title), text("")]
}
