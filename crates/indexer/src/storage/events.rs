//! Immutable event log.

use querynode_core::EventId;
use sqlx::Row;

use super::{decode_error, Store};
use crate::error::Result;
use crate::event::{EventData, EventRecord};

impl Store<'_> {
    /// Append an event record.
    ///
    /// Plain insert: a second record with the same id means a block was
    /// projected twice, which the enclosing transaction must not allow.
    pub async fn insert_event(&mut self, record: &EventRecord) -> Result<()> {
        let data = serde_json::to_string(&record.data)?;

        sqlx::query(
            r#"
            INSERT INTO events (
                id, event_type, in_block, index_in_block, in_extrinsic, created_at, data
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_str())
        .bind(&record.event_type)
        .bind(record.in_block as i64)
        .bind(record.index_in_block as i64)
        .bind(record.in_extrinsic.as_deref())
        .bind(record.created_at)
        .bind(data)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Get an event record.
    pub async fn event(&mut self, id: &EventId) -> Result<Option<EventRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, event_type, in_block, index_in_block, in_extrinsic, created_at, data
            FROM events
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: String = row.try_get("data")?;
        let data: EventData = serde_json::from_str(&data).map_err(decode_error)?;

        Ok(Some(EventRecord {
            id: EventId::from_stored(row.try_get::<String, _>("id")?),
            event_type: row.try_get("event_type")?,
            in_block: row.try_get::<i64, _>("in_block")? as u64,
            index_in_block: row.try_get::<i64, _>("index_in_block")? as u32,
            in_extrinsic: row.try_get("in_extrinsic")?,
            created_at: row.try_get("created_at")?,
            data,
        }))
    }

    /// Number of recorded events of one type, e.g. `forum.ThreadDeleted`.
    pub async fn count_events(&mut self, event_type: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE event_type = ?")
            .bind(event_type)
            .fetch_one(&mut *self.conn)
            .await?;

        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::setup_storage;
    use querynode_core::ThreadId;

    fn record(index: u32) -> EventRecord {
        EventRecord {
            id: EventId::new(3, index),
            event_type: "forum.ThreadDeleted".to_string(),
            in_block: 3,
            index_in_block: index,
            in_extrinsic: Some("0x01".to_string()),
            created_at: 3_000,
            data: EventData::ThreadDeleted {
                thread: ThreadId::from(1),
            },
        }
    }

    #[tokio::test]
    async fn test_insert_and_load() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        store.insert_event(&record(0)).await.unwrap();
        store.insert_event(&record(1)).await.unwrap();

        let loaded = store.event(&EventId::new(3, 1)).await.unwrap().unwrap();
        assert_eq!(loaded, record(1));
        assert_eq!(store.count_events("forum.ThreadDeleted").await.unwrap(), 2);
        assert!(store.event(&EventId::new(4, 0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_event_is_rejected() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        store.insert_event(&record(0)).await.unwrap();
        assert!(store.insert_event(&record(0)).await.is_err());
    }
}
