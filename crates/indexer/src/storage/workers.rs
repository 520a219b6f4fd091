//! Membership stubs and working group workers.

use querynode_core::{MemberId, WorkerId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{Store, Worker};
use crate::error::Result;

fn worker_from_row(row: &SqliteRow) -> std::result::Result<Worker, sqlx::Error> {
    Ok(Worker {
        id: WorkerId::from(row.try_get::<String, _>("id")?),
        group_id: row.try_get("group_id")?,
        runtime_id: row.try_get::<i64, _>("runtime_id")? as u64,
        membership: row
            .try_get::<Option<String>, _>("membership_id")?
            .map(MemberId::from),
        is_lead: row.try_get("is_lead")?,
        is_active: row.try_get("is_active")?,
    })
}

const WORKER_COLUMNS: &str = "id, group_id, runtime_id, membership_id, is_lead, is_active";

impl Store<'_> {
    /// Upsert a membership stub by id.
    pub async fn ensure_member(&mut self, id: &MemberId, block: u64) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (id, created_in_block)
            VALUES (?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(id.as_str())
        .bind(block as i64)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// True if a membership row exists.
    pub async fn member_exists(&mut self, id: &MemberId) -> Result<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM members WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *self.conn)
            .await?;

        Ok(found.is_some())
    }

    /// Get a worker by its runtime id within a working group.
    pub async fn group_worker(&mut self, group: &str, runtime_id: u64) -> Result<Option<Worker>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM workers WHERE group_id = ? AND runtime_id = ?",
            WORKER_COLUMNS
        ))
        .bind(group)
        .bind(runtime_id as i64)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(worker_from_row).transpose()?)
    }

    /// Get the current lead of a working group.
    pub async fn group_lead(&mut self, group: &str) -> Result<Option<Worker>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM workers WHERE group_id = ? AND is_lead = 1 AND is_active = 1",
            WORKER_COLUMNS
        ))
        .bind(group)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(worker_from_row).transpose()?)
    }

    /// Insert or replace a worker.
    pub async fn save_worker(&mut self, worker: &Worker) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO workers (id, group_id, runtime_id, membership_id, is_lead, is_active)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                membership_id = excluded.membership_id,
                is_lead = excluded.is_lead,
                is_active = excluded.is_active
            "#,
        )
        .bind(worker.id.as_str())
        .bind(&worker.group_id)
        .bind(worker.runtime_id as i64)
        .bind(worker.membership.as_ref().map(|m| m.as_str()))
        .bind(worker.is_lead)
        .bind(worker.is_active)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::setup_storage;

    #[tokio::test]
    async fn test_member_stub_is_idempotent() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        let member = MemberId::from(4);
        assert!(!store.member_exists(&member).await.unwrap());
        store.ensure_member(&member, 1).await.unwrap();
        store.ensure_member(&member, 2).await.unwrap();
        assert!(store.member_exists(&member).await.unwrap());
    }

    #[tokio::test]
    async fn test_worker_lookup() {
        let (storage, _temp_db) = setup_storage().await;
        let mut conn = storage.acquire().await.unwrap();
        let mut store = Store::new(&mut conn);

        let lead = Worker {
            id: WorkerId::for_group("forumWorkingGroup", 0),
            group_id: "forumWorkingGroup".to_string(),
            runtime_id: 0,
            membership: Some(MemberId::from(1)),
            is_lead: true,
            is_active: true,
        };
        let moderator = Worker {
            id: WorkerId::for_group("forumWorkingGroup", 2),
            runtime_id: 2,
            is_lead: false,
            ..lead.clone()
        };
        store.save_worker(&lead).await.unwrap();
        store.save_worker(&moderator).await.unwrap();

        assert_eq!(store.group_lead("forumWorkingGroup").await.unwrap(), Some(lead));
        assert_eq!(
            store.group_worker("forumWorkingGroup", 2).await.unwrap(),
            Some(moderator)
        );
        assert!(store.group_worker("contentWorkingGroup", 2).await.unwrap().is_none());
    }
}
