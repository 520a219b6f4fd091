//! Forum storage operations.

use querynode_core::{CategoryId, MemberId, PostId, ThreadId, Variant, WorkerId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{variant_from_row, Category, Poll, PollAlternative, Post, Store, Thread};
use crate::error::Result;

fn category_from_row(row: &SqliteRow) -> std::result::Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::from(row.try_get::<String, _>("id")?),
        parent: row
            .try_get::<Option<String>, _>("parent_id")?
            .map(CategoryId::from),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: variant_from_row(row, "status_kind", "status_event_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn thread_from_row(row: &SqliteRow) -> std::result::Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: ThreadId::from(row.try_get::<String, _>("id")?),
        category: CategoryId::from(row.try_get::<String, _>("category_id")?),
        author: MemberId::from(row.try_get::<String, _>("author_id")?),
        title: row.try_get("title")?,
        is_sticky: row.try_get("is_sticky")?,
        status: variant_from_row(row, "status_kind", "status_event_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn post_from_row(row: &SqliteRow) -> std::result::Result<Post, sqlx::Error> {
    Ok(Post {
        id: PostId::from(row.try_get::<String, _>("id")?),
        thread: ThreadId::from(row.try_get::<String, _>("thread_id")?),
        author: MemberId::from(row.try_get::<String, _>("author_id")?),
        text: row.try_get("text")?,
        status: variant_from_row(row, "status_kind", "status_event_id")?,
        origin: variant_from_row(row, "origin_kind", "origin_event_id")?,
        replies_to: row
            .try_get::<Option<String>, _>("replies_to_id")?
            .map(PostId::from),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl Store<'_> {
    /// Get a forum category.
    pub async fn category(&mut self, id: &CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            r#"
            SELECT id, parent_id, title, description, status_kind, status_event_id,
                   created_at, updated_at
            FROM forum_categories
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(category_from_row).transpose()?)
    }

    /// Insert or replace a forum category.
    pub async fn save_category(&mut self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO forum_categories (
                id, parent_id, title, description, status_kind, status_event_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                parent_id = excluded.parent_id,
                title = excluded.title,
                description = excluded.description,
                status_kind = excluded.status_kind,
                status_event_id = excluded.status_event_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(category.id.as_str())
        .bind(category.parent.as_ref().map(|p| p.as_str()))
        .bind(&category.title)
        .bind(&category.description)
        .bind(category.status.kind())
        .bind(category.status.event_id().map(|e| e.as_str()))
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Moderators of a category, ordered by worker id.
    pub async fn category_moderators(&mut self, id: &CategoryId) -> Result<Vec<WorkerId>> {
        let ids: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT worker_id
            FROM forum_category_moderators
            WHERE category_id = ?
            ORDER BY worker_id
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(ids.into_iter().map(WorkerId::from).collect())
    }

    /// Add a moderator. Returns `false` if it already was one.
    pub async fn add_category_moderator(
        &mut self,
        category: &CategoryId,
        worker: &WorkerId,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO forum_category_moderators (category_id, worker_id)
            VALUES (?, ?)
            ON CONFLICT(category_id, worker_id) DO NOTHING
            "#,
        )
        .bind(category.as_str())
        .bind(worker.as_str())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a moderator. Returns `false` if it was not one.
    pub async fn remove_category_moderator(
        &mut self,
        category: &CategoryId,
        worker: &WorkerId,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM forum_category_moderators WHERE category_id = ? AND worker_id = ?",
        )
        .bind(category.as_str())
        .bind(worker.as_str())
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a forum thread.
    pub async fn thread(&mut self, id: &ThreadId) -> Result<Option<Thread>> {
        let row = sqlx::query(
            r#"
            SELECT id, category_id, author_id, title, is_sticky, status_kind, status_event_id,
                   created_at, updated_at
            FROM forum_threads
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(thread_from_row).transpose()?)
    }

    /// Insert or replace a forum thread.
    pub async fn save_thread(&mut self, thread: &Thread) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO forum_threads (
                id, category_id, author_id, title, is_sticky, status_kind, status_event_id,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                category_id = excluded.category_id,
                author_id = excluded.author_id,
                title = excluded.title,
                is_sticky = excluded.is_sticky,
                status_kind = excluded.status_kind,
                status_event_id = excluded.status_event_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(thread.id.as_str())
        .bind(thread.category.as_str())
        .bind(thread.author.as_str())
        .bind(&thread.title)
        .bind(thread.is_sticky)
        .bind(thread.status.kind())
        .bind(thread.status.event_id().map(|e| e.as_str()))
        .bind(thread.created_at)
        .bind(thread.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Get a forum post.
    pub async fn post(&mut self, id: &PostId) -> Result<Option<Post>> {
        let row = sqlx::query(
            r#"
            SELECT id, thread_id, author_id, text, status_kind, status_event_id,
                   origin_kind, origin_event_id, replies_to_id, created_at, updated_at
            FROM forum_posts
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.as_ref().map(post_from_row).transpose()?)
    }

    /// Insert or replace a forum post.
    pub async fn save_post(&mut self, post: &Post) -> Result<()> {
        let origin_event = post.origin.event_id().map(|e| e.as_str());

        sqlx::query(
            r#"
            INSERT INTO forum_posts (
                id, thread_id, author_id, text, status_kind, status_event_id,
                origin_kind, origin_event_id, replies_to_id, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                thread_id = excluded.thread_id,
                author_id = excluded.author_id,
                text = excluded.text,
                status_kind = excluded.status_kind,
                status_event_id = excluded.status_event_id,
                origin_kind = excluded.origin_kind,
                origin_event_id = excluded.origin_event_id,
                replies_to_id = excluded.replies_to_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(post.id.as_str())
        .bind(post.thread.as_str())
        .bind(post.author.as_str())
        .bind(&post.text)
        .bind(post.status.kind())
        .bind(post.status.event_id().map(|e| e.as_str()))
        .bind(post.origin.kind())
        .bind(origin_event)
        .bind(post.replies_to.as_ref().map(|p| p.as_str()))
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&mut *self.conn)
        .await?;

        Ok(())
    }

    /// Insert a poll and its alternatives. Returns the poll row id.
    pub async fn insert_poll(&mut self, poll: &Poll, created_at: i64) -> Result<i64> {
        let poll_id = sqlx::query(
            r#"
            INSERT INTO forum_polls (thread_id, description, end_time, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(poll.thread.as_str())
        .bind(&poll.description)
        .bind(poll.end_time)
        .bind(created_at)
        .execute(&mut *self.conn)
        .await?
        .last_insert_rowid();

        for (index, text) in poll.alternatives.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO forum_poll_alternatives (poll_id, alternative_index, text)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(poll_id)
            .bind(index as i64)
            .bind(text)
            .execute(&mut *self.conn)
            .await?;
        }

        Ok(poll_id)
    }

    /// Get the alternative at `index` of the poll attached to `thread`.
    pub async fn poll_alternative(
        &mut self,
        thread: &ThreadId,
        index: u32,
    ) -> Result<Option<PollAlternative>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.alternative_index, a.text
            FROM forum_poll_alternatives a
            JOIN forum_polls p ON p.id = a.poll_id
            WHERE p.thread_id = ? AND a.alternative_index = ?
            "#,
        )
        .bind(thread.as_str())
        .bind(index as i64)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(|row| PollAlternative {
            id: row.get("id"),
            index: row.get::<i64, _>("alternative_index") as u32,
            text: row.get("text"),
        }))
    }
}
