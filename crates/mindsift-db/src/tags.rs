//! Tag store implementation.
//!
//! The tag table is globally shared: one row per distinct name across all
//! users. Upsert relies on the name uniqueness constraint so concurrent
//! lookup-or-create calls for the same name never produce duplicates.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use mindsift_core::{Error, Result, Tag, TagStore};

/// PostgreSQL implementation of [`TagStore`].
pub struct PgTagStore {
    pool: Pool<Postgres>,
}

impl PgTagStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn upsert(&self, name: &str) -> Result<Tag> {
        if name.is_empty() {
            return Err(Error::InvalidInput("Tag name cannot be empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("INSERT INTO tag (id, name, created_at) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING")
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let row = sqlx::query("SELECT id, name, created_at FROM tag WHERE name = $1")
            .bind(name)
            .fetch_one(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        Ok(Tag {
            id: row.get("id"),
            name: row.get("name"),
            created_at: row.get("created_at"),
        })
    }

    async fn attach_to_idea(&self, idea_id: Uuid, tag_id: Uuid) -> Result<()> {
        sqlx::query(
            "INSERT INTO idea_tag (idea_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(idea_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn list_for_idea(&self, idea_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name, t.created_at
             FROM tag t
             JOIN idea_tag it ON it.tag_id = t.id
             WHERE it.idea_id = $1
             ORDER BY t.name",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
                created_at: row.get("created_at"),
            })
            .collect())
    }
}
