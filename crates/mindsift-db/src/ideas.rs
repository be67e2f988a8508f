//! Idea store implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use mindsift_core::{
    Error, Idea, IdeaCategory, IdeaPotential, IdeaStatus, IdeaStore, IdeaType, NewIdea, Result,
};

/// PostgreSQL implementation of [`IdeaStore`].
pub struct PgIdeaStore {
    pool: Pool<Postgres>,
}

impl PgIdeaStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_row(row: PgRow) -> Result<Idea> {
        let category: String = row.get("category");
        let potential: String = row.get("potential");
        let kind: String = row.get("kind");
        let status: String = row.get("status");
        let next_steps: serde_json::Value = row.get("next_steps");

        Ok(Idea {
            id: row.get("id"),
            user_id: row.get("user_id"),
            note_id: row.get("note_id"),
            title: row.get("title"),
            description: row.get("description"),
            category: IdeaCategory::parse(&category).unwrap_or_default(),
            potential: IdeaPotential::parse(&potential).unwrap_or_default(),
            kind: IdeaType::parse(&kind).unwrap_or_default(),
            status: IdeaStatus::parse(&status).unwrap_or_default(),
            next_steps: serde_json::from_value(next_steps)?,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

const IDEA_COLUMNS: &str = "id, user_id, note_id, title, description, category, potential, \
                            kind, status, next_steps, created_at, updated_at";

#[async_trait]
impl IdeaStore for PgIdeaStore {
    async fn insert(&self, idea: NewIdea) -> Result<Idea> {
        let now = Utc::now();
        let row = sqlx::query(&format!(
            "INSERT INTO idea
                 (id, user_id, note_id, title, description, category, potential, kind,
                  status, next_steps, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
             RETURNING {IDEA_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(idea.user_id)
        .bind(idea.note_id)
        .bind(&idea.title)
        .bind(&idea.description)
        .bind(idea.category.as_str())
        .bind(idea.potential.as_str())
        .bind(idea.kind.as_str())
        .bind(IdeaStatus::New.as_str())
        .bind(serde_json::to_value(&idea.next_steps)?)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::parse_row(row)
    }

    async fn list_for_note(&self, note_id: Uuid) -> Result<Vec<Idea>> {
        let rows = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM idea WHERE note_id = $1 ORDER BY created_at ASC"
        ))
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.into_iter().map(Self::parse_row).collect()
    }
}
