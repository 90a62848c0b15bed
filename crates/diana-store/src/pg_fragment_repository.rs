//! `PostgreSQL` implementation of the `FragmentRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;

use diana_core::error::DomainError;
use diana_core::model::{Choice, ClueId, Fragment, FragmentId, FragmentKind};
use diana_core::repository::FragmentRepository;

use crate::storage_error;

const FRAGMENT_COLUMNS: &str =
    "fragment_id, title, content, kind, choices, required_clues, is_active, created_at";

/// PostgreSQL-backed fragment store.
#[derive(Debug, Clone)]
pub struct PgFragmentRepository {
    pool: PgPool,
}

impl PgFragmentRepository {
    /// Creates a new `PgFragmentRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn fragment_from_row(row: &PgRow) -> Result<Fragment, DomainError> {
    let kind: String = row.try_get("kind").map_err(storage_error)?;
    let kind = FragmentKind::parse(&kind)
        .ok_or_else(|| DomainError::Storage(format!("unknown fragment kind: {kind}")))?;
    let id: String = row.try_get("fragment_id").map_err(storage_error)?;
    let Json(choices): Json<Vec<Choice>> = row.try_get("choices").map_err(storage_error)?;
    let Json(required_clues): Json<Vec<ClueId>> =
        row.try_get("required_clues").map_err(storage_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(storage_error)?;

    Ok(Fragment {
        id: FragmentId::from(id),
        title: row.try_get("title").map_err(storage_error)?,
        content: row.try_get("content").map_err(storage_error)?,
        kind,
        choices,
        required_clues,
        is_active: row.try_get("is_active").map_err(storage_error)?,
        created_at,
    })
}

#[async_trait]
impl FragmentRepository for PgFragmentRepository {
    async fn get_fragment(&self, id: &FragmentId) -> Result<Option<Fragment>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {FRAGMENT_COLUMNS} FROM narrative_fragments \
             WHERE fragment_id = $1 AND is_active"
        ))
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(fragment_from_row).transpose()
    }

    async fn get_entry_fragment(&self) -> Result<Option<Fragment>, DomainError> {
        let row = sqlx::query(&format!(
            "SELECT {FRAGMENT_COLUMNS} FROM narrative_fragments \
             WHERE is_active \
             ORDER BY created_at ASC, fragment_id ASC \
             LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.as_ref().map(fragment_from_row).transpose()
    }

    async fn count_active_fragments(&self) -> Result<u64, DomainError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM narrative_fragments WHERE is_active")
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error)?;

        u64::try_from(count).map_err(|e| DomainError::Storage(e.to_string()))
    }

    async fn publish_fragments(&self, fragments: &[Fragment]) -> Result<(), DomainError> {
        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let listed: Vec<String> = fragments.iter().map(|f| f.id.as_str().to_owned()).collect();
        let retired = sqlx::query(
            "UPDATE narrative_fragments SET is_active = FALSE, updated_at = NOW() \
             WHERE is_active AND NOT (fragment_id = ANY($1))",
        )
        .bind(listed)
        .execute(&mut *tx)
        .await
        .map_err(storage_error)?
        .rows_affected();
        if retired > 0 {
            debug!(retired, "deactivated fragments missing from the published set");
        }

        for fragment in fragments {
            sqlx::query(
                "INSERT INTO narrative_fragments \
                 (fragment_id, title, content, kind, choices, required_clues, is_active, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (fragment_id) DO UPDATE SET \
                 title = EXCLUDED.title, \
                 content = EXCLUDED.content, \
                 kind = EXCLUDED.kind, \
                 choices = EXCLUDED.choices, \
                 required_clues = EXCLUDED.required_clues, \
                 is_active = EXCLUDED.is_active, \
                 created_at = EXCLUDED.created_at, \
                 updated_at = NOW()",
            )
            .bind(fragment.id.as_str())
            .bind(&fragment.title)
            .bind(&fragment.content)
            .bind(fragment.kind.as_str())
            .bind(Json(&fragment.choices))
            .bind(Json(&fragment.required_clues))
            .bind(fragment.is_active)
            .bind(fragment.created_at)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        }

        tx.commit().await.map_err(storage_error)
    }
}
