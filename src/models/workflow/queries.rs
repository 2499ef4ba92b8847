use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use crate::errors::AppError;
use super::store::{Mutation, WorkflowStore};
use super::types::Workflow;

/// PostgreSQL-backed store. Each workflow is one JSONB document; `status`
/// and the timestamps are mirrored into columns for ordering and reporting.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl WorkflowStore for PgStore {
    async fn list(&self) -> Result<Vec<Workflow>, AppError> {
        let rows = sqlx::query_as::<_, (Json<Workflow>,)>(
            "SELECT document FROM workflows ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(Json(wf),)| wf).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Workflow>, AppError> {
        let row = sqlx::query_as::<_, (Json<Workflow>,)>(
            "SELECT document FROM workflows WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(Json(wf),)| wf))
    }

    async fn insert(&self, workflow: &Workflow) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO workflows (id, status, document, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&workflow.id)
        .bind(workflow.status.as_str())
        .bind(Json(workflow))
        .bind(workflow.created_at)
        .bind(workflow.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_with(&self, id: &str, mutation: Mutation) -> Result<Workflow, AppError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serialises concurrent transitions on the same workflow.
        let row = sqlx::query_as::<_, (Json<Workflow>,)>(
            "SELECT document FROM workflows WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((Json(mut workflow),)) = row else {
            return Err(AppError::NotFound);
        };

        mutation(&mut workflow)?;

        sqlx::query(
            "UPDATE workflows SET status = $2, document = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(workflow.status.as_str())
        .bind(Json(&workflow))
        .bind(workflow.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(workflow)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM workflows WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self) -> Result<usize, AppError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM workflows")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as usize)
    }
}
