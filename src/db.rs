use chrono::Utc;
use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::auth::{ADMIN_ROLE, Actor};
use crate::errors::AppError;
use crate::models::workflow::{self, Workflow, WorkflowDraft, WorkflowStore};

const DEMO_SEED: &str = include_str!("../data/seed/workflows.json");

pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// One demo workflow and how far to drive it after creation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedWorkflow {
    created_by: String,
    #[serde(default)]
    start: bool,
    #[serde(default)]
    completed_steps: usize,
    draft: WorkflowDraft,
}

fn build_seed_workflow(seed: SeedWorkflow) -> Result<Workflow, String> {
    let errors = workflow::validate_draft(&seed.draft);
    if !errors.is_empty() {
        return Err(errors.join("; "));
    }

    let admin = Actor::new(seed.created_by.clone(), ADMIN_ROLE);
    let mut wf = Workflow::from_draft(seed.draft, &seed.created_by, Utc::now());
    if seed.start {
        wf.start(&admin, Utc::now()).map_err(|e| e.to_string())?;
        for index in 0..seed.completed_steps {
            wf.complete_step(index, &admin, None, Utc::now())
                .map_err(|e| e.to_string())?;
        }
    }
    Ok(wf)
}

/// Load the demo workflows into an empty store. Returns how many were created.
pub async fn seed_demo(store: &dyn WorkflowStore) -> Result<usize, AppError> {
    let existing = store.count().await?;
    if existing > 0 {
        log::info!("Store already holds {existing} workflows, skipping demo seed");
        return Ok(0);
    }

    let seeds: Vec<SeedWorkflow> = serde_json::from_str(DEMO_SEED)?;
    let mut created = 0;
    for seed in seeds {
        let name = seed.draft.name.clone();
        match build_seed_workflow(seed) {
            Ok(wf) => {
                store.insert(&wf).await?;
                created += 1;
            }
            Err(reason) => log::warn!("Seed workflow '{name}' skipped: {reason}"),
        }
    }

    log::info!("Demo seed complete: created={created}");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::workflow::{MemoryStore, WorkflowStatus};

    #[tokio::test]
    async fn demo_seed_is_idempotent() {
        let store = MemoryStore::new();
        let created = seed_demo(&store).await.unwrap();
        assert_eq!(created, 3);
        assert_eq!(seed_demo(&store).await.unwrap(), 0);

        let workflows = store.list().await.unwrap();
        let report = &workflows[0];
        assert_eq!(report.status, WorkflowStatus::Active);
        assert_eq!(report.metrics.current_step, 1);
        assert!(workflows.iter().any(|w| w.is_template && w.status == WorkflowStatus::Draft));
    }
}
