//! Shared test infrastructure for the API and tracker tests.
//!
//! - `services()` builds in-memory app state with three known actors
//! - `LocalApi` drives the workflow engine directly, no HTTP involved
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use actix_web::ResponseError;
use async_trait::async_trait;
use chrono::Utc;

use impactflow::app::AppServices;
use impactflow::auth::{Actor, ActorDirectory};
use impactflow::errors::AppError;
use impactflow::models::setting::MemorySettingsRepository;
use impactflow::models::workflow::{
    self, MemoryStore, Mutation, PendingTask, Priority, RequiredAction, StepDraft, Workflow,
    WorkflowDraft, WorkflowStats, WorkflowStore,
};
use impactflow::tracker::{ApiError, WorkflowApi};

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const ADMIN_TOKEN: &str = "admin-token";
pub const MANAGER_TOKEN: &str = "manager-token";
pub const ANALYST_TOKEN: &str = "analyst-token";

pub fn actors() -> ActorDirectory {
    ActorDirectory::parse(&format!(
        "{ADMIN_TOKEN}=root:admin,{MANAGER_TOKEN}=alice:manager,{ANALYST_TOKEN}=bob:analyst"
    ))
    .expect("valid actor spec")
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

// ============================================================================
// APP SETUP
// ============================================================================

pub fn services() -> AppServices {
    AppServices::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemorySettingsRepository::default()),
        actors(),
    )
}

// ============================================================================
// DRAFT BUILDERS
// ============================================================================

pub fn step(name: &str, role: &str) -> StepDraft {
    StepDraft {
        name: name.to_string(),
        description: None,
        required_action: RequiredAction::Approve,
        assigned_role: role.to_string(),
        due_date: None,
    }
}

/// A REPORT draft with one step per `(name, role)` pair.
pub fn draft(name: &str, steps: &[(&str, &str)]) -> WorkflowDraft {
    WorkflowDraft {
        name: name.to_string(),
        description: None,
        workflow_type: "REPORT".to_string(),
        priority: Priority::Medium,
        steps: steps.iter().map(|(n, r)| step(n, r)).collect(),
        is_template: false,
        settings: None,
    }
}

// ============================================================================
// IN-PROCESS API
// ============================================================================

/// `WorkflowApi` backed by a `MemoryStore`, acting as a single actor.
/// Errors come back the way the HTTP service would report them.
pub struct LocalApi {
    pub store: MemoryStore,
    pub actor: Actor,
    pub offline: AtomicBool,
    pub stats_down: AtomicBool,
    pub tasks_down: AtomicBool,
    pub calls: AtomicUsize,
}

impl LocalApi {
    pub fn new(actor: Actor) -> Self {
        LocalApi {
            store: MemoryStore::new(),
            actor,
            offline: AtomicBool::new(false),
            stats_down: AtomicBool::new(false),
            tasks_down: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn admin() -> Self {
        Self::new(Actor::new("root", "admin"))
    }

    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    /// Make only the stats endpoint fail from now on.
    pub fn break_stats(&self) {
        self.stats_down.store(true, Ordering::SeqCst);
    }

    /// Make only the pending-task endpoint fail from now on.
    pub fn break_pending_tasks(&self) {
        self.tasks_down.store(true, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Insert a workflow directly, bypassing the tracker.
    pub async fn seed(&self, draft: WorkflowDraft) -> Workflow {
        let wf = Workflow::from_draft(draft, &self.actor.name, Utc::now());
        self.store.insert(&wf).await.expect("insert");
        wf
    }

    fn enter(&self) -> Result<(), ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            Err(ApiError::Transport("Network Error".to_string()))
        } else {
            Ok(())
        }
    }

    async fn transition(&self, id: &str, mutation: Mutation) -> Result<Workflow, ApiError> {
        self.enter()?;
        self.store.update_with(id, mutation).await.map_err(to_api_error)
    }
}

fn to_api_error(e: AppError) -> ApiError {
    ApiError::Server {
        status: e.status_code().as_u16(),
        message: e.to_string(),
    }
}

#[async_trait]
impl WorkflowApi for LocalApi {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        self.enter()?;
        self.store.list().await.map_err(to_api_error)
    }

    async fn stats(&self) -> Result<WorkflowStats, ApiError> {
        self.enter()?;
        if self.stats_down.load(Ordering::SeqCst) {
            return Err(to_api_error(AppError::Io(std::io::Error::other("stats unavailable"))));
        }
        let all = self.store.list().await.map_err(to_api_error)?;
        Ok(workflow::compute_stats(&all))
    }

    async fn my_pending_tasks(&self) -> Result<Vec<PendingTask>, ApiError> {
        self.enter()?;
        if self.tasks_down.load(Ordering::SeqCst) {
            return Err(to_api_error(AppError::Io(std::io::Error::other("tasks unavailable"))));
        }
        let all = self.store.list().await.map_err(to_api_error)?;
        Ok(workflow::pending_tasks_for(&all, &self.actor))
    }

    async fn create(&self, draft: &WorkflowDraft) -> Result<Workflow, ApiError> {
        self.enter()?;
        let errors = workflow::validate_draft(draft);
        if !errors.is_empty() {
            return Err(to_api_error(AppError::Validation(errors.join("; "))));
        }
        let wf = Workflow::from_draft(draft.clone(), &self.actor.name, Utc::now());
        self.store.insert(&wf).await.map_err(to_api_error)?;
        Ok(wf)
    }

    async fn start(&self, id: &str) -> Result<Workflow, ApiError> {
        let actor = self.actor.clone();
        self.transition(id, Box::new(move |w: &mut Workflow| w.start(&actor, Utc::now())))
            .await
    }

    async fn complete_step(&self, id: &str, index: usize, comment: Option<&str>) -> Result<Workflow, ApiError> {
        let actor = self.actor.clone();
        let comment = comment.map(str::to_string);
        self.transition(
            id,
            Box::new(move |w: &mut Workflow| w.complete_step(index, &actor, comment, Utc::now())),
        )
        .await
    }

    async fn reject_step(&self, id: &str, index: usize, reason: &str) -> Result<Workflow, ApiError> {
        let actor = self.actor.clone();
        let reason = reason.to_string();
        self.transition(
            id,
            Box::new(move |w: &mut Workflow| w.reject_step(index, &actor, &reason, Utc::now())),
        )
        .await
    }

    async fn pause(&self, id: &str) -> Result<Workflow, ApiError> {
        let actor = self.actor.clone();
        self.transition(id, Box::new(move |w: &mut Workflow| w.pause(&actor, Utc::now())))
            .await
    }

    async fn resume(&self, id: &str) -> Result<Workflow, ApiError> {
        let actor = self.actor.clone();
        self.transition(id, Box::new(move |w: &mut Workflow| w.resume(&actor, Utc::now())))
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.enter()?;
        if self.store.delete(id).await.map_err(to_api_error)? {
            Ok(())
        } else {
            Err(to_api_error(AppError::NotFound))
        }
    }
}
