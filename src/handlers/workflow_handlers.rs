use actix_web::{web, HttpResponse};
use chrono::Utc;

use crate::audit;
use crate::auth::Actor;
use crate::errors::AppError;
use crate::handlers::event_handlers::{EventHub, EventKind, WorkflowEvent};
use crate::models::workflow::{
    self, CompleteStepRequest, Mutation, RejectStepRequest, Workflow, WorkflowDraft, WorkflowStore,
};

/// Run a transition through the store, then audit and announce the result.
async fn apply_transition(
    store: &dyn WorkflowStore,
    hub: &EventHub,
    actor: &Actor,
    workflow_id: &str,
    action: &str,
    details: serde_json::Value,
    mutation: Mutation,
) -> Result<HttpResponse, AppError> {
    let updated = store.update_with(workflow_id, mutation).await?;

    audit::log(actor, action, "workflow", &updated.id, details);
    hub.publish(&WorkflowEvent::for_workflow(EventKind::WorkflowUpdated, &updated, actor));

    Ok(HttpResponse::Ok().json(updated))
}

/// GET /api/workflows - List every workflow, templates included
pub async fn list(store: web::Data<dyn WorkflowStore>) -> Result<HttpResponse, AppError> {
    let workflows = store.list().await?;
    Ok(HttpResponse::Ok().json(workflows))
}

/// GET /api/workflows/stats - Dashboard counters
pub async fn stats(store: web::Data<dyn WorkflowStore>) -> Result<HttpResponse, AppError> {
    let workflows = store.list().await?;
    Ok(HttpResponse::Ok().json(workflow::compute_stats(&workflows)))
}

/// GET /api/workflows/my-pending-tasks - Steps waiting on the caller's role
pub async fn my_pending_tasks(
    store: web::Data<dyn WorkflowStore>,
    actor: web::ReqData<Actor>,
) -> Result<HttpResponse, AppError> {
    let workflows = store.list().await?;
    let tasks = workflow::pending_tasks_for(&workflows, &actor);
    Ok(HttpResponse::Ok().json(tasks))
}

/// GET /api/workflows/{id}
pub async fn read(
    store: web::Data<dyn WorkflowStore>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let workflow = store.find_by_id(&path).await?.ok_or(AppError::NotFound)?;
    Ok(HttpResponse::Ok().json(workflow))
}

/// POST /api/workflows - Create a DRAFT workflow
pub async fn create(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    body: web::Json<WorkflowDraft>,
) -> Result<HttpResponse, AppError> {
    let draft = body.into_inner();
    let errors = workflow::validate_draft(&draft);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    let created = Workflow::from_draft(draft, &actor.name, Utc::now());
    store.insert(&created).await?;

    let details = serde_json::json!({
        "name": created.name,
        "type": created.workflow_type,
        "steps": created.steps.len(),
        "is_template": created.is_template,
        "summary": "Workflow created via API"
    });
    audit::log(&actor, "workflow.created", "workflow", &created.id, details);
    hub.publish(&WorkflowEvent::for_workflow(EventKind::WorkflowCreated, &created, &actor));

    Ok(HttpResponse::Created().json(created))
}

/// POST /api/workflows/{id}/start - DRAFT -> ACTIVE
pub async fn start(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let actor = actor.into_inner();
    let mover = actor.clone();
    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &path,
        "workflow.started",
        serde_json::json!({ "summary": "Workflow started" }),
        Box::new(move |w: &mut Workflow| w.start(&mover, Utc::now())),
    )
    .await
}

/// An empty body means no comment; anything else must be a valid request.
fn parse_complete_body(body: &[u8]) -> Result<CompleteStepRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(CompleteStepRequest::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}

/// POST /api/workflows/{id}/steps/{index}/complete
/// Body (optional): `{"comment": "..."}`
pub async fn complete_step(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<(String, usize)>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let (workflow_id, index) = path.into_inner();
    let comment = parse_complete_body(&body)?.comment;
    let actor = actor.into_inner();
    let mover = actor.clone();

    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &workflow_id,
        "workflow.step_completed",
        serde_json::json!({ "step_index": index, "comment": comment }),
        Box::new(move |w: &mut Workflow| w.complete_step(index, &mover, comment, Utc::now())),
    )
    .await
}

/// POST /api/workflows/{id}/steps/{index}/reject
/// Body: `{"reason": "..."}` (required, non-empty)
pub async fn reject_step(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<(String, usize)>,
    body: web::Json<RejectStepRequest>,
) -> Result<HttpResponse, AppError> {
    let (workflow_id, index) = path.into_inner();
    let reason = body.into_inner().reason.trim().to_string();
    if reason.is_empty() {
        return Err(AppError::Validation("Rejection reason is required".to_string()));
    }
    let actor = actor.into_inner();
    let mover = actor.clone();

    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &workflow_id,
        "workflow.step_rejected",
        serde_json::json!({ "step_index": index, "rejection_reason": reason }),
        Box::new(move |w: &mut Workflow| w.reject_step(index, &mover, &reason, Utc::now())),
    )
    .await
}

/// POST /api/workflows/{id}/steps/{index}/skip - Administrators only
pub async fn skip_step(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<(String, usize)>,
) -> Result<HttpResponse, AppError> {
    let (workflow_id, index) = path.into_inner();
    let actor = actor.into_inner();
    let mover = actor.clone();

    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &workflow_id,
        "workflow.step_skipped",
        serde_json::json!({ "step_index": index }),
        Box::new(move |w: &mut Workflow| w.skip_step(index, &mover, Utc::now())),
    )
    .await
}

/// POST /api/workflows/{id}/pause - ACTIVE -> PAUSED
pub async fn pause(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let actor = actor.into_inner();
    let mover = actor.clone();
    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &path,
        "workflow.paused",
        serde_json::json!({}),
        Box::new(move |w: &mut Workflow| w.pause(&mover, Utc::now())),
    )
    .await
}

/// POST /api/workflows/{id}/resume - PAUSED -> ACTIVE
pub async fn resume(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let actor = actor.into_inner();
    let mover = actor.clone();
    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &path,
        "workflow.resumed",
        serde_json::json!({}),
        Box::new(move |w: &mut Workflow| w.resume(&mover, Utc::now())),
    )
    .await
}

/// POST /api/workflows/{id}/archive
pub async fn archive(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let actor = actor.into_inner();
    let mover = actor.clone();
    apply_transition(
        store.get_ref(),
        &hub,
        &actor,
        &path,
        "workflow.archived",
        serde_json::json!({}),
        Box::new(move |w: &mut Workflow| w.archive(&mover, Utc::now())),
    )
    .await
}

/// DELETE /api/workflows/{id} - Owner or administrator
pub async fn delete(
    store: web::Data<dyn WorkflowStore>,
    hub: web::Data<EventHub>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let workflow_id = path.into_inner();

    let existing = store.find_by_id(&workflow_id).await?.ok_or(AppError::NotFound)?;
    existing.require_owner(&actor, "delete it")?;

    if !store.delete(&workflow_id).await? {
        return Err(AppError::NotFound);
    }

    let details = serde_json::json!({
        "name": existing.name,
        "summary": "Workflow deleted via API"
    });
    audit::log(&actor, "workflow.deleted", "workflow", &workflow_id, details);
    hub.publish(&WorkflowEvent::deleted(&workflow_id, &actor));

    Ok(HttpResponse::NoContent().finish())
}
