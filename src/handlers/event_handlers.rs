use actix_web::{web, HttpRequest, HttpResponse};
use actix_ws::Message;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

use crate::auth::Actor;
use crate::models::workflow::{Workflow, WorkflowStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    WorkflowCreated,
    WorkflowUpdated,
    WorkflowDeleted,
}

/// Change notification pushed to connected dashboards.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub workflow_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    pub actor: String,
}

impl WorkflowEvent {
    pub fn for_workflow(kind: EventKind, workflow: &Workflow, actor: &Actor) -> Self {
        WorkflowEvent {
            kind,
            workflow_id: workflow.id.clone(),
            status: Some(workflow.status),
            actor: actor.name.clone(),
        }
    }

    pub fn deleted(workflow_id: &str, actor: &Actor) -> Self {
        WorkflowEvent {
            kind: EventKind::WorkflowDeleted,
            workflow_id: workflow_id.to_string(),
            status: None,
            actor: actor.name.clone(),
        }
    }
}

/// Open WebSocket connections, grouped by actor name.
#[derive(Clone, Default)]
pub struct EventHub {
    connections: Arc<RwLock<HashMap<String, Vec<mpsc::UnboundedSender<String>>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; events arrive as serialized JSON strings.
    pub fn subscribe(&self, actor_name: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let mut map = self.connections.write().unwrap_or_else(|e| e.into_inner());
        map.entry(actor_name.to_string()).or_default().push(tx);
        rx
    }

    /// Broadcast to every listener, dropping the ones that went away.
    pub fn publish(&self, event: &WorkflowEvent) {
        let msg = match serde_json::to_string(event) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Failed to serialize workflow event: {e}");
                return;
            }
        };
        let mut map = self.connections.write().unwrap_or_else(|e| e.into_inner());
        for senders in map.values_mut() {
            senders.retain(|s| s.send(msg.clone()).is_ok());
        }
        map.retain(|_, senders| !senders.is_empty());
    }

    pub fn subscriber_count(&self) -> usize {
        let map = self.connections.read().unwrap_or_else(|e| e.into_inner());
        map.values().map(Vec::len).sum()
    }

    fn prune(&self, actor_name: &str) {
        let mut map = self.connections.write().unwrap_or_else(|e| e.into_inner());
        if let Some(senders) = map.get_mut(actor_name) {
            senders.retain(|s| !s.is_closed());
            if senders.is_empty() {
                map.remove(actor_name);
            }
        }
    }
}

/// GET /api/workflows/events - WebSocket stream of workflow changes.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    actor: web::ReqData<Actor>,
    hub: web::Data<EventHub>,
) -> Result<HttpResponse, actix_web::Error> {
    let actor = actor.into_inner();
    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;

    let mut rx = hub.subscribe(&actor.name);
    let hub = hub.get_ref().clone();
    log::info!("Event stream opened for {}", actor.name);

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                Some(msg) = rx.recv() => {
                    if ws_session.text(msg).await.is_err() {
                        break;
                    }
                }
                Some(Ok(msg)) = msg_stream.recv() => {
                    match msg {
                        Message::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        // Mutations go through the REST endpoints.
                        _ => {}
                    }
                }
                else => break,
            }
        }

        drop(rx);
        hub.prune(&actor.name);
        log::info!("Event stream closed for {}", actor.name);
    });

    Ok(response)
}
