use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use crate::models::workflow::{
    CompleteStepRequest, PendingTask, RejectStepRequest, Workflow, WorkflowDraft, WorkflowStats,
};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// The workflow endpoints as seen from a dashboard.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError>;

    async fn stats(&self) -> Result<WorkflowStats, ApiError>;

    async fn my_pending_tasks(&self) -> Result<Vec<PendingTask>, ApiError>;

    async fn create(&self, draft: &WorkflowDraft) -> Result<Workflow, ApiError>;

    async fn start(&self, workflow_id: &str) -> Result<Workflow, ApiError>;

    async fn complete_step(
        &self,
        workflow_id: &str,
        step_index: usize,
        comment: Option<&str>,
    ) -> Result<Workflow, ApiError>;

    async fn reject_step(&self, workflow_id: &str, step_index: usize, reason: &str) -> Result<Workflow, ApiError>;

    async fn pause(&self, workflow_id: &str) -> Result<Workflow, ApiError>;

    async fn resume(&self, workflow_id: &str) -> Result<Workflow, ApiError>;

    async fn delete(&self, workflow_id: &str) -> Result<(), ApiError>;
}

/// Error body returned by the service.
#[derive(Deserialize)]
struct ServerMessage {
    message: String,
}

/// [`WorkflowApi`] over HTTP. The bearer token, when set, is attached to
/// every request, and every response is decoded into its typed model here.
#[derive(Clone)]
pub struct HttpWorkflowApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl Default for HttpWorkflowApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl HttpWorkflowApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpWorkflowApi {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = ensure_success(builder.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// Turn a non-2xx response into [`ApiError::Server`], keeping the
/// service's `message` when the body carries one.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    let message = serde_json::from_slice::<ServerMessage>(&body)
        .map(|m| m.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl WorkflowApi for HttpWorkflowApi {
    async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
        self.fetch(self.request(Method::GET, "/workflows")).await
    }

    async fn stats(&self) -> Result<WorkflowStats, ApiError> {
        self.fetch(self.request(Method::GET, "/workflows/stats")).await
    }

    async fn my_pending_tasks(&self) -> Result<Vec<PendingTask>, ApiError> {
        self.fetch(self.request(Method::GET, "/workflows/my-pending-tasks"))
            .await
    }

    async fn create(&self, draft: &WorkflowDraft) -> Result<Workflow, ApiError> {
        self.fetch(self.request(Method::POST, "/workflows").json(draft))
            .await
    }

    async fn start(&self, workflow_id: &str) -> Result<Workflow, ApiError> {
        self.fetch(self.request(Method::POST, &format!("/workflows/{workflow_id}/start")))
            .await
    }

    async fn complete_step(
        &self,
        workflow_id: &str,
        step_index: usize,
        comment: Option<&str>,
    ) -> Result<Workflow, ApiError> {
        let body = CompleteStepRequest {
            comment: comment.map(str::to_string),
        };
        let path = format!("/workflows/{workflow_id}/steps/{step_index}/complete");
        self.fetch(self.request(Method::POST, &path).json(&body)).await
    }

    async fn reject_step(&self, workflow_id: &str, step_index: usize, reason: &str) -> Result<Workflow, ApiError> {
        let body = RejectStepRequest {
            reason: reason.to_string(),
        };
        let path = format!("/workflows/{workflow_id}/steps/{step_index}/reject");
        self.fetch(self.request(Method::POST, &path).json(&body)).await
    }

    async fn pause(&self, workflow_id: &str) -> Result<Workflow, ApiError> {
        self.fetch(self.request(Method::POST, &format!("/workflows/{workflow_id}/pause")))
            .await
    }

    async fn resume(&self, workflow_id: &str) -> Result<Workflow, ApiError> {
        self.fetch(self.request(Method::POST, &format!("/workflows/{workflow_id}/resume")))
            .await
    }

    async fn delete(&self, workflow_id: &str) -> Result<(), ApiError> {
        let builder = self.request(Method::DELETE, &format!("/workflows/{workflow_id}"));
        ensure_success(builder.send().await?).await?;
        Ok(())
    }
}
