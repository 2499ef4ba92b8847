use crate::models::workflow::{PendingTask, Workflow, WorkflowDraft, WorkflowStats, WorkflowStatus};

use super::api::WorkflowApi;
use super::error::ApiError;
use super::filter::{self, WorkflowFilter};
use super::resource::Resource;

/// Holds what a dashboard shows and runs every user action against the
/// service. Each action awaits its request and then reloads everything;
/// nothing is updated optimistically.
pub struct WorkflowTracker<A: WorkflowApi> {
    api: A,
    workflows: Resource<Workflow>,
    pending: Resource<PendingTask>,
    stats: Option<WorkflowStats>,
    error: Option<String>,
    pub filter: WorkflowFilter,
}

impl<A: WorkflowApi> WorkflowTracker<A> {
    pub fn new(api: A) -> Self {
        WorkflowTracker {
            api,
            workflows: Resource::default(),
            pending: Resource::default(),
            stats: None,
            error: None,
            filter: WorkflowFilter::default(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Fetch workflows, stats and pending tasks concurrently.
    ///
    /// A failed workflow or stats fetch sets [`error`](Self::error); a failed
    /// pending-task fetch only leaves that list empty.
    pub async fn refresh(&mut self) {
        self.workflows.begin();
        self.pending.begin();

        let (workflows, stats, pending) = tokio::join!(
            self.api.list_workflows(),
            self.api.stats(),
            self.api.my_pending_tasks()
        );

        self.workflows.settle(workflows);
        self.pending.settle_or_empty(pending);

        let stats_error = match stats {
            Ok(stats) => {
                self.stats = Some(stats);
                None
            }
            Err(e) => {
                self.stats = None;
                Some(e.to_string())
            }
        };
        self.error = self.workflows.error().map(str::to_string).or(stats_error);
    }

    pub async fn create(&mut self, draft: WorkflowDraft) -> Result<Workflow, ApiError> {
        if draft.name.trim().is_empty() {
            return self.refuse("Name is required");
        }
        if draft.steps.is_empty() {
            return self.refuse("At least one step is required");
        }
        let result = self.api.create(&draft).await;
        // A failed creation keeps the current list as is.
        self.finish(result, false).await
    }

    pub async fn start(&mut self, workflow_id: &str) -> Result<Workflow, ApiError> {
        let startable = self
            .find(workflow_id)
            .is_none_or(|wf| !wf.is_template && wf.status == WorkflowStatus::Draft);
        if !startable {
            return self.refuse("Only draft workflows can be started");
        }
        let result = self.api.start(workflow_id).await;
        self.finish(result, true).await
    }

    pub async fn complete_step(
        &mut self,
        workflow_id: &str,
        step_index: usize,
        comment: Option<&str>,
    ) -> Result<Workflow, ApiError> {
        let result = self.api.complete_step(workflow_id, step_index, comment).await;
        self.finish(result, true).await
    }

    /// Complete the step behind a pending task.
    pub async fn complete_task(&mut self, task: &PendingTask) -> Result<Workflow, ApiError> {
        self.complete_step(&task.workflow_id, task.step_index, None)
            .await
    }

    pub async fn reject_step(
        &mut self,
        workflow_id: &str,
        step_index: usize,
        reason: &str,
    ) -> Result<Workflow, ApiError> {
        if reason.trim().is_empty() {
            return self.refuse("A reason is required to reject a step");
        }
        let result = self.api.reject_step(workflow_id, step_index, reason).await;
        self.finish(result, true).await
    }

    pub async fn pause(&mut self, workflow_id: &str) -> Result<Workflow, ApiError> {
        let result = self.api.pause(workflow_id).await;
        self.finish(result, true).await
    }

    pub async fn resume(&mut self, workflow_id: &str) -> Result<Workflow, ApiError> {
        let result = self.api.resume(workflow_id).await;
        self.finish(result, true).await
    }

    pub async fn delete(&mut self, workflow_id: &str) -> Result<(), ApiError> {
        let result = self.api.delete(workflow_id).await;
        self.finish(result, true).await
    }

    /// Reload after an action. On failure the action's error replaces
    /// whatever the reload reported.
    async fn finish<T>(&mut self, result: Result<T, ApiError>, reload_on_error: bool) -> Result<T, ApiError> {
        match result {
            Ok(value) => {
                self.refresh().await;
                Ok(value)
            }
            Err(e) => {
                log::warn!("Workflow action failed: {e}");
                if reload_on_error {
                    self.refresh().await;
                }
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn refuse<T>(&mut self, message: &str) -> Result<T, ApiError> {
        self.error = Some(message.to_string());
        Err(ApiError::Invalid(message.to_string()))
    }

    pub fn workflows(&self) -> &[Workflow] {
        self.workflows.items()
    }

    /// Non-template workflows that pass the current filter.
    pub fn visible_workflows(&self) -> Vec<&Workflow> {
        self.filter.apply(self.workflows.items())
    }

    pub fn templates(&self) -> Vec<&Workflow> {
        filter::templates(self.workflows.items())
    }

    /// Distinct workflow types in the loaded list, for the type filter.
    pub fn workflow_types(&self) -> Vec<&str> {
        filter::workflow_types(self.workflows.items())
    }

    pub fn find(&self, workflow_id: &str) -> Option<&Workflow> {
        self.workflows.items().iter().find(|w| w.id == workflow_id)
    }

    pub fn pending_tasks(&self) -> &[PendingTask] {
        self.pending.items()
    }

    pub fn stats(&self) -> Option<&WorkflowStats> {
        self.stats.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.workflows.is_loading() || self.pending.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every call with the same transport error, counting requests.
    #[derive(Default)]
    struct Offline {
        calls: AtomicUsize,
        created: Mutex<Vec<String>>,
    }

    impl Offline {
        fn fail<T>(&self) -> Result<T, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ApiError::Transport("Network Error".into()))
        }
    }

    #[async_trait]
    impl WorkflowApi for Offline {
        async fn list_workflows(&self) -> Result<Vec<Workflow>, ApiError> {
            self.fail()
        }
        async fn stats(&self) -> Result<WorkflowStats, ApiError> {
            self.fail()
        }
        async fn my_pending_tasks(&self) -> Result<Vec<PendingTask>, ApiError> {
            self.fail()
        }
        async fn create(&self, draft: &WorkflowDraft) -> Result<Workflow, ApiError> {
            self.created.lock().unwrap().push(draft.name.clone());
            self.fail()
        }
        async fn start(&self, _: &str) -> Result<Workflow, ApiError> {
            self.fail()
        }
        async fn complete_step(&self, _: &str, _: usize, _: Option<&str>) -> Result<Workflow, ApiError> {
            self.fail()
        }
        async fn reject_step(&self, _: &str, _: usize, _: &str) -> Result<Workflow, ApiError> {
            self.fail()
        }
        async fn pause(&self, _: &str) -> Result<Workflow, ApiError> {
            self.fail()
        }
        async fn resume(&self, _: &str) -> Result<Workflow, ApiError> {
            self.fail()
        }
        async fn delete(&self, _: &str) -> Result<(), ApiError> {
            self.fail()
        }
    }

    fn empty_draft(name: &str) -> WorkflowDraft {
        WorkflowDraft {
            name: name.into(),
            description: None,
            workflow_type: "REPORT".into(),
            priority: Default::default(),
            steps: vec![],
            is_template: false,
            settings: None,
        }
    }

    #[tokio::test]
    async fn network_failure_empties_list_and_sets_error() {
        let mut tracker = WorkflowTracker::new(Offline::default());
        tracker.refresh().await;
        assert!(tracker.workflows().is_empty());
        assert!(tracker.pending_tasks().is_empty());
        assert!(tracker.stats().is_none());
        assert_eq!(tracker.error(), Some("Network Error"));
        assert!(!tracker.is_loading());
    }

    #[tokio::test]
    async fn create_gate_blocks_before_any_request() {
        let mut tracker = WorkflowTracker::new(Offline::default());

        let err = tracker.create(empty_draft("  ")).await.unwrap_err();
        assert_eq!(err, ApiError::Invalid("Name is required".into()));

        let err = tracker.create(empty_draft("Report")).await.unwrap_err();
        assert_eq!(err.to_string(), "At least one step is required");

        assert_eq!(tracker.api().calls.load(Ordering::SeqCst), 0);
        assert!(tracker.api().created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_requires_a_reason() {
        let mut tracker = WorkflowTracker::new(Offline::default());
        assert!(tracker.reject_step("wf", 0, " ").await.is_err());
        assert_eq!(tracker.api().calls.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.error(), Some("A reason is required to reject a step"));

        tracker.clear_error();
        assert_eq!(tracker.error(), None);
    }

    #[tokio::test]
    async fn failed_action_reloads_and_keeps_its_own_message() {
        let mut tracker = WorkflowTracker::new(Offline::default());
        let err = tracker.complete_step("wf", 0, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Network Error");
        // one action call plus the three reload fetches
        assert_eq!(tracker.api().calls.load(Ordering::SeqCst), 4);
        assert_eq!(tracker.error(), Some("Network Error"));
    }
}
