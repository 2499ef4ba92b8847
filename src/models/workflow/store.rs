use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::errors::AppError;
use super::engine::TransitionError;
use super::types::Workflow;

/// A transition applied to one workflow inside the store's critical section.
pub type Mutation = Box<dyn FnOnce(&mut Workflow) -> Result<(), TransitionError> + Send>;

/// Persistence seam for workflows.
///
/// `update_with` is the only way to change an existing workflow: the store
/// loads it, applies the mutation and writes it back atomically, so two
/// callers racing on the same step cannot both succeed.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// All workflows, oldest first.
    async fn list(&self) -> Result<Vec<Workflow>, AppError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Workflow>, AppError>;

    async fn insert(&self, workflow: &Workflow) -> Result<(), AppError>;

    /// Apply `mutation` and persist the result. `AppError::NotFound` if the
    /// workflow does not exist; the stored copy is unchanged on error.
    async fn update_with(&self, id: &str, mutation: Mutation) -> Result<Workflow, AppError>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn count(&self) -> Result<usize, AppError>;
}

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    workflows: RwLock<Vec<Workflow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Workflow>, AppError> {
        Ok(self.workflows.read().await.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Workflow>, AppError> {
        Ok(self.workflows.read().await.iter().find(|w| w.id == id).cloned())
    }

    async fn insert(&self, workflow: &Workflow) -> Result<(), AppError> {
        let mut workflows = self.workflows.write().await;
        if workflows.iter().any(|w| w.id == workflow.id) {
            return Err(AppError::Validation(format!("Workflow {} already exists", workflow.id)));
        }
        workflows.push(workflow.clone());
        Ok(())
    }

    async fn update_with(&self, id: &str, mutation: Mutation) -> Result<Workflow, AppError> {
        let mut workflows = self.workflows.write().await;
        let slot = workflows
            .iter_mut()
            .find(|w| w.id == id)
            .ok_or(AppError::NotFound)?;

        let mut updated = slot.clone();
        mutation(&mut updated)?;
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut workflows = self.workflows.write().await;
        let before = workflows.len();
        workflows.retain(|w| w.id != id);
        Ok(workflows.len() != before)
    }

    async fn count(&self) -> Result<usize, AppError> {
        Ok(self.workflows.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Actor;
    use crate::models::workflow::types::*;
    use chrono::Utc;

    fn sample(name: &str) -> Workflow {
        let draft = WorkflowDraft {
            name: name.to_string(),
            description: None,
            workflow_type: "AUDIT".to_string(),
            priority: Priority::Low,
            steps: vec![StepDraft {
                name: "Sign-off".to_string(),
                description: None,
                required_action: RequiredAction::Validate,
                assigned_role: "auditor".to_string(),
                due_date: None,
            }],
            is_template: false,
            settings: None,
        };
        Workflow::from_draft(draft, "olivia", Utc::now())
    }

    #[tokio::test]
    async fn insert_list_and_delete_preserve_order() {
        let store = MemoryStore::new();
        let (a, b, c) = (sample("A"), sample("B"), sample("C"));
        for wf in [&a, &b, &c] {
            store.insert(wf).await.unwrap();
        }
        assert!(store.insert(&a).await.is_err());

        assert!(store.delete(&b.id).await.unwrap());
        assert!(!store.delete(&b.id).await.unwrap());

        let names: Vec<_> = store.list().await.unwrap().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn failed_mutation_leaves_stored_copy_untouched() {
        let store = MemoryStore::new();
        let wf = sample("A");
        store.insert(&wf).await.unwrap();

        let outsider = Actor::new("eve", "auditor");
        let result = store
            .update_with(&wf.id, Box::new(move |w: &mut Workflow| w.start(&outsider, Utc::now())))
            .await;
        assert!(matches!(result, Err(AppError::Transition(TransitionError::NotOwner(_)))));
        assert_eq!(store.find_by_id(&wf.id).await.unwrap().unwrap(), wf);

        let owner = Actor::new("olivia", "manager");
        let started = store
            .update_with(&wf.id, Box::new(move |w: &mut Workflow| w.start(&owner, Utc::now())))
            .await
            .unwrap();
        assert_eq!(started.status, WorkflowStatus::Active);
        assert_eq!(store.find_by_id(&wf.id).await.unwrap().unwrap().status, WorkflowStatus::Active);
    }

    #[tokio::test]
    async fn update_of_missing_workflow_is_not_found() {
        let store = MemoryStore::new();
        let result = store.update_with("nope", Box::new(|_: &mut Workflow| -> Result<(), TransitionError> { Ok(()) })).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
