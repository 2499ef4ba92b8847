//! Workflow state machine.
//!
//! Every transition the API exposes is a method on [`Workflow`] that either
//! applies completely or leaves the workflow untouched. Metrics are
//! recomputed after each successful transition, and an ACTIVE workflow whose
//! steps are all resolved moves to COMPLETED in the same call.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Actor;
use super::types::*;

/// Reason a requested transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {action} a workflow in status {status}")]
    InvalidStatus {
        action: &'static str,
        status: &'static str,
    },
    #[error("Templates cannot be started")]
    Template,
    #[error("Step {index} does not exist (workflow has {len} steps)")]
    StepOutOfRange { index: usize, len: usize },
    #[error("Step {index} is {status:?}, it cannot be {action}")]
    StepNotActionable {
        index: usize,
        status: StepStatus,
        action: &'static str,
    },
    #[error("Step {index} is assigned to role '{role}'")]
    NotAssigned { index: usize, role: String },
    #[error("Only the workflow owner or an administrator may {0}")]
    NotOwner(&'static str),
}

/// Check a creation request. Returns one message per problem found.
pub fn validate_draft(draft: &WorkflowDraft) -> Vec<String> {
    let mut errors = Vec::new();
    if draft.name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    if draft.workflow_type.trim().is_empty() {
        errors.push("Type is required".to_string());
    }
    if draft.steps.is_empty() {
        errors.push("At least one step is required".to_string());
    }
    for (i, step) in draft.steps.iter().enumerate() {
        if step.name.trim().is_empty() {
            errors.push(format!("Step {} needs a name", i + 1));
        }
        if step.assigned_role.trim().is_empty() {
            errors.push(format!("Step {} needs an assigned role", i + 1));
        }
    }
    errors
}

impl Workflow {
    /// Build a DRAFT workflow from a validated draft.
    pub fn from_draft(draft: WorkflowDraft, created_by: &str, now: DateTime<Utc>) -> Self {
        let steps = draft
            .steps
            .into_iter()
            .enumerate()
            .map(|(i, s)| Step {
                name: s.name.trim().to_string(),
                description: s.description.unwrap_or_default(),
                order: i as u32 + 1,
                required_action: s.required_action,
                assigned_role: s.assigned_role.trim().to_string(),
                status: StepStatus::Pending,
                comment: None,
                completed_by: None,
                completed_at: None,
                due_date: s.due_date,
            })
            .collect();

        let mut workflow = Workflow {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description.unwrap_or_default(),
            workflow_type: draft.workflow_type.trim().to_string(),
            status: WorkflowStatus::Draft,
            priority: draft.priority,
            is_template: draft.is_template,
            steps,
            metrics: WorkflowMetrics::default(),
            settings: draft.settings.unwrap_or_default(),
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        workflow.recompute_metrics();
        workflow
    }

    pub fn start(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.require_owner(actor, "start it")?;
        if self.is_template {
            return Err(TransitionError::Template);
        }
        self.require_status("start", &[WorkflowStatus::Draft])?;

        self.status = WorkflowStatus::Active;
        if self.settings.require_sequential {
            if let Some(first) = self.steps.first_mut() {
                first.status = StepStatus::InProgress;
            }
        } else {
            for step in &mut self.steps {
                step.status = StepStatus::InProgress;
            }
        }
        self.settle(now);
        Ok(())
    }

    pub fn complete_step(
        &mut self,
        index: usize,
        actor: &Actor,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.require_status("complete a step of", &[WorkflowStatus::Active])?;
        let step = self.actionable_step(index, actor, "completed")?;

        step.status = StepStatus::Completed;
        step.comment = comment.filter(|c| !c.trim().is_empty());
        step.completed_by = Some(actor.name.clone());
        step.completed_at = Some(now);

        self.advance();
        self.settle(now);
        Ok(())
    }

    /// Reject a step. The remaining unresolved steps are skipped and the
    /// workflow completes with a REJECTED outcome.
    pub fn reject_step(
        &mut self,
        index: usize,
        actor: &Actor,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.require_status("reject a step of", &[WorkflowStatus::Active])?;
        let step = self.actionable_step(index, actor, "rejected")?;

        step.status = StepStatus::Rejected;
        step.comment = Some(reason.trim().to_string());
        step.completed_by = Some(actor.name.clone());
        step.completed_at = Some(now);

        for step in &mut self.steps {
            if !step.status.is_resolved() {
                step.status = StepStatus::Skipped;
            }
        }
        self.settle(now);
        Ok(())
    }

    /// Administrative bypass of a pending or running step.
    pub fn skip_step(&mut self, index: usize, actor: &Actor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        if !actor.is_admin() {
            return Err(TransitionError::NotOwner("skip steps"));
        }
        self.require_status("skip a step of", &[WorkflowStatus::Active])?;
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(TransitionError::StepOutOfRange { index, len })?;
        if step.status.is_resolved() {
            return Err(TransitionError::StepNotActionable {
                index,
                status: step.status,
                action: "skipped",
            });
        }

        step.status = StepStatus::Skipped;
        step.completed_by = Some(actor.name.clone());
        step.completed_at = Some(now);

        self.advance();
        self.settle(now);
        Ok(())
    }

    pub fn pause(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.require_owner(actor, "pause it")?;
        self.require_status("pause", &[WorkflowStatus::Active])?;
        self.status = WorkflowStatus::Paused;
        self.updated_at = now;
        Ok(())
    }

    pub fn resume(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.require_owner(actor, "resume it")?;
        self.require_status("resume", &[WorkflowStatus::Paused])?;
        self.status = WorkflowStatus::Active;
        self.updated_at = now;
        Ok(())
    }

    pub fn archive(&mut self, actor: &Actor, now: DateTime<Utc>) -> Result<(), TransitionError> {
        self.require_owner(actor, "archive it")?;
        self.require_status(
            "archive",
            &[
                WorkflowStatus::Draft,
                WorkflowStatus::Active,
                WorkflowStatus::Paused,
                WorkflowStatus::Completed,
            ],
        )?;
        self.status = WorkflowStatus::Archived;
        self.updated_at = now;
        Ok(())
    }

    /// Owner or admin check, shared with deletion.
    pub fn require_owner(&self, actor: &Actor, action: &'static str) -> Result<(), TransitionError> {
        if actor.is_admin() || actor.name == self.created_by {
            Ok(())
        } else {
            Err(TransitionError::NotOwner(action))
        }
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_resolved())
    }

    /// Recompute `metrics` from step state.
    pub fn recompute_metrics(&mut self) {
        let len = self.steps.len();
        let resolved = self.steps.iter().filter(|s| s.status.is_resolved()).count();
        let current_step = self
            .steps
            .iter()
            .position(|s| !s.status.is_resolved())
            .unwrap_or(len);

        // Integer division never reaches 100 before the last step resolves.
        let progress_percentage = if len == 0 || resolved == len {
            if self.status == WorkflowStatus::Draft { 0 } else { 100 }
        } else {
            (resolved * 100 / len) as u8
        };

        let outcome = match self.status {
            WorkflowStatus::Completed | WorkflowStatus::Archived if resolved == len => {
                if self.steps.iter().any(|s| s.status == StepStatus::Rejected) {
                    Some(Outcome::Rejected)
                } else {
                    Some(Outcome::Approved)
                }
            }
            _ => None,
        };

        self.metrics = WorkflowMetrics {
            current_step,
            progress_percentage,
            outcome,
        };
    }

    fn require_status(&self, action: &'static str, allowed: &[WorkflowStatus]) -> Result<(), TransitionError> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(TransitionError::InvalidStatus {
                action,
                status: self.status.as_str(),
            })
        }
    }

    fn actionable_step(
        &mut self,
        index: usize,
        actor: &Actor,
        action: &'static str,
    ) -> Result<&mut Step, TransitionError> {
        let len = self.steps.len();
        let step = self
            .steps
            .get_mut(index)
            .ok_or(TransitionError::StepOutOfRange { index, len })?;
        if step.status != StepStatus::InProgress {
            return Err(TransitionError::StepNotActionable {
                index,
                status: step.status,
                action,
            });
        }
        if !actor.is_admin() && actor.role != step.assigned_role {
            return Err(TransitionError::NotAssigned {
                index,
                role: step.assigned_role.clone(),
            });
        }
        Ok(step)
    }

    /// In sequential mode, hand the baton to the next pending step once
    /// nothing is running.
    fn advance(&mut self) {
        if !self.settings.require_sequential {
            return;
        }
        if self.steps.iter().any(|s| s.status == StepStatus::InProgress) {
            return;
        }
        if let Some(next) = self.steps.iter_mut().find(|s| s.status == StepStatus::Pending) {
            next.status = StepStatus::InProgress;
        }
    }

    fn settle(&mut self, now: DateTime<Utc>) {
        if self.status == WorkflowStatus::Active && self.is_fully_resolved() {
            self.status = WorkflowStatus::Completed;
        }
        self.updated_at = now;
        self.recompute_metrics();
    }
}
