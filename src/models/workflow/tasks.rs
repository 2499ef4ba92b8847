use std::cmp::Ordering;

use crate::auth::Actor;
use super::types::*;

/// Steps currently waiting on `actor`: IN_PROGRESS steps of ACTIVE,
/// non-template workflows whose assigned role is the actor's role.
///
/// Ordered by priority (most urgent first), then due date (undated last),
/// then workflow name.
pub fn pending_tasks_for(workflows: &[Workflow], actor: &Actor) -> Vec<PendingTask> {
    let mut tasks: Vec<PendingTask> = workflows
        .iter()
        .filter(|w| w.status == WorkflowStatus::Active && !w.is_template)
        .flat_map(|w| {
            w.steps
                .iter()
                .enumerate()
                .filter(|(_, s)| s.status == StepStatus::InProgress && s.assigned_role == actor.role)
                .map(move |(index, s)| PendingTask {
                    workflow_id: w.id.clone(),
                    workflow_name: w.name.clone(),
                    step_index: index,
                    step_name: s.name.clone(),
                    priority: w.priority,
                    due_date: s.due_date,
                })
        })
        .collect();

    tasks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| match (a.due_date, b.due_date) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
            .then_with(|| a.workflow_name.cmp(&b.workflow_name))
            .then_with(|| a.step_index.cmp(&b.step_index))
    });
    tasks
}

/// Dashboard counters over non-template workflows.
pub fn compute_stats(workflows: &[Workflow]) -> WorkflowStats {
    workflows
        .iter()
        .filter(|w| !w.is_template)
        .fold(WorkflowStats::default(), |mut stats, w| {
            stats.total += 1;
            match w.status {
                WorkflowStatus::Active => stats.active += 1,
                WorkflowStatus::Completed => stats.completed += 1,
                WorkflowStatus::Draft => stats.draft += 1,
                WorkflowStatus::Paused | WorkflowStatus::Archived => {}
            }
            stats
        })
}
