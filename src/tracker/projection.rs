//! Pure views over a [`Workflow`] used to render a timeline.

use crate::models::workflow::{Step, StepStatus, Workflow, WorkflowStatus};

/// How a step is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepVisual {
    Waiting,
    Active,
    Done,
    Failed,
    Skipped,
}

impl From<StepStatus> for StepVisual {
    fn from(status: StepStatus) -> Self {
        match status {
            StepStatus::Pending => StepVisual::Waiting,
            StepStatus::InProgress => StepVisual::Active,
            StepStatus::Completed => StepVisual::Done,
            StepStatus::Rejected => StepVisual::Failed,
            StepStatus::Skipped => StepVisual::Skipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepView<'a> {
    pub index: usize,
    pub step: &'a Step,
    pub visual: StepVisual,
    pub is_current: bool,
}

pub fn project_steps(workflow: &Workflow) -> Vec<StepView<'_>> {
    let current = workflow.metrics.current_step;
    let running = matches!(workflow.status, WorkflowStatus::Active | WorkflowStatus::Paused);
    workflow
        .steps
        .iter()
        .enumerate()
        .map(|(index, step)| StepView {
            index,
            step,
            visual: step.status.into(),
            is_current: running && index == current,
        })
        .collect()
}

/// Progress as displayed, never outside `[0, 100]` or `[0, steps]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressView {
    pub percentage: u8,
    pub current_step: usize,
    pub total_steps: usize,
}

pub fn progress(workflow: &Workflow) -> ProgressView {
    let total_steps = workflow.steps.len();
    ProgressView {
        percentage: workflow.metrics.progress_percentage.min(100),
        current_step: workflow.metrics.current_step.min(total_steps),
        total_steps,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowAction {
    Start,
    CompleteStep(usize),
    RejectStep(usize),
    Pause,
    Resume,
    Delete,
}

/// Actions worth offering for `workflow`. The service still has the final
/// word on each of them.
pub fn available_actions(workflow: &Workflow) -> Vec<WorkflowAction> {
    let mut actions = Vec::new();
    match workflow.status {
        WorkflowStatus::Draft if !workflow.is_template => actions.push(WorkflowAction::Start),
        WorkflowStatus::Active => {
            for (index, step) in workflow.steps.iter().enumerate() {
                if step.status == StepStatus::InProgress {
                    actions.push(WorkflowAction::CompleteStep(index));
                    actions.push(WorkflowAction::RejectStep(index));
                }
            }
            actions.push(WorkflowAction::Pause);
        }
        WorkflowStatus::Paused => actions.push(WorkflowAction::Resume),
        _ => {}
    }
    actions.push(WorkflowAction::Delete);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ADMIN_ROLE, Actor};
    use crate::models::workflow::{Priority, RequiredAction, StepDraft, WorkflowDraft};
    use chrono::Utc;

    fn workflow(steps: usize) -> Workflow {
        let draft = WorkflowDraft {
            name: "Review".into(),
            description: None,
            workflow_type: "REPORT".into(),
            priority: Priority::High,
            steps: (0..steps)
                .map(|i| StepDraft {
                    name: format!("S{i}"),
                    description: None,
                    required_action: RequiredAction::Approve,
                    assigned_role: "manager".into(),
                    due_date: None,
                })
                .collect(),
            is_template: false,
            settings: None,
        };
        Workflow::from_draft(draft, "alice", Utc::now())
    }

    #[test]
    fn visuals_follow_step_status() {
        let admin = Actor::new("root", ADMIN_ROLE);
        let mut wf = workflow(3);
        wf.start(&admin, Utc::now()).unwrap();
        wf.complete_step(0, &admin, None, Utc::now()).unwrap();

        let views = project_steps(&wf);
        let visuals: Vec<_> = views.iter().map(|v| v.visual).collect();
        assert_eq!(
            visuals,
            vec![StepVisual::Done, StepVisual::Active, StepVisual::Waiting]
        );
        assert!(views[1].is_current);
        assert!(!views[0].is_current);
        assert_eq!(project_steps(&wf), views);
    }

    #[test]
    fn rejected_workflow_shows_failed_and_skipped() {
        let admin = Actor::new("root", ADMIN_ROLE);
        let mut wf = workflow(3);
        wf.start(&admin, Utc::now()).unwrap();
        wf.reject_step(0, &admin, "no", Utc::now()).unwrap();

        let visuals: Vec<_> = project_steps(&wf).iter().map(|v| v.visual).collect();
        assert_eq!(
            visuals,
            vec![StepVisual::Failed, StepVisual::Skipped, StepVisual::Skipped]
        );
        assert!(project_steps(&wf).iter().all(|v| !v.is_current));
    }

    #[test]
    fn progress_is_clamped() {
        let mut wf = workflow(2);
        wf.metrics.progress_percentage = 250;
        wf.metrics.current_step = 9;
        let view = progress(&wf);
        assert_eq!(view.percentage, 100);
        assert_eq!(view.current_step, 2);
        assert_eq!(view.total_steps, 2);
    }

    #[test]
    fn actions_depend_on_status() {
        let admin = Actor::new("root", ADMIN_ROLE);
        let mut wf = workflow(2);
        assert_eq!(
            available_actions(&wf),
            vec![WorkflowAction::Start, WorkflowAction::Delete]
        );

        wf.start(&admin, Utc::now()).unwrap();
        assert_eq!(
            available_actions(&wf),
            vec![
                WorkflowAction::CompleteStep(0),
                WorkflowAction::RejectStep(0),
                WorkflowAction::Pause,
                WorkflowAction::Delete,
            ]
        );

        wf.pause(&admin, Utc::now()).unwrap();
        assert_eq!(
            available_actions(&wf),
            vec![WorkflowAction::Resume, WorkflowAction::Delete]
        );
    }

    #[test]
    fn templates_cannot_be_started() {
        let mut wf = workflow(1);
        wf.is_template = true;
        assert_eq!(available_actions(&wf), vec![WorkflowAction::Delete]);
    }
}
