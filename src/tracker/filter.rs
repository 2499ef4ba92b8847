use std::collections::BTreeSet;

use crate::models::workflow::{Workflow, WorkflowStatus};

/// Client-side narrowing of the workflow list.
///
/// `None` for `status` or `workflow_type` means "all". Templates never
/// pass; they are listed through [`templates`] instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowFilter {
    pub search_term: String,
    pub status: Option<WorkflowStatus>,
    pub workflow_type: Option<String>,
}

impl WorkflowFilter {
    pub fn matches(&self, workflow: &Workflow) -> bool {
        if workflow.is_template {
            return false;
        }
        if self.status.is_some_and(|s| s != workflow.status) {
            return false;
        }
        if let Some(t) = &self.workflow_type {
            if *t != workflow.workflow_type {
                return false;
            }
        }
        let term = self.search_term.trim().to_lowercase();
        term.is_empty()
            || workflow.name.to_lowercase().contains(&term)
            || workflow.description.to_lowercase().contains(&term)
    }

    pub fn apply<'a>(&self, workflows: &'a [Workflow]) -> Vec<&'a Workflow> {
        workflows.iter().filter(|w| self.matches(w)).collect()
    }
}

pub fn templates(workflows: &[Workflow]) -> Vec<&Workflow> {
    workflows.iter().filter(|w| w.is_template).collect()
}

/// Distinct workflow types, sorted, for building a type selector.
pub fn workflow_types(workflows: &[Workflow]) -> Vec<&str> {
    workflows
        .iter()
        .map(|w| w.workflow_type.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
