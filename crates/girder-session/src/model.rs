use serde::{Deserialize, Serialize};
use serde_json::Value;

use girder_wire::PlanStep;

use crate::registry::RunningRegistry;

/// Execution state of one step in an approved plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failure,
}

/// One step of the executing plan. Created from the approved plan's steps
/// and mutated in place by index as chain events arrive; never reordered
/// or resized afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    #[serde(flatten)]
    pub spec: PlanStep,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<Value>,
}

impl ExecutionStep {
    pub fn pending(spec: PlanStep) -> Self {
        Self {
            spec,
            status: StepStatus::Pending,
            tool_call: None,
            tool_output: None,
            evaluation: None,
        }
    }
}

/// One child of a run container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunChild {
    ArchitectPlan {
        steps: Vec<PlanStep>,
        is_awaiting_approval: bool,
    },
    ExecutionPlan {
        steps: Vec<ExecutionStep>,
    },
    DirectAnswer {
        content: String,
    },
    FinalAnswer {
        content: String,
    },
}

/// One backend turn: everything produced in response to the most recent
/// prompt (or a resume). Mutable while `is_complete` is false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunContainer {
    pub children: Vec<RunChild>,
    pub is_complete: bool,
}

impl RunContainer {
    pub fn architect_plan_mut(&mut self) -> Option<(&mut Vec<PlanStep>, &mut bool)> {
        self.children.iter_mut().find_map(|child| match child {
            RunChild::ArchitectPlan {
                steps,
                is_awaiting_approval,
            } => Some((steps, is_awaiting_approval)),
            _ => None,
        })
    }

    pub fn execution_plan_mut(&mut self) -> Option<&mut Vec<ExecutionStep>> {
        self.children.iter_mut().find_map(|child| match child {
            RunChild::ExecutionPlan { steps } => Some(steps),
            _ => None,
        })
    }

    pub fn has_execution_plan(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, RunChild::ExecutionPlan { .. }))
    }
}

/// A prompt or a run, in arrival order. The serde tags match the JSON
/// shape the original client persisted, so archives stay readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryItem {
    Prompt { content: String },
    RunContainer(RunContainer),
}

/// One independent conversation thread with its own history and backend
/// working directory (the task id doubles as the workspace path key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub history: Vec<HistoryItem>,
}

impl Task {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: format!("task_{}", uuid::Uuid::new_v4()),
            name: name.into(),
            history: Vec::new(),
        }
    }

    /// The trailing run container, if it is still open. Only the last
    /// history item can be an open turn.
    pub fn open_container_mut(&mut self) -> Option<&mut RunContainer> {
        match self.history.last_mut() {
            Some(HistoryItem::RunContainer(container)) if !container.is_complete => {
                Some(container)
            }
            _ => None,
        }
    }

    /// The open run container, creating one at the end of the history if
    /// none is open.
    pub fn ensure_open_container(&mut self) -> &mut RunContainer {
        let needs_new = !matches!(
            self.history.last(),
            Some(HistoryItem::RunContainer(container)) if !container.is_complete
        );
        if needs_new {
            self.history
                .push(HistoryItem::RunContainer(RunContainer::default()));
        }
        match self.history.last_mut() {
            Some(HistoryItem::RunContainer(container)) => container,
            _ => unreachable!("just pushed a run container"),
        }
    }
}

/// The single mutable snapshot the whole client reads. Reducer and user
/// actions produce a fully-formed replacement rather than editing in
/// place, so a consumer never observes a half-applied update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub tasks: Vec<Task>,
    pub active_task_id: Option<String>,
    #[serde(default)]
    pub running: RunningRegistry,
    /// True while any plan is pending a human verdict for the active task.
    #[serde(default)]
    pub awaiting_approval: bool,
}

impl SessionState {
    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn active_task(&self) -> Option<&Task> {
        self.active_task_id
            .as_deref()
            .and_then(|id| self.task(id))
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active_task_id.as_deref() == Some(id)
    }
}
