use tracing::{debug, warn};

use girder_wire::{
    AgentEventData, PlanStep, ServerEvent, CHAIN_END, CHAIN_START, PROJECT_SUPERVISOR,
    SITE_FOREMAN,
};

use crate::model::{ExecutionStep, RunChild, SessionState, StepStatus};

/// Work the caller must perform after a state transition. The reducer
/// itself stays pure; file-store calls happen in the I/O shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// The backend touched the active task's workspace; re-list it.
    RefreshWorkspace { task_id: String },
}

pub struct SessionReducer;

impl SessionReducer {
    /// Fold one gateway event into the next state snapshot.
    ///
    /// Defensive by contract: the backend guarantees neither idempotence
    /// nor payload shape, so events for unknown tasks, missing containers,
    /// or out-of-range step indices are dropped with a log line instead of
    /// failing the session.
    pub fn reduce(state: &SessionState, event: ServerEvent) -> (SessionState, Vec<SideEffect>) {
        let mut next = state.clone();
        let mut effects = Vec::new();

        let Some(task_id) = event.task_id().map(str::to_owned) else {
            debug!("dropping gateway event with unknown tag");
            return (next, effects);
        };
        if next.task(&task_id).is_none() {
            // Task was deleted locally; late events for it are expected.
            debug!(task_id, "dropping event for unknown task");
            return (next, effects);
        }

        match event {
            ServerEvent::AgentStarted { .. } | ServerEvent::AgentResumed { .. } => {
                next.running.insert(task_id);
            }
            ServerEvent::AgentStopped { .. } => {
                next.running.remove(&task_id);
            }
            ServerEvent::PlanApprovalRequest { plan, .. } => {
                next.running.remove(&task_id);
                next.awaiting_approval = true;
                if let Some(task) = next.task_mut(&task_id) {
                    task.ensure_open_container()
                        .children
                        .push(RunChild::ArchitectPlan {
                            steps: plan,
                            is_awaiting_approval: true,
                        });
                }
            }
            ServerEvent::DirectAnswer { data, .. } => {
                Self::close_turn(&mut next, &task_id, RunChild::DirectAnswer { content: data });
            }
            ServerEvent::FinalAnswer {
                data,
                refresh_workspace,
                ..
            } => {
                Self::close_turn(&mut next, &task_id, RunChild::FinalAnswer { content: data });
                if refresh_workspace && next.is_active(&task_id) {
                    effects.push(SideEffect::RefreshWorkspace {
                        task_id: task_id.clone(),
                    });
                }
            }
            ServerEvent::AgentEvent {
                name, event, data, ..
            } => {
                Self::apply_chain_event(&mut next, &mut effects, &task_id, &name, &event, data);
            }
            ServerEvent::Unknown => {}
        }

        (next, effects)
    }

    /// Append a terminal answer and freeze the turn.
    fn close_turn(next: &mut SessionState, task_id: &str, answer: RunChild) {
        next.running.remove(task_id);
        next.awaiting_approval = false;
        if let Some(task) = next.task_mut(task_id) {
            let container = task.ensure_open_container();
            container.children.push(answer);
            container.is_complete = true;
        }
    }

    fn apply_chain_event(
        next: &mut SessionState,
        effects: &mut Vec<SideEffect>,
        task_id: &str,
        name: &str,
        event: &str,
        data: AgentEventData,
    ) {
        let active = next.is_active(task_id);
        let Some(task) = next.task_mut(task_id) else {
            return;
        };
        let container = task.ensure_open_container();

        // The foreman's first chain start is the approval boundary: the
        // architect plan stops awaiting and becomes the execution plan.
        if name == SITE_FOREMAN && event == CHAIN_START {
            let approved_steps: Option<Vec<PlanStep>> = match container.architect_plan_mut() {
                Some((steps, is_awaiting_approval)) if *is_awaiting_approval => {
                    *is_awaiting_approval = false;
                    Some(steps.clone())
                }
                _ => None,
            };
            if let Some(steps) = approved_steps {
                if !container.has_execution_plan() {
                    container.children.push(RunChild::ExecutionPlan {
                        steps: steps.into_iter().map(ExecutionStep::pending).collect(),
                    });
                }
            }
        }

        let Some(steps) = container.execution_plan_mut() else {
            return;
        };
        let Some(index) = data.input.current_step_index else {
            return;
        };
        let Some(step) = steps.get_mut(index) else {
            warn!(task_id, index, "chain event addresses a step out of range");
            return;
        };

        if name == SITE_FOREMAN && event == CHAIN_START {
            step.status = StepStatus::InProgress;
        } else if name == PROJECT_SUPERVISOR && event == CHAIN_END {
            let failed = data
                .output
                .step_evaluation
                .as_ref()
                .is_some_and(girder_wire::StepEvaluation::is_failure);
            step.status = if failed {
                StepStatus::Failure
            } else {
                StepStatus::Completed
            };
            step.tool_call = data.input.current_tool_call;
            step.tool_output = data.output.tool_output;
            step.evaluation = data
                .output
                .step_evaluation
                .map(|evaluation| serde_json::to_value(evaluation).unwrap_or_default());
            if active {
                effects.push(SideEffect::RefreshWorkspace {
                    task_id: task_id.to_owned(),
                });
            }
        }
    }
}
