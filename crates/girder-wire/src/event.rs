use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Agent name on step-execution chain events that marks execution start
/// and per-step progress.
pub const SITE_FOREMAN: &str = "Site_Foreman";
/// Agent name on chain events that carry step outcome evaluations.
pub const PROJECT_SUPERVISOR: &str = "Project_Supervisor";
/// Chain lifecycle markers carried in `agent_event.event`.
pub const CHAIN_START: &str = "on_chain_start";
pub const CHAIN_END: &str = "on_chain_end";
/// Evaluation status string the supervisor emits for a failed step.
pub const EVALUATION_FAILURE: &str = "failure";

/// One step of a proposed plan. The backend owns the shape (tool name,
/// arguments, rationale); the client treats it as an opaque JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanStep(pub Value);

/// Chain-event input fields the client cares about. Everything else in the
/// payload is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_tool_call: Option<Value>,
}

/// Chain-event output fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainOutput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_evaluation: Option<StepEvaluation>,
}

/// Supervisor verdict for one executed step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepEvaluation {
    #[serde(default)]
    pub status: String,
    #[serde(flatten)]
    pub detail: serde_json::Map<String, Value>,
}

impl StepEvaluation {
    pub fn is_failure(&self) -> bool {
        self.status == EVALUATION_FAILURE
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentEventData {
    #[serde(default)]
    pub input: ChainInput,
    #[serde(default)]
    pub output: ChainOutput,
}

/// Inbound gateway event, tagged by the `type` field.
///
/// The `Unknown` variant absorbs tags this client does not understand so
/// the protocol can grow without breaking older clients; the reducer
/// treats it as a no-op.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    PlanApprovalRequest {
        task_id: String,
        #[serde(default)]
        plan: Vec<PlanStep>,
    },
    AgentEvent {
        task_id: String,
        name: String,
        event: String,
        #[serde(default)]
        data: AgentEventData,
    },
    DirectAnswer {
        task_id: String,
        #[serde(default)]
        data: String,
    },
    FinalAnswer {
        task_id: String,
        #[serde(default)]
        data: String,
        #[serde(default)]
        refresh_workspace: bool,
    },
    AgentStarted {
        task_id: String,
    },
    AgentResumed {
        task_id: String,
    },
    AgentStopped {
        task_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// The task this event addresses, if the tag is known.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            ServerEvent::PlanApprovalRequest { task_id, .. }
            | ServerEvent::AgentEvent { task_id, .. }
            | ServerEvent::DirectAnswer { task_id, .. }
            | ServerEvent::FinalAnswer { task_id, .. }
            | ServerEvent::AgentStarted { task_id }
            | ServerEvent::AgentResumed { task_id }
            | ServerEvent::AgentStopped { task_id } => Some(task_id),
            ServerEvent::Unknown => None,
        }
    }
}
