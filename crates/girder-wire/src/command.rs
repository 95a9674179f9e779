use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::event::PlanStep;

/// Human verdict on a proposed plan, sent with `resume_agent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeFeedback {
    Approve,
    Reject,
}

/// Outbound gateway message, tagged by the `type` field.
///
/// There is no envelope id or ack in this protocol; the gateway answers
/// with the events in [`crate::ServerEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    TaskCreate {
        task_id: String,
    },
    TaskDelete {
        task_id: String,
    },
    RunAgent {
        task_id: String,
        prompt: String,
        /// Per-role model selection (role key -> model id).
        llm_config: BTreeMap<String, String>,
    },
    ResumeAgent {
        task_id: String,
        feedback: ResumeFeedback,
        /// Present when the user edited the plan before approving.
        #[serde(skip_serializing_if = "Option::is_none")]
        plan: Option<Vec<PlanStep>>,
    },
    StopAgent {
        task_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn run_agent_serializes_with_type_tag() {
        let mut llm_config = BTreeMap::new();
        llm_config.insert("EDITOR_LLM_ID".to_string(), "gpt-4o".to_string());
        let command = ClientCommand::RunAgent {
            task_id: "t-1".into(),
            prompt: "hello".into(),
            llm_config,
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "run_agent",
                "task_id": "t-1",
                "prompt": "hello",
                "llm_config": {"EDITOR_LLM_ID": "gpt-4o"},
            })
        );
    }

    #[test]
    fn resume_without_plan_omits_the_field() {
        let command = ClientCommand::ResumeAgent {
            task_id: "t-1".into(),
            feedback: ResumeFeedback::Reject,
            plan: None,
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(
            value,
            json!({"type": "resume_agent", "task_id": "t-1", "feedback": "reject"})
        );
    }

    #[test]
    fn resume_with_modified_plan_carries_steps() {
        let command = ClientCommand::ResumeAgent {
            task_id: "t-1".into(),
            feedback: ResumeFeedback::Approve,
            plan: Some(vec![PlanStep(json!({"tool": "write_file"}))]),
        };
        let value = serde_json::to_value(&command).unwrap();
        assert_eq!(value["feedback"], "approve");
        assert_eq!(value["plan"][0]["tool"], "write_file");
    }
}
