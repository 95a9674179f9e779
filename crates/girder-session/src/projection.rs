use crate::model::SessionState;

/// Renderable flags derived from the session snapshot plus the link's
/// connected flag. Pure derivation; holds no state of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub connected: bool,
    /// Prompt input accepts a submission.
    pub can_send: bool,
    /// Stop button replaces the send button.
    pub show_stop: bool,
    /// "Agent is running..." banner under the history.
    pub show_running_banner: bool,
    pub input_placeholder: &'static str,
    /// Status line text for the link indicator.
    pub connection_label: &'static str,
}

pub fn project(state: &SessionState, connected: bool) -> ViewState {
    let has_active = state.active_task().is_some();
    let active_running = state
        .active_task_id
        .as_deref()
        .is_some_and(|id| state.running.contains(id));

    let input_placeholder = if !has_active {
        "Please select or create a task."
    } else if state.awaiting_approval {
        "Approve, modify, or reject the plan above."
    } else if active_running {
        "Agent is running..."
    } else {
        "Send a message..."
    };

    ViewState {
        connected,
        can_send: connected && has_active && !active_running && !state.awaiting_approval,
        show_stop: active_running && !state.awaiting_approval,
        show_running_banner: active_running && !state.awaiting_approval,
        input_placeholder,
        connection_label: if connected { "Connected" } else { "Disconnected" },
    }
}
