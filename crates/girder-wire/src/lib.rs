//! Wire-format models for the girder client.
//!
//! `event` and `command` cover the agent gateway WebSocket protocol;
//! `rest` covers the file-store and model/tool catalog HTTP endpoints.
//! These types carry no behavior beyond (de)serialization so they can be
//! shared between the session core and the I/O shell.

mod command;
mod event;
mod rest;

pub use command::{ClientCommand, ResumeFeedback};
pub use event::{
    AgentEventData, ChainInput, ChainOutput, PlanStep, ServerEvent, StepEvaluation, CHAIN_END,
    CHAIN_START, EVALUATION_FAILURE, PROJECT_SUPERVISOR, SITE_FOREMAN,
};
pub use rest::{
    ErrorBody, ItemKind, ModelCatalog, ModelInfo, ToolCatalog, WorkspaceItem, WorkspaceListing,
};
