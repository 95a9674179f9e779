//! Session state for the girder client.
//!
//! The model mirrors what the backend streams per task: a flat history of
//! prompts and run containers, where each run holds a proposed plan, the
//! executing plan, and a terminal answer. [`SessionReducer`] folds inbound
//! gateway events into the next state snapshot; [`RunningRegistry`] tracks
//! which tasks are executing independent of which one is foregrounded.

mod model;
mod projection;
mod reducer;
mod registry;
mod store;

pub use model::{
    ExecutionStep, HistoryItem, RunChild, RunContainer, SessionState, StepStatus, Task,
};
pub use projection::{project, ViewState};
pub use reducer::{SessionReducer, SideEffect};
pub use registry::RunningRegistry;
