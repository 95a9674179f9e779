//! Single-threaded owner of the session snapshot.
//!
//! Inbound gateway notices and user actions both funnel through here, so
//! no two mutations ever race against the same state. Every committed
//! mutation replaces the snapshot wholesale and is persisted to the task
//! archive before the call returns.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use girder_session::{project, SessionReducer, SessionState, SideEffect, Task, ViewState};
use girder_wire::{ClientCommand, ModelInfo, PlanStep, ResumeFeedback};

use crate::files::ConfigApi;
use crate::link::{CommandSink, LinkError, LinkNotice};
use crate::storage::TaskArchive;

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Link(#[from] LinkError),
    /// The projection says the prompt input is disabled (disconnected,
    /// running, or awaiting approval).
    #[error("input is disabled")]
    InputDisabled,
    #[error("no task is selected")]
    NoActiveTask,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct SessionController<S: CommandSink> {
    state: SessionState,
    sink: S,
    archive: TaskArchive,
    /// Per-role model selection sent with every `run_agent`.
    llm_config: BTreeMap<String, String>,
    available_models: Vec<ModelInfo>,
    available_tools: Vec<Value>,
}

impl<S: CommandSink> SessionController<S> {
    pub fn new(sink: S, archive: TaskArchive) -> Self {
        Self {
            state: SessionState::default(),
            sink,
            archive,
            llm_config: BTreeMap::new(),
            available_models: Vec::new(),
            available_tools: Vec::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> ViewState {
        project(&self.state, self.sink.connected())
    }

    pub fn available_models(&self) -> &[ModelInfo] {
        &self.available_models
    }

    pub fn available_tools(&self) -> &[Value] {
        &self.available_tools
    }

    pub fn set_model(&mut self, role_key: &str, model_id: &str) {
        self.llm_config
            .insert(role_key.to_string(), model_id.to_string());
    }

    /// Restore tasks and the active selection from the archive.
    pub async fn bootstrap(&mut self) -> Result<(), ControllerError> {
        let (tasks, active_task_id) = self.archive.load().await?;
        self.state.tasks = tasks;
        self.state.active_task_id = active_task_id;
        Ok(())
    }

    /// Fetch the model and tool catalogs once at startup. Failures are
    /// logged and leave the defaults empty; the session still works.
    pub async fn load_catalogs(&mut self, api: &ConfigApi) {
        match api.models().await {
            Ok(catalog) => {
                self.llm_config = catalog.default_models;
                self.available_models = catalog.available_models;
            }
            Err(err) => warn!(%err, "model catalog unavailable"),
        }
        match api.tools().await {
            Ok(catalog) => self.available_tools = catalog.tools,
            Err(err) => warn!(%err, "tool catalog unavailable"),
        }
    }

    /// Apply one link notice. Returns the side effects the caller must
    /// run (workspace refreshes for the active task).
    pub async fn handle_notice(
        &mut self,
        notice: LinkNotice,
    ) -> Result<Vec<SideEffect>, ControllerError> {
        match notice {
            LinkNotice::Connected => Ok(Vec::new()),
            LinkNotice::Disconnected => {
                // Nothing can be presumed running across a dropped
                // connection.
                self.state.running.clear();
                Ok(Vec::new())
            }
            LinkNotice::Event(event) => {
                let (next, effects) = SessionReducer::reduce(&self.state, event);
                if next != self.state {
                    self.state = next;
                    self.persist().await?;
                }
                Ok(effects)
            }
        }
    }

    /// Two-phase create: the backend is told first, and only a successful
    /// transport send commits the local task. There is no create ack in
    /// the protocol, so send success is the commit point.
    pub async fn create_task(&mut self) -> Result<String, ControllerError> {
        let task = Task::new(self.state.next_task_name());
        self.sink.send(&ClientCommand::TaskCreate {
            task_id: task.id.clone(),
        })?;
        let id = task.id.clone();
        self.state.adopt_task(task);
        self.persist().await?;
        Ok(id)
    }

    pub async fn delete_task(&mut self, task_id: &str) -> Result<(), ControllerError> {
        self.sink.send(&ClientCommand::TaskDelete {
            task_id: task_id.to_string(),
        })?;
        self.state.delete_task(task_id);
        self.persist().await?;
        Ok(())
    }

    /// Rename is local-only.
    pub async fn rename_task(&mut self, task_id: &str, name: &str) -> Result<(), ControllerError> {
        if self.state.rename_task(task_id, name) {
            self.persist().await?;
        }
        Ok(())
    }

    pub async fn select_task(&mut self, task_id: &str) -> Result<(), ControllerError> {
        self.state.select_task(task_id);
        self.persist().await?;
        Ok(())
    }

    /// Optimistic prompt submission: the history append and running mark
    /// are rolled back if the transport send fails.
    pub async fn send_prompt(&mut self, prompt: &str) -> Result<(), ControllerError> {
        if !self.view().can_send {
            return Err(ControllerError::InputDisabled);
        }
        let task_id = self.active_task_id()?;

        let before = self.state.clone();
        self.state.push_prompt(&task_id, prompt);
        let command = ClientCommand::RunAgent {
            task_id,
            prompt: prompt.to_string(),
            llm_config: self.llm_config.clone(),
        };
        if let Err(err) = self.sink.send(&command) {
            self.state = before;
            return Err(err.into());
        }
        self.persist().await?;
        Ok(())
    }

    /// Approve the pending plan, optionally with user edits. The edited
    /// steps are stamped into the architect plan so the execution plan
    /// built at the foreman's first chain start matches what was sent.
    pub async fn approve_plan(
        &mut self,
        modified_plan: Option<Vec<PlanStep>>,
    ) -> Result<(), ControllerError> {
        let task_id = self.active_task_id()?;
        self.sink.send(&ClientCommand::ResumeAgent {
            task_id: task_id.clone(),
            feedback: ResumeFeedback::Approve,
            plan: modified_plan.clone(),
        })?;

        if let Some(plan) = modified_plan {
            if let Some(container) = self
                .state
                .task_mut(&task_id)
                .and_then(|task| task.open_container_mut())
            {
                if let Some((steps, _)) = container.architect_plan_mut() {
                    *steps = plan;
                }
            }
        }
        self.state.awaiting_approval = false;
        self.state.running.insert(task_id);
        self.persist().await?;
        Ok(())
    }

    /// Reject the pending plan. Appends nothing to the history; the
    /// backend answers with its own events.
    pub async fn reject_plan(&mut self) -> Result<(), ControllerError> {
        let task_id = self.active_task_id()?;
        self.sink.send(&ClientCommand::ResumeAgent {
            task_id: task_id.clone(),
            feedback: ResumeFeedback::Reject,
            plan: None,
        })?;
        self.state.awaiting_approval = false;
        self.state.running.remove(&task_id);
        self.persist().await?;
        Ok(())
    }

    /// Ask the backend to stop the active task's run. The registry entry
    /// stays until `agent_stopped` arrives; there is no local prediction
    /// of stop completion.
    pub fn stop_agent(&self) -> Result<(), ControllerError> {
        let task_id = self.active_task_id()?;
        if !self.state.running.contains(&task_id) {
            return Ok(());
        }
        self.sink.send(&ClientCommand::StopAgent { task_id })?;
        Ok(())
    }

    fn active_task_id(&self) -> Result<String, ControllerError> {
        self.state
            .active_task_id
            .clone()
            .ok_or(ControllerError::NoActiveTask)
    }

    async fn persist(&self) -> Result<(), ControllerError> {
        self.archive
            .save(&self.state.tasks, self.state.active_task_id.as_deref())
            .await?;
        Ok(())
    }
}
