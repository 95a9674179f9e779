use crate::model::{HistoryItem, RunContainer, SessionState, Task};

/// User-action mutations over the task list. Each returns with the state
/// fully formed; callers persist the snapshot afterwards.
impl SessionState {
    /// Add a freshly created task and foreground it. The caller is
    /// responsible for having told the backend first (`task_create` has no
    /// ack, so transport-send success is the commit point).
    pub fn adopt_task(&mut self, task: Task) {
        let id = task.id.clone();
        self.tasks.push(task);
        self.select_task(&id);
    }

    /// Next auto-assigned display name, matching the original client's
    /// "New Task N" counter.
    pub fn next_task_name(&self) -> String {
        format!("New Task {}", self.tasks.len() + 1)
    }

    /// Rename is local-only; no backend round trip.
    pub fn rename_task(&mut self, id: &str, name: &str) -> bool {
        match self.task_mut(id) {
            Some(task) => {
                task.name = name.to_string();
                true
            }
            None => false,
        }
    }

    /// Foreground a task. Switching clears the awaiting-approval gate;
    /// the pending plan stays in the other task's history.
    pub fn select_task(&mut self, id: &str) {
        if self.active_task_id.as_deref() == Some(id) {
            return;
        }
        if self.task(id).is_some() {
            self.active_task_id = Some(id.to_string());
            self.awaiting_approval = false;
        }
    }

    /// Remove a task. If it was foregrounded, the neighbor above it (or
    /// the first remaining task) becomes active.
    pub fn delete_task(&mut self, id: &str) -> bool {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            return false;
        };
        let was_active = self.is_active(id);
        self.tasks.remove(index);
        self.running.remove(id);
        if was_active {
            self.awaiting_approval = false;
            self.active_task_id = if self.tasks.is_empty() {
                None
            } else {
                let neighbor = index.saturating_sub(1);
                Some(self.tasks[neighbor].id.clone())
            };
        }
        true
    }

    /// Optimistic prompt submission: append the prompt and a fresh open
    /// turn, and mark the task running ahead of the backend's
    /// `agent_started`.
    pub fn push_prompt(&mut self, id: &str, content: &str) -> bool {
        let Some(task) = self.task_mut(id) else {
            return false;
        };
        task.history.push(HistoryItem::Prompt {
            content: content.to_string(),
        });
        task.history
            .push(HistoryItem::RunContainer(RunContainer::default()));
        self.running.insert(id);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_tasks(ids: &[&str]) -> SessionState {
        let mut state = SessionState::default();
        for id in ids {
            let mut task = Task::new(format!("task {id}"));
            task.id = (*id).to_string();
            state.tasks.push(task);
        }
        state.active_task_id = ids.first().map(|id| (*id).to_string());
        state
    }

    #[test]
    fn adopt_task_foregrounds_the_new_task() {
        let mut state = state_with_tasks(&["a"]);
        let task = Task::new(state.next_task_name());
        let id = task.id.clone();
        state.adopt_task(task);
        assert_eq!(state.active_task_id.as_deref(), Some(id.as_str()));
        assert_eq!(state.tasks[1].name, "New Task 2");
    }

    #[test]
    fn push_prompt_appends_prompt_and_open_turn() {
        let mut state = state_with_tasks(&["t1"]);
        assert!(state.push_prompt("t1", "hello"));

        let task = state.task("t1").unwrap();
        assert_eq!(
            task.history[0],
            HistoryItem::Prompt {
                content: "hello".into()
            }
        );
        assert_eq!(
            task.history[1],
            HistoryItem::RunContainer(RunContainer::default())
        );
        assert!(state.running.contains("t1"));
    }

    #[test]
    fn push_prompt_for_missing_task_changes_nothing() {
        let mut state = state_with_tasks(&["t1"]);
        assert!(!state.push_prompt("ghost", "hello"));
        assert!(state.running.is_empty());
    }

    #[test]
    fn select_task_clears_the_approval_gate() {
        let mut state = state_with_tasks(&["a", "b"]);
        state.awaiting_approval = true;
        state.select_task("b");
        assert_eq!(state.active_task_id.as_deref(), Some("b"));
        assert!(!state.awaiting_approval);
    }

    #[test]
    fn reselecting_the_active_task_keeps_the_gate() {
        let mut state = state_with_tasks(&["a"]);
        state.awaiting_approval = true;
        state.select_task("a");
        assert!(state.awaiting_approval);
    }

    #[test]
    fn delete_active_task_selects_the_neighbor_above() {
        let mut state = state_with_tasks(&["a", "b", "c"]);
        state.select_task("b");
        assert!(state.delete_task("b"));
        assert_eq!(state.active_task_id.as_deref(), Some("a"));
    }

    #[test]
    fn delete_first_active_task_selects_the_new_first() {
        let mut state = state_with_tasks(&["a", "b"]);
        assert!(state.delete_task("a"));
        assert_eq!(state.active_task_id.as_deref(), Some("b"));
    }

    #[test]
    fn delete_last_task_clears_the_selection() {
        let mut state = state_with_tasks(&["a"]);
        state.running.insert("a");
        assert!(state.delete_task("a"));
        assert_eq!(state.active_task_id, None);
        assert!(state.running.is_empty());
    }

    #[test]
    fn delete_background_task_keeps_the_selection() {
        let mut state = state_with_tasks(&["a", "b"]);
        assert!(state.delete_task("b"));
        assert_eq!(state.active_task_id.as_deref(), Some("a"));
    }

    #[test]
    fn rename_unknown_task_reports_false() {
        let mut state = state_with_tasks(&["a"]);
        assert!(state.rename_task("a", "Field notes"));
        assert_eq!(state.task("a").unwrap().name, "Field notes");
        assert!(!state.rename_task("ghost", "x"));
    }
}
