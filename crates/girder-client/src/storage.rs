//! Durable client storage for the task list and the active selection.
//!
//! Two keys, stored as two JSON files under the archive directory,
//! written on every mutation and removed when the value is empty or
//! absent — the same contract the original client kept with
//! localStorage.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tokio::fs;
use tracing::warn;

use girder_session::Task;

const TASKS_FILE: &str = "tasks.json";
const ACTIVE_TASK_FILE: &str = "active_task.json";

pub struct TaskArchive {
    base: PathBuf,
}

impl TaskArchive {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Restore the task list and active selection. An active id that no
    /// longer names a task falls back to the first task, matching the
    /// original startup behavior. Unreadable files are treated as absent.
    pub async fn load(&self) -> anyhow::Result<(Vec<Task>, Option<String>)> {
        let tasks: Vec<Task> = match read_if_present(&self.base.join(TASKS_FILE)).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(%err, "task archive is unreadable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };

        let saved_active: Option<String> =
            match read_if_present(&self.base.join(ACTIVE_TASK_FILE)).await? {
                Some(raw) => serde_json::from_str(&raw).ok(),
                None => None,
            };

        let active = saved_active
            .filter(|id| tasks.iter().any(|task| &task.id == id))
            .or_else(|| tasks.first().map(|task| task.id.clone()));

        Ok((tasks, active))
    }

    /// Write both keys. Empty task list and absent selection clear their
    /// files instead of writing empty values.
    pub async fn save(&self, tasks: &[Task], active_task_id: Option<&str>) -> anyhow::Result<()> {
        fs::create_dir_all(&self.base)
            .await
            .with_context(|| format!("creating archive dir {}", self.base.display()))?;

        let tasks_path = self.base.join(TASKS_FILE);
        if tasks.is_empty() {
            remove_if_present(&tasks_path).await?;
        } else {
            let raw = serde_json::to_string_pretty(tasks)?;
            fs::write(&tasks_path, raw)
                .await
                .with_context(|| format!("writing {}", tasks_path.display()))?;
        }

        let active_path = self.base.join(ACTIVE_TASK_FILE);
        match active_task_id {
            Some(id) => {
                let raw = serde_json::to_string(id)?;
                fs::write(&active_path, raw)
                    .await
                    .with_context(|| format!("writing {}", active_path.display()))?;
            }
            None => remove_if_present(&active_path).await?,
        }

        Ok(())
    }
}

async fn read_if_present(path: &Path) -> anyhow::Result<Option<String>> {
    match fs::read_to_string(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", path.display())),
    }
}

async fn remove_if_present(path: &Path) -> anyhow::Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("removing {}", path.display())),
    }
}
