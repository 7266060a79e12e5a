use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{NotFoundError, ValidationError};
use crate::task::{Priority, Task, TaskId};
use crate::view::{self, Filter, SortKey};

pub const DEFAULT_MIN_TITLE_LEN: usize = 3;

/// What `add` does with a title that is empty after trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankTitle {
    /// Treated like any other short title.
    #[default]
    Reject,
    /// Reported as [`ValidationError::BlankTitle`] so the caller can skip it
    /// without showing a message.
    Ignore,
}

impl FromStr for BlankTitle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "ignore" => Ok(Self::Ignore),
            other => Err(anyhow!("invalid blank title policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitlePolicy {
    pub min_length: usize,
    pub blank: BlankTitle,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_TITLE_LEN,
            blank: BlankTitle::Reject,
        }
    }
}

impl TitlePolicy {
    /// Returns the trimmed title when it is acceptable.
    pub fn validate<'a>(&self, raw: &'a str) -> Result<&'a str, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() && self.blank == BlankTitle::Ignore {
            return Err(ValidationError::BlankTitle);
        }

        let actual = trimmed.chars().count();
        if actual < self.min_length {
            return Err(ValidationError::TitleTooShort {
                min: self.min_length,
                actual,
            });
        }

        Ok(trimmed)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counts {
    pub total: usize,
    pub completed: usize,
}

impl fmt::Display for Counts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.total == 1 { "task" } else { "tasks" };
        write!(f, "{} {noun}, {} completed", self.total, self.completed)
    }
}

/// Owner of the session's task list. Tasks are kept in insertion order and
/// ids are handed out from a counter that never goes backwards, so an id is
/// never reused even after its task is deleted.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Task>,
    last_id: u64,
    policy: TitlePolicy,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: TitlePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> TitlePolicy {
        self.policy
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn add(&mut self, title: &str, priority: Option<Priority>) -> Result<Task, ValidationError> {
        self.add_at(title, priority, Utc::now())
    }

    #[tracing::instrument(skip(self, now))]
    pub fn add_at(
        &mut self,
        title: &str,
        priority: Option<Priority>,
        now: DateTime<Utc>,
    ) -> Result<Task, ValidationError> {
        let title = self.policy.validate(title).inspect_err(|err| {
            warn!(error = %err, "rejected task title");
        })?;

        self.last_id += 1;
        let task = Task::new_pending(
            TaskId::new(self.last_id),
            title.to_string(),
            priority.unwrap_or_default(),
            now,
        );
        self.tasks.push(task.clone());

        info!(id = %task.id, priority = %task.priority, "task added");
        Ok(task)
    }

    #[tracing::instrument(skip(self))]
    pub fn toggle(&mut self, id: TaskId) -> Result<Task, NotFoundError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(NotFoundError(id))?;

        task.status = task.status.toggled();
        info!(id = %task.id, status = %task.status, "task toggled");
        Ok(task.clone())
    }

    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: TaskId) -> Result<(), NotFoundError> {
        self.remove(id).map(|_| ())
    }

    /// Same as [`TaskStore::delete`] but hands the removed task back.
    #[tracing::instrument(skip(self))]
    pub fn remove(&mut self, id: TaskId) -> Result<Task, NotFoundError> {
        let idx = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or(NotFoundError(id))?;

        let task = self.tasks.remove(idx);
        info!(id = %task.id, remaining = self.tasks.len(), "task deleted");
        Ok(task)
    }

    pub fn view(&self, filter: Filter, sort: SortKey) -> Vec<Task> {
        debug!(%filter, %sort, "building view");
        view::select(&self.tasks, filter, sort)
    }

    pub fn counts(&self) -> Counts {
        Counts {
            total: self.tasks.len(),
            completed: self.tasks.iter().filter(|task| task.is_completed()).count(),
        }
    }
}
