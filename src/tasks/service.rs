use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::storage::Storage;

use super::model::{NewTask, Priority, TaskPage, TaskPatch, TaskRow};

/// Practical upper bound on title length. Descriptions are unbounded.
pub const TITLE_MAX: usize = 255;

pub const NOTICE_CREATED: &str = "Task created.";
pub const NOTICE_UPDATED: &str = "Task updated.";
pub const NOTICE_DELETED: &str = "Task deleted.";

/// A single field-level validation message, e.g. `("title", "Title is required.")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("validation failed: {}", format_errors(.errors))]
    Validation { errors: Vec<FieldError> },

    #[error("task not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

fn format_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl TaskError {
    /// The validation messages for a given field, if this is a validation error.
    pub fn field_message(&self, field: &str) -> Option<&str> {
        match self {
            TaskError::Validation { errors } => errors
                .iter()
                .find(|e| e.field == field)
                .map(|e| e.message.as_str()),
            _ => None,
        }
    }
}

/// The result of a successful mutation: the affected row plus the one-shot
/// notice the caller surfaces to the user.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub task: TaskRow,
    pub notice: &'static str,
}

/// Owns validation and persistence for the task lifecycle. Every failed
/// mutation leaves the store unchanged — validation runs before any write.
#[derive(Clone)]
pub struct TaskService {
    storage: Arc<Storage>,
}

impl TaskService {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }

    /// All tasks, or exactly those matching `filter`, newest-first, plus the
    /// completed/total counts over the returned set. An unrecognised filter
    /// value matches nothing (exact-equality semantics).
    pub async fn list(&self, filter: Option<&str>) -> Result<TaskPage, TaskError> {
        let tasks = self.storage.list_tasks(filter).await?;
        let completed_count = tasks.iter().filter(|t| t.is_completed).count();
        let total_count = tasks.len();
        Ok(TaskPage {
            tasks,
            completed_count,
            total_count,
        })
    }

    pub async fn get(&self, id: &str) -> Result<TaskRow, TaskError> {
        self.storage
            .get_task(id)
            .await?
            .ok_or_else(|| TaskError::NotFound(id.to_string()))
    }

    pub async fn create(&self, input: NewTask) -> Result<Mutation, TaskError> {
        let mut errors = Vec::new();
        let title = validate_title(&input.title, &mut errors);
        let priority = validate_priority(input.priority.as_deref(), &mut errors);
        if !errors.is_empty() {
            return Err(TaskError::Validation { errors });
        }

        let priority = priority.unwrap_or_default();
        let task = self
            .storage
            .insert_task(&title, normalize(input.description.as_deref()), priority.as_str())
            .await?;
        debug!(id = %task.id, priority = %priority, "task created");
        Ok(Mutation {
            task,
            notice: NOTICE_CREATED,
        })
    }

    /// Apply only the supplied fields. Unknown id fails before validation is
    /// even relevant; validation failures leave the row untouched.
    pub async fn update(&self, id: &str, patch: TaskPatch) -> Result<Mutation, TaskError> {
        let current = self.get(id).await?;

        let mut errors = Vec::new();
        let title = match patch.title {
            Some(ref t) => validate_title(t, &mut errors),
            None => current.title.clone(),
        };
        let priority = validate_priority(patch.priority.as_deref(), &mut errors);
        if !errors.is_empty() {
            return Err(TaskError::Validation { errors });
        }

        let description = match patch.description {
            Some(ref d) => normalize(Some(d)).map(str::to_string),
            None => current.description.clone(),
        };
        let priority = priority.map(|p| p.as_str().to_string()).unwrap_or(current.priority);
        let is_completed = patch.is_completed.unwrap_or(current.is_completed);

        let touched = self
            .storage
            .update_task(id, &title, description.as_deref(), &priority, is_completed)
            .await?;
        if touched == 0 {
            return Err(TaskError::NotFound(id.to_string()));
        }
        let task = self.get(id).await?;
        debug!(id = %task.id, "task updated");
        Ok(Mutation {
            task,
            notice: NOTICE_UPDATED,
        })
    }

    /// Flip `is_completed`. Each call negates the current value — applying it
    /// twice restores the original state.
    pub async fn toggle(&self, id: &str) -> Result<TaskRow, TaskError> {
        if !self.storage.toggle_task(id).await? {
            return Err(TaskError::NotFound(id.to_string()));
        }
        let task = self.get(id).await?;
        debug!(id = %task.id, is_completed = task.is_completed, "task toggled");
        Ok(task)
    }

    /// Permanent removal — no soft-delete, no undo.
    pub async fn delete(&self, id: &str) -> Result<&'static str, TaskError> {
        if !self.storage.delete_task(id).await? {
            return Err(TaskError::NotFound(id.to_string()));
        }
        debug!(id, "task deleted");
        Ok(NOTICE_DELETED)
    }
}

/// Trimmed title, with errors recorded for empty or over-long input.
fn validate_title(raw: &str, errors: &mut Vec<FieldError>) -> String {
    let title = raw.trim();
    if title.is_empty() {
        errors.push(FieldError {
            field: "title",
            message: "Title is required.".to_string(),
        });
    } else if title.chars().count() > TITLE_MAX {
        errors.push(FieldError {
            field: "title",
            message: format!("Title must be at most {TITLE_MAX} characters."),
        });
    }
    title.to_string()
}

fn validate_priority(raw: Option<&str>, errors: &mut Vec<FieldError>) -> Option<Priority> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match Priority::from_str(raw) {
        Ok(p) => Some(p),
        Err(()) => {
            errors.push(FieldError {
                field: "priority",
                message: "Priority must be one of: low, medium, high.".to_string(),
            });
            None
        }
    }
}

/// Treat whitespace-only descriptions as absent.
fn normalize(description: Option<&str>) -> Option<&str> {
    description.map(str::trim).filter(|s| !s.is_empty())
}
