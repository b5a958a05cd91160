use std::collections::HashMap;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use tera::{Context, Tera, Value};

use crate::tasks::{FieldError, Priority, TaskPage, TaskRow};

static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("layout.html", include_str!("../../templates/layout.html")),
        ("index.html", include_str!("../../templates/index.html")),
        ("form.html", include_str!("../../templates/form.html")),
    ])
    .expect("embedded templates must parse");
    tera.register_filter("time_ago", time_ago);
    tera
});

/// Render the task list. `filter` is the active priority filter; `notice` the
/// one-shot confirmation carried through the redirect.
pub fn render_index(
    page: &TaskPage,
    filter: Option<&str>,
    notice: Option<&str>,
) -> tera::Result<String> {
    let mut ctx = Context::new();
    ctx.insert("tasks", &page.tasks);
    ctx.insert("completed_count", &page.completed_count);
    ctx.insert("total_count", &page.total_count);
    ctx.insert("filter", &filter.unwrap_or(""));
    ctx.insert("notice", &notice.unwrap_or(""));
    TEMPLATES.render("index.html", &ctx)
}

/// Everything the create/edit form needs: current field values (either from
/// the task being edited or from a rejected submission) and per-field errors.
#[derive(Debug, Default)]
pub struct FormView {
    pub heading: &'static str,
    pub action: String,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub is_completed: bool,
    pub editing: bool,
    pub errors: Vec<FieldError>,
}

impl FormView {
    pub fn create() -> Self {
        Self {
            heading: "Create Task",
            action: "/tasks".to_string(),
            priority: Priority::default().as_str().to_string(),
            ..Default::default()
        }
    }

    pub fn edit(task: &TaskRow) -> Self {
        Self {
            heading: "Edit Task",
            action: format!("/tasks/{}", task.id),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: task.priority.clone(),
            is_completed: task.is_completed,
            editing: true,
            ..Default::default()
        }
    }

    /// Edit form shell for re-rendering a rejected submission: the action and
    /// mode are known but the field values come from the submission itself.
    pub fn edit_shell(id: &str) -> Self {
        Self {
            heading: "Edit Task",
            action: format!("/tasks/{id}"),
            editing: true,
            ..Default::default()
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

pub fn render_form(form: &FormView) -> tera::Result<String> {
    // Field errors keyed by field name; absent fields render as empty (falsy).
    let mut errors: HashMap<&str, &str> = HashMap::from([("title", ""), ("priority", "")]);
    for e in &form.errors {
        errors.insert(e.field, e.message.as_str());
    }

    let priorities: Vec<&str> = Priority::ALL.iter().map(|p| p.as_str()).collect();

    let mut ctx = Context::new();
    ctx.insert("heading", form.heading);
    ctx.insert("action", &form.action);
    ctx.insert("title", &form.title);
    ctx.insert("description", &form.description);
    ctx.insert("priority", &form.priority);
    ctx.insert("is_completed", &form.is_completed);
    ctx.insert("editing", &form.editing);
    ctx.insert("errors", &errors);
    ctx.insert("priorities", &priorities);
    TEMPLATES.render("form.html", &ctx)
}

pub fn render_not_found() -> String {
    "<!DOCTYPE html><html><body><h1>404 — Task not found</h1>\
     <p><a href=\"/tasks\">Back to tasks</a></p></body></html>"
        .to_string()
}

pub fn render_server_error() -> String {
    "<!DOCTYPE html><html><body><h1>500 — Something went wrong</h1>\
     <p><a href=\"/tasks\">Back to tasks</a></p></body></html>"
        .to_string()
}

/// Tera filter: RFC 3339 timestamp → "3 hours ago" style relative text.
fn time_ago(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let raw = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("time_ago expects a string"))?;
    let ts = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| tera::Error::msg(format!("time_ago: bad timestamp: {e}")))?
        .with_timezone(&Utc);
    Ok(Value::String(humanize(Utc::now() - ts)))
}

fn humanize(delta: chrono::Duration) -> String {
    let secs = delta.num_seconds().max(0);
    match secs {
        0..=59 => "just now".to_string(),
        60..=3599 => plural(secs / 60, "minute"),
        3600..=86_399 => plural(secs / 3600, "hour"),
        _ => plural(secs / 86_400, "day"),
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{n} {unit}s ago")
    }
}
