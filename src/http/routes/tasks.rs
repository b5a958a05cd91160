// http/routes/tasks.rs — Task page handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::http::views::{self, FormView};
use crate::tasks::{NewTask, TaskError, TaskPatch};
use crate::AppContext;

/// Failures that escape a handler. Validation is handled inline (the form is
/// re-rendered), so only not-found / storage / render failures land here.
pub enum HttpError {
    Task(TaskError),
    Render(tera::Error),
}

impl From<TaskError> for HttpError {
    fn from(err: TaskError) -> Self {
        HttpError::Task(err)
    }
}

impl From<tera::Error> for HttpError {
    fn from(err: tera::Error) -> Self {
        HttpError::Render(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        match self {
            HttpError::Task(TaskError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, Html(views::render_not_found())).into_response()
            }
            HttpError::Task(TaskError::Validation { errors }) => {
                // Unreachable from the form handlers; kept for completeness.
                let messages: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                (StatusCode::UNPROCESSABLE_ENTITY, messages.join("\n")).into_response()
            }
            HttpError::Task(TaskError::Storage(e)) => {
                error!(err = %e, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::render_server_error()),
                )
                    .into_response()
            }
            HttpError::Render(e) => {
                error!(err = %e, "template render failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::render_server_error()),
                )
                    .into_response()
            }
        }
    }
}

/// Redirect to the list with the one-shot notice in the query string.
/// Notices are fixed ASCII constants, so encoding spaces is enough.
fn see_tasks(notice: Option<&str>) -> Redirect {
    match notice {
        Some(n) => Redirect::to(&format!("/tasks?notice={}", n.replace(' ', "%20"))),
        None => Redirect::to("/tasks"),
    }
}

pub async fn home() -> Redirect {
    Redirect::to("/tasks")
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub priority: Option<String>,
    pub notice: Option<String>,
}

pub async fn index(
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, HttpError> {
    let page = ctx.tasks.list(query.priority.as_deref()).await?;
    let html = views::render_index(&page, query.priority.as_deref(), query.notice.as_deref())?;
    Ok(Html(html))
}

pub async fn create_form() -> Result<Html<String>, HttpError> {
    Ok(Html(views::render_form(&FormView::create())?))
}

/// Form payload for create and update. Everything arrives as optional text;
/// the service validates.
#[derive(Debug, Default, Deserialize)]
pub struct TaskForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub is_completed: Option<String>,
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw, "on" | "true" | "1" | "yes")
}

pub async fn store(
    State(ctx): State<Arc<AppContext>>,
    Form(form): Form<TaskForm>,
) -> Result<Response, HttpError> {
    let input = NewTask {
        title: form.title.clone().unwrap_or_default(),
        description: form.description.clone(),
        priority: form.priority.clone(),
    };

    match ctx.tasks.create(input).await {
        Ok(mutation) => Ok(see_tasks(Some(mutation.notice)).into_response()),
        Err(TaskError::Validation { errors }) => {
            // Back to the form: prior input preserved, messages per field.
            let view = FormView {
                title: form.title.unwrap_or_default(),
                description: form.description.unwrap_or_default(),
                priority: form.priority.unwrap_or_default(),
                ..FormView::create()
            }
            .with_errors(errors);
            let html = views::render_form(&view)?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn edit_form(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Html<String>, HttpError> {
    let task = ctx.tasks.get(&id).await?;
    Ok(Html(views::render_form(&FormView::edit(&task))?))
}

pub async fn update(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
    Form(form): Form<TaskForm>,
) -> Result<Response, HttpError> {
    let patch = TaskPatch {
        title: form.title.clone(),
        description: form.description.clone(),
        priority: form.priority.clone(),
        is_completed: form.is_completed.as_deref().map(parse_bool),
    };

    match ctx.tasks.update(&id, patch).await {
        Ok(mutation) => Ok(see_tasks(Some(mutation.notice)).into_response()),
        Err(TaskError::Validation { errors }) => {
            let view = FormView {
                title: form.title.unwrap_or_default(),
                description: form.description.unwrap_or_default(),
                priority: form.priority.unwrap_or_default(),
                is_completed: form.is_completed.as_deref().map(parse_bool).unwrap_or(false),
                ..FormView::edit_shell(&id)
            }
            .with_errors(errors);
            let html = views::render_form(&view)?;
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(html)).into_response())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn toggle(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Redirect, HttpError> {
    ctx.tasks.toggle(&id).await?;
    Ok(see_tasks(None))
}

pub async fn destroy(
    State(ctx): State<Arc<AppContext>>,
    Path(id): Path<String>,
) -> Result<Redirect, HttpError> {
    let notice = ctx.tasks.delete(&id).await?;
    Ok(see_tasks(Some(notice)))
}
