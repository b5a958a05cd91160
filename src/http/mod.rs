// http/mod.rs — HTML-serving HTTP server.
//
// Axum router over the task service. All pages are server-rendered; mutating
// routes redirect back to the list with a one-shot notice in the query string.
//
// Routes:
//   GET    /                    → redirect to /tasks
//   GET    /tasks               (optional ?priority=low|medium|high)
//   GET    /tasks/create
//   POST   /tasks
//   GET    /tasks/{id}/edit
//   PUT    /tasks/{id}          (PATCH and POST accepted for HTML forms)
//   PATCH  /tasks/{id}/toggle   (POST accepted for HTML forms)
//   DELETE /tasks/{id}          (POST /tasks/{id}/delete for HTML forms)

pub mod routes;
pub mod views;

use anyhow::Result;
use axum::{
    routing::{get, patch, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::AppContext;

pub async fn start_http_server(ctx: Arc<AppContext>) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("taskboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        .route("/", get(routes::tasks::home))
        .route("/tasks", get(routes::tasks::index).post(routes::tasks::store))
        .route("/tasks/create", get(routes::tasks::create_form))
        .route(
            "/tasks/{id}",
            put(routes::tasks::update)
                .patch(routes::tasks::update)
                .post(routes::tasks::update)
                .delete(routes::tasks::destroy),
        )
        .route("/tasks/{id}/edit", get(routes::tasks::edit_form))
        .route(
            "/tasks/{id}/toggle",
            patch(routes::tasks::toggle).post(routes::tasks::toggle),
        )
        .route("/tasks/{id}/delete", post(routes::tasks::destroy))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
