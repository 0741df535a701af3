use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use super::config::ServiceConfig;
use super::inbound;
use super::scheduler::{run_daily_summary, run_due_reminders, start_scheduler_tasks};
use super::state::AppState;
use super::BoxError;
use crate::summary::{build_daily_summary, build_roadmap_summaries, render_html};
use crate::users::merge_users;

pub async fn run_server(
    config: ServiceConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<(), BoxError> {
    let host: IpAddr = config
        .host
        .parse()
        .map_err(|_| format!("invalid host: {}", config.host))?;
    let addr = SocketAddr::new(host, config.port);

    let state = AppState::new(config);
    let mut scheduler = start_scheduler_tasks(state.clone());

    info!("relay service listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let serve_result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await;
    scheduler.stop_and_join().await;
    serve_result?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/getTodaySummary", get(get_today_summary))
        .route("/getTodaySummaryView", get(get_today_summary_view))
        .route("/getRoadmaps", get(get_roadmaps))
        .route("/users", get(get_users))
        .route("/triggerNow", get(trigger_summary))
        .route("/triggerDueUsers", get(trigger_due_reminders))
        .route("/op-update", post(inbound::openproject::handle_op_update))
        .fallback(generic_webhook)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn get_today_summary(State(state): State<AppState>) -> impl IntoResponse {
    let summary = build_daily_summary(
        &state.client,
        &state.resolver,
        state.config.terminal_status_threshold,
    )
    .await;
    Json(summary)
}

async fn get_today_summary_view(State(state): State<AppState>) -> impl IntoResponse {
    let summary = build_daily_summary(
        &state.client,
        &state.resolver,
        state.config.terminal_status_threshold,
    )
    .await;
    Html(render_html(
        &summary,
        state.config.openproject_base_url.as_deref(),
    ))
}

async fn get_roadmaps(State(state): State<AppState>) -> impl IntoResponse {
    Json(build_roadmap_summaries(&state.client).await)
}

async fn get_users(State(state): State<AppState>) -> impl IntoResponse {
    Json(merge_users(state.client.fetch_users().await))
}

async fn trigger_summary(State(state): State<AppState>) -> impl IntoResponse {
    run_daily_summary(&state).await;
    (StatusCode::OK, "OK")
}

async fn trigger_due_reminders(State(state): State<AppState>) -> impl IntoResponse {
    run_due_reminders(&state).await;
    (StatusCode::OK, "OK")
}

/// Any POST not claimed by a named route is the code-hosting webhook; the
/// platform points every repository hook at this service regardless of
/// path. Other methods fall through to 404.
async fn generic_webhook(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::POST {
        inbound::github::handle_github_webhook(State(state), headers, body).await
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}
