//! Work-tracking webhook handling.
//!
//! The tracker posts its own webhook shape to a dedicated path; the relay
//! turns a subset of actions into chat notifications.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::openproject::WorkPackage;
use crate::service::state::AppState;

#[derive(Debug, Deserialize)]
struct TrackerEvent {
    action: String,
    #[serde(default)]
    work_package: Option<WorkPackage>,
}

pub async fn handle_op_update(State(state): State<AppState>, body: Bytes) -> Response {
    let event: TrackerEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!("malformed work-tracking webhook: {}", err);
            return (StatusCode::BAD_REQUEST, "bad json").into_response();
        }
    };

    match event.action.as_str() {
        "work_package:updated" => {
            if let Some(work_package) = &event.work_package {
                notify_status_move(&state, work_package).await;
            }
        }
        "work_package:created" => {
            if let Some(work_package) = &event.work_package {
                let text = format!(
                    "Work package #{} \"{}\" was created.",
                    work_package.id, work_package.subject
                );
                state
                    .broadcast(state.config.chat_webhook_url.as_deref(), &text)
                    .await;
            }
        }
        other => debug!("ignoring work-tracking action '{}'", other),
    }

    (StatusCode::OK, "OK").into_response()
}

/// Ids at or below the threshold are internal pipeline states; only a move
/// to a terminal status (strictly above it) is worth announcing.
async fn notify_status_move(state: &AppState, work_package: &WorkPackage) {
    let status = work_package
        .embedded
        .as_ref()
        .and_then(|embedded| embedded.status.as_ref());
    let status_link = work_package
        .links
        .as_ref()
        .and_then(|links| links.status.as_ref());

    let Some(status_id) = status
        .and_then(|status| status.id)
        .or_else(|| status_link.and_then(|link| link.trailing_id()))
    else {
        debug!(
            "work package {} update carries no status id",
            work_package.id
        );
        return;
    };
    if status_id <= state.config.terminal_status_threshold {
        return;
    }

    let status_label = status
        .and_then(|status| status.name.clone())
        .or_else(|| status_link.and_then(|link| link.title.clone()))
        .unwrap_or_else(|| format!("status {status_id}"));
    let text = format!(
        "Work package #{} \"{}\" moved to {}.",
        work_package.id, work_package.subject, status_label
    );
    state
        .broadcast(state.config.chat_webhook_url.as_deref(), &text)
        .await;
}
