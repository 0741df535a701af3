//! Code-hosting webhook handling.
//!
//! Every POST that is not addressed to the tracker path lands here. The
//! raw body is consumed first, verified against the shared secret, and only
//! then parsed; the event name arrives in the `x-github-event` header and
//! the delivery id is logged for tracing.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::service::state::AppState;
use crate::service::verify::verify_github;
use crate::workref::{extract_ref, extract_ref_from_push_ref};

pub async fn handle_github_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if state.config.verify_signatures {
        if let Err(reason) =
            verify_github(state.config.webhook_secret.as_deref(), &headers, &body)
        {
            warn!("rejecting webhook: {}", reason);
            return (StatusCode::UNAUTHORIZED, reason).into_response();
        }
    } else {
        warn!("signature verification is disabled; accepting webhook unverified");
    }

    let event = header_str(&headers, "x-github-event").unwrap_or("");
    let delivery = header_str(&headers, "x-github-delivery").unwrap_or("-");
    info!("code-hosting webhook event={} delivery={}", event, delivery);

    let outcome = match event {
        "create" => handle_create(&state, &body).await,
        "push" => handle_push(&state, &body).await,
        "pull_request" => handle_pull_request(&state, &body).await,
        "issue_comment" => handle_issue_comment(&state, &body).await,
        other => {
            debug!("ignoring event '{}'", other);
            Ok(())
        }
    };

    match outcome {
        Ok(()) => (StatusCode::OK, "OK").into_response(),
        Err(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("").trim_end()
}

fn short_hash(commit_id: &str) -> &str {
    commit_id.get(..7).unwrap_or(commit_id)
}

#[derive(Debug, Deserialize)]
struct CreateEvent {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    ref_type: Option<String>,
}

async fn handle_create(state: &AppState, body: &[u8]) -> Result<(), &'static str> {
    let event: CreateEvent = serde_json::from_slice(body).map_err(|_| "bad json")?;
    if event.ref_type.as_deref() != Some("branch") {
        return Ok(());
    }
    let Some(work_package_id) = extract_ref(&event.git_ref) else {
        return Ok(());
    };
    let comment = format!("Branch `{}` was created.", event.git_ref);
    state.client.post_comment(work_package_id, &comment).await;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PushEvent {
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    commits: Vec<PushCommit>,
}

#[derive(Debug, Deserialize)]
struct PushCommit {
    id: String,
    message: String,
}

async fn handle_push(state: &AppState, body: &[u8]) -> Result<(), &'static str> {
    let event: PushEvent = serde_json::from_slice(body).map_err(|_| "bad json")?;
    let Some(work_package_id) = extract_ref_from_push_ref(&event.git_ref) else {
        return Ok(());
    };
    let branch = event
        .git_ref
        .strip_prefix("refs/heads/")
        .unwrap_or(&event.git_ref);
    // One comment per commit, in payload order.
    for commit in &event.commits {
        let comment = format!(
            "Commit `{}` pushed to `{}`: {}",
            short_hash(&commit.id),
            branch,
            first_line(&commit.message)
        );
        state.client.post_comment(work_package_id, &comment).await;
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct PullRequestEvent {
    action: String,
    pull_request: PullRequest,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    number: u64,
    title: String,
    #[serde(default)]
    merged: Option<bool>,
    head: BranchRef,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    #[serde(rename = "ref")]
    git_ref: String,
}

async fn handle_pull_request(state: &AppState, body: &[u8]) -> Result<(), &'static str> {
    let event: PullRequestEvent = serde_json::from_slice(body).map_err(|_| "bad json")?;
    let pull_request = &event.pull_request;
    let work_package_id = extract_ref(&pull_request.head.git_ref)
        .or_else(|| extract_ref(&pull_request.title));

    match event.action.as_str() {
        "closed" => {
            if pull_request.merged != Some(true) {
                debug!(
                    "pull request #{} closed without merge; nothing to relay",
                    pull_request.number
                );
                return Ok(());
            }
            let Some(work_package_id) = work_package_id else {
                return Ok(());
            };
            let comment = format!(
                "Pull request #{} \"{}\" was merged.",
                pull_request.number, pull_request.title
            );
            state.client.post_comment(work_package_id, &comment).await;
            state
                .client
                .set_status_developed(work_package_id, &state.resolver)
                .await;
        }
        action @ ("opened" | "reopened" | "ready_for_review") => {
            let Some(work_package_id) = work_package_id else {
                return Ok(());
            };
            let comment = format!(
                "Pull request #{} \"{}\" was {}.",
                pull_request.number,
                pull_request.title,
                action.replace('_', " ")
            );
            state.client.post_comment(work_package_id, &comment).await;
        }
        other => debug!("ignoring pull request action '{}'", other),
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct IssueCommentEvent {
    action: String,
    issue: Issue,
    comment: IssueComment,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    body: String,
    user: CommentAuthor,
}

#[derive(Debug, Deserialize)]
struct CommentAuthor {
    login: String,
}

async fn handle_issue_comment(state: &AppState, body: &[u8]) -> Result<(), &'static str> {
    let event: IssueCommentEvent = serde_json::from_slice(body).map_err(|_| "bad json")?;
    if event.action != "created" || event.issue.pull_request.is_none() {
        return Ok(());
    }
    // The head branch is not part of this payload; the issue title is the
    // only place a reference can live.
    let Some(work_package_id) = extract_ref(&event.issue.title) else {
        return Ok(());
    };
    let comment = format!(
        "{} commented on the pull request: {}",
        event.comment.user.login,
        first_line(&event.comment.body)
    );
    state.client.post_comment(work_package_id, &comment).await;
    Ok(())
}
