//! Outbound chat-webhook delivery.
//!
//! Sends plain-text notifications to an incoming-webhook URL, splitting
//! overlong content into chunks the receiving platform will accept.

use serde::Serialize;
use tracing::info;

/// Maximum characters per webhook call.
pub const MAX_CHUNK_CHARS: usize = 1900;

/// How far back from the cap a newline is still considered a usable split
/// point. Earlier newlines would waste most of the chunk, so the split
/// falls back to a hard cut at the cap.
const NEWLINE_SPLIT_WINDOW: usize = 300;

#[derive(Debug, thiserror::Error)]
pub enum SendChatError {
    #[error("chat webhook url is empty")]
    MissingWebhookUrl,
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("chat webhook rejected message: {status} {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    text: &'a str,
}

/// Split `text` into chunks of at most [`MAX_CHUNK_CHARS`] characters.
///
/// Each split lands on the last newline inside the cap when one exists
/// within the trailing window; otherwise the chunk is cut hard at the cap.
/// Concatenating the returned chunks reproduces `text` exactly.
pub fn chunk_message(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if rest.chars().count() <= MAX_CHUNK_CHARS {
            chunks.push(rest.to_string());
            break;
        }

        // Byte offset just past the MAX_CHUNK_CHARS-th character.
        let cap_bytes = rest
            .char_indices()
            .nth(MAX_CHUNK_CHARS)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let window = &rest[..cap_bytes];

        let split_at = match window.rfind('\n') {
            Some(pos) if MAX_CHUNK_CHARS - window[..pos].chars().count() <= NEWLINE_SPLIT_WINDOW => {
                // Keep the newline at the end of this chunk so the
                // concatenation round-trips.
                pos + 1
            }
            _ => cap_bytes,
        };

        chunks.push(rest[..split_at].to_string());
        rest = &rest[split_at..];
    }

    chunks
}

/// Deliver `text` to the webhook, one POST per chunk, in order.
///
/// Returns the number of chunks sent. Fails on the first chunk the
/// webhook rejects; already-sent chunks are not recalled.
pub async fn send_chat(
    client: &reqwest::Client,
    webhook_url: &str,
    text: &str,
) -> Result<usize, SendChatError> {
    if webhook_url.trim().is_empty() {
        return Err(SendChatError::MissingWebhookUrl);
    }

    let chunks = chunk_message(text);
    for chunk in &chunks {
        let response = client
            .post(webhook_url)
            .json(&ChatPayload { text: chunk })
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SendChatError::Rejected { status, body });
        }
    }

    info!("sent chat notification in {} chunk(s)", chunks.len());
    Ok(chunks.len())
}
