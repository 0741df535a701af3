#![allow(dead_code)]

use axum::http::{HeaderMap, HeaderValue};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use relay_module::service::{AppState, ServiceConfig};

pub const TEST_SECRET: &str = "testsecret";

pub fn test_config(
    openproject_base_url: Option<String>,
    chat_webhook_url: Option<String>,
) -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        webhook_secret: Some(TEST_SECRET.to_string()),
        verify_signatures: false,
        openproject_base_url,
        openproject_api_key: Some("test-api-key".to_string()),
        developed_status_id: Some(9),
        developed_status_name: "Developed".to_string(),
        task_type_id: None,
        task_type_name: "Task".to_string(),
        chat_webhook_url,
        summary_webhook_url: None,
        reminder_webhook_url: None,
        daily_summary_times: String::new(),
        due_reminder_times: String::new(),
        terminal_status_threshold: 8,
        log_file: None,
    }
}

pub fn state_for(
    openproject_base_url: Option<String>,
    chat_webhook_url: Option<String>,
) -> AppState {
    AppState::new(test_config(openproject_base_url, chat_webhook_url))
}

pub fn github_headers(event: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-github-event", HeaderValue::from_str(event).unwrap());
    headers.insert(
        "x-github-delivery",
        HeaderValue::from_static("test-delivery-id"),
    );
    headers
}

pub fn signed_github_headers(event: &str, secret: &str, body: &[u8]) -> HeaderMap {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("mac");
    mac.update(body);
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));
    let mut headers = github_headers(event);
    headers.insert(
        "x-hub-signature-256",
        HeaderValue::from_str(&signature).unwrap(),
    );
    headers
}
