use std::sync::Arc;

use tracing::{error, warn};

use super::config::ServiceConfig;
use crate::openproject::{LookupResolver, WorkPackageClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub client: Arc<WorkPackageClient>,
    pub resolver: Arc<LookupResolver>,
    /// Plain client for the chat webhook; separate from the work-tracking
    /// client, which carries auth state.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let client = WorkPackageClient::new(
            config.openproject_base_url.clone(),
            config.openproject_api_key.clone(),
        );
        let resolver = LookupResolver::new(
            config.developed_status_id,
            config.developed_status_name.clone(),
            config.task_type_id,
            config.task_type_name.clone(),
        );
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            resolver: Arc::new(resolver),
            http: reqwest::Client::new(),
        }
    }

    /// Deliver `text` to a chat webhook; failures are logged and swallowed.
    pub async fn broadcast(&self, webhook_url: Option<&str>, text: &str) {
        let Some(url) = webhook_url else {
            warn!("no chat webhook configured; dropping notification");
            return;
        };
        if let Err(err) = send_chat_module::send_chat(&self.http, url, text).await {
            error!("chat notification failed: {}", err);
        }
    }
}
