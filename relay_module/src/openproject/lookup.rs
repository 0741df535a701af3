//! Status/type id resolution with process-lifetime caching.
//!
//! Constructed once at startup and shared; an explicit id override
//! short-circuits the remote lookup entirely. Cached ids never expire, so a
//! remote rename requires a restart (or an override) to pick up. A duplicate
//! remote lookup under concurrent first use is benign.

use std::sync::Mutex;

use tracing::warn;

use super::client::WorkPackageClient;

pub struct LookupResolver {
    status_override: Option<u64>,
    status_name: String,
    type_override: Option<u64>,
    type_name: String,
    status_cache: Mutex<Option<u64>>,
    type_cache: Mutex<Option<u64>>,
}

impl LookupResolver {
    pub fn new(
        status_override: Option<u64>,
        status_name: impl Into<String>,
        type_override: Option<u64>,
        type_name: impl Into<String>,
    ) -> Self {
        Self {
            status_override,
            status_name: status_name.into(),
            type_override,
            type_name: type_name.into(),
            status_cache: Mutex::new(None),
            type_cache: Mutex::new(None),
        }
    }

    /// Id of the terminal status, matched case-insensitively by name.
    pub async fn status_id(&self, client: &WorkPackageClient) -> Option<u64> {
        if let Some(id) = self.status_override {
            return Some(id);
        }
        if let Some(id) = *self
            .status_cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
        {
            return Some(id);
        }

        let statuses = client.fetch_statuses().await;
        let found = statuses
            .iter()
            .find(|status| {
                status
                    .name
                    .as_deref()
                    .is_some_and(|name| name.eq_ignore_ascii_case(&self.status_name))
            })
            .and_then(|status| status.id);
        match found {
            Some(id) => {
                *self
                    .status_cache
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner()) = Some(id);
                Some(id)
            }
            None => {
                warn!("no status named '{}' found", self.status_name);
                None
            }
        }
    }

    /// Id of the task type, matched case-insensitively by name.
    pub async fn type_id(&self, client: &WorkPackageClient) -> Option<u64> {
        if let Some(id) = self.type_override {
            return Some(id);
        }
        if let Some(id) = *self
            .type_cache
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
        {
            return Some(id);
        }

        let types = client.fetch_types().await;
        let found = types
            .iter()
            .find(|kind| kind.name.eq_ignore_ascii_case(&self.type_name))
            .map(|kind| kind.id);
        match found {
            Some(id) => {
                *self
                    .type_cache
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner()) = Some(id);
                Some(id)
            }
            None => {
                warn!("no type named '{}' found", self.type_name);
                None
            }
        }
    }
}
