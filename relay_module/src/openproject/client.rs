//! REST client for the work-tracking system.
//!
//! All operations authenticate with basic auth (`apikey:<API_KEY>`) and
//! degrade to an empty/none result on any failure: callers cannot tell
//! "no data" from "confirmed empty", which is an accepted limitation of
//! the relay.

use base64::Engine as _;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::lookup::LookupResolver;
use super::models::{
    Collection, CountResult, Principal, Status, Version, WorkPackage, WorkPackageType,
};

const PAGE_SIZE: usize = 500;

/// Build one entry of the `filters` query parameter.
pub fn filter(field: &str, operator: &str, values: &[&str]) -> Value {
    json!({ field: { "operator": operator, "values": values } })
}

pub struct WorkPackageClient {
    http: reqwest::Client,
    base_url: Option<String>,
    auth_header: Option<String>,
}

impl WorkPackageClient {
    pub fn new(base_url: Option<String>, api_key: Option<String>) -> Self {
        let base_url = base_url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.trim_end_matches('/').to_string());
        let auth_header = api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|key| {
                let credentials = format!("apikey:{key}");
                format!(
                    "Basic {}",
                    base64::engine::general_purpose::STANDARD.encode(credentials)
                )
            });
        Self {
            http: reqwest::Client::new(),
            base_url,
            auth_header,
        }
    }

    fn target(&self, path: &str) -> Option<(String, String)> {
        let Some(base) = self.base_url.as_deref() else {
            error!("work-tracking base url is not configured; skipping {}", path);
            return None;
        };
        let Some(auth) = self.auth_header.clone() else {
            error!("work-tracking api key is not configured; skipping {}", path);
            return None;
        };
        Some((format!("{base}{path}"), auth))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Option<T> {
        let (url, auth) = self.target(path)?;
        let response = match self.http.get(&url).header(AUTHORIZATION, auth).send().await {
            Ok(response) => response,
            Err(err) => {
                error!("request to {} failed: {}", url, err);
                return None;
            }
        };
        if !response.status().is_success() {
            error!("{} returned {}", url, response.status());
            return None;
        }
        match response.json::<T>().await {
            Ok(value) => Some(value),
            Err(err) => {
                error!("failed to decode response from {}: {}", url, err);
                None
            }
        }
    }

    fn work_packages_path(filters: &[Value], page_size: usize) -> String {
        let encoded = serde_json::to_string(filters).unwrap_or_else(|_| "[]".to_string());
        format!(
            "/api/v3/work_packages?filters={}&pageSize={}",
            urlencoding::encode(&encoded),
            page_size
        )
    }

    /// List work packages matching `filters`; empty on any failure.
    pub async fn fetch_work_packages(&self, filters: &[Value]) -> Vec<WorkPackage> {
        self.get_json::<Collection<WorkPackage>>(&Self::work_packages_path(filters, PAGE_SIZE))
            .await
            .map(|collection| collection.embedded.elements)
            .unwrap_or_default()
    }

    /// Remote-reported total for `filters`; 0 on any failure.
    pub async fn fetch_count(&self, filters: &[Value]) -> i64 {
        self.get_json::<CountResult>(&Self::work_packages_path(filters, 1))
            .await
            .map(|count| count.total)
            .unwrap_or(0)
    }

    pub async fn fetch_work_package(&self, id: u64) -> Option<WorkPackage> {
        self.get_json(&format!("/api/v3/work_packages/{id}")).await
    }

    /// All project versions; empty on failure.
    pub async fn fetch_roadmaps(&self) -> Vec<Version> {
        self.get_json::<Collection<Version>>("/api/v3/versions")
            .await
            .map(|collection| collection.embedded.elements)
            .unwrap_or_default()
    }

    /// Directory principals, filtered to user records.
    pub async fn fetch_users(&self) -> Vec<Principal> {
        self.get_json::<Collection<Principal>>("/api/v3/principals")
            .await
            .map(|collection| collection.embedded.elements)
            .unwrap_or_default()
            .into_iter()
            .filter(|principal| {
                principal
                    .principal_type
                    .as_deref()
                    .is_some_and(|kind| kind == "User")
            })
            .collect()
    }

    pub async fn fetch_statuses(&self) -> Vec<Status> {
        self.get_json::<Collection<Status>>("/api/v3/statuses")
            .await
            .map(|collection| collection.embedded.elements)
            .unwrap_or_default()
    }

    pub async fn fetch_types(&self) -> Vec<WorkPackageType> {
        self.get_json::<Collection<WorkPackageType>>("/api/v3/types")
            .await
            .map(|collection| collection.embedded.elements)
            .unwrap_or_default()
    }

    /// Post a comment to the work package's activities. Outcome is logged;
    /// failures never propagate.
    pub async fn post_comment(&self, work_package_id: u64, comment: &str) {
        let Some((url, auth)) =
            self.target(&format!("/api/v3/work_packages/{work_package_id}/activities"))
        else {
            return;
        };
        let body = json!({ "comment": { "raw": comment } });
        match self
            .http
            .post(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!("posted comment on work package {}", work_package_id);
            }
            Ok(response) => {
                error!(
                    "comment on work package {} rejected: {}",
                    work_package_id,
                    response.status()
                );
            }
            Err(err) => {
                error!("comment on work package {} failed: {}", work_package_id, err);
            }
        }
    }

    /// Move a work package to the configured terminal status.
    ///
    /// Read-modify-write: fetch the record for its lock version, resolve the
    /// status id, then patch. Aborts silently when the fetch fails or the id
    /// cannot be resolved; no retry on a version conflict.
    pub async fn set_status_developed(&self, work_package_id: u64, resolver: &LookupResolver) {
        let Some(current) = self.fetch_work_package(work_package_id).await else {
            return;
        };
        let Some(lock_version) = current.lock_version else {
            warn!(
                "work package {} has no lock version; skipping status update",
                work_package_id
            );
            return;
        };
        let Some(status_id) = resolver.status_id(self).await else {
            return;
        };
        let Some((url, auth)) = self.target(&format!("/api/v3/work_packages/{work_package_id}"))
        else {
            return;
        };
        let body = json!({
            "lockVersion": lock_version,
            "_links": { "status": { "href": format!("/api/v3/statuses/{status_id}") } }
        });
        match self
            .http
            .patch(&url)
            .header(AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                info!(
                    "work package {} moved to status {}",
                    work_package_id, status_id
                );
            }
            Ok(response) => {
                error!(
                    "status update for work package {} rejected: {}",
                    work_package_id,
                    response.status()
                );
            }
            Err(err) => {
                error!(
                    "status update for work package {} failed: {}",
                    work_package_id, err
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server) -> WorkPackageClient {
        WorkPackageClient::new(Some(server.url()), Some("secret-key".to_string()))
    }

    #[test]
    fn auth_header_encodes_apikey_credentials() {
        let client = WorkPackageClient::new(Some("http://op.local/".to_string()), Some("k".to_string()));
        assert_eq!(client.base_url.as_deref(), Some("http://op.local"));
        // base64("apikey:k")
        assert_eq!(client.auth_header.as_deref(), Some("Basic YXBpa2V5Oms="));
    }

    #[tokio::test]
    async fn unconfigured_client_degrades_to_empty() {
        let client = WorkPackageClient::new(None, None);
        assert!(client.fetch_work_packages(&[]).await.is_empty());
        assert_eq!(client.fetch_count(&[]).await, 0);
        assert!(client.fetch_roadmaps().await.is_empty());
    }

    #[tokio::test]
    async fn fetch_work_packages_parses_collection() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("pageSize".into(), "500".into()),
                Matcher::Regex("filters=".into()),
            ]))
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 1,
                    "_embedded": { "elements": [
                        { "id": 7, "subject": "Fix login" }
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let filters = vec![filter("status", "o", &[])];
        let packages = client.fetch_work_packages(&filters).await;
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].id, 7);
    }

    #[tokio::test]
    async fn fetch_work_packages_empty_on_remote_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let client = client_for(&server);
        assert!(client.fetch_work_packages(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn fetch_count_reads_total() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/work_packages")
            .match_query(Matcher::UrlEncoded("pageSize".into(), "1".into()))
            .with_status(200)
            .with_body(r#"{"total": 23, "_embedded": {"elements": []}}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        assert_eq!(client.fetch_count(&[]).await, 23);
    }

    #[tokio::test]
    async fn fetch_users_filters_to_user_principals() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/principals")
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "total": 2,
                    "_embedded": { "elements": [
                        { "_type": "User", "id": 1, "name": "Alice Reyes" },
                        { "_type": "Group", "id": 2, "name": "Backend" }
                    ]}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let users = client.fetch_users().await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Alice Reyes");
    }

    #[tokio::test]
    async fn post_comment_targets_activities() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v3/work_packages/7/activities")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "comment": { "raw": "hello" }
            })))
            .with_status(201)
            .create_async()
            .await;

        let client = client_for(&server);
        client.post_comment(7, "hello").await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn set_status_patches_with_lock_version() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/api/v3/work_packages/7")
            .with_status(200)
            .with_body(r#"{"id": 7, "subject": "Fix login", "lockVersion": 5}"#)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/api/v3/work_packages/7")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "lockVersion": 5,
                "_links": { "status": { "href": "/api/v3/statuses/9" } }
            })))
            .with_status(200)
            .create_async()
            .await;

        let client = client_for(&server);
        let resolver = LookupResolver::new(Some(9), "Developed", None, "Task");
        client.set_status_developed(7, &resolver).await;
        patch.assert_async().await;
    }

    #[tokio::test]
    async fn set_status_aborts_when_fetch_fails() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/api/v3/work_packages/7")
            .with_status(404)
            .create_async()
            .await;
        let patch = server
            .mock("PATCH", "/api/v3/work_packages/7")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server);
        let resolver = LookupResolver::new(Some(9), "Developed", None, "Task");
        client.set_status_developed(7, &resolver).await;
        patch.assert_async().await;
    }
}
