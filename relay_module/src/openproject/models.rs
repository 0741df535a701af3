//! Wire models for the work-tracking REST API.
//!
//! Records arrive in HAL shape: plain fields plus `_embedded` expansions and
//! `_links` references. Both expansions are optional on the wire, so every
//! nested field tolerates absence and the normalization helpers in the
//! summary module decide precedence.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    #[serde(default)]
    pub total: i64,
    #[serde(rename = "_embedded")]
    pub embedded: CollectionElements<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionElements<T> {
    pub elements: Vec<T>,
}

/// Collection envelope read only for its `total` field (pageSize=1 count
/// queries).
#[derive(Debug, Clone, Deserialize)]
pub struct CountResult {
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkPackage {
    pub id: u64,
    pub subject: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub lock_version: Option<i64>,
    #[serde(default, rename = "_embedded")]
    pub embedded: Option<WorkPackageEmbedded>,
    #[serde(default, rename = "_links")]
    pub links: Option<WorkPackageLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkPackageEmbedded {
    #[serde(default)]
    pub status: Option<Status>,
    #[serde(default)]
    pub assignee: Option<Principal>,
    #[serde(default)]
    pub project: Option<ProjectRecord>,
    #[serde(default, rename = "type")]
    pub work_package_type: Option<WorkPackageType>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkPackageLinks {
    #[serde(default)]
    pub status: Option<Link>,
    #[serde(default)]
    pub assignee: Option<Link>,
    #[serde(default)]
    pub project: Option<Link>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "isClosed")]
    pub is_closed: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkPackageType {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectRecord {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Principal {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default, rename = "_type")]
    pub principal_type: Option<String>,
    pub name: String,
    #[serde(default)]
    pub login: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl Link {
    /// Numeric id parsed from the trailing path segment of the href,
    /// e.g. `/api/v3/statuses/12` -> `12`.
    pub fn trailing_id(&self) -> Option<u64> {
        self.href
            .as_deref()?
            .trim_end_matches('/')
            .rsplit('/')
            .next()?
            .parse()
            .ok()
    }
}

/// A project version ("roadmap" milestone).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub description: Option<Formattable>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sharing: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "_links")]
    pub links: Option<VersionLinks>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VersionLinks {
    #[serde(default, rename = "definingProject")]
    pub defining_project: Option<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Formattable {
    #[serde(default)]
    pub raw: Option<String>,
}
