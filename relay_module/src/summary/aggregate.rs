//! Work-package aggregation.
//!
//! Builds the daily digest data: three pairwise-disjoint item sets plus
//! per-roadmap completion. The remote record shape is duck-typed on the
//! wire, so status normalization follows a fixed precedence list here and
//! nowhere else.

use std::collections::HashSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::openproject::{
    filter, LookupResolver, Version, WorkPackage, WorkPackageClient,
};

#[derive(Debug, Clone, Serialize)]
pub struct WorkPackageSummary {
    pub id: u64,
    pub subject: String,
    pub status: String,
    pub assignee: Option<String>,
    pub project: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoadmapSummary {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub status: Option<String>,
    pub sharing: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub project: Option<String>,
    pub total: i64,
    pub closed: i64,
    pub percent: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub due_today: Vec<WorkPackageSummary>,
    pub overdue: Vec<WorkPackageSummary>,
    pub in_progress: Vec<WorkPackageSummary>,
    pub roadmaps: Vec<RoadmapSummary>,
}

fn status_name(work_package: &WorkPackage) -> Option<String> {
    if let Some(name) = work_package
        .embedded
        .as_ref()
        .and_then(|embedded| embedded.status.as_ref())
        .and_then(|status| status.name.clone())
    {
        return Some(name);
    }
    work_package
        .links
        .as_ref()
        .and_then(|links| links.status.as_ref())
        .and_then(|link| link.title.clone())
}

fn assignee_name(work_package: &WorkPackage) -> Option<String> {
    if let Some(name) = work_package
        .embedded
        .as_ref()
        .and_then(|embedded| embedded.assignee.as_ref())
        .map(|assignee| assignee.name.clone())
    {
        return Some(name);
    }
    work_package
        .links
        .as_ref()
        .and_then(|links| links.assignee.as_ref())
        .and_then(|link| link.title.clone())
}

fn project_name(work_package: &WorkPackage) -> Option<String> {
    if let Some(name) = work_package
        .embedded
        .as_ref()
        .and_then(|embedded| embedded.project.as_ref())
        .and_then(|project| project.name.clone())
    {
        return Some(name);
    }
    work_package
        .links
        .as_ref()
        .and_then(|links| links.project.as_ref())
        .and_then(|link| link.title.clone())
}

/// Project a remote record down to display fields.
pub fn summarize(work_package: &WorkPackage) -> WorkPackageSummary {
    WorkPackageSummary {
        id: work_package.id,
        subject: work_package.subject.clone(),
        status: status_name(work_package).unwrap_or_else(|| "unknown".to_string()),
        assignee: assignee_name(work_package),
        project: project_name(work_package),
        start_date: work_package.start_date,
        due_date: work_package.due_date,
    }
}

/// Whether a record counts as open.
///
/// Precedence: explicit closed flag on the embedded status, then embedded
/// status name, then linked status title, then the numeric id from the
/// status link (open iff id <= `terminal_threshold`), defaulting to open so
/// genuinely open items are never hidden.
pub fn is_open(work_package: &WorkPackage, terminal_threshold: u64) -> bool {
    let embedded_status = work_package
        .embedded
        .as_ref()
        .and_then(|embedded| embedded.status.as_ref());
    if let Some(closed) = embedded_status.and_then(|status| status.is_closed) {
        return !closed;
    }
    if let Some(name) = embedded_status.and_then(|status| status.name.as_deref()) {
        return !name.eq_ignore_ascii_case("closed");
    }
    let status_link = work_package
        .links
        .as_ref()
        .and_then(|links| links.status.as_ref());
    if let Some(title) = status_link.and_then(|link| link.title.as_deref()) {
        return !title.eq_ignore_ascii_case("closed");
    }
    if let Some(id) = status_link.and_then(|link| link.trailing_id()) {
        return id <= terminal_threshold;
    }
    true
}

/// Derive the three disjoint display sets from the raw query results.
///
/// Precedence: due today, then overdue, then in progress; an id claimed by
/// an earlier set never reappears in a later one.
pub fn derive_sets(
    due_today_raw: Vec<WorkPackage>,
    overdue_raw: Vec<WorkPackage>,
    in_progress_raw: Vec<WorkPackage>,
    terminal_threshold: u64,
) -> (
    Vec<WorkPackageSummary>,
    Vec<WorkPackageSummary>,
    Vec<WorkPackageSummary>,
) {
    let due_today: Vec<WorkPackageSummary> = due_today_raw
        .iter()
        .filter(|wp| is_open(wp, terminal_threshold))
        .map(summarize)
        .collect();
    let mut claimed: HashSet<u64> = due_today.iter().map(|item| item.id).collect();

    let overdue: Vec<WorkPackageSummary> = overdue_raw
        .iter()
        .filter(|wp| is_open(wp, terminal_threshold))
        .filter(|wp| !claimed.contains(&wp.id))
        .map(summarize)
        .collect();
    claimed.extend(overdue.iter().map(|item| item.id));

    let in_progress: Vec<WorkPackageSummary> = in_progress_raw
        .iter()
        .filter(|wp| is_open(wp, terminal_threshold))
        .filter(|wp| {
            status_name(wp).is_some_and(|name| name.eq_ignore_ascii_case("in progress"))
        })
        .filter(|wp| !claimed.contains(&wp.id))
        .map(summarize)
        .collect();

    (due_today, overdue, in_progress)
}

/// Closed/total as a percentage, rounded to the nearest integer. 0 when the
/// roadmap has no work packages.
pub fn completion_percent(closed: i64, total: i64) -> u32 {
    if total <= 0 {
        return 0;
    }
    let closed = closed.max(0) as f64;
    ((closed / total as f64) * 100.0).round() as u32
}

fn with_type_filter(mut filters: Vec<Value>, type_id: Option<u64>) -> Vec<Value> {
    if let Some(id) = type_id {
        let id = id.to_string();
        filters.push(filter("type", "=", &[id.as_str()]));
    }
    filters
}

fn due_today_filters(today: &str, type_id: Option<u64>) -> Vec<Value> {
    with_type_filter(vec![filter("dueDate", "=d", &[today])], type_id)
}

fn overdue_filters(type_id: Option<u64>) -> Vec<Value> {
    with_type_filter(vec![filter("dueDate", "<t-", &["1"])], type_id)
}

fn open_filters(type_id: Option<u64>) -> Vec<Value> {
    with_type_filter(vec![filter("status", "o", &[])], type_id)
}

/// Due-today and overdue sets only, for the reminder job.
pub async fn fetch_due_sets(
    client: &WorkPackageClient,
    resolver: &LookupResolver,
    terminal_threshold: u64,
) -> (Vec<WorkPackageSummary>, Vec<WorkPackageSummary>) {
    let today = Local::now().date_naive().to_string();
    let type_id = resolver.type_id(client).await;
    let due_filters = due_today_filters(&today, type_id);
    let overdue_filters = overdue_filters(type_id);
    let (due_raw, overdue_raw) = futures::join!(
        client.fetch_work_packages(&due_filters),
        client.fetch_work_packages(&overdue_filters),
    );
    let (due_today, overdue, _) = derive_sets(due_raw, overdue_raw, Vec::new(), terminal_threshold);
    (due_today, overdue)
}

/// Completion summary per project version.
pub async fn build_roadmap_summaries(client: &WorkPackageClient) -> Vec<RoadmapSummary> {
    let versions = client.fetch_roadmaps().await;
    let summaries = versions.into_iter().map(|version| async move {
        let id = version.id.to_string();
        let total_filters = [filter("version", "=", &[id.as_str()])];
        let closed_filters = [
            filter("version", "=", &[id.as_str()]),
            filter("status", "c", &[]),
        ];
        let (total, closed) = futures::join!(
            client.fetch_count(&total_filters),
            client.fetch_count(&closed_filters),
        );
        roadmap_summary(version, total, closed)
    });
    join_all(summaries).await
}

fn roadmap_summary(version: Version, total: i64, closed: i64) -> RoadmapSummary {
    let project = version
        .links
        .as_ref()
        .and_then(|links| links.defining_project.as_ref())
        .and_then(|link| link.title.clone());
    RoadmapSummary {
        id: version.id,
        name: version.name,
        description: version.description.and_then(|formattable| formattable.raw),
        status: version.status,
        sharing: version.sharing,
        start_date: version.start_date,
        due_date: version.end_date,
        created_at: version.created_at,
        updated_at: version.updated_at,
        project,
        total,
        closed,
        percent: completion_percent(closed, total),
    }
}

/// The full daily aggregate: three item sets plus roadmap completion.
pub async fn build_daily_summary(
    client: &WorkPackageClient,
    resolver: &LookupResolver,
    terminal_threshold: u64,
) -> DailySummary {
    let today = Local::now().date_naive();
    let today_string = today.to_string();
    let type_id = resolver.type_id(client).await;
    let due_filters = due_today_filters(&today_string, type_id);
    let overdue_filters = overdue_filters(type_id);
    let open_filters = open_filters(type_id);
    let (due_raw, overdue_raw, progress_raw) = futures::join!(
        client.fetch_work_packages(&due_filters),
        client.fetch_work_packages(&overdue_filters),
        client.fetch_work_packages(&open_filters),
    );
    let (due_today, overdue, in_progress) =
        derive_sets(due_raw, overdue_raw, progress_raw, terminal_threshold);
    let roadmaps = build_roadmap_summaries(client).await;
    DailySummary {
        date: today,
        due_today,
        overdue,
        in_progress,
        roadmaps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work_package(id: u64, status: serde_json::Value) -> WorkPackage {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "subject": format!("Task {id}"),
            "_embedded": { "status": status },
        }))
        .expect("work package")
    }

    fn work_package_with_links(id: u64, links: serde_json::Value) -> WorkPackage {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "subject": format!("Task {id}"),
            "_links": links,
        }))
        .expect("work package")
    }

    #[test]
    fn closed_flag_outranks_name() {
        let wp = work_package(1, serde_json::json!({ "name": "closed", "isClosed": false }));
        assert!(is_open(&wp, 8));
        let wp = work_package(1, serde_json::json!({ "name": "In progress", "isClosed": true }));
        assert!(!is_open(&wp, 8));
    }

    #[test]
    fn embedded_name_outranks_link_title() {
        let wp: WorkPackage = serde_json::from_value(serde_json::json!({
            "id": 1,
            "subject": "Task",
            "_embedded": { "status": { "name": "Closed" } },
            "_links": { "status": { "title": "In progress" } },
        }))
        .expect("work package");
        assert!(!is_open(&wp, 8));
    }

    #[test]
    fn link_title_used_when_embedded_absent() {
        let wp = work_package_with_links(1, serde_json::json!({ "status": { "title": "closed" } }));
        assert!(!is_open(&wp, 8));
        let wp = work_package_with_links(1, serde_json::json!({ "status": { "title": "New" } }));
        assert!(is_open(&wp, 8));
    }

    #[test]
    fn numeric_link_id_follows_threshold() {
        let wp =
            work_package_with_links(1, serde_json::json!({ "status": { "href": "/api/v3/statuses/8" } }));
        assert!(is_open(&wp, 8));
        let wp =
            work_package_with_links(1, serde_json::json!({ "status": { "href": "/api/v3/statuses/9" } }));
        assert!(!is_open(&wp, 8));
    }

    #[test]
    fn unresolvable_status_defaults_to_open() {
        let wp: WorkPackage =
            serde_json::from_value(serde_json::json!({ "id": 1, "subject": "Task" }))
                .expect("work package");
        assert!(is_open(&wp, 8));
    }

    #[test]
    fn sets_are_pairwise_disjoint_on_overlapping_input() {
        let open = serde_json::json!({ "name": "In progress", "isClosed": false });
        let due = vec![work_package(1, open.clone()), work_package(2, open.clone())];
        let overdue = vec![work_package(2, open.clone()), work_package(3, open.clone())];
        let in_progress = vec![
            work_package(1, open.clone()),
            work_package(3, open.clone()),
            work_package(4, open.clone()),
        ];

        let (due_today, overdue, in_progress) = derive_sets(due, overdue, in_progress, 8);
        let due_ids: Vec<u64> = due_today.iter().map(|item| item.id).collect();
        let overdue_ids: Vec<u64> = overdue.iter().map(|item| item.id).collect();
        let progress_ids: Vec<u64> = in_progress.iter().map(|item| item.id).collect();

        assert_eq!(due_ids, vec![1, 2]);
        assert_eq!(overdue_ids, vec![3]);
        assert_eq!(progress_ids, vec![4]);
    }

    #[test]
    fn closed_items_are_filtered_out_of_every_set() {
        let closed = serde_json::json!({ "name": "Closed", "isClosed": true });
        let open = serde_json::json!({ "name": "In progress" });
        let (due_today, overdue, in_progress) = derive_sets(
            vec![work_package(1, closed.clone())],
            vec![work_package(2, closed.clone())],
            vec![work_package(3, closed), work_package(4, open)],
            8,
        );
        assert!(due_today.is_empty());
        assert!(overdue.is_empty());
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, 4);
    }

    #[test]
    fn in_progress_requires_matching_status_name() {
        let (_, _, in_progress) = derive_sets(
            Vec::new(),
            Vec::new(),
            vec![
                work_package(1, serde_json::json!({ "name": "New" })),
                work_package(2, serde_json::json!({ "name": "IN PROGRESS" })),
            ],
            8,
        );
        assert_eq!(in_progress.len(), 1);
        assert_eq!(in_progress[0].id, 2);
    }

    #[test]
    fn completion_percent_rounds_to_nearest() {
        assert_eq!(completion_percent(0, 0), 0);
        assert_eq!(completion_percent(3, 10), 30);
        assert_eq!(completion_percent(2, 3), 67);
        assert_eq!(completion_percent(1, 3), 33);
        assert_eq!(completion_percent(10, 10), 100);
    }

    #[test]
    fn summarize_prefers_embedded_fields() {
        let wp: WorkPackage = serde_json::from_value(serde_json::json!({
            "id": 5,
            "subject": "Polish dashboard",
            "dueDate": "2026-08-07",
            "_embedded": {
                "status": { "name": "In progress" },
                "assignee": { "_type": "User", "name": "Alice Reyes" },
            },
            "_links": {
                "status": { "title": "stale title" },
                "project": { "title": "Relay" },
            },
        }))
        .expect("work package");

        let summary = summarize(&wp);
        assert_eq!(summary.status, "In progress");
        assert_eq!(summary.assignee.as_deref(), Some("Alice Reyes"));
        assert_eq!(summary.project.as_deref(), Some("Relay"));
        assert_eq!(summary.due_date.unwrap().to_string(), "2026-08-07");
    }
}
