//! Plain-text digest rendering.

use super::aggregate::{DailySummary, WorkPackageSummary};

const SUBJECT_MAX_CHARS: usize = 80;

pub fn render_digest(summary: &DailySummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("**Work-package summary for {}**\n\n", summary.date));
    push_section(&mut out, "Due today", &summary.due_today);
    push_section(&mut out, "Overdue", &summary.overdue);
    push_section(&mut out, "In progress", &summary.in_progress);

    out.push_str("**Roadmaps**\n");
    if summary.roadmaps.is_empty() {
        out.push_str("- none\n");
    }
    for roadmap in &summary.roadmaps {
        out.push_str(&format!(
            "- {}: {}% complete ({}/{} closed)\n",
            roadmap.name, roadmap.percent, roadmap.closed, roadmap.total
        ));
    }
    out
}

fn push_section(out: &mut String, title: &str, items: &[WorkPackageSummary]) {
    out.push_str(&format!("**{title}**\n"));
    if items.is_empty() {
        out.push_str("- none\n");
    }
    for item in items {
        let assignee = item.assignee.as_deref().unwrap_or("unassigned");
        let due = item
            .due_date
            .map(|date| format!(", due {date}"))
            .unwrap_or_default();
        out.push_str(&format!(
            "- #{} {} ({assignee}{due})\n",
            item.id,
            truncate_subject(&item.subject)
        ));
    }
    out.push('\n');
}

pub(super) fn truncate_subject(subject: &str) -> String {
    if subject.chars().count() <= SUBJECT_MAX_CHARS {
        return subject.to_string();
    }
    let head: String = subject.chars().take(SUBJECT_MAX_CHARS - 1).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn item(id: u64, subject: &str) -> WorkPackageSummary {
        WorkPackageSummary {
            id,
            subject: subject.to_string(),
            status: "In progress".to_string(),
            assignee: Some("Alice Reyes".to_string()),
            project: None,
            start_date: None,
            due_date: NaiveDate::from_ymd_opt(2026, 8, 7),
        }
    }

    fn empty_summary() -> DailySummary {
        DailySummary {
            date: NaiveDate::from_ymd_opt(2026, 8, 7).unwrap(),
            due_today: Vec::new(),
            overdue: Vec::new(),
            in_progress: Vec::new(),
            roadmaps: Vec::new(),
        }
    }

    #[test]
    fn digest_lists_each_section() {
        let mut summary = empty_summary();
        summary.due_today = vec![item(1, "Fix login")];

        let digest = render_digest(&summary);
        assert!(digest.contains("**Due today**"));
        assert!(digest.contains("- #1 Fix login (Alice Reyes, due 2026-08-07)"));
        assert!(digest.contains("**Overdue**\n- none"));
        assert!(digest.contains("**Roadmaps**\n- none"));
    }

    #[test]
    fn long_subjects_are_truncated() {
        let long = "x".repeat(200);
        let truncated = truncate_subject(&long);
        assert_eq!(truncated.chars().count(), SUBJECT_MAX_CHARS);
        assert!(truncated.ends_with('…'));
    }
}
