//! Per-assignee due/overdue reminders.

use super::aggregate::WorkPackageSummary;
use crate::users::mention_for_name;

const DUE_TODAY_CALL_TO_ACTION: &str =
    "Please update its status or move the due date before end of day.";
const OVERDUE_CALL_TO_ACTION: &str =
    "Please reschedule it or bring it to a terminal status.";

/// One message per item; items without an assignee have nobody to remind
/// and are skipped.
pub fn build_reminders(
    due_today: &[WorkPackageSummary],
    overdue: &[WorkPackageSummary],
) -> Vec<String> {
    let mut messages = Vec::new();
    for item in due_today {
        if let Some(message) = reminder_line(item, true) {
            messages.push(message);
        }
    }
    for item in overdue {
        if let Some(message) = reminder_line(item, false) {
            messages.push(message);
        }
    }
    messages
}

fn reminder_line(item: &WorkPackageSummary, due_today: bool) -> Option<String> {
    let name = item.assignee.as_deref()?;
    let mention = mention_for_name(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string());
    if due_today {
        Some(format!(
            "{mention} work package #{} \"{}\" is due today. {DUE_TODAY_CALL_TO_ACTION}",
            item.id, item.subject
        ))
    } else {
        let due = item
            .due_date
            .map(|date| format!(" since {date}"))
            .unwrap_or_default();
        Some(format!(
            "{mention} work package #{} \"{}\" is overdue{due}. {OVERDUE_CALL_TO_ACTION}",
            item.id, item.subject
        ))
    }
}
