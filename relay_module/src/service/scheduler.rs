//! Time-of-day job scheduling.
//!
//! Each configured `HH:MM` entry gets its own sleep/wake loop: compute the
//! next local occurrence, sleep, run the job, recompute. Rescheduling
//! happens after the job body finishes, so a slow run delays only its own
//! next fire and drift never accumulates. There is no overlap protection; a
//! job body running past 24h overlaps its next fire.

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::state::AppState;
use crate::summary::{
    build_daily_summary, build_reminders, fetch_due_sets, render_digest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub hour: u32,
    pub minute: u32,
}

/// Parse a comma/whitespace-separated `HH:MM` list. Invalid entries are
/// logged and skipped; they never take the valid ones down with them.
pub fn parse_schedule_times(raw: &str) -> Vec<ScheduleEntry> {
    raw.split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match parse_entry(token) {
            Some(entry) => Some(entry),
            None => {
                warn!("skipping invalid schedule time '{}'", token);
                None
            }
        })
        .collect()
}

fn parse_entry(token: &str) -> Option<ScheduleEntry> {
    let (hour, minute) = token.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(ScheduleEntry { hour, minute })
}

/// Next strictly-future occurrence of `entry`: today if still ahead of
/// `now`, otherwise tomorrow. A wall-clock time skipped by a DST jump
/// resolves to the following valid instant.
pub fn next_occurrence(now: DateTime<Local>, entry: ScheduleEntry) -> Option<DateTime<Local>> {
    let today = local_at(now.date_naive(), entry)?;
    if today > now {
        return Some(today);
    }
    local_at(now.date_naive() + ChronoDuration::days(1), entry)
}

fn local_at(date: chrono::NaiveDate, entry: ScheduleEntry) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(entry.hour, entry.minute, 0)?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(naive + ChronoDuration::hours(1))).earliest())
}

/// Broadcast the daily digest to the summary webhook.
pub async fn run_daily_summary(state: &AppState) {
    let summary = build_daily_summary(
        &state.client,
        &state.resolver,
        state.config.terminal_status_threshold,
    )
    .await;
    let digest = render_digest(&summary);
    state.broadcast(state.config.summary_webhook(), &digest).await;
}

/// Broadcast one reminder per due/overdue item to the reminder webhook.
pub async fn run_due_reminders(state: &AppState) {
    let (due_today, overdue) = fetch_due_sets(
        &state.client,
        &state.resolver,
        state.config.terminal_status_threshold,
    )
    .await;
    let messages = build_reminders(&due_today, &overdue);
    if messages.is_empty() {
        info!("no due or overdue items to remind about");
        return;
    }
    for message in &messages {
        state
            .broadcast(state.config.reminder_webhook(), message)
            .await;
    }
}

pub(super) struct SchedulerControl {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl SchedulerControl {
    pub(super) fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub(super) async fn stop_and_join(&mut self) {
        self.stop();
        for handle in self.handles.drain(..) {
            if let Err(err) = handle.await {
                error!("scheduler task panicked: {}", err);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum JobKind {
    DailySummary,
    DueReminders,
}

impl JobKind {
    fn label(self) -> &'static str {
        match self {
            JobKind::DailySummary => "daily summary",
            JobKind::DueReminders => "due reminders",
        }
    }

    async fn run(self, state: &AppState) {
        match self {
            JobKind::DailySummary => run_daily_summary(state).await,
            JobKind::DueReminders => run_due_reminders(state).await,
        }
    }
}

pub(super) fn start_scheduler_tasks(state: AppState) -> SchedulerControl {
    let (stop, _) = watch::channel(false);
    let mut handles = Vec::new();

    let jobs = [
        (JobKind::DailySummary, state.config.daily_summary_times.clone()),
        (JobKind::DueReminders, state.config.due_reminder_times.clone()),
    ];
    for (kind, raw_times) in jobs {
        for entry in parse_schedule_times(&raw_times) {
            info!(
                "scheduling {} at {:02}:{:02} local time",
                kind.label(),
                entry.hour,
                entry.minute
            );
            handles.push(spawn_job_loop(state.clone(), kind, entry, stop.subscribe()));
        }
    }

    SchedulerControl { stop, handles }
}

fn spawn_job_loop(
    state: AppState,
    kind: JobKind,
    entry: ScheduleEntry,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let Some(next) = next_occurrence(now, entry) else {
                error!(
                    "cannot compute next occurrence of {:02}:{:02}; stopping {} loop",
                    entry.hour,
                    entry.minute,
                    kind.label()
                );
                return;
            };
            let delay = (next - now)
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(0));
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    info!("running scheduled {}", kind.label());
                    kind.run(&state).await;
                }
                _ = stop.changed() => {
                    return;
                }
            }
        }
    })
}
