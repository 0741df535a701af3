mod aggregate;
mod digest;
mod html;
mod reminders;

pub use aggregate::{
    build_daily_summary, build_roadmap_summaries, completion_percent, derive_sets, fetch_due_sets,
    is_open, summarize, DailySummary, RoadmapSummary, WorkPackageSummary,
};
pub use digest::render_digest;
pub use html::render_html;
pub use reminders::build_reminders;
