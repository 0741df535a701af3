mod config;
pub mod inbound;
mod scheduler;
mod server;
mod state;
mod verify;

pub(crate) type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub use config::ServiceConfig;
pub use scheduler::{
    next_occurrence, parse_schedule_times, run_daily_summary, run_due_reminders, ScheduleEntry,
};
pub use server::{router, run_server};
pub use state::AppState;
