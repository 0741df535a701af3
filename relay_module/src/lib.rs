pub mod openproject;
pub mod service;
pub mod summary;
pub mod users;
pub mod workref;

pub use service::{run_server, ServiceConfig};
