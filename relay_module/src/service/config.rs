use std::env;
use std::path::PathBuf;

use super::BoxError;

pub const DEFAULT_TERMINAL_STATUS_THRESHOLD: u64 = 8;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Shared secret for the code-hosting webhook signature.
    pub webhook_secret: Option<String>,
    /// Signature enforcement toggle; disabling logs a warning per request.
    pub verify_signatures: bool,
    pub openproject_base_url: Option<String>,
    pub openproject_api_key: Option<String>,
    /// Explicit terminal-status id; skips the name lookup when set.
    pub developed_status_id: Option<u64>,
    pub developed_status_name: String,
    /// Explicit task-type id; skips the name lookup when set.
    pub task_type_id: Option<u64>,
    pub task_type_name: String,
    pub chat_webhook_url: Option<String>,
    pub summary_webhook_url: Option<String>,
    pub reminder_webhook_url: Option<String>,
    /// `HH:MM` lists, comma or whitespace separated.
    pub daily_summary_times: String,
    pub due_reminder_times: String,
    /// Status ids above this value count as terminal. Instance-specific
    /// convention; ids are renumbered only by the remote administrator.
    pub terminal_status_threshold: u64,
    pub log_file: Option<PathBuf>,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, BoxError> {
        dotenvy::dotenv().ok();

        let host = env_opt("RELAY_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env::var("RELAY_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8080);

        Ok(Self {
            host,
            port,
            webhook_secret: env_opt("GITHUB_WEBHOOK_SECRET"),
            verify_signatures: env_flag("RELAY_VERIFY_SIGNATURES", true),
            openproject_base_url: env_opt("OPENPROJECT_BASE_URL"),
            openproject_api_key: env_opt("OPENPROJECT_API_KEY"),
            developed_status_id: env_parse("OPENPROJECT_DEVELOPED_STATUS_ID"),
            developed_status_name: env_opt("OPENPROJECT_DEVELOPED_STATUS_NAME")
                .unwrap_or_else(|| "Developed".to_string()),
            task_type_id: env_parse("OPENPROJECT_TASK_TYPE_ID"),
            task_type_name: env_opt("OPENPROJECT_TASK_TYPE_NAME")
                .unwrap_or_else(|| "Task".to_string()),
            chat_webhook_url: env_opt("CHAT_WEBHOOK_URL"),
            summary_webhook_url: env_opt("SUMMARY_WEBHOOK_URL"),
            reminder_webhook_url: env_opt("REMINDER_WEBHOOK_URL"),
            daily_summary_times: env_opt("DAILY_SUMMARY_TIMES").unwrap_or_default(),
            due_reminder_times: env_opt("DUE_REMINDER_TIMES").unwrap_or_default(),
            terminal_status_threshold: env_parse("RELAY_TERMINAL_STATUS_THRESHOLD")
                .unwrap_or(DEFAULT_TERMINAL_STATUS_THRESHOLD),
            log_file: env_opt("RELAY_LOG_FILE").map(PathBuf::from),
        })
    }

    /// Webhook for summary broadcasts, falling back to the general one.
    pub fn summary_webhook(&self) -> Option<&str> {
        self.summary_webhook_url
            .as_deref()
            .or(self.chat_webhook_url.as_deref())
    }

    /// Webhook for reminder broadcasts, falling back to the general one.
    pub fn reminder_webhook(&self) -> Option<&str> {
        self.reminder_webhook_url
            .as_deref()
            .or(self.chat_webhook_url.as_deref())
    }
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_opt(name).and_then(|value| value.parse().ok())
}

fn env_flag(name: &str, default: bool) -> bool {
    match env_opt(name) {
        Some(value) => !matches!(
            value.to_ascii_lowercase().as_str(),
            "0" | "false" | "off" | "no"
        ),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_relay_env() {
        for name in [
            "RELAY_HOST",
            "RELAY_PORT",
            "GITHUB_WEBHOOK_SECRET",
            "RELAY_VERIFY_SIGNATURES",
            "OPENPROJECT_BASE_URL",
            "OPENPROJECT_API_KEY",
            "OPENPROJECT_DEVELOPED_STATUS_ID",
            "OPENPROJECT_DEVELOPED_STATUS_NAME",
            "OPENPROJECT_TASK_TYPE_ID",
            "OPENPROJECT_TASK_TYPE_NAME",
            "CHAT_WEBHOOK_URL",
            "SUMMARY_WEBHOOK_URL",
            "REMINDER_WEBHOOK_URL",
            "DAILY_SUMMARY_TIMES",
            "DUE_REMINDER_TIMES",
            "RELAY_TERMINAL_STATUS_THRESHOLD",
            "RELAY_LOG_FILE",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_when_env_is_empty() {
        clear_relay_env();
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(config.port, 8080);
        assert!(config.verify_signatures);
        assert_eq!(config.developed_status_name, "Developed");
        assert_eq!(config.task_type_name, "Task");
        assert_eq!(
            config.terminal_status_threshold,
            DEFAULT_TERMINAL_STATUS_THRESHOLD
        );
    }

    #[test]
    #[serial]
    fn verify_toggle_recognizes_off_values() {
        clear_relay_env();
        env::set_var("RELAY_VERIFY_SIGNATURES", "false");
        let config = ServiceConfig::from_env().expect("config");
        assert!(!config.verify_signatures);
        env::remove_var("RELAY_VERIFY_SIGNATURES");
    }

    #[test]
    #[serial]
    fn webhook_fallbacks_use_the_general_url() {
        clear_relay_env();
        env::set_var("CHAT_WEBHOOK_URL", "https://chat.example.com/hook");
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(
            config.summary_webhook(),
            Some("https://chat.example.com/hook")
        );
        assert_eq!(
            config.reminder_webhook(),
            Some("https://chat.example.com/hook")
        );

        env::set_var("SUMMARY_WEBHOOK_URL", "https://chat.example.com/summary");
        let config = ServiceConfig::from_env().expect("config");
        assert_eq!(
            config.summary_webhook(),
            Some("https://chat.example.com/summary")
        );
        env::remove_var("CHAT_WEBHOOK_URL");
        env::remove_var("SUMMARY_WEBHOOK_URL");
    }
}
