use std::net::SocketAddr;

use chrono::FixedOffset;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Which mail capability the process wires up at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransport {
    /// Log the alert instead of sending it.
    Log,
    Smtp,
}

#[derive(Clone, PartialEq, Eq)]
pub struct SmtpAuth {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SmtpAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpAuth")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub transport: MailTransport,
    /// Required when `transport` is [`MailTransport::Smtp`].
    pub host: Option<String>,
    pub port: u16,
    pub auth: Option<SmtpAuth>,
    pub from_address: String,
    /// Base URL used to build listing and dashboard links in alert emails.
    pub frontend_base_url: String,
    pub send_timeout_secs: u64,
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub mail: MailConfig,
    /// Six-field cron expression for the scheduled alert check.
    pub alert_cron: String,
    pub alert_hours_back: u32,
    /// Offset whose local midnight rolls over the daily alert quota.
    pub quota_utc_offset: FixedOffset,
    pub scheduler_enabled: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("mail", &self.mail)
            .field("alert_cron", &self.alert_cron)
            .field("alert_hours_back", &self.alert_hours_back)
            .field("quota_utc_offset", &self.quota_utc_offset)
            .field("scheduler_enabled", &self.scheduler_enabled)
            .finish()
    }
}
