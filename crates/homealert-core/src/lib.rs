pub mod app_config;
pub mod config;
pub mod matching;
pub mod property;
pub mod quota;
pub mod saved_search;
pub mod validation;

use thiserror::Error;

pub use app_config::{AppConfig, Environment, MailConfig, MailTransport, SmtpAuth};
pub use config::{load_app_config, load_app_config_from_env};
pub use matching::{filter_matches, matches, PropertyPrefilter};
pub use property::PropertyRecord;
pub use saved_search::{
    AlertFrequency, AlertSettings, AlertTracking, PropertyType, SavedSearch, SavedSearchPatch,
    SearchCriteria, SearchOwner,
};
pub use validation::{normalize_email, validate_saved_search, validate_search_fields};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("config validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid property type: {0}")]
    InvalidPropertyType(String),
    #[error("invalid alert frequency: {0}")]
    InvalidAlertFrequency(String),
    #[error("invalid saved search: {0}")]
    Validation(String),
}
