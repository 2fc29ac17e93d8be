//! The match-and-alert engine.
//!
//! [`AlertRunCoordinator`] runs one scan-and-dispatch cycle: the
//! [`MatchScanner`] pairs newly listed properties with saved searches that
//! still have daily budget, and the [`AlertDispatcher`] mails each owner and
//! persists the tracking update. Storage and mail are reached through the
//! traits in [`source`] and [`mailer`].

pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod history;
pub mod mailer;
pub mod preview;
pub mod render;
pub mod scanner;
pub mod source;
pub mod store;

pub use coordinator::{
    validate_hours_back, AlertRunCoordinator, EngineSettings, MatchSummary, RunPermit,
    RunSummary, MAX_HOURS_BACK,
};
pub use dispatcher::{AlertDispatcher, DeliveryOutcome, SkipReason};
pub use error::{AlertError, DeliveryError, StoreError};
pub use history::{run_recorded, RecordedRun};
pub use mailer::{build_mailer, AlertEmail, LogMailer, Mailer, Recipient, SmtpMailer};
pub use preview::{preview_matches, MatchPreview};
pub use render::render_alert;
pub use scanner::{MatchResult, MatchScanner, ScanReport};
pub use source::{PropertySource, SavedSearchStore};
pub use store::PgStore;
