//! Core domain logic for the recruiting race leaderboard.
//! This crate owns the applicant ledgers, reconciliation and scoring rules.

pub mod clock;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod settings;

pub use clock::{Clock, FixedClock, SystemClock};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget, LoggingError};
pub use model::applicant::{ApplicantRecord, PORTAL_SYNC_SOURCE};
pub use model::participant::{avatar_for, ParticipantLedger, Roster, DEFAULT_GROUP_LABEL};
pub use model::viewer::Viewer;
pub use model::window::{CampaignWindow, DateRange, InvertedWindowError, WindowPolicy};
pub use repo::blob_store::{BlobStore, MemoryBlobStore, SqliteBlobStore, StoreError, StoreResult};
pub use repo::config_repo::{ConfigRepository, ConfigStore};
pub use repo::roster_repo::{LedgerStore, RosterRepository};
pub use repo::{RepoError, RepoResult};
pub use service::chart::{daily_series, daily_series_in, DayBucket};
pub use service::coaching::{
    analyze_portal_text, estimated_commission, parse_portal_analysis, AnalysisError,
    CoachingService, GeneratorError, PortalAnalysis, PortalAnalyzer, TipGenerator, TipRequest,
};
pub use service::leaderboard_service::{DashboardView, LeaderboardService};
pub use service::reconcile_service::{
    parse_count_input, preview_difference, InputError, LedgerMutation, ReconcileOutcome,
    ReconcileRequest, ReconcileService, UpdateMode,
};
pub use service::scoring::{
    campaign_score, campaign_score_in, leaderboard, leaderboard_in, rank_of,
    total_campaign_score, weekly_score, weekly_score_in, LeaderboardEntry,
};
pub use service::{ServiceError, ServiceResult};
pub use settings::CoreSettings;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
