//! Dashboard read model assembly.
//!
//! # Responsibility
//! - Read the window and roster once and derive every displayed number.
//! - Select chart ledgers from the explicit viewer context.
//!
//! # Invariants
//! - Views are pure projections of config + roster snapshots.
//! - Admin views chart every ledger; participant views chart only their own.

use crate::model::viewer::Viewer;
use crate::model::window::CampaignWindow;
use crate::repo::config_repo::ConfigStore;
use crate::repo::roster_repo::LedgerStore;
use crate::service::chart::{daily_series_in, DayBucket};
use crate::service::scoring::{leaderboard_in, total_campaign_score, LeaderboardEntry};
use crate::service::{ServiceError, ServiceResult};
use chrono::{Local, TimeZone};
use log::debug;

/// Everything the dashboard renders for one viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub window: CampaignWindow,
    /// Ranked by descending campaign score.
    pub entries: Vec<LeaderboardEntry>,
    pub series: Vec<DayBucket>,
    /// Sum of campaign scores across the roster.
    pub total_campaign_applicants: usize,
    /// Viewer's entry when the viewer is a participant.
    pub viewer_entry: Option<LeaderboardEntry>,
}

/// Read-side service combining the config and ledger stores.
pub struct LeaderboardService<K: ConfigStore, L: LedgerStore> {
    config: K,
    ledgers: L,
}

impl<K: ConfigStore, L: LedgerStore> LeaderboardService<K, L> {
    pub fn new(config: K, ledgers: L) -> Self {
        Self { config, ledgers }
    }

    /// Builds the dashboard for `viewer` on the local calendar.
    pub fn dashboard(&self, viewer: &Viewer) -> ServiceResult<DashboardView> {
        self.dashboard_in(viewer, &Local)
    }

    /// Builds the dashboard for `viewer`, evaluating days in `tz`.
    pub fn dashboard_in<Tz: TimeZone>(
        &self,
        viewer: &Viewer,
        tz: &Tz,
    ) -> ServiceResult<DashboardView> {
        let window = self.config.window()?;
        let roster = self.ledgers.all()?;
        let entries = leaderboard_in(&roster, &window, tz);

        let (series, viewer_entry) = match viewer.participant_id() {
            None => (daily_series_in(&roster, &window, tz), None),
            Some(id) => {
                let ledger = roster
                    .iter()
                    .find(|ledger| ledger.id == id)
                    .ok_or_else(|| ServiceError::ParticipantNotFound(id.to_string()))?;
                let entry = entries
                    .iter()
                    .find(|entry| entry.participant_id == id)
                    .cloned();
                (daily_series_in([ledger], &window, tz), entry)
            }
        };

        debug!(
            "event=dashboard_build module=service status=ok participants={} buckets={} admin={}",
            entries.len(),
            series.len(),
            viewer_entry.is_none()
        );
        Ok(DashboardView {
            total_campaign_applicants: total_campaign_score(&entries),
            window,
            entries,
            series,
            viewer_entry,
        })
    }
}
