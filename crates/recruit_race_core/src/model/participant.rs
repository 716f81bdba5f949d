//! Participant ledger model.
//!
//! # Responsibility
//! - Define one participant with their ordered applicant records.
//! - Derive avatar references from display names.
//!
//! # Invariants
//! - `avatar_ref` is always derived from the current `display_name`.
//! - `records` keeps insertion order; trimming always removes from the tail.

use crate::model::applicant::ApplicantRecord;
use serde::{Deserialize, Serialize};

/// Group label assigned to participants that do not carry one.
pub const DEFAULT_GROUP_LABEL: &str = "Talent Team";

const AVATAR_BASE_URL: &str = "https://api.dicebear.com/7.x/avataaars/svg?seed=";

/// The whole set of participant ledgers, in stored order.
pub type Roster = Vec<ParticipantLedger>;

/// One participant and their applicant ledger.
///
/// Field names on the wire follow the roster blob: `name`, `avatar`,
/// `applicants`, `weeklyCount` and `company`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantLedger {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(rename = "avatar")]
    pub avatar_ref: String,
    #[serde(rename = "applicants")]
    pub records: Vec<ApplicantRecord>,
    /// Manually maintained weekly counter. Older blobs omit it.
    #[serde(rename = "weeklyCount", default)]
    pub manual_weekly_counter: i64,
    #[serde(rename = "company", default = "default_group_label")]
    pub group_label: String,
}

impl ParticipantLedger {
    /// Creates an empty ledger with a derived avatar and the default group.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            id: id.into(),
            avatar_ref: avatar_for(&display_name),
            display_name,
            records: Vec::new(),
            manual_weekly_counter: 0,
            group_label: DEFAULT_GROUP_LABEL.to_string(),
        }
    }

    /// Replaces the display name and re-derives the avatar from it.
    pub fn rename(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
        self.avatar_ref = avatar_for(&self.display_name);
    }

    /// Total number of records, regardless of any window.
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Derives the avatar reference for a display name.
pub fn avatar_for(display_name: &str) -> String {
    format!("{AVATAR_BASE_URL}{}", urlencoding::encode(display_name))
}

fn default_group_label() -> String {
    DEFAULT_GROUP_LABEL.to_string()
}
