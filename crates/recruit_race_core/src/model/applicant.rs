//! Applicant record model.
//!
//! # Responsibility
//! - Define one timestamped entry of a participant ledger.
//! - Classify entries created by reconciliation versus organic sources.
//!
//! # Invariants
//! - `id` is the identity; `email` is not required to be unique.
//! - `applied_at` is stored as an absolute instant (UTC) and interpreted in a
//!   caller-supplied time zone when bucketed into calendar days.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Source marker carried by records synthesized during reconciliation.
pub const PORTAL_SYNC_SOURCE: &str = "Portal Sync";

/// One applicant entry in a participant ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantRecord {
    /// Opaque identity of this entry.
    pub id: String,
    pub email: String,
    pub name: String,
    /// Serialized as `appliedDate` (ISO-8601) to match the stored roster blob.
    #[serde(rename = "appliedDate")]
    pub applied_at: DateTime<Utc>,
    pub source: String,
}

impl ApplicantRecord {
    /// Returns the calendar day this record falls on in `tz`.
    pub fn local_day_in<Tz: TimeZone>(&self, tz: &Tz) -> NaiveDate {
        self.applied_at.with_timezone(tz).date_naive()
    }

    /// Returns whether this record was synthesized by reconciliation.
    pub fn is_synthetic(&self) -> bool {
        self.source == PORTAL_SYNC_SOURCE
    }
}
