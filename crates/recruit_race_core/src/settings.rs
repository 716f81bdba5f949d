//! Core runtime settings.
//!
//! # Responsibility
//! - Hold the tunables shared by stores and services: blob keys, seed
//!   roster, window policy, reconciliation limits and the coaching-tip
//!   timeout.
//!
//! # Invariants
//! - `Default` reproduces the behavior of the shipped dashboard.
//! - `seed_record_range` is never empty; builders clamp inverted input.

use crate::model::participant::DEFAULT_GROUP_LABEL;
use crate::model::window::WindowPolicy;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Blob key of the campaign window.
pub const CONFIG_BLOB_KEY: &str = "recruitment_race_config_v1";
/// Blob key of the roster.
pub const ROSTER_BLOB_KEY: &str = "recruitment_race_year_end_v1";

const DEFAULT_TIP_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_MAX_RECORDS_PER_CALL: usize = 10_000;
const DEFAULT_MAX_LEDGER_LEN: usize = 100_000;
const DEFAULT_SEED_NAMES: [&str; 10] = [
    "Alice Chen",
    "Bob Smith",
    "Charlie Davis",
    "Diana Prince",
    "Evan Wright",
    "Fiona Gallagher",
    "George Miller",
    "Hannah Lee",
    "Ivan Petrov",
    "Jessica Wu",
];

/// Settings consumed by repositories and services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreSettings {
    pub config_key: String,
    pub roster_key: String,
    /// Names seeded when the roster blob is absent.
    pub seed_names: Vec<String>,
    /// Inclusive range for the random record count of each seeded ledger.
    pub seed_record_range: RangeInclusive<usize>,
    pub group_label: String,
    pub window_policy: WindowPolicy,
    /// Most records a single reconciliation may append.
    pub max_records_per_call: usize,
    /// Longest ledger a reconciliation may produce.
    pub max_ledger_len: usize,
    /// Upper bound for one coaching-tip generation.
    pub tip_timeout: Duration,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            config_key: CONFIG_BLOB_KEY.to_string(),
            roster_key: ROSTER_BLOB_KEY.to_string(),
            seed_names: DEFAULT_SEED_NAMES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            seed_record_range: 5..=44,
            group_label: DEFAULT_GROUP_LABEL.to_string(),
            window_policy: WindowPolicy::default(),
            max_records_per_call: DEFAULT_MAX_RECORDS_PER_CALL,
            max_ledger_len: DEFAULT_MAX_LEDGER_LEN,
            tip_timeout: DEFAULT_TIP_TIMEOUT,
        }
    }
}

impl CoreSettings {
    pub fn with_window_policy(mut self, policy: WindowPolicy) -> Self {
        self.window_policy = policy;
        self
    }

    pub fn with_seed_names(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.seed_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_seed_record_range(mut self, min: usize, max: usize) -> Self {
        self.seed_record_range = min.min(max)..=min.max(max);
        self
    }

    pub fn with_reconcile_limits(
        mut self,
        max_records_per_call: usize,
        max_ledger_len: usize,
    ) -> Self {
        self.max_records_per_call = max_records_per_call;
        self.max_ledger_len = max_ledger_len;
        self
    }

    pub fn with_tip_timeout(mut self, timeout: Duration) -> Self {
        self.tip_timeout = timeout;
        self
    }
}
