//! Initial roster generation.
//!
//! Seeded ledgers get a random number of organic-looking records spread
//! uniformly over the campaign window, so a fresh install shows a live race.

use crate::clock::{end_of_day_in, start_of_day_in};
use crate::model::applicant::ApplicantRecord;
use crate::model::participant::{ParticipantLedger, Roster};
use crate::model::window::CampaignWindow;
use chrono::{Duration, TimeZone};
use rand::Rng;
use std::ops::RangeInclusive;

const SEED_SOURCE: &str = "LinkedIn";

/// What a fresh roster is generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedPlan {
    pub names: Vec<String>,
    pub record_range: RangeInclusive<usize>,
    pub group_label: String,
}

/// Generates one ledger per seed name with records inside `window`.
///
/// Ids are `recruiter-<index>`; record timestamps lie within
/// `[campaign_start 00:00, campaign_end 23:59:59.999]` in `tz`. An inverted
/// window collapses every timestamp onto its start instant.
pub fn seed_roster_in<R: Rng, Tz: TimeZone>(
    plan: &SeedPlan,
    window: &CampaignWindow,
    rng: &mut R,
    tz: &Tz,
) -> Roster {
    let start = start_of_day_in(window.campaign_start, tz);
    let end = end_of_day_in(window.campaign_end, tz);
    let span_ms = (end - start).num_milliseconds().max(0);

    plan.names
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let id = format!("recruiter-{idx}");
            let count = if plan.record_range.is_empty() {
                *plan.record_range.start()
            } else {
                rng.gen_range(plan.record_range.clone())
            };
            let records = (0..count)
                .map(|i| ApplicantRecord {
                    id: format!("app-{id}-{i}"),
                    email: format!("candidate{i}@example.com"),
                    name: format!("Candidate {i}"),
                    applied_at: start + Duration::milliseconds(rng.gen_range(0..=span_ms)),
                    source: SEED_SOURCE.to_string(),
                })
                .collect();

            let mut ledger = ParticipantLedger::new(id, name.as_str());
            ledger.records = records;
            ledger.group_label = plan.group_label.clone();
            ledger
        })
        .collect()
}
