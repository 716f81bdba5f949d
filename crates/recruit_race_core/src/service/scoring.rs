//! Windowed scoring engine and leaderboard ranking.
//!
//! # Responsibility
//! - Count ledger records inside the campaign and weekly windows.
//! - Rank a roster by campaign score.
//!
//! # Invariants
//! - A record counts when its calendar day in the evaluation zone lies in
//!   `[start, end]`; at millisecond precision this is the closed interval
//!   `[start 00:00:00.000, end 23:59:59.999]`.
//! - Scores share the day rule with `chart::daily_series_in`, so a ledger's
//!   campaign score always equals the sum of its daily buckets.
//! - Weekly score is zero unless both weekly bounds are present.
//! - Ranking is stable: ties keep stored roster order.

use crate::model::participant::ParticipantLedger;
use crate::model::window::{CampaignWindow, DateRange};
use chrono::{Local, TimeZone};

/// Counts records of `ledger` whose day in `tz` falls inside `range`.
pub fn count_in_range_in<Tz: TimeZone>(
    ledger: &ParticipantLedger,
    range: &DateRange,
    tz: &Tz,
) -> usize {
    ledger
        .records
        .iter()
        .filter(|record| range.contains_day(record.local_day_in(tz)))
        .count()
}

/// Campaign-to-date score evaluated in `tz`.
pub fn campaign_score_in<Tz: TimeZone>(
    ledger: &ParticipantLedger,
    window: &CampaignWindow,
    tz: &Tz,
) -> usize {
    count_in_range_in(ledger, &window.campaign_range(), tz)
}

/// Weekly score evaluated in `tz`; zero when the weekly range is not open.
pub fn weekly_score_in<Tz: TimeZone>(
    ledger: &ParticipantLedger,
    window: &CampaignWindow,
    tz: &Tz,
) -> usize {
    window
        .weekly_range()
        .map_or(0, |range| count_in_range_in(ledger, &range, tz))
}

/// Campaign-to-date score on the local calendar.
pub fn campaign_score(ledger: &ParticipantLedger, window: &CampaignWindow) -> usize {
    campaign_score_in(ledger, window, &Local)
}

/// Weekly score on the local calendar.
pub fn weekly_score(ledger: &ParticipantLedger, window: &CampaignWindow) -> usize {
    weekly_score_in(ledger, window, &Local)
}

/// One ranked row of the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// 1-based position.
    pub rank: usize,
    pub participant_id: String,
    pub display_name: String,
    pub avatar_ref: String,
    pub group_label: String,
    pub campaign_score: usize,
    pub weekly_score: usize,
    pub manual_weekly_counter: i64,
}

/// Ranks `roster` by descending campaign score evaluated in `tz`.
pub fn leaderboard_in<Tz: TimeZone>(
    roster: &[ParticipantLedger],
    window: &CampaignWindow,
    tz: &Tz,
) -> Vec<LeaderboardEntry> {
    let mut scored = roster
        .iter()
        .map(|ledger| {
            (
                ledger,
                campaign_score_in(ledger, window, tz),
                weekly_score_in(ledger, window, tz),
            )
        })
        .collect::<Vec<_>>();
    scored.sort_by(|left, right| right.1.cmp(&left.1));

    scored
        .into_iter()
        .enumerate()
        .map(|(idx, (ledger, campaign_score, weekly_score))| LeaderboardEntry {
            rank: idx + 1,
            participant_id: ledger.id.clone(),
            display_name: ledger.display_name.clone(),
            avatar_ref: ledger.avatar_ref.clone(),
            group_label: ledger.group_label.clone(),
            campaign_score,
            weekly_score,
            manual_weekly_counter: ledger.manual_weekly_counter,
        })
        .collect()
}

/// Ranks `roster` on the local calendar.
pub fn leaderboard(roster: &[ParticipantLedger], window: &CampaignWindow) -> Vec<LeaderboardEntry> {
    leaderboard_in(roster, window, &Local)
}

/// Returns the rank of `participant_id`, if present.
pub fn rank_of(entries: &[LeaderboardEntry], participant_id: &str) -> Option<usize> {
    entries
        .iter()
        .find(|entry| entry.participant_id == participant_id)
        .map(|entry| entry.rank)
}

/// Sum of campaign scores across all entries.
pub fn total_campaign_score(entries: &[LeaderboardEntry]) -> usize {
    entries.iter().map(|entry| entry.campaign_score).sum()
}
