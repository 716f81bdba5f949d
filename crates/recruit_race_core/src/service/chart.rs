//! Daily series builder for the campaign chart.
//!
//! Which ledgers feed the series (every ledger for an aggregate view, one for
//! a personal view) is decided by the caller.

use crate::model::participant::ParticipantLedger;
use crate::model::window::CampaignWindow;
use chrono::{Local, NaiveDate, TimeZone};
use serde::Serialize;

/// Applicant count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    /// Short axis label such as `Nov 1`.
    pub label: String,
    pub count: usize,
}

/// Buckets records of `ledgers` per day of the campaign range in `tz`.
///
/// Produces one zeroed bucket per day from `campaign_start` to
/// `campaign_end` inclusive; an inverted range yields no buckets. Records
/// outside the range are dropped.
pub fn daily_series_in<'a, Tz: TimeZone>(
    ledgers: impl IntoIterator<Item = &'a ParticipantLedger>,
    window: &CampaignWindow,
    tz: &Tz,
) -> Vec<DayBucket> {
    let range = window.campaign_range();
    let mut buckets = range
        .days()
        .map(|date| DayBucket {
            date,
            label: date.format("%b %-d").to_string(),
            count: 0,
        })
        .collect::<Vec<_>>();
    if buckets.is_empty() {
        return buckets;
    }

    for record in ledgers.into_iter().flat_map(|ledger| ledger.records.iter()) {
        let day = record.local_day_in(tz);
        if !range.contains_day(day) {
            continue;
        }
        let offset = (day - range.start).num_days();
        if let Some(bucket) = usize::try_from(offset)
            .ok()
            .and_then(|idx| buckets.get_mut(idx))
        {
            bucket.count += 1;
        }
    }

    buckets
}

/// Buckets records on the local calendar.
pub fn daily_series<'a>(
    ledgers: impl IntoIterator<Item = &'a ParticipantLedger>,
    window: &CampaignWindow,
) -> Vec<DayBucket> {
    daily_series_in(ledgers, window, &Local)
}
