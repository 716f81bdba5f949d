//! Campaign window model.
//!
//! # Responsibility
//! - Define the campaign date range and the optional weekly sub-range.
//! - Provide the default month window and the inversion policy applied when
//!   a window is saved.
//!
//! # Invariants
//! - Dates are calendar dates; time of day is applied by the engines.
//! - The derived month default always satisfies `campaign_start <= campaign_end`.
//! - User-supplied windows are only checked when the active policy says so.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Returns whether `start > end`.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Returns whether `day` lies within `[start, end]`.
    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Iterates every day from `start` to `end` inclusive.
    ///
    /// Yields nothing when the range is inverted.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |day| *day <= end)
    }
}

/// Active campaign window plus optional weekly challenge window.
///
/// Persisted as `{startDate, endDate, weeklyStartDate?, weeklyEndDate?}` with
/// `YYYY-MM-DD` dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignWindow {
    #[serde(rename = "startDate")]
    pub campaign_start: NaiveDate,
    #[serde(rename = "endDate")]
    pub campaign_end: NaiveDate,
    #[serde(
        rename = "weeklyStartDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub weekly_start: Option<NaiveDate>,
    #[serde(
        rename = "weeklyEndDate",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub weekly_end: Option<NaiveDate>,
}

impl CampaignWindow {
    /// Creates a campaign window without a weekly range.
    pub fn new(campaign_start: NaiveDate, campaign_end: NaiveDate) -> Self {
        Self {
            campaign_start,
            campaign_end,
            weekly_start: None,
            weekly_end: None,
        }
    }

    /// Returns a copy with the weekly range set.
    pub fn with_weekly(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.weekly_start = start;
        self.weekly_end = end;
        self
    }

    /// Default window: first through last calendar day of `today`'s month.
    pub fn month_of(today: NaiveDate) -> Self {
        let first = today.with_day(1).unwrap_or(today);
        let next_month_first = if first.month() == 12 {
            NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
        };
        let last = next_month_first
            .and_then(|date| date.pred_opt())
            .unwrap_or(today);
        Self::new(first, last)
    }

    pub fn campaign_range(&self) -> DateRange {
        DateRange::new(self.campaign_start, self.campaign_end)
    }

    /// Returns the weekly range only when both bounds are present.
    pub fn weekly_range(&self) -> Option<DateRange> {
        match (self.weekly_start, self.weekly_end) {
            (Some(start), Some(end)) => Some(DateRange::new(start, end)),
            _ => None,
        }
    }

    /// Returns whether the campaign range or an open weekly range is inverted.
    pub fn has_inverted_range(&self) -> bool {
        self.campaign_range().is_inverted()
            || self
                .weekly_range()
                .is_some_and(|range| range.is_inverted())
    }

    /// Returns a copy where every inverted open range has its bounds swapped.
    pub fn normalized(mut self) -> Self {
        if self.campaign_start > self.campaign_end {
            std::mem::swap(&mut self.campaign_start, &mut self.campaign_end);
        }
        if let (Some(start), Some(end)) = (self.weekly_start, self.weekly_end) {
            if start > end {
                self.weekly_start = Some(end);
                self.weekly_end = Some(start);
            }
        }
        self
    }
}

/// How the config store treats a window whose start is after its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPolicy {
    /// Persist verbatim. Inverted ranges produce empty series and zero scores.
    #[default]
    AcceptAsIs,
    /// Refuse to persist an inverted range.
    RejectInverted,
    /// Swap inverted bounds before persisting.
    NormalizeInverted,
}

/// Window rejected by [`WindowPolicy::RejectInverted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvertedWindowError {
    pub window: CampaignWindow,
}

impl Display for InvertedWindowError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "campaign window has start after end ({}..{})",
            self.window.campaign_start, self.window.campaign_end
        )
    }
}

impl Error for InvertedWindowError {}

impl WindowPolicy {
    /// Applies this policy to a window about to be persisted.
    pub fn apply(self, window: CampaignWindow) -> Result<CampaignWindow, InvertedWindowError> {
        match self {
            Self::AcceptAsIs => Ok(window),
            Self::RejectInverted if window.has_inverted_range() => {
                Err(InvertedWindowError { window })
            }
            Self::RejectInverted => Ok(window),
            Self::NormalizeInverted => Ok(window.normalized()),
        }
    }
}
