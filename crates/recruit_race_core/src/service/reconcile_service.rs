//! Ledger reconciliation engine and service.
//!
//! # Responsibility
//! - Validate raw count/delta input before it reaches the engine.
//! - Plan ledger mutations for absolute syncs and signed deltas.
//! - Apply a plan to exactly one participant inside one read-modify-write.
//!
//! # Invariants
//! - Growth appends synthetic records dated noon local time on the target day.
//! - Shrinking always trims from the tail (most recently appended first),
//!   regardless of record dates.
//! - Ledger length never goes below zero; oversized removals empty the ledger.
//! - Growth is bounded per call and per ledger; requests over either limit
//!   are rejected before any record is built.
//! - Equal sync targets and zero deltas do not write.

use crate::clock::{noon_in, Clock};
use crate::model::applicant::{ApplicantRecord, PORTAL_SYNC_SOURCE};
use crate::model::participant::ParticipantLedger;
use crate::repo::roster_repo::LedgerStore;
use crate::service::{ServiceError, ServiceResult};
use crate::settings::CoreSettings;
use chrono::{Local, NaiveDate, TimeZone};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static COUNT_INPUT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?[0-9]+$").expect("valid count input regex"));

/// Rejected administrator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    /// Input is not a plain signed integer.
    NotAnInteger(String),
    /// Absolute totals cannot be negative.
    NegativeTotal(i64),
    /// Requested growth exceeds a configured limit.
    TooLarge { requested: usize, limit: usize },
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnInteger(value) => write!(f, "not an integer: `{value}`"),
            Self::NegativeTotal(value) => write!(f, "total must not be negative: {value}"),
            Self::TooLarge { requested, limit } => {
                write!(f, "requested {requested} records exceeds the limit of {limit}")
            }
        }
    }
}

impl Error for InputError {}

/// Parses a count or delta typed by an administrator.
///
/// Accepts optional surrounding whitespace, an optional sign and ASCII
/// digits. Anything else, including values outside `i64`, is rejected.
pub fn parse_count_input(raw: &str) -> Result<i64, InputError> {
    let trimmed = raw.trim();
    if !COUNT_INPUT_RE.is_match(trimmed) {
        return Err(InputError::NotAnInteger(raw.to_string()));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| InputError::NotAnInteger(raw.to_string()))
}

/// How raw input is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Input is the new absolute total.
    SyncTotal,
    /// Input is a signed adjustment.
    AddManual,
}

/// Signed change `raw` would make to a ledger of length `current`.
///
/// Invalid input previews as `0`.
pub fn preview_difference(mode: UpdateMode, raw: &str, current: usize) -> i64 {
    let Ok(value) = parse_count_input(raw) else {
        return 0;
    };
    match mode {
        UpdateMode::AddManual => value,
        UpdateMode::SyncTotal => value.saturating_sub(i64::try_from(current).unwrap_or(i64::MAX)),
    }
}

/// Validated reconciliation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileRequest {
    SyncAbsolute(usize),
    Delta(i64),
}

impl ReconcileRequest {
    /// Plans the mutation needed against a ledger of length `current`.
    pub fn plan(self, current: usize) -> LedgerMutation {
        match self {
            Self::SyncAbsolute(target) if target == current => LedgerMutation::Unchanged,
            Self::SyncAbsolute(target) if target > current => {
                LedgerMutation::Append(target - current)
            }
            Self::SyncAbsolute(target) => LedgerMutation::TruncateTo(target),
            Self::Delta(0) => LedgerMutation::Unchanged,
            Self::Delta(amount) if amount > 0 => {
                LedgerMutation::Append(usize::try_from(amount).unwrap_or(usize::MAX))
            }
            Self::Delta(amount) => {
                let removal = usize::try_from(amount.unsigned_abs()).unwrap_or(usize::MAX);
                LedgerMutation::TruncateTo(current.saturating_sub(removal))
            }
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::SyncAbsolute(_) => "sync",
            Self::Delta(_) => "delta",
        }
    }
}

/// Planned change to one ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerMutation {
    Unchanged,
    /// Append this many synthetic records.
    Append(usize),
    /// Keep only the first `n` records.
    TruncateTo(usize),
}

/// Applies `mutation` to `records`. Returns whether anything changed.
pub fn apply_mutation_in<Tz: TimeZone>(
    records: &mut Vec<ApplicantRecord>,
    mutation: LedgerMutation,
    target_date: NaiveDate,
    tz: &Tz,
) -> bool {
    match mutation {
        LedgerMutation::Unchanged | LedgerMutation::Append(0) => false,
        LedgerMutation::Append(count) => {
            let synthetic = synthesize_records_in(count, records.len(), target_date, tz);
            records.extend(synthetic);
            true
        }
        LedgerMutation::TruncateTo(len) if len < records.len() => {
            records.truncate(len);
            true
        }
        LedgerMutation::TruncateTo(_) => false,
    }
}

/// Builds `count` portal-sync records dated noon on `date` in `tz`.
///
/// Names continue numbering after `existing` records. Ids and emails share a
/// per-batch token and are never derived from real applicants.
pub fn synthesize_records_in<Tz: TimeZone>(
    count: usize,
    existing: usize,
    date: NaiveDate,
    tz: &Tz,
) -> Vec<ApplicantRecord> {
    let applied_at = noon_in(date, tz);
    let batch = Uuid::new_v4().simple().to_string();
    (0..count)
        .map(|i| ApplicantRecord {
            id: format!("portal-sync-{batch}-{i}"),
            email: format!("portal.candidate.{batch}.{i}@portal-sync.local"),
            name: format!("Portal Candidate {}", existing + i + 1),
            applied_at,
            source: PORTAL_SYNC_SOURCE.to_string(),
        })
        .collect()
}

/// Result of one reconciliation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Ledger after the call.
    pub participant: ParticipantLedger,
    pub before: usize,
    pub after: usize,
    pub mutation: LedgerMutation,
}

impl ReconcileOutcome {
    /// Signed change in record count.
    pub fn difference(&self) -> i64 {
        let after = i64::try_from(self.after).unwrap_or(i64::MAX);
        let before = i64::try_from(self.before).unwrap_or(i64::MAX);
        after - before
    }
}

/// Reconciliation service over a ledger store.
pub struct ReconcileService<L: LedgerStore, C: Clock> {
    ledgers: L,
    clock: C,
    max_records_per_call: usize,
    max_ledger_len: usize,
}

impl<L: LedgerStore, C: Clock> ReconcileService<L, C> {
    pub fn new(ledgers: L, clock: C, settings: &CoreSettings) -> Self {
        Self {
            ledgers,
            clock,
            max_records_per_call: settings.max_records_per_call,
            max_ledger_len: settings.max_ledger_len,
        }
    }

    /// Makes the ledger of `id` hold exactly `target_total` records.
    ///
    /// `target_date` defaults to today on the local calendar.
    pub fn sync_absolute(
        &self,
        id: &str,
        target_total: i64,
        target_date: Option<NaiveDate>,
    ) -> ServiceResult<ReconcileOutcome> {
        let target = usize::try_from(target_total)
            .map_err(|_| InputError::NegativeTotal(target_total))?;
        self.reconcile(id, ReconcileRequest::SyncAbsolute(target), target_date)
    }

    /// Adds (positive) or removes (negative) records for `id`.
    pub fn apply_delta(
        &self,
        id: &str,
        amount: i64,
        target_date: Option<NaiveDate>,
    ) -> ServiceResult<ReconcileOutcome> {
        self.reconcile(id, ReconcileRequest::Delta(amount), target_date)
    }

    /// Validates raw administrator input and dispatches it by `mode`.
    pub fn apply_input(
        &self,
        id: &str,
        mode: UpdateMode,
        raw: &str,
        target_date: Option<NaiveDate>,
    ) -> ServiceResult<ReconcileOutcome> {
        let value = parse_count_input(raw)?;
        match mode {
            UpdateMode::SyncTotal => self.sync_absolute(id, value, target_date),
            UpdateMode::AddManual => self.apply_delta(id, value, target_date),
        }
    }

    fn reconcile(
        &self,
        id: &str,
        request: ReconcileRequest,
        target_date: Option<NaiveDate>,
    ) -> ServiceResult<ReconcileOutcome> {
        self.check_request(request).inspect_err(|err| {
            warn!(
                "event=reconcile module=service status=rejected mode={} participant_id={id} error={err}",
                request.label()
            );
        })?;

        let date = target_date.unwrap_or_else(|| self.clock.today());
        let mut before = 0;
        let mut mutation = LedgerMutation::Unchanged;
        let mut rejected = None;

        let updated = self.ledgers.mutate_records(
            id,
            &mut |records: &mut Vec<ApplicantRecord>| -> bool {
                before = records.len();
                mutation = request.plan(before);
                if let LedgerMutation::Append(count) = mutation {
                    if let Err(err) = self.check_growth(before, count) {
                        rejected = Some(err);
                        return false;
                    }
                }
                apply_mutation_in(records, mutation, date, &Local)
            },
        )?;

        if let Some(err) = rejected {
            warn!(
                "event=reconcile module=service status=rejected mode={} participant_id={id} error={err}",
                request.label()
            );
            return Err(err.into());
        }

        let Some(participant) = updated else {
            warn!(
                "event=reconcile module=service status=error mode={} error_code=participant_not_found participant_id={id}",
                request.label()
            );
            return Err(ServiceError::ParticipantNotFound(id.to_string()));
        };

        let after = participant.record_count();
        info!(
            "event=reconcile module=service status=ok mode={} participant_id={id} target_date={date} before={before} after={after}",
            request.label()
        );
        Ok(ReconcileOutcome {
            participant,
            before,
            after,
            mutation,
        })
    }

    /// Rejects requests that exceed a limit regardless of ledger length.
    fn check_request(&self, request: ReconcileRequest) -> Result<(), InputError> {
        match request {
            ReconcileRequest::SyncAbsolute(target) if target > self.max_ledger_len => {
                Err(InputError::TooLarge {
                    requested: target,
                    limit: self.max_ledger_len,
                })
            }
            ReconcileRequest::Delta(amount) if amount > 0 => {
                let requested = usize::try_from(amount).unwrap_or(usize::MAX);
                if requested > self.max_records_per_call {
                    return Err(InputError::TooLarge {
                        requested,
                        limit: self.max_records_per_call,
                    });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_growth(&self, current: usize, count: usize) -> Result<(), InputError> {
        if count > self.max_records_per_call {
            return Err(InputError::TooLarge {
                requested: count,
                limit: self.max_records_per_call,
            });
        }
        let total = current.saturating_add(count);
        if total > self.max_ledger_len {
            return Err(InputError::TooLarge {
                requested: total,
                limit: self.max_ledger_len,
            });
        }
        Ok(())
    }
}
