//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose dashboard reads and administrator commands to Dart via FRB.
//! - Translate core errors into flat envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every store access holds `STORE_LOCK`, so roster read-modify-write
//!   cycles from concurrent calls never interleave.
//! - Dates cross the boundary as `YYYY-MM-DD` strings.

use chrono::NaiveDate;
use log::{info, warn};
use recruit_race_core::db::open_db;
use recruit_race_core::service::coaching::{DEFAULT_COMMISSION_RATE, FALLBACK_TIP};
use recruit_race_core::{
    core_version as core_version_inner, estimated_commission, init_logging as init_logging_inner,
    ping as ping_inner, preview_difference, CampaignWindow, CoachingService, ConfigStore, CoreSettings, DashboardView,
    DayBucket, LeaderboardEntry, LeaderboardService, LedgerStore, ReconcileService,
    RosterRepository, ServiceResult, SqliteBlobStore, SystemClock, UpdateMode, Viewer,
};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock, PoisonError};

const DB_FILE_NAME: &str = "recruit_race.sqlite3";
const DEFAULT_ADMIN_PASSPHRASE: &str = "admin2025";
const DATE_FORMAT: &str = "%Y-%m-%d";

static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

type RaceRoster<'a, 'conn> = RosterRepository<&'a SqliteBlobStore<'conn>, SystemClock>;

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Campaign and weekly window as `YYYY-MM-DD` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowView {
    pub campaign_start: String,
    pub campaign_end: String,
    pub weekly_start: Option<String>,
    pub weekly_end: Option<String>,
}

impl From<CampaignWindow> for WindowView {
    fn from(window: CampaignWindow) -> Self {
        Self {
            campaign_start: format_date(window.campaign_start),
            campaign_end: format_date(window.campaign_end),
            weekly_start: window.weekly_start.map(format_date),
            weekly_end: window.weekly_end.map(format_date),
        }
    }
}

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub rank: u32,
    pub participant_id: String,
    pub display_name: String,
    pub avatar_ref: String,
    pub group_label: String,
    pub campaign_score: u32,
    pub weekly_score: u32,
    pub manual_weekly_counter: i64,
}

impl From<LeaderboardEntry> for ParticipantRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            rank: to_u32(entry.rank),
            participant_id: entry.participant_id,
            display_name: entry.display_name,
            avatar_ref: entry.avatar_ref,
            group_label: entry.group_label,
            campaign_score: to_u32(entry.campaign_score),
            weekly_score: to_u32(entry.weekly_score),
            manual_weekly_counter: entry.manual_weekly_counter,
        }
    }
}

/// One chart bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPoint {
    pub date: String,
    /// Axis label such as `Nov 1`.
    pub label: String,
    pub count: u32,
}

impl From<DayBucket> for ChartPoint {
    fn from(bucket: DayBucket) -> Self {
        Self {
            date: format_date(bucket.date),
            label: bucket.label,
            count: to_u32(bucket.count),
        }
    }
}

/// Dashboard response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardResponse {
    pub ok: bool,
    pub window: Option<WindowView>,
    /// Ranked by descending campaign score.
    pub rows: Vec<ParticipantRow>,
    /// Aggregate for admins, the viewer's own series otherwise.
    pub chart: Vec<ChartPoint>,
    pub total_campaign_applicants: u32,
    /// Viewer's own row when a participant id was supplied.
    pub viewer_row: Option<ParticipantRow>,
    pub message: String,
}

impl DashboardResponse {
    fn success(view: DashboardView) -> Self {
        Self {
            ok: true,
            window: Some(view.window.into()),
            total_campaign_applicants: to_u32(view.total_campaign_applicants),
            rows: view.entries.into_iter().map(Into::into).collect(),
            chart: view.series.into_iter().map(Into::into).collect(),
            viewer_row: view.viewer_entry.map(Into::into),
            message: String::new(),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            ok: false,
            window: None,
            rows: Vec::new(),
            chart: Vec::new(),
            total_campaign_applicants: 0,
            viewer_row: None,
            message,
        }
    }
}

/// Window read/write response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowResponse {
    pub ok: bool,
    pub window: Option<WindowView>,
    pub message: String,
}

impl WindowResponse {
    fn from_result(result: Result<CampaignWindow, String>) -> Self {
        match result {
            Ok(window) => Self {
                ok: true,
                window: Some(window.into()),
                message: String::new(),
            },
            Err(message) => Self {
                ok: false,
                window: None,
                message,
            },
        }
    }
}

/// Generic action response envelope for administrator commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceActionResponse {
    pub ok: bool,
    pub participant_id: Option<String>,
    /// Ledger length after the command.
    pub record_count: u32,
    /// Signed change in ledger length.
    pub difference: i64,
    pub message: String,
}

impl RaceActionResponse {
    fn success(message: impl Into<String>, participant_id: String, record_count: usize) -> Self {
        Self {
            ok: true,
            participant_id: Some(participant_id),
            record_count: to_u32(record_count),
            difference: 0,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            participant_id: None,
            record_count: 0,
            difference: 0,
            message: message.into(),
        }
    }
}

/// Builds the dashboard for a participant, or for the admin when
/// `viewer_id` is absent or blank.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Seeds the roster and default window on first use.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn load_dashboard(viewer_id: Option<String>) -> DashboardResponse {
    let viewer = viewer_from(viewer_id);
    match with_roster("load_dashboard", |roster| {
        LeaderboardService::new(roster.config(), roster).dashboard(&viewer)
    }) {
        Ok(view) => DashboardResponse::success(view),
        Err(message) => DashboardResponse::failure(message),
    }
}

/// Returns the active campaign window.
#[flutter_rust_bridge::frb(sync)]
pub fn get_campaign_window() -> WindowResponse {
    WindowResponse::from_result(with_roster("get_campaign_window", |roster| {
        Ok(roster.config().window()?)
    }))
}

/// Persists a new campaign window.
///
/// Input semantics:
/// - All dates are `YYYY-MM-DD`; blank weekly bounds mean "not set".
///
/// # FFI contract
/// - Returns the window actually stored.
/// - Malformed dates are rejected before any write.
#[flutter_rust_bridge::frb(sync)]
pub fn set_campaign_window(
    campaign_start: String,
    campaign_end: String,
    weekly_start: Option<String>,
    weekly_end: Option<String>,
) -> WindowResponse {
    let result = parse_window(campaign_start, campaign_end, weekly_start, weekly_end)
        .and_then(|window| {
            with_roster("set_campaign_window", |roster| {
                Ok(roster.config().set_window(window)?)
            })
        });
    WindowResponse::from_result(result)
}

/// Adds a participant with an empty ledger.
#[flutter_rust_bridge::frb(sync)]
pub fn create_participant(display_name: String) -> RaceActionResponse {
    match with_roster("create_participant", |roster| {
        Ok(roster.create(&display_name)?)
    }) {
        Ok(ledger) => RaceActionResponse::success("Participant created.", ledger.id, 0),
        Err(message) => RaceActionResponse::failure(message),
    }
}

/// Renames a participant and refreshes their avatar.
#[flutter_rust_bridge::frb(sync)]
pub fn rename_participant(participant_id: String, display_name: String) -> RaceActionResponse {
    let result = with_roster("rename_participant", |roster| {
        if !roster.rename(&participant_id, &display_name)? {
            return Ok(None);
        }
        Ok(roster.get(&participant_id)?)
    });
    ledger_action(result, &participant_id, "Participant renamed.")
}

/// Overwrites the manual weekly counter of one participant.
#[flutter_rust_bridge::frb(sync)]
pub fn set_weekly_count(participant_id: String, count: i64) -> RaceActionResponse {
    let result = with_roster("set_weekly_count", |roster| {
        if !roster.update_weekly_counter(&participant_id, count)? {
            return Ok(None);
        }
        Ok(roster.get(&participant_id)?)
    });
    ledger_action(result, &participant_id, "Weekly count updated.")
}

/// Reconciles a participant's ledger against administrator input.
///
/// Input semantics:
/// - `mode`: `sync` (input is the new total) or `add` (input is a signed
///   adjustment).
/// - `target_date`: `YYYY-MM-DD` date for added records; today when absent.
///
/// # FFI contract
/// - Invalid input, unknown participants and growth past the configured
///   limits never mutate state.
/// - Returns the new ledger length and the signed difference.
#[flutter_rust_bridge::frb(sync)]
pub fn update_applicants(
    participant_id: String,
    mode: String,
    input: String,
    target_date: Option<String>,
) -> RaceActionResponse {
    let prepared = parse_mode(&mode).and_then(|mode| {
        parse_optional_date("target_date", target_date.as_deref()).map(|date| (mode, date))
    });
    let (mode, date) = match prepared {
        Ok(prepared) => prepared,
        Err(message) => {
            return RaceActionResponse::failure(format!("update_applicants failed: {message}"))
        }
    };

    match with_roster("update_applicants", |roster| {
        ReconcileService::new(roster, SystemClock, &CoreSettings::default())
            .apply_input(&participant_id, mode, &input, date)
    }) {
        Ok(outcome) => {
            let mut response = RaceActionResponse::success(
                "Applicants updated.",
                outcome.participant.id.clone(),
                outcome.after,
            );
            response.difference = outcome.difference();
            response
        }
        Err(message) => RaceActionResponse::failure(message),
    }
}

/// Previews the signed change `update_applicants` would make.
///
/// Returns `0` for unknown modes and invalid input.
#[flutter_rust_bridge::frb(sync)]
pub fn preview_applicant_change(mode: String, input: String, current_count: u32) -> i64 {
    match parse_mode(&mode) {
        Ok(mode) => preview_difference(mode, &input, current_count as usize),
        Err(_) => 0,
    }
}

/// Estimates commission for `applicants` at `rate_per_applicant`
/// (default 50 per applicant).
#[flutter_rust_bridge::frb(sync)]
pub fn estimate_commission(applicants: u32, rate_per_applicant: Option<u32>) -> u64 {
    let rate = rate_per_applicant.map_or(DEFAULT_COMMISSION_RATE, u64::from);
    estimated_commission(u64::from(applicants), rate)
}

/// Replaces the whole roster with a freshly seeded one.
#[flutter_rust_bridge::frb(sync)]
pub fn reseed_roster() -> RaceActionResponse {
    match with_roster("reseed_roster", |roster| Ok(roster.reseed()?)) {
        Ok(ledgers) => RaceActionResponse {
            ok: true,
            participant_id: None,
            record_count: to_u32(ledgers.iter().map(|ledger| ledger.record_count()).sum()),
            difference: 0,
            message: format!("Roster reseeded with {} participant(s).", ledgers.len()),
        },
        Err(message) => RaceActionResponse::failure(message),
    }
}

/// Checks an administrator passphrase.
///
/// The expected value comes from `RECRUIT_RACE_ADMIN_PASSPHRASE`, falling
/// back to the built-in default.
#[flutter_rust_bridge::frb(sync)]
pub fn admin_login(passphrase: String) -> bool {
    let expected = std::env::var("RECRUIT_RACE_ADMIN_PASSPHRASE")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ADMIN_PASSPHRASE.to_string());
    let granted = passphrase == expected;
    if granted {
        info!("event=admin_login module=ffi status=ok");
    } else {
        warn!("event=admin_login module=ffi status=denied");
    }
    granted
}

/// Returns the coaching tip for a viewer.
///
/// No tip generator is wired at this layer, so trailing participants get
/// the unconfigured tip.
///
/// # FFI contract
/// - Never fails; store errors degrade to the fallback tip.
#[flutter_rust_bridge::frb(sync)]
pub fn coaching_tip(viewer_id: Option<String>) -> String {
    let viewer = viewer_from(viewer_id);
    let settings = CoreSettings::default();
    match with_roster("coaching_tip", |roster| {
        LeaderboardService::new(roster.config(), roster).dashboard(&viewer)
    }) {
        Ok(view) => {
            CoachingService::new(None, settings.tip_timeout).tip_for(&viewer, &view.entries)
        }
        Err(_) => FALLBACK_TIP.to_string(),
    }
}

fn with_roster<T>(
    op: &str,
    f: impl FnOnce(&RaceRoster<'_, '_>) -> ServiceResult<T>,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let conn = open_db(resolve_db_path())
        .map_err(|err| format!("{op} failed: database open failed: {err}"))?;
    let store =
        SqliteBlobStore::try_new(&conn).map_err(|err| format!("{op} failed: {err}"))?;
    let roster = RosterRepository::new(&store, SystemClock, &CoreSettings::default());
    f(&roster).map_err(|err| {
        warn!("event=ffi_call module=ffi status=error op={op} error={err}");
        format!("{op} failed: {err}")
    })
}

fn ledger_action(
    result: Result<Option<recruit_race_core::ParticipantLedger>, String>,
    participant_id: &str,
    message: &str,
) -> RaceActionResponse {
    match result {
        Ok(Some(ledger)) => RaceActionResponse::success(message, ledger.id, ledger.records.len()),
        Ok(None) => {
            RaceActionResponse::failure(format!("participant not found: {participant_id}"))
        }
        Err(message) => RaceActionResponse::failure(message),
    }
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var("RECRUIT_RACE_DB_PATH") {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn viewer_from(viewer_id: Option<String>) -> Viewer {
    match viewer_id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => Viewer::Participant(id.to_string()),
        _ => Viewer::Admin,
    }
}

fn parse_window(
    campaign_start: String,
    campaign_end: String,
    weekly_start: Option<String>,
    weekly_end: Option<String>,
) -> Result<CampaignWindow, String> {
    let window = CampaignWindow::new(
        parse_date("campaign_start", &campaign_start)?,
        parse_date("campaign_end", &campaign_end)?,
    );
    Ok(window.with_weekly(
        parse_optional_date("weekly_start", weekly_start.as_deref())?,
        parse_optional_date("weekly_end", weekly_end.as_deref())?,
    ))
}

fn parse_mode(mode: &str) -> Result<UpdateMode, String> {
    match mode.trim().to_ascii_lowercase().as_str() {
        "sync" => Ok(UpdateMode::SyncTotal),
        "add" => Ok(UpdateMode::AddManual),
        other => Err(format!("unsupported mode `{other}`; expected sync|add")),
    }
}

fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|err| format!("{field} must be YYYY-MM-DD, got `{}`: {err}", raw.trim()))
}

fn parse_optional_date(field: &str, raw: Option<&str>) -> Result<Option<NaiveDate>, String> {
    match raw.map(str::trim) {
        Some(value) if !value.is_empty() => parse_date(field, value).map(Some),
        _ => Ok(None),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
