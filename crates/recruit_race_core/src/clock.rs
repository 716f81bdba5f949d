//! Wall-clock access and local-time helpers.
//!
//! # Responsibility
//! - Abstract "now" so stores and services can be driven by fixed clocks.
//! - Resolve calendar dates to instants in a given time zone.
//!
//! # Invariants
//! - Local times that do not exist (DST gaps) resolve by reading the wall
//!   time as UTC.
//! - Ambiguous local times (DST overlaps) resolve to the earliest instant.

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Today's date on the caller's local calendar.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl FixedClock {
    /// Freezes the clock at noon of `date` in local time.
    pub fn at_noon(date: NaiveDate) -> Self {
        Self(noon_in(date, &Local).with_timezone(&Local))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Local> {
        (**self).now()
    }
}

/// Resolves a wall-clock reading in `tz` to an absolute instant.
pub fn local_instant<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(at) => at.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => tz.from_utc_datetime(&naive).with_timezone(&Utc),
    }
}

/// First instant of `date` in `tz`.
pub fn start_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    local_instant(tz, date.and_time(NaiveTime::MIN))
}

/// Last millisecond of `date` in `tz` (`23:59:59.999`).
pub fn end_of_day_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let last_milli = NaiveTime::MIN + Duration::days(1) - Duration::milliseconds(1);
    local_instant(tz, date.and_time(last_milli))
}

/// Noon of `date` in `tz`.
pub fn noon_in<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    local_instant(tz, date.and_time(NaiveTime::MIN + Duration::hours(12)))
}
