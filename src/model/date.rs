use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Local, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Canonical wire format for a calendar day
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Error type for date parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateError {
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// A whole calendar day with no time-of-day and no timezone.
///
/// Ordering is by (year, month, day). Arithmetic is exact day arithmetic, so
/// a difference between two dates never drifts across DST changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarDate(NaiveDate);

impl CalendarDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(CalendarDate)
            .ok_or_else(|| DateError::InvalidDate(format!("{year}-{month}-{day}")))
    }

    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(input: &str) -> Result<Self, DateError> {
        NaiveDate::parse_from_str(input, DATE_FORMAT)
            .map(CalendarDate)
            .map_err(|_| DateError::InvalidDate(input.to_string()))
    }

    /// Zero-padded `YYYY-MM-DD`; the inverse of [`CalendarDate::parse`].
    pub fn format(&self) -> String {
        self.0.format(DATE_FORMAT).to_string()
    }

    /// Shift by `n` days (negative goes back). Saturates at the ends of the
    /// representable range instead of panicking.
    pub fn add_days(self, n: i64) -> Self {
        let shifted = if n >= 0 {
            self.0.checked_add_days(Days::new(n.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(n.unsigned_abs()))
        };
        match shifted {
            Some(date) => CalendarDate(date),
            None if n >= 0 => CalendarDate(NaiveDate::MAX),
            None => CalendarDate(NaiveDate::MIN),
        }
    }

    /// Whole days from `earlier` to `self` (`self - earlier`).
    pub fn days_since(self, earlier: CalendarDate) -> i64 {
        (self.0 - earlier.0).num_days()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}

impl FromStr for CalendarDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CalendarDate::parse(s)
    }
}

impl From<NaiveDate> for CalendarDate {
    fn from(date: NaiveDate) -> Self {
        CalendarDate(date)
    }
}

impl Serialize for CalendarDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CalendarDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        CalendarDate::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Parsing from loosely typed input
// ---------------------------------------------------------------------------

/// Anything a collaborator may hand over as "a date".
#[derive(Debug, Clone, Copy)]
pub enum DateInput<'a> {
    Text(&'a str),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl<'a> From<&'a str> for DateInput<'a> {
    fn from(text: &'a str) -> Self {
        DateInput::Text(text)
    }
}

impl From<NaiveDate> for DateInput<'_> {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<NaiveDateTime> for DateInput<'_> {
    fn from(stamp: NaiveDateTime) -> Self {
        DateInput::Timestamp(stamp)
    }
}

impl<Tz: TimeZone> From<&DateTime<Tz>> for DateInput<'_> {
    fn from(stamp: &DateTime<Tz>) -> Self {
        DateInput::Timestamp(stamp.naive_local())
    }
}

/// Parse a `YYYY-MM-DD` string, or truncate a date/timestamp to its day.
/// Timestamps are taken in their own local wall-clock terms, never shifted
/// through UTC.
pub fn parse_date<'a>(input: impl Into<DateInput<'a>>) -> Result<CalendarDate, DateError> {
    match input.into() {
        DateInput::Text(text) => CalendarDate::parse(text),
        DateInput::Date(date) => Ok(CalendarDate(date)),
        DateInput::Timestamp(stamp) => Ok(CalendarDate(stamp.date())),
    }
}

pub fn format_date(date: CalendarDate) -> String {
    date.format()
}

/// `a - b` in whole days.
pub fn diff_in_days(a: CalendarDate, b: CalendarDate) -> i64 {
    a.days_since(b)
}

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

/// Source of "today". Sampled once per refresh cycle, never per cell.
pub trait Clock {
    fn today(&self) -> CalendarDate;
}

/// The local wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> CalendarDate {
        CalendarDate(Local::now().date_naive())
    }
}

/// A clock pinned to one day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub CalendarDate);

impl Clock for FixedClock {
    fn today(&self) -> CalendarDate {
        self.0
    }
}

/// Today on the local wall clock.
pub fn today() -> CalendarDate {
    SystemClock.today()
}
