use std::{fmt, str::FromStr};

use chrono::{Days, Local, NaiveDate};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// How far in the past a newly entered deadline may lie.
pub const DEADLINE_LOOKBACK_DAYS: i64 = 365;

/// Errors produced when a string is used as a date key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Input is not shaped like `YYYY-MM-DD`.
    #[error("date key must look like YYYY-MM-DD, got {input:?}")]
    Shape { input: String },
    /// Input is shaped correctly but names a day that does not exist.
    #[error("date key {input:?} is not a calendar day")]
    Calendar { input: String },
}

/// A local calendar day with no time-of-day component.
///
/// Ordering follows the calendar, which is also the lexicographic order of the
/// `YYYY-MM-DD` rendering. Years stay within 0000..=9999 so every key renders
/// with exactly four year digits and parses back to itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    /// 0000-01-01. Both bounds are checked at compile time.
    pub const MIN: DateKey = DateKey(NaiveDate::from_ymd_opt(0, 1, 1).expect("valid"));
    /// 9999-12-31.
    pub const MAX: DateKey = DateKey(NaiveDate::from_ymd_opt(9999, 12, 31).expect("valid"));

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        if !(0..=9999).contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Clamped into the four-digit year range.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date).clamp(Self::MIN, Self::MAX)
    }

    /// Strict parse: shape check first, then a round trip through the calendar.
    pub fn parse(input: &str) -> Result<Self, FormatError> {
        let shape_err = || FormatError::Shape {
            input: input.to_string(),
        };
        let bytes = input.as_bytes();
        if bytes.len() != 10 {
            return Err(shape_err());
        }
        for (idx, b) in bytes.iter().enumerate() {
            let ok = match idx {
                4 | 7 => *b == b'-',
                _ => b.is_ascii_digit(),
            };
            if !ok {
                return Err(shape_err());
            }
        }

        let year: i32 = input[0..4].parse().map_err(|_| shape_err())?;
        let month: u32 = input[5..7].parse().map_err(|_| shape_err())?;
        let day: u32 = input[8..10].parse().map_err(|_| shape_err())?;

        let key = Self::from_ymd(year, month, day).ok_or_else(|| FormatError::Calendar {
            input: input.to_string(),
        })?;
        if key.to_string() != input {
            return Err(FormatError::Calendar {
                input: input.to_string(),
            });
        }
        Ok(key)
    }

    /// Signed number of calendar days from `self` to `other`; positive when `other` is later.
    ///
    /// Naive dates carry no time of day or offset, so there is no DST hour to round away.
    pub fn days_until(&self, other: DateKey) -> i64 {
        other.0.signed_duration_since(self.0).num_days()
    }

    /// The day `amount` days after this one (`amount` may be negative).
    /// Saturates at [`DateKey::MIN`] and [`DateKey::MAX`].
    pub fn add_days(&self, amount: i64) -> DateKey {
        let shifted = if amount >= 0 {
            self.0.checked_add_days(Days::new(amount.unsigned_abs()))
        } else {
            self.0.checked_sub_days(Days::new(amount.unsigned_abs()))
        };
        match shifted {
            Some(date) => Self::from_date(date),
            None if amount >= 0 => Self::MAX,
            None => Self::MIN,
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl FromStr for DateKey {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for DateKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateKey::parse(&raw).map_err(de::Error::custom)
    }
}

/// Today's key on the local wall clock.
pub fn today() -> DateKey {
    DateKey(Local::now().date_naive())
}

/// String form of [`DateKey::days_until`].
pub fn diff_days(from: &str, to: &str) -> Result<i64, FormatError> {
    Ok(DateKey::parse(from)?.days_until(DateKey::parse(to)?))
}

/// String form of [`DateKey::add_days`].
pub fn add_days(key: &str, amount: i64) -> Result<String, FormatError> {
    Ok(DateKey::parse(key)?.add_days(amount).to_string())
}

pub fn is_valid(candidate: &str) -> bool {
    DateKey::parse(candidate).is_ok()
}

/// Whether `deadline` may be entered as a new deadline on `today`.
pub fn is_deadline_allowed(deadline: DateKey, today: DateKey) -> bool {
    today.add_days(-DEADLINE_LOOKBACK_DAYS).days_until(deadline) >= 0
}
