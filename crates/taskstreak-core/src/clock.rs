use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, Utc};
use chrono_tz::Tz;

use crate::date::DateKey;

/// Rules used to turn an instant into a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    /// The machine's local zone, daylight saving included.
    Local,
    /// A named IANA zone such as `Europe/Berlin`.
    Named(Tz),
    /// One offset for every instant.
    Fixed(FixedOffset),
}

impl Zone {
    /// Wall-clock time of `instant` under this zone's rules at that instant.
    pub fn localize(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => instant.with_timezone(&Local).fixed_offset(),
            Zone::Named(tz) => instant.with_timezone(tz).fixed_offset(),
            Zone::Fixed(offset) => instant.with_timezone(offset),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    /// `local` or an IANA zone name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.eq_ignore_ascii_case("local") {
            return Ok(Zone::Local);
        }
        name.parse::<Tz>()
            .map(Zone::Named)
            .map_err(|_| format!("unknown time zone: {name}"))
    }
}

/// A single reading of the clock, threaded through one state transition.
///
/// Stored UTC timestamps are bucketed into days with the moment's zone, using the
/// offset that zone had at the stored instant rather than the offset of now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    at: DateTime<FixedOffset>,
    zone: Zone,
}

impl Moment {
    /// Moment pinned to the offset carried by `at`.
    pub fn new(at: DateTime<FixedOffset>) -> Self {
        Self {
            at,
            zone: Zone::Fixed(*at.offset()),
        }
    }

    pub fn in_zone(instant: DateTime<Utc>, zone: Zone) -> Self {
        Self {
            at: zone.localize(instant),
            zone,
        }
    }

    pub fn at(&self) -> DateTime<FixedOffset> {
        self.at
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Timestamp form stored on tasks.
    pub fn utc(&self) -> DateTime<Utc> {
        self.at.with_timezone(&Utc)
    }

    pub fn today(&self) -> DateKey {
        DateKey::from_date(self.at.date_naive())
    }

    /// Wall-clock time at which `instant` happened.
    pub fn local(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        self.zone.localize(instant)
    }

    /// Local calendar day on which `instant` fell.
    pub fn day_of(&self, instant: DateTime<Utc>) -> DateKey {
        DateKey::from_date(self.local(instant).date_naive())
    }
}

/// Source of [`Moment`]s.
pub trait Clock: Send + Sync {
    fn moment(&self) -> Moment;
}

/// Wall clock read in a configurable zone, the machine's own by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemClock {
    zone: Zone,
}

impl SystemClock {
    pub fn new(zone: Zone) -> Self {
        Self { zone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Zone::Local)
    }
}

impl Clock for SystemClock {
    fn moment(&self) -> Moment {
        Moment::in_zone(Utc::now(), self.zone)
    }
}

/// Clock frozen at one moment, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Moment);

impl Clock for FixedClock {
    fn moment(&self) -> Moment {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .expect("parse")
            .with_timezone(&Utc)
    }

    #[test]
    fn buckets_instants_in_the_moment_offset() {
        let at = DateTime::parse_from_rfc3339("2024-01-02T00:30:00+03:00").expect("parse");
        let moment = Moment::new(at);
        assert_eq!(moment.today().to_string(), "2024-01-02");
        // 21:30 UTC the previous evening is already the 2nd at +03:00.
        assert_eq!(
            moment.day_of(utc("2024-01-01T21:30:00Z")).to_string(),
            "2024-01-02"
        );
        assert_eq!(moment.utc().to_rfc3339(), "2024-01-01T21:30:00+00:00");
    }

    #[test]
    fn summer_instant_uses_summer_offset_in_winter() {
        let berlin = Zone::Named(chrono_tz::Europe::Berlin);
        let winter = Moment::in_zone(utc("2024-12-01T10:00:00Z"), berlin);
        assert_eq!(winter.at().offset().local_minus_utc(), 3600);
        assert_eq!(winter.today().to_string(), "2024-12-01");

        // 00:30 CEST on 2 July; a flat +01:00 would put it on 1 July.
        let summer = utc("2024-07-01T22:30:00Z");
        assert_eq!(winter.day_of(summer).to_string(), "2024-07-02");
        assert_eq!(winter.local(summer).format("%H:%M").to_string(), "00:30");
    }

    #[test]
    fn named_zone_moment_reports_local_today() {
        let moment = Moment::in_zone(
            utc("2024-03-31T23:30:00Z"),
            Zone::Named(chrono_tz::America::New_York),
        );
        assert_eq!(moment.today().to_string(), "2024-03-31");
        assert_eq!(moment.utc(), utc("2024-03-31T23:30:00Z"));
    }

    #[test]
    fn fixed_clock_is_frozen() {
        let at = DateTime::parse_from_rfc3339("2024-05-05T10:00:00Z").expect("parse");
        let clock = FixedClock(Moment::new(at));
        assert_eq!(clock.moment(), clock.moment());
    }

    #[test]
    fn parses_zone_names() {
        assert_eq!("local".parse::<Zone>(), Ok(Zone::Local));
        assert_eq!(
            "Europe/Berlin".parse::<Zone>(),
            Ok(Zone::Named(chrono_tz::Europe::Berlin))
        );
        assert!("Mars/Olympus".parse::<Zone>().is_err());
    }

    #[test]
    fn system_clock_defaults_to_local_zone() {
        let clock = SystemClock::default();
        assert_eq!(clock.moment().zone(), Zone::Local);
    }
}
