use std::fmt;
use std::ops::{Add, AddAssign, Sub};

use crate::calendar::{civil_from_days, days_from_civil, weekday_from_days};

/// A calendar date in the proleptic Gregorian calendar.
///
/// Callers guarantee that `day` is valid for `month`/`year` (leap years
/// included); none of the arithmetic in this crate checks it again.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd)]
pub struct CalendarDate {
    pub year: i32,
    /// 1 based, january is 1
    pub month: u8,
    /// 1 based
    pub day: u8,
}

impl CalendarDate {
    pub const fn new(year: i32, month: u8, day: u8) -> Self {
        CalendarDate { year, month, day }
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// A civil date and time of day, together with its weekday.
///
/// The weekday convention is 0 = Monday .. 6 = Sunday throughout the
/// workspace. Instances are produced by the network time fetch (then in UTC)
/// and by local-time conversion; the struct itself is frame-agnostic.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct WallClockTime {
    pub date: CalendarDate,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
}

impl WallClockTime {
    /// Build a wall-clock time, deriving the weekday from the date.
    pub fn new(date: CalendarDate, hour: u8, minute: u8, second: u8) -> Self {
        let days = days_from_civil(date.year, date.month, date.day);
        WallClockTime {
            date,
            hour,
            minute,
            second,
            weekday: weekday_from_days(days),
        }
    }

    /// Convert to the shared comparable scalar (seconds since the Unix
    /// epoch), interpreting the civil fields naively in whatever frame the
    /// caller is working in.
    pub fn to_unix(self) -> UnixTimestamp {
        let days = days_from_civil(self.date.year, self.date.month, self.date.day);
        UnixTimestamp::from_seconds(
            days * 86400 + self.hour as i64 * 3600 + self.minute as i64 * 60 + self.second as i64,
        )
    }

    /// Inverse of [`to_unix`](Self::to_unix). Month/day/year rollover from
    /// offset arithmetic is handled entirely by this round trip.
    pub fn from_unix(timestamp: UnixTimestamp) -> Self {
        let days = timestamp.seconds.div_euclid(86400);
        let secs_today = timestamp.seconds.rem_euclid(86400);

        let (year, month, day) = civil_from_days(days);

        WallClockTime {
            date: CalendarDate::new(year, month, day),
            hour: (secs_today / 3600) as u8,
            minute: ((secs_today % 3600) / 60) as u8,
            second: (secs_today % 60) as u8,
            weekday: weekday_from_days(days),
        }
    }
}

impl fmt::Display for WallClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02}:{:02}:{:02}",
            self.date, self.hour, self.minute, self.second
        )
    }
}

/// Seconds since 1970-01-01 00:00:00, the single scalar representation that
/// both the DST evaluator and the clock synchronizer compare instants in.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Default)]
pub struct UnixTimestamp {
    seconds: i64,
}

impl UnixTimestamp {
    pub const fn from_seconds(seconds: i64) -> Self {
        UnixTimestamp { seconds }
    }

    pub const fn as_seconds(self) -> i64 {
        self.seconds
    }
}

impl Add<UtcOffset> for UnixTimestamp {
    type Output = UnixTimestamp;

    fn add(self, rhs: UtcOffset) -> Self::Output {
        UnixTimestamp {
            seconds: self.seconds + rhs.seconds as i64,
        }
    }
}

impl AddAssign<UtcOffset> for UnixTimestamp {
    fn add_assign(&mut self, rhs: UtcOffset) {
        self.seconds += rhs.seconds as i64;
    }
}

impl Sub<UtcOffset> for UnixTimestamp {
    type Output = UnixTimestamp;

    fn sub(self, rhs: UtcOffset) -> Self::Output {
        UnixTimestamp {
            seconds: self.seconds - rhs.seconds as i64,
        }
    }
}

/// Signed seconds to add to UTC to obtain local time.
///
/// Only two values exist for the modeled region, and a computed offset is
/// valid only for the instant it was computed for: the region switches
/// between them twice a year.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    /// Central Standard Time, UTC-6
    pub const CENTRAL_STANDARD: UtcOffset = UtcOffset::from_seconds(-6 * 3600);
    /// Central Daylight Time, UTC-5
    pub const CENTRAL_DAYLIGHT: UtcOffset = UtcOffset::from_seconds(-5 * 3600);

    pub const fn from_seconds(seconds: i32) -> Self {
        UtcOffset { seconds }
    }

    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// The offset mapping local time back to UTC.
    pub const fn inverse(self) -> Self {
        UtcOffset {
            seconds: -self.seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_breakdown() {
        let t = WallClockTime::from_unix(UnixTimestamp::from_seconds(0));
        assert_eq!(t.date, CalendarDate::new(1970, 1, 1));
        assert_eq!((t.hour, t.minute, t.second), (0, 0, 0));
        // 1970-01-01 was a Thursday
        assert_eq!(t.weekday, 3);
    }

    #[test]
    fn civil_scalar_round_trip() {
        for seconds in [
            0i64,
            946_684_800,   // 2000-01-01
            1_078_099_200, // 2004-02-29, a leap day
            1_704_067_200, // 2024-01-01
            2_147_483_647, // the 32-bit rollover instant
            4_102_444_800, // 2100-01-01
        ] {
            let ts = UnixTimestamp::from_seconds(seconds);
            assert_eq!(WallClockTime::from_unix(ts).to_unix(), ts);
        }
    }

    #[test]
    fn weekday_follows_date() {
        // 2024-07-15 was a Monday, 2024-01-15 also a Monday
        let t = WallClockTime::new(CalendarDate::new(2024, 7, 15), 18, 30, 0);
        assert_eq!(t.weekday, 0);
        // 2024-11-03 was a Sunday
        let t = WallClockTime::new(CalendarDate::new(2024, 11, 3), 2, 0, 0);
        assert_eq!(t.weekday, 6);
    }

    #[test]
    fn offset_round_trip_restores_instant() {
        let utc = WallClockTime::new(CalendarDate::new(2024, 7, 15), 18, 30, 0).to_unix();

        for offset in [UtcOffset::CENTRAL_STANDARD, UtcOffset::CENTRAL_DAYLIGHT] {
            let local = utc + offset;
            assert_eq!(local + offset.inverse(), utc);
            assert_eq!(local - offset, utc);
        }
    }

    #[test]
    fn fixed_region_offsets_differ_by_one_hour() {
        assert_eq!(
            UtcOffset::CENTRAL_DAYLIGHT.as_seconds(),
            UtcOffset::CENTRAL_STANDARD.as_seconds() + 3600
        );
    }

    #[test]
    fn midnight_rollover_goes_to_previous_day() {
        // 2024-01-15 02:00 UTC minus six hours lands on the 14th
        let utc = WallClockTime::new(CalendarDate::new(2024, 1, 15), 2, 0, 0);
        let local = WallClockTime::from_unix(utc.to_unix() + UtcOffset::CENTRAL_STANDARD);
        assert_eq!(local.date, CalendarDate::new(2024, 1, 14));
        assert_eq!(local.hour, 20);
    }
}
