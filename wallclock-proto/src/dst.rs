//! Daylight saving evaluation for the one region this system models
//! (US Central): DST runs from the second Sunday in March at 02:00 until the
//! first Sunday in November at 02:00.
//!
//! All instants, the query included, are expressed naively in a single frame
//! and compared as [`UnixTimestamp`] scalars. The evaluator therefore does
//! not resolve the duplicated local hour when clocks fall back; that
//! ambiguity is a documented limitation of the device, not of this function.

use crate::calendar::{days_from_civil, weekday_from_days};
use crate::time_types::{CalendarDate, UnixTimestamp, WallClockTime};

/// Both transitions happen at 02:00 in the frame the rule is evaluated in.
const TRANSITION_HOUR: u8 = 2;

/// Day-of-month of the first Sunday in the given month.
fn first_sunday(year: i32, month: u8) -> u8 {
    // weekday of the 1st, 0 = Monday so Sunday is 6
    let first_weekday = weekday_from_days(days_from_civil(year, month, 1));
    1 + (6 - first_weekday) % 7
}

/// The instant DST begins: second Sunday in March, 02:00.
fn dst_start(year: i32) -> UnixTimestamp {
    let day = first_sunday(year, 3) + 7;
    WallClockTime::new(CalendarDate::new(year, 3, day), TRANSITION_HOUR, 0, 0).to_unix()
}

/// The instant DST ends: first Sunday in November, 02:00.
fn dst_end(year: i32) -> UnixTimestamp {
    let day = first_sunday(year, 11);
    WallClockTime::new(CalendarDate::new(year, 11, day), TRANSITION_HOUR, 0, 0).to_unix()
}

/// Whether `(year, month, day, hour)` falls inside the active DST window.
///
/// The window is half open: the 02:00 start instant is DST, the 02:00 end
/// instant is not. Hour granularity only; minutes and seconds of the query
/// are taken as zero.
pub fn is_dst_active(year: i32, month: u8, day: u8, hour: u8) -> bool {
    let query = WallClockTime::new(CalendarDate::new(year, month, day), hour, 0, 0).to_unix();
    dst_start(year) <= query && query < dst_end(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_days_2024() {
        // 2024: DST ran March 10 through November 3
        assert_eq!(first_sunday(2024, 3) + 7, 10);
        assert_eq!(first_sunday(2024, 11), 3);
    }

    #[test]
    fn transition_days_2025() {
        // 2025: March 9 through November 2
        assert_eq!(first_sunday(2025, 3) + 7, 9);
        assert_eq!(first_sunday(2025, 11), 2);
    }

    #[test]
    fn start_boundary_is_half_open() {
        // exactly at the start instant counts as DST
        assert!(is_dst_active(2024, 3, 10, 2));
        // one hour earlier does not
        assert!(!is_dst_active(2024, 3, 10, 1));
    }

    #[test]
    fn end_boundary_is_exclusive() {
        // one hour before the end instant is still DST
        assert!(is_dst_active(2024, 11, 3, 1));
        // the end instant itself is not
        assert!(!is_dst_active(2024, 11, 3, 2));
    }

    #[test]
    fn midseason_queries() {
        assert!(is_dst_active(2024, 7, 15, 18));
        assert!(!is_dst_active(2024, 1, 15, 18));
        assert!(!is_dst_active(2024, 12, 25, 12));
        assert!(is_dst_active(2023, 6, 1, 0));
    }
}
