//! Calendar arithmetic shared by the DST evaluator and the synchronizer.
//!
//! The civil ⇄ days-since-epoch conversions are Howard Hinnant's
//! `days_from_civil`/`civil_from_days` algorithms
//! (<http://howardhinnant.github.io/date_algorithms.html>): O(1), correct for
//! the whole proleptic Gregorian calendar, no year iteration.

use crate::time_types::CalendarDate;

/// Day counts for january..december in a non-leap year.
const MONTH_DAYS: [u8; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Gregorian leap year rule: divisible by 4, except centuries not divisible
/// by 400.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// 1-based ordinal of `date` within its year (1 to 366).
///
/// The caller guarantees the date is well formed; there are no error paths.
pub fn day_of_year(date: CalendarDate) -> u16 {
    let mut days: u16 = date.day as u16;
    for (month0, &len) in MONTH_DAYS.iter().enumerate() {
        if month0 + 1 >= date.month as usize {
            break;
        }
        days += len as u16;
        if month0 == 1 && is_leap_year(date.year) {
            days += 1;
        }
    }
    days
}

/// Days since 1970-01-01 for a civil date.
pub(crate) fn days_from_civil(year: i32, month: u8, day: u8) -> i64 {
    let y: i64 = if month <= 2 { year as i64 - 1 } else { year as i64 };
    let m = month as i64;
    let d = day as i64;

    // shift the year to start on March 1 so the leap day falls at the end
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400; // [0, 399]
    let mp = if m <= 2 { m + 9 } else { m - 3 }; // [0, 11], 0 = March
    let doy = (153 * mp + 2) / 5 + d - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]

    era * 146097 + doe - 719468 // 719468 days from 0000-03-01 to 1970-01-01
}

/// Civil date for a count of days since 1970-01-01.
pub(crate) fn civil_from_days(days: i64) -> (i32, u8, u8) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = z - era * 146097; // [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365; // [0, 399]
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100); // [0, 365]
    let mp = (5 * doy + 2) / 153; // [0, 11], 0 = March
    let d = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let m = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = if m <= 2 { y + 1 } else { y };

    (year as i32, m, d)
}

/// Weekday (0 = Monday .. 6 = Sunday) for a count of days since the epoch.
/// 1970-01-01 was a Thursday.
pub(crate) fn weekday_from_days(days: i64) -> u8 {
    (days + 3).rem_euclid(7) as u8
}
