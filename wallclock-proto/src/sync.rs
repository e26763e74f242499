//! One-shot clock synchronization: UTC network time in, RTC field set out.

use crate::clock::HardwareClockState;
use crate::dst::is_dst_active;
use crate::time_types::{UtcOffset, WallClockTime};

/// Pick the UTC offset to apply for the given UTC instant.
///
/// The DST rule is evaluated directly on the UTC tuple even though the rule
/// is defined in local terms. This reproduces the behavior of the original
/// firmware; within a few hours of the 02:00 transitions it can pick the
/// offset the other side of the boundary would use.
pub fn select_offset(utc_now: WallClockTime) -> UtcOffset {
    if is_dst_active(
        utc_now.date.year,
        utc_now.date.month,
        utc_now.date.day,
        utc_now.hour,
    ) {
        UtcOffset::CENTRAL_DAYLIGHT
    } else {
        UtcOffset::CENTRAL_STANDARD
    }
}

/// Compute the RTC state for a freshly fetched UTC time.
///
/// Invoked exactly once at startup. The caller commits the result to the
/// hardware clock; a write failure there is a fatal startup error and is not
/// retried.
pub fn synchronize(utc_now: WallClockTime) -> HardwareClockState {
    let offset = select_offset(utc_now);
    let local = WallClockTime::from_unix(utc_now.to_unix() + offset);
    HardwareClockState::from_local(local)
}
