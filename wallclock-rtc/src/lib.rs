//! Unix implementation of the persistent hardware clock.
//!
//! The device treats its battery-backed clock as a store of naive local
//! civil time, the way small RTC chips do. On a Unix host that clock is
//! `CLOCK_REALTIME`: the civil fields are mapped to a second count through
//! the proto conversion pair and written/read with `clock_settime`/
//! `clock_gettime`.
//
// Note on unsafe usage.
//
// This crate uses unsafe code to call the clock syscalls. The public
// functions are safe regardless of given arguments: the timespec buffers
// are always valid locals and no pointer outlives its call.

use wallclock_proto::{HardwareClockState, Rtc, UnixTimestamp, WallClockTime};

use thiserror::Error as ThisError;

#[derive(Debug, Copy, Clone, ThisError)]
pub enum Error {
    #[error("insufficient permissions to set the clock")]
    NoPermission,
    #[error("invalid time value for this clock")]
    Invalid,
}

// Convert the error numbers clock_gettime and clock_settime can produce.
fn convert_errno() -> Error {
    match unsafe { *libc::__errno_location() } {
        libc::EINVAL => Error::Invalid,
        libc::EPERM => Error::NoPermission,
        // EFAULT is not possible as we always pass in a proper buffer
        _ => Error::Invalid,
    }
}

/// Hardware clock handle backed by `CLOCK_REALTIME`.
// Intentionally a bare struct: the realtime clock is unique and no state is
// needed to interact with it.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixRtc(());

impl UnixRtc {
    pub fn new() -> Self {
        Self(())
    }
}

impl Rtc for UnixRtc {
    type Error = Error;

    fn set_datetime(&self, state: HardwareClockState) -> Result<(), Error> {
        let seconds = state.to_wall_clock().to_unix().as_seconds();
        let ts = libc::timespec {
            tv_sec: seconds as libc::time_t,
            tv_nsec: 0,
        };

        if unsafe { libc::clock_settime(libc::CLOCK_REALTIME, &ts) } == -1 {
            return Err(convert_errno());
        }

        Ok(())
    }

    fn datetime(&self) -> Result<HardwareClockState, Error> {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };

        if unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) } == -1 {
            return Err(convert_errno());
        }

        // second resolution only; the display never needs more
        let time = WallClockTime::from_unix(UnixTimestamp::from_seconds(ts.tv_sec as i64));
        Ok(HardwareClockState::from_local(time))
    }
}
