use crate::calendar::day_of_year;
use crate::time_types::{CalendarDate, WallClockTime};

/// The hardware clock's DST field.
///
/// The field exists because RTC write interfaces accept it, but this system
/// never re-derives DST from the hardware clock: the synchronizer always
/// writes [`DstFlag::NotApplicable`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum DstFlag {
    Active,
    Inactive,
    #[default]
    NotApplicable,
}

/// The writable field set of the persistent hardware clock.
///
/// After synchronization the RTC holds naive local civil time and is the
/// device's single source of truth for "current local time".
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct HardwareClockState {
    pub year: i32,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u8,
    /// 1-based day of year ordinal
    pub yearday: u16,
    pub dst_flag: DstFlag,
}

impl HardwareClockState {
    /// Assemble the full RTC field set from a local wall-clock time.
    pub fn from_local(local: WallClockTime) -> Self {
        HardwareClockState {
            year: local.date.year,
            month: local.date.month,
            day: local.date.day,
            hour: local.hour,
            minute: local.minute,
            second: local.second,
            weekday: local.weekday,
            yearday: day_of_year(local.date),
            dst_flag: DstFlag::NotApplicable,
        }
    }

    pub fn to_wall_clock(self) -> WallClockTime {
        WallClockTime {
            date: CalendarDate::new(self.year, self.month, self.day),
            hour: self.hour,
            minute: self.minute,
            second: self.second,
            weekday: self.weekday,
        }
    }
}

/// Interface to a persistent hardware clock.
///
/// This is a trait so the daemon can run against the real device clock while
/// tests run against an in-memory one. The handle is passed explicitly to
/// the one writer (the startup synchronizer) and the one reader (the display
/// task); there is no process-wide clock singleton.
pub trait Rtc {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Write all RTC fields at once.
    fn set_datetime(&self, state: HardwareClockState) -> Result<(), Self::Error>;

    /// Read the current RTC fields.
    fn datetime(&self) -> Result<HardwareClockState, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_local_fills_every_field() {
        let local = WallClockTime::new(CalendarDate::new(2024, 7, 15), 13, 30, 0);
        let state = HardwareClockState::from_local(local);

        assert_eq!(state.year, 2024);
        assert_eq!(state.month, 7);
        assert_eq!(state.day, 15);
        assert_eq!(state.hour, 13);
        assert_eq!(state.minute, 30);
        assert_eq!(state.second, 0);
        assert_eq!(state.weekday, 0); // a Monday
        assert_eq!(state.yearday, 197);
        assert_eq!(state.dst_flag, DstFlag::NotApplicable);
    }

    #[test]
    fn wall_clock_round_trip() {
        let local = WallClockTime::new(CalendarDate::new(2024, 2, 29), 23, 59, 58);
        assert_eq!(HardwareClockState::from_local(local).to_wall_clock(), local);
    }
}
