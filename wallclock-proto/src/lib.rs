//! Timekeeping core for wallclock-rs.
//!
//! Everything in this crate is pure: calendar arithmetic, the DST rule for
//! the one modeled region, the startup clock synchronization computation,
//! display-label formatting with the refresh retry state machine, and the
//! SNTP wire format. I/O (sockets, the device clock, the panel) lives behind
//! the [`Rtc`] and [`DisplayPanel`] traits and in the daemon crate.
#![forbid(unsafe_code)]

mod calendar;
mod clock;
mod display;
mod dst;
mod packet;
mod sync;
mod time_types;

pub use calendar::{day_of_year, is_leap_year};
pub use clock::{DstFlag, HardwareClockState, Rtc};
pub use display::{
    format_time_label, DisplayPanel, RefreshAction, RefreshDriver, RefreshError, RefreshState,
    REFRESH_RETRY_DELAY, TIME_LABEL_PLACEHOLDER,
};
pub use dst::is_dst_active;
pub use packet::{
    client_packet, parse_server_packet, server_packet, NtpTimestamp, PacketError, PACKET_SIZE,
};
pub use sync::{select_offset, synchronize};
pub use time_types::{CalendarDate, UnixTimestamp, UtcOffset, WallClockTime};
