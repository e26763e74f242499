//! Minimal SNTP wire format: a mode-3 client packet and validation of the
//! mode-4 server response. Just enough of RFC 4330 for a single
//! time-of-day fetch at startup; no extension fields, no authentication.

use thiserror::Error;

use crate::time_types::UnixTimestamp;

/// The fixed NTP header size. Shorter datagrams are rejected; longer ones
/// may carry extensions we never requested and the extra bytes are ignored.
pub const PACKET_SIZE: usize = 48;

/// Unix uses an epoch located at 1/1/1970-00:00h (UTC) and NTP uses
/// 1/1/1900-00:00h. This leads to an offset equivalent to 70 years in
/// seconds; there are 17 leap years between the two dates so the offset is
const EPOCH_OFFSET: u64 = (70 * 365 + 17) * 86400;

// leap indicator 0, version 4, mode 3 (client) / mode 4 (server)
const LI_VN_MODE_CLIENT: u8 = 0x23;
const MODE_MASK: u8 = 0x07;
const MODE_SERVER: u8 = 4;

// field offsets within the header
const ORIGIN_FIELD: usize = 24;
const TRANSMIT_FIELD: usize = 40;

/// A raw 64-bit NTP timestamp: whole seconds since the NTP epoch in the
/// upper half, the 2^-32 s fraction in the lower half.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct NtpTimestamp {
    bits: u64,
}

impl NtpTimestamp {
    /// Wrap raw bits. The client's transmit timestamp is created from random
    /// bits so the request never leaks our system time onto the network.
    pub const fn from_bits(bits: u64) -> Self {
        NtpTimestamp { bits }
    }

    pub(crate) fn from_bytes(bytes: [u8; 8]) -> Self {
        NtpTimestamp {
            bits: u64::from_be_bytes(bytes),
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; 8] {
        self.bits.to_be_bytes()
    }

    pub const fn from_seconds_since_ntp_epoch(seconds: u32) -> Self {
        NtpTimestamp {
            bits: (seconds as u64) << 32,
        }
    }

    /// Whole seconds on the Unix timescale; the sub-second fraction is
    /// dropped, matching the device's second-level resolution.
    pub fn to_unix(self) -> UnixTimestamp {
        let ntp_seconds = self.bits >> 32;
        UnixTimestamp::from_seconds(ntp_seconds as i64 - EPOCH_OFFSET as i64)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet is smaller than an NTP header")]
    TooShort,
    #[error("packet is not a server response")]
    NotAServerResponse,
    #[error("server sent a kiss-o'-death (stratum 0)")]
    KissOfDeath,
    #[error("origin timestamp does not match our request")]
    OriginMismatch,
}

/// Build the 48-byte client request.
///
/// `transmit` ends up in the transmit-timestamp field and must be remembered
/// by the caller: the server copies it into the response's origin field,
/// which is the only way we tie a response to our request.
pub fn client_packet(transmit: NtpTimestamp) -> [u8; PACKET_SIZE] {
    let mut buf = [0u8; PACKET_SIZE];
    buf[0] = LI_VN_MODE_CLIENT;
    buf[TRANSMIT_FIELD..TRANSMIT_FIELD + 8].copy_from_slice(&transmit.to_bytes());
    buf
}

/// Validate a server response and extract its transmit timestamp, the UTC
/// time of day we asked for.
pub fn parse_server_packet(
    buf: &[u8],
    expected_origin: NtpTimestamp,
) -> Result<NtpTimestamp, PacketError> {
    if buf.len() < PACKET_SIZE {
        return Err(PacketError::TooShort);
    }

    if buf[0] & MODE_MASK != MODE_SERVER {
        return Err(PacketError::NotAServerResponse);
    }

    // stratum 0 is the kiss-o'-death marker; the server refuses to serve us
    if buf[1] == 0 {
        return Err(PacketError::KissOfDeath);
    }

    let mut field = [0u8; 8];
    field.copy_from_slice(&buf[ORIGIN_FIELD..ORIGIN_FIELD + 8]);
    if NtpTimestamp::from_bytes(field) != expected_origin {
        return Err(PacketError::OriginMismatch);
    }

    field.copy_from_slice(&buf[TRANSMIT_FIELD..TRANSMIT_FIELD + 8]);
    Ok(NtpTimestamp::from_bytes(field))
}

/// Build a well-formed server response. Production code never serves time;
/// this exists for loopback fixtures and tests.
pub fn server_packet(origin: NtpTimestamp, transmit: NtpTimestamp) -> [u8; PACKET_SIZE] {
    let mut buf = [0u8; PACKET_SIZE];
    buf[0] = 0x24; // leap 0, version 4, mode 4
    buf[1] = 2; // stratum
    buf[ORIGIN_FIELD..ORIGIN_FIELD + 8].copy_from_slice(&origin.to_bytes());
    buf[TRANSMIT_FIELD..TRANSMIT_FIELD + 8].copy_from_slice(&transmit.to_bytes());
    buf
}
