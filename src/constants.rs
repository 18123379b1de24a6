use std::time::Duration;

pub const UBX_SYNC_CHAR_1: u8 = 0xb5;
pub const UBX_SYNC_CHAR_2: u8 = 0x62;

/// Class + message ID + 2-byte little-endian length (sync chars excluded).
pub(crate) const UBX_BODY_HEADER_LEN: usize = 4;
pub(crate) const UBX_CHECKSUM_LEN: usize = 2;

/// Window for a complete UBX response or acknowledgement.
pub const UBX_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1500);
/// Command attempts before an exchange is reported as failed.
pub const UBX_SEND_ATTEMPTS: usize = 3;

/// Body budget for an acknowledgement: class + id + length + 2-byte payload
/// + checksum is 8 bytes, kept with 2 bytes of slack.
pub(crate) const UBX_ACK_FRAME_LIMIT: usize = 10;
/// Body budget for a CFG-NAV5 response (36-byte payload).
pub(crate) const UBX_NAV5_FRAME_LIMIT: usize = 42;

pub const NMEA_SYNC_CHAR: u8 = b'$';
pub const NMEA_END_CHAR_1: u8 = 0x0d; // '\r' (<CR>)
pub const NMEA_END_CHAR_2: u8 = 0x0a; // '\n' (<LF>)
/// Maximum NMEA sentence length; longer lines are truncated.
pub const NMEA_MAX_SENTENCE_LENGTH: usize = 82;

/// No sentence start for this long means the receiver is treated as absent.
pub const NMEA_FRESHNESS_WINDOW: Duration = Duration::from_secs(10);

/// Settle delay between wake bytes and configuration during power-up.
pub(crate) const WAKE_SETTLE: Duration = Duration::from_millis(50);
/// Serial reads are near-nonblocking; the driver supplies its own deadlines.
pub(crate) const SERIAL_READ_TIMEOUT: Duration = Duration::from_millis(1);
