use std::io::{self, Read};
use std::time::Instant;

use log::warn;

use crate::constants::{
    NMEA_END_CHAR_1, NMEA_END_CHAR_2, NMEA_FRESHNESS_WINDOW, NMEA_MAX_SENTENCE_LENGTH,
    NMEA_SYNC_CHAR,
};
use crate::fix::{FixStatus, NavFix};
use crate::nmea::parser;
use crate::nmea::SentenceOutcome;

/// Reassembles the live serial byte stream into complete sentences and
/// tracks stream freshness.
///
/// Each [`poll`](LineAssembler::poll) consumes only the bytes currently
/// available and returns immediately; it must be invoked once per scheduler
/// tick. At most one complete sentence is handed to the parser per
/// invocation, even when more bytes are queued.
#[derive(Debug)]
pub struct LineAssembler {
    buf: [u8; NMEA_MAX_SENTENCE_LENGTH],
    len: usize,
    deadline: Option<Instant>,
    overflowed: bool,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl LineAssembler {
    pub fn new() -> Self {
        Self {
            buf: [0; NMEA_MAX_SENTENCE_LENGTH],
            len: 0,
            deadline: None,
            overflowed: false,
        }
    }

    /// Whether the line being assembled dropped bytes past the maximum
    /// sentence length. Cleared by the next sentence start.
    pub fn line_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Drains available bytes, updating `fix` when a sentence completes.
    ///
    /// Before consuming input, the freshness deadline is checked: if no
    /// sentence start arrived within the window, the fix is marked stale and
    /// the deadline pushed forward, independent of whether a line completes
    /// this invocation.
    pub fn poll<R: Read>(
        &mut self,
        now: Instant,
        port: &mut R,
        fix: &mut NavFix,
    ) -> io::Result<Option<SentenceOutcome>> {
        let deadline = *self.deadline.get_or_insert(now + NMEA_FRESHNESS_WINDOW);
        if now > deadline {
            warn!("no NMEA traffic for {NMEA_FRESHNESS_WINDOW:?}, marking fix stale");
            fix.status = FixStatus::Timeout;
            self.deadline = Some(now + NMEA_FRESHNESS_WINDOW);
        }

        while let Some(byte) = read_available(port)? {
            if byte == NMEA_SYNC_CHAR {
                self.deadline = Some(now + NMEA_FRESHNESS_WINDOW);
                self.len = 0;
                self.overflowed = false;
            }
            if byte == NMEA_END_CHAR_1 || byte == NMEA_END_CHAR_2 {
                if self.len == 0 {
                    // Terminator noise between sentences (the LF of a CR LF
                    // pair already handled).
                    continue;
                }
                let outcome = parser::parse(&self.buf[..self.len], fix);
                self.len = 0;
                return Ok(Some(outcome));
            }
            if self.len >= NMEA_MAX_SENTENCE_LENGTH {
                if !self.overflowed {
                    warn!("NMEA line exceeded {NMEA_MAX_SENTENCE_LENGTH} bytes, truncating");
                }
                self.overflowed = true;
                continue;
            }
            self.buf[self.len] = byte;
            self.len += 1;
        }
        Ok(None)
    }
}

// One byte if the port has one; TimedOut/WouldBlock and empty reads mean
// "nothing available right now".
fn read_available<R: Read>(port: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match port.read(&mut byte) {
        Ok(0) => Ok(None),
        Ok(_) => Ok(Some(byte[0])),
        Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
            Ok(None)
        },
        Err(e) => Err(e),
    }
}
