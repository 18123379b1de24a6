use crate::constants::{
    UBX_BODY_HEADER_LEN, UBX_CHECKSUM_LEN, UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2,
};
use crate::error::Error;

/// UBX [Fletcher-16](https://en.wikipedia.org/wiki/Fletcher%27s_checksum)
/// running pair, computed over class + id + length + payload.
#[derive(Default, Debug, Clone, Copy)]
pub(crate) struct FrameChecksum {
    ck_a: u8,
    ck_b: u8,
}

impl FrameChecksum {
    pub(crate) const fn new() -> Self {
        Self { ck_a: 0, ck_b: 0 }
    }

    pub(crate) const fn update(&mut self, bytes: &[u8]) {
        let mut i = 0;
        while i < bytes.len() {
            self.update_byte(bytes[i]);
            i += 1;
        }
    }

    pub(crate) const fn update_byte(&mut self, byte: u8) {
        self.ck_a = self.ck_a.wrapping_add(byte);
        self.ck_b = self.ck_b.wrapping_add(self.ck_a);
    }

    pub(crate) const fn result(self) -> (u8, u8) {
        (self.ck_a, self.ck_b)
    }
}

/// A UBX packet as held in memory: sync marker and checksum only exist on
/// the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub class: u8,
    pub id: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(class: u8, id: u8, payload: Vec<u8>) -> Self {
        Self { class, id, payload }
    }

    pub fn checksum(&self) -> (u8, u8) {
        let mut calc = FrameChecksum::new();
        calc.update(&[self.class, self.id]);
        calc.update(&(self.payload.len() as u16).to_le_bytes());
        calc.update(&self.payload);
        calc.result()
    }

    /// Serializes for transmission: sync chars, class, id, little-endian
    /// length, payload, checksum pair, then CR LF.
    ///
    /// The CR LF tail is not part of the UBX standard; the beacon's receiver
    /// firmware expects it, and a standard peer ignores it while rescanning
    /// for sync.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(
            self.payload.len() + UBX_BODY_HEADER_LEN + UBX_CHECKSUM_LEN + 4,
        );
        wire.extend_from_slice(&[UBX_SYNC_CHAR_1, UBX_SYNC_CHAR_2, self.class, self.id]);
        wire.extend_from_slice(&(self.payload.len() as u16).to_le_bytes());
        wire.extend_from_slice(&self.payload);
        let (ck_a, ck_b) = self.checksum();
        wire.push(ck_a);
        wire.push(ck_b);
        wire.extend_from_slice(b"\r\n");
        wire
    }
}

// States are named for the portion of the frame which was last received.
#[derive(Debug, Clone, Copy)]
enum ScanState {
    Idle,
    Sync1,
    Body,
}

/// Incremental frame decoder fed one byte at a time.
///
/// Scans for the sync sequence, then captures class, id, length, payload and
/// checksum into an internal buffer bounded by the caller's byte budget. A
/// declared length that cannot fit is rejected as soon as the header is
/// complete rather than after silently truncating.
#[derive(Debug)]
pub struct FrameScanner {
    state: ScanState,
    buf: Vec<u8>,
    limit: usize,
}

impl FrameScanner {
    pub fn new(limit: usize) -> Self {
        Self {
            state: ScanState::Idle,
            buf: Vec::with_capacity(limit),
            limit,
        }
    }

    /// Feeds one byte; `Some` when a frame completed (or definitively
    /// failed), `None` while mid-frame.
    pub fn push(&mut self, byte: u8) -> Option<Result<Frame, Error>> {
        match self.state {
            ScanState::Idle => {
                if byte == UBX_SYNC_CHAR_1 {
                    self.state = ScanState::Sync1;
                }
                None
            },
            ScanState::Sync1 => {
                if byte == UBX_SYNC_CHAR_2 {
                    self.state = ScanState::Body;
                    self.buf.clear();
                } else if byte != UBX_SYNC_CHAR_1 {
                    // A repeated 0xB5 keeps the scanner armed.
                    self.state = ScanState::Idle;
                }
                None
            },
            ScanState::Body => {
                if self.buf.len() == self.limit {
                    self.state = ScanState::Idle;
                    return Some(Err(Error::BufferOverflow { limit: self.limit }));
                }
                self.buf.push(byte);
                if self.buf.len() < UBX_BODY_HEADER_LEN {
                    return None;
                }
                let len = usize::from(u16::from_le_bytes([self.buf[2], self.buf[3]]));
                if self.buf.len() == UBX_BODY_HEADER_LEN
                    && UBX_BODY_HEADER_LEN + len + UBX_CHECKSUM_LEN > self.limit
                {
                    self.state = ScanState::Idle;
                    return Some(Err(Error::FrameTooLarge {
                        len: len as u16,
                        limit: self.limit,
                    }));
                }
                if self.buf.len() == UBX_BODY_HEADER_LEN + len + UBX_CHECKSUM_LEN {
                    self.state = ScanState::Idle;
                    return Some(self.finish(len));
                }
                None
            },
        }
    }

    fn finish(&self, len: usize) -> Result<Frame, Error> {
        let mut calc = FrameChecksum::new();
        calc.update(&self.buf[..UBX_BODY_HEADER_LEN + len]);
        let (ck_a, ck_b) = calc.result();
        let received = (
            self.buf[UBX_BODY_HEADER_LEN + len],
            self.buf[UBX_BODY_HEADER_LEN + len + 1],
        );
        if (ck_a, ck_b) != received {
            return Err(Error::InvalidChecksum {
                expect: u16::from_le_bytes([received.0, received.1]),
                got: u16::from_le_bytes([ck_a, ck_b]),
            });
        }
        Ok(Frame {
            class: self.buf[0],
            id: self.buf[1],
            payload: self.buf[UBX_BODY_HEADER_LEN..UBX_BODY_HEADER_LEN + len].to_vec(),
        })
    }
}
