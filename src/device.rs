use std::fmt;
use std::io::{self, Read, Write};

use log::{debug, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::constants::{
    SERIAL_READ_TIMEOUT, UBX_ACK_FRAME_LIMIT, UBX_NAV5_FRAME_LIMIT, UBX_RESPONSE_TIMEOUT,
    UBX_SEND_ATTEMPTS, WAKE_SETTLE,
};
use crate::error::Error;
use crate::fix::NavFix;
use crate::frame::{Frame, FrameScanner};
use crate::nmea::{LineAssembler, SentenceOutcome};
use crate::packets::{
    self, AntennaFlags, CfgAntBuilder, NavMode, PmReqFlags, RxmPmReqBuilder,
    CFG_NAV5, CFG_NAV5_PAYLOAD_LEN, CLASS_CFG, NAV5_DYN_MODEL_OFFSET,
};

/// Packed CFG-ANT supervisor word for the beacon board: antenna bias switch
/// on PIO 22 through a P-MOSFET with pull-up.
const ANTENNA_SUPERVISOR_PINS: u16 = 0x8016;

type Result<T> = std::result::Result<T, Error>;

/// Session phase; operations are only legal in the states that match the
/// receiver's actual condition, and misuse fails fast instead of confusing
/// the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Receiver state unknown, nothing configured yet.
    Off,
    /// Awake with antenna bias enabled; navigation mode not negotiated.
    PoweredUp,
    /// Fully configured; NMEA polling is live.
    Ready,
    /// Sent to backup mode; must be woken before further use.
    Sleeping,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Off => "off",
            SessionState::PoweredUp => "powered up",
            SessionState::Ready => "ready",
            SessionState::Sleeping => "sleeping",
        };
        f.write_str(name)
    }
}

/// A u-blox receiver on a serial channel.
///
/// The channel carries both the NMEA stream and UBX exchanges; the session
/// state machine keeps the two temporally exclusive (configuration happens
/// before or between periods of NMEA polling, never interleaved).
pub struct Device<P, C = SystemClock> {
    port: P,
    clock: C,
    state: SessionState,
    assembler: LineAssembler,
    fix: NavFix,
}

impl Device<Box<dyn serialport::SerialPort>, SystemClock> {
    /// Opens the given serial port with a near-nonblocking read timeout and
    /// wraps it. 9600 baud 8N1 is the receiver's wire default.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(SERIAL_READ_TIMEOUT)
            .open()?;
        Ok(Self::new(port, SystemClock))
    }
}

impl<P: Read + Write, C: Clock> Device<P, C> {
    pub fn new(port: P, clock: C) -> Self {
        Self {
            port,
            clock,
            state: SessionState::Off,
            assembler: LineAssembler::new(),
            fix: NavFix::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The navigation record merged from the NMEA stream so far.
    pub fn fix(&self) -> &NavFix {
        &self.fix
    }

    /// Whether the current NMEA line dropped bytes past the sentence limit.
    pub fn line_overflowed(&self) -> bool {
        self.assembler.line_overflowed()
    }

    /// Writes one frame, wire-framed, without waiting for any response.
    pub fn send_frame(&mut self, frame: &Frame) -> Result<()> {
        trace!("send {:#04x}/{:#04x}, {} payload bytes", frame.class, frame.id, frame.payload.len());
        self.port.write_all(&frame.to_wire())?;
        self.port.flush()?;
        Ok(())
    }

    /// Blocks for the next complete frame, bounded by the response window.
    ///
    /// `limit` is the byte budget for class + id + length + payload +
    /// checksum; a response declaring more than fits is rejected outright.
    pub fn recv_frame(&mut self, limit: usize) -> Result<Frame> {
        let mut scanner = FrameScanner::new(limit);
        let start = self.clock.now();
        loop {
            if let Some(byte) = self.read_available()? {
                if let Some(result) = scanner.push(byte) {
                    return result;
                }
            }
            if self.clock.now().duration_since(start) >= UBX_RESPONSE_TIMEOUT {
                return Err(Error::AckTimeout);
            }
        }
    }

    /// Sends a command and waits for the matching ACK-ACK, retrying up to
    /// the attempt budget. Success requires the acknowledgement payload to
    /// echo the command's class/id.
    pub fn send_with_ack(&mut self, frame: &Frame) -> Result<()> {
        for attempt in 1..=UBX_SEND_ATTEMPTS {
            self.send_frame(frame)?;
            match self.recv_frame(UBX_ACK_FRAME_LIMIT) {
                Ok(reply) if packets::is_ack_for(&reply, frame.class, frame.id) => {
                    return Ok(());
                },
                Ok(reply) => debug!(
                    "attempt {attempt}: wanted ack for {:#04x}/{:#04x}, got {:#04x}/{:#04x}",
                    frame.class, frame.id, reply.class, reply.id
                ),
                // A dead channel will not come back within the budget.
                Err(err @ Error::Io(_)) => return Err(err),
                Err(err) => debug!(
                    "attempt {attempt}: no ack for {:#04x}/{:#04x}: {err}",
                    frame.class, frame.id
                ),
            }
        }
        Err(Error::NoAck {
            class: frame.class,
            id: frame.id,
        })
    }

    /// Wakes the receiver and enables the antenna bias supply.
    ///
    /// The wake bytes are a dummy pattern; a receiver in backup mode loses
    /// the first characters on its UART while its oscillator restarts.
    pub fn power_up(&mut self) -> Result<()> {
        self.require_state("power_up", &[SessionState::Off, SessionState::Sleeping])?;
        self.port.write_all(&[0xff])?;
        self.clock.sleep(WAKE_SETTLE);
        self.port.write_all(&[0xff])?;
        self.clock.sleep(WAKE_SETTLE);

        let antenna = CfgAntBuilder {
            flags: AntennaFlags::SVCS,
            pins: ANTENNA_SUPERVISOR_PINS,
        }
        .into_frame();
        self.send_with_ack(&antenna)?;
        self.state = SessionState::PoweredUp;
        debug!("receiver awake, antenna bias enabled");
        Ok(())
    }

    /// Negotiates the navigation engine's dynamic platform model.
    ///
    /// Polls the current CFG-NAV5 settings first; when the receiver already
    /// runs the requested mode nothing is written. Otherwise the retrieved
    /// configuration is written back with only the mode byte changed, so
    /// every other engine setting survives.
    pub fn set_nav_mode(&mut self, mode: NavMode) -> Result<()> {
        self.require_state(
            "set_nav_mode",
            &[SessionState::PoweredUp, SessionState::Ready],
        )?;
        let mut last_err = Error::AckTimeout;
        for attempt in 1..=UBX_SEND_ATTEMPTS {
            self.send_frame(&packets::poll_nav5())?;
            match self.recv_frame(UBX_NAV5_FRAME_LIMIT) {
                Ok(mut reply) => {
                    if reply.class != CLASS_CFG
                        || reply.id != CFG_NAV5
                        || reply.payload.len() != CFG_NAV5_PAYLOAD_LEN
                    {
                        debug!(
                            "attempt {attempt}: wanted CFG-NAV5 echo, got {:#04x}/{:#04x}",
                            reply.class, reply.id
                        );
                        last_err = Error::UnexpectedFrame {
                            class: reply.class,
                            id: reply.id,
                        };
                        continue;
                    }
                    if reply.payload[NAV5_DYN_MODEL_OFFSET] == mode as u8 {
                        debug!("nav mode already {mode:?}");
                        self.state = SessionState::Ready;
                        return Ok(());
                    }
                    reply.payload[NAV5_DYN_MODEL_OFFSET] = mode as u8;
                    self.send_with_ack(&reply)?;
                    debug!("nav mode set to {mode:?}");
                    self.state = SessionState::Ready;
                    return Ok(());
                },
                Err(err @ Error::Io(_)) => return Err(err),
                Err(err) => {
                    debug!("attempt {attempt}: CFG-NAV5 poll failed: {err}");
                    last_err = err;
                },
            }
        }
        Err(last_err)
    }

    /// Full startup: wake + antenna bias, a settle delay, then navigation
    /// mode negotiation.
    pub fn initialize(&mut self, mode: NavMode) -> Result<()> {
        self.power_up()?;
        self.clock.sleep(WAKE_SETTLE);
        self.set_nav_mode(mode)
    }

    /// Requests backup mode. Fire-and-forget: the receiver stops its UART
    /// on entry, so no acknowledgement is waited for.
    pub fn power_down(&mut self) -> Result<()> {
        self.require_state(
            "power_down",
            &[SessionState::PoweredUp, SessionState::Ready],
        )?;
        let request = RxmPmReqBuilder {
            duration_ms: 0,
            flags: PmReqFlags::BACKUP,
        }
        .into_frame();
        self.send_frame(&request)?;
        self.state = SessionState::Sleeping;
        debug!("receiver sent to backup mode");
        Ok(())
    }

    /// Drains currently-available NMEA bytes, updating the navigation
    /// record when a sentence completes. Never blocks; call once per
    /// scheduler tick.
    pub fn poll(&mut self) -> Result<Option<SentenceOutcome>> {
        self.require_state("poll", &[SessionState::Ready])?;
        let now = self.clock.now();
        self.assembler
            .poll(now, &mut self.port, &mut self.fix)
            .map_err(Error::Io)
    }

    fn require_state(&self, op: &'static str, allowed: &[SessionState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            warn!("{op} refused while {}", self.state);
            Err(Error::InvalidTransition {
                op,
                state: self.state,
            })
        }
    }

    fn read_available(&mut self) -> Result<Option<u8>> {
        let mut byte = [0u8; 1];
        match self.port.read(&mut byte) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(byte[0])),
            Err(e)
                if e.kind() == io::ErrorKind::TimedOut
                    || e.kind() == io::ErrorKind::WouldBlock =>
            {
                Ok(None)
            },
            Err(e) => Err(Error::Io(e)),
        }
    }
}
