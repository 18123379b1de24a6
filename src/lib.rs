//! # beacon-gps
//!
//! Driver for the u-blox GPS receiver of a battery-powered APRS tracking
//! beacon. It has two duties: decoding the NMEA sentence stream into a
//! [`NavFix`] navigation record, and driving the receiver's binary UBX
//! configuration protocol (navigation mode, antenna bias, power state).
//!
//! Talking to a receiver
//! =====================
//!
//! A [`Device`] owns the serial channel and sequences power-up, navigation
//! mode negotiation and power-down. During normal operation it is polled once
//! per scheduler tick; polling never blocks, it only consumes the bytes
//! currently available:
//!
//! ```no_run
//! use beacon_gps::{Device, NavMode};
//!
//! let mut gps = Device::open("/dev/ttyUSB0", 9_600)?;
//! gps.initialize(NavMode::Automotive)?;
//! loop {
//!     if let Some(outcome) = gps.poll()? {
//!         if outcome.is_accepted() {
//!             let fix = gps.fix();
//!             println!("{} sats, {:.5} {:.5}", fix.sats_used, fix.latitude, fix.longitude);
//!         }
//!     }
//! }
//! # Ok::<(), beacon_gps::Error>(())
//! ```
//!
//! Building UBX frames
//! ===================
//!
//! Configuration packets are built with the `Builder` structs and framed by
//! [`Frame::to_wire`]:
//!
//! ```
//! use beacon_gps::{AntennaFlags, CfgAntBuilder};
//!
//! let frame = CfgAntBuilder {
//!     flags: AntennaFlags::SVCS,
//!     pins: 0x8016,
//! }
//! .into_frame();
//! assert_eq!(frame.to_wire()[..2], [0xb5, 0x62]);
//! ```
//!
//! The UBX exchange blocks the calling thread (bounded by a 1.5 s response
//! window with three attempts), which is acceptable because configuration
//! only happens at startup and on mode changes, never inside the polling
//! loop. The serial channel is shared between UBX exchanges and NMEA
//! streaming; the [`Device`] state machine keeps the two temporally
//! exclusive.
//!
//! Timing is injected through the [`Clock`] trait, so the freshness window
//! and response timeouts can be driven deterministically in tests with
//! [`ManualClock`].

pub use crate::{
    clock::{Clock, ManualClock, SystemClock},
    device::{Device, SessionState},
    error::{DateTimeError, Error},
    fix::{FixStatus, NavFix},
    frame::{Frame, FrameScanner},
    nmea::{SentenceKind, SentenceOutcome},
    packets::{AntennaFlags, CfgAntBuilder, NavMode, PmReqFlags, RxmPmReqBuilder},
};

mod clock;
pub mod constants;
mod device;
mod error;
mod fix;
mod frame;
pub mod nmea;
pub mod packets;
pub mod scan;
