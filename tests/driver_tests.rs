use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::rc::Rc;
use std::time::{Duration, Instant};

use beacon_gps::packets::{
    ACK_ACK, ACK_NAK, CFG_ANT, CFG_NAV5, CLASS_ACK, CLASS_CFG, CLASS_MON, CLASS_RXM,
    NAV5_DYN_MODEL_OFFSET, RXM_PMREQ,
};
use beacon_gps::{
    Device, Error, FixStatus, Frame, FrameScanner, ManualClock, NavMode, SentenceKind,
    SentenceOutcome, SessionState,
};

const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

/// In-memory serial channel shared between the device under test and the
/// test body; reads drain a queue of scripted receiver bytes, writes record
/// everything the driver transmits.
#[derive(Clone, Default)]
struct SharedPort(Rc<RefCell<PortInner>>);

#[derive(Default)]
struct PortInner {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    read_error: Option<io::ErrorKind>,
}

impl SharedPort {
    fn feed(&self, bytes: &[u8]) {
        self.0.borrow_mut().rx.extend(bytes.iter().copied());
    }

    /// Makes every subsequent read fail hard, as when the adapter vanishes.
    fn break_reads(&self, kind: io::ErrorKind) {
        self.0.borrow_mut().read_error = Some(kind);
    }

    fn written(&self) -> Vec<u8> {
        self.0.borrow().tx.clone()
    }

    fn clear_written(&self) {
        self.0.borrow_mut().tx.clear();
    }

    /// Decodes every complete UBX frame the driver wrote.
    fn written_frames(&self) -> Vec<Frame> {
        let tx = self.written();
        let mut scanner = FrameScanner::new(64);
        let mut frames = Vec::new();
        for &byte in &tx {
            if let Some(Ok(frame)) = scanner.push(byte) {
                frames.push(frame);
            }
        }
        frames
    }
}

impl Read for SharedPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inner = self.0.borrow_mut();
        if let Some(kind) = inner.read_error {
            return Err(io::Error::from(kind));
        }
        match inner.rx.pop_front() {
            Some(byte) => {
                buf[0] = byte;
                Ok(1)
            },
            None => Err(io::Error::new(io::ErrorKind::TimedOut, "no data queued")),
        }
    }
}

impl Write for SharedPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().tx.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ack_for(class: u8, id: u8) -> Vec<u8> {
    Frame::new(CLASS_ACK, ACK_ACK, vec![class, id]).to_wire()
}

fn nav5_response(mode: u8) -> Vec<u8> {
    let mut payload: Vec<u8> = (0..36).map(|i| i as u8).collect();
    payload[NAV5_DYN_MODEL_OFFSET] = mode;
    Frame::new(CLASS_CFG, CFG_NAV5, payload).to_wire()
}

fn ticking_clock() -> ManualClock {
    ManualClock::with_tick(Instant::now(), Duration::from_millis(1))
}

#[test]
fn power_up_sends_wake_bytes_then_antenna_config() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));

    gps.power_up().unwrap();
    assert_eq!(gps.state(), SessionState::PoweredUp);

    let written = port.written();
    assert_eq!(&written[..2], &[0xff, 0xff]);
    assert_eq!(
        &written[2..],
        &[0xb5, 0x62, 0x06, 0x13, 0x04, 0x00, 0x01, 0x00, 0x16, 0x80, 0xb4, 0x7d, 0x0d, 0x0a]
    );
}

#[test]
fn unacknowledged_command_fails_after_three_sends() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);

    let err = gps.power_up().unwrap_err();
    assert!(matches!(
        err,
        Error::NoAck {
            class: CLASS_CFG,
            id: CFG_ANT
        }
    ));
    assert_eq!(gps.state(), SessionState::Off);
    assert_eq!(port.written_frames().len(), 3);
}

#[test]
fn broken_channel_surfaces_io_error_without_retry() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.break_reads(io::ErrorKind::BrokenPipe);

    let err = gps.power_up().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(gps.state(), SessionState::Off);
    // No point re-sending on a dead channel.
    assert_eq!(port.written_frames().len(), 1);
}

#[test]
fn nak_is_retried_until_acknowledged() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&Frame::new(CLASS_ACK, ACK_NAK, vec![CLASS_CFG, CFG_ANT]).to_wire());
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));

    gps.power_up().unwrap();
    assert_eq!(port.written_frames().len(), 2);
}

#[test]
fn matching_nav_mode_performs_zero_writes() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    gps.power_up().unwrap();
    port.clear_written();

    port.feed(&nav5_response(NavMode::Automotive as u8));
    gps.set_nav_mode(NavMode::Automotive).unwrap();
    assert_eq!(gps.state(), SessionState::Ready);

    // Only the empty-payload poll went out, no configuration write.
    let frames = port.written_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!((frames[0].class, frames[0].id), (CLASS_CFG, CFG_NAV5));
    assert!(frames[0].payload.is_empty());
}

#[test]
fn differing_nav_mode_rewrites_only_the_mode_byte() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    gps.power_up().unwrap();
    port.clear_written();

    port.feed(&nav5_response(NavMode::Portable as u8));
    port.feed(&ack_for(CLASS_CFG, CFG_NAV5));
    gps.set_nav_mode(NavMode::Airborne1g).unwrap();

    let frames = port.written_frames();
    assert_eq!(frames.len(), 2);
    let written = &frames[1];
    assert_eq!((written.class, written.id), (CLASS_CFG, CFG_NAV5));
    assert_eq!(written.payload.len(), 36);
    assert_eq!(written.payload[NAV5_DYN_MODEL_OFFSET], NavMode::Airborne1g as u8);
    // Every other engine setting survives the rewrite.
    for (i, &byte) in written.payload.iter().enumerate() {
        if i != NAV5_DYN_MODEL_OFFSET {
            assert_eq!(byte, i as u8);
        }
    }
}

#[test]
fn unexpected_poll_echo_exhausts_the_retry_budget() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    gps.power_up().unwrap();
    port.clear_written();

    for _ in 0..3 {
        port.feed(&Frame::new(CLASS_MON, 0x09, vec![0; 4]).to_wire());
    }
    let err = gps.set_nav_mode(NavMode::Automotive).unwrap_err();
    assert!(matches!(
        err,
        Error::UnexpectedFrame {
            class: CLASS_MON,
            id: 0x09
        }
    ));
    assert_eq!(gps.state(), SessionState::PoweredUp);
    // One poll per attempt, never a configuration write.
    assert_eq!(port.written_frames().len(), 3);
}

#[test]
fn initialize_then_poll_decodes_the_stream() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    port.feed(&nav5_response(NavMode::Pedestrian as u8));
    port.feed(&ack_for(CLASS_CFG, CFG_NAV5));

    gps.initialize(NavMode::Automotive).unwrap();
    assert_eq!(gps.state(), SessionState::Ready);

    port.feed(GGA.as_bytes());
    let outcome = gps.poll().unwrap();
    assert_eq!(outcome, Some(SentenceOutcome::Accepted(SentenceKind::Gga)));

    let fix = gps.fix();
    assert_eq!(fix.status, FixStatus::Fix(1));
    assert_eq!(fix.sats_used, 8);
    assert_eq!(fix.altitude, 545.4);
    assert_eq!((fix.hour, fix.minute, fix.second), (12, 35, 19));
    assert_eq!(fix.aprs_latitude_str(), Some("480703"));

    assert_eq!(gps.poll().unwrap(), None);
}

#[test]
fn quiet_stream_times_out_after_ten_seconds() {
    let port = SharedPort::default();
    let clock = ManualClock::new(Instant::now());
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    port.feed(&nav5_response(NavMode::Automotive as u8));
    gps.initialize(NavMode::Automotive).unwrap();

    assert_eq!(gps.poll().unwrap(), None);
    assert_eq!(gps.fix().status, FixStatus::NoFix);

    clock.advance(Duration::from_secs(9));
    gps.poll().unwrap();
    assert_eq!(gps.fix().status, FixStatus::NoFix);

    clock.advance(Duration::from_secs(2));
    gps.poll().unwrap();
    assert_eq!(gps.fix().status, FixStatus::Timeout);

    // Stays stale until the stream resumes.
    clock.advance(Duration::from_secs(1));
    gps.poll().unwrap();
    assert_eq!(gps.fix().status, FixStatus::Timeout);

    port.feed(GGA.as_bytes());
    gps.poll().unwrap();
    assert_eq!(gps.fix().status, FixStatus::Fix(1));
}

#[test]
fn power_down_is_fire_and_forget() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    port.feed(&nav5_response(NavMode::Automotive as u8));
    gps.initialize(NavMode::Automotive).unwrap();
    port.clear_written();

    gps.power_down().unwrap();
    assert_eq!(gps.state(), SessionState::Sleeping);

    let frames = port.written_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!((frames[0].class, frames[0].id), (CLASS_RXM, RXM_PMREQ));
    assert_eq!(
        frames[0].payload,
        [0x00, 0x00, 0x00, 0x00, 0x02, 0x00, 0x00, 0x00]
    );
}

#[test]
fn out_of_order_operations_fail_fast() {
    let port = SharedPort::default();
    let clock = ticking_clock();
    let mut gps = Device::new(port.clone(), &clock);

    assert!(matches!(
        gps.poll().unwrap_err(),
        Error::InvalidTransition { op: "poll", .. }
    ));
    assert!(matches!(
        gps.set_nav_mode(NavMode::Automotive).unwrap_err(),
        Error::InvalidTransition {
            op: "set_nav_mode",
            ..
        }
    ));
    assert!(matches!(
        gps.power_down().unwrap_err(),
        Error::InvalidTransition {
            op: "power_down",
            ..
        }
    ));

    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    port.feed(&nav5_response(NavMode::Automotive as u8));
    gps.initialize(NavMode::Automotive).unwrap();

    // Powering up an already-running session is refused.
    assert!(matches!(
        gps.power_up().unwrap_err(),
        Error::InvalidTransition { op: "power_up", .. }
    ));

    // A sleeping receiver accepts a wake but not polling.
    gps.power_down().unwrap();
    assert!(matches!(
        gps.poll().unwrap_err(),
        Error::InvalidTransition { op: "poll", .. }
    ));
    port.feed(&ack_for(CLASS_CFG, CFG_ANT));
    gps.power_up().unwrap();
    assert_eq!(gps.state(), SessionState::PoweredUp);
}
