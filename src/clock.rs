use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Time source injected into the driver.
///
/// All deadlines (UBX response window, NMEA freshness window, power-up
/// settles) are measured against this trait, so tests can substitute a
/// deterministic clock instead of waiting out real delays.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by [`Instant::now`] and [`thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

/// Deterministic clock for simulation and tests.
///
/// Every `now()` reading advances time by the configured tick, which lets
/// bounded receive loops run to their deadline without real waiting.
/// `sleep()` advances by the requested duration instead of blocking.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<Instant>,
    tick: Duration,
}

impl ManualClock {
    pub fn new(start: Instant) -> Self {
        Self::with_tick(start, Duration::ZERO)
    }

    pub fn with_tick(start: Instant, tick: Duration) -> Self {
        Self {
            now: Cell::new(start),
            tick,
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let now = self.now.get();
        self.now.set(now + self.tick);
        now
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}
