use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::dom::dom_model::Document;
use crate::fill::fill::FillSession;
use crate::fill::fill_model::FillState;

/// Time source and timer for retries and snapshot timestamps.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
    fn sleep(&mut self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Deterministic clock: `sleep` advances time without blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now_ms: u64,
    pub sleeps: u32,
}

impl ManualClock {
    pub fn at(now_ms: u64) -> Self {
        ManualClock { now_ms, sleeps: 0 }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn sleep(&mut self, duration: Duration) {
        self.now_ms += duration.as_millis() as u64;
        self.sleeps += 1;
    }
}

/// Drive a session to a terminal state, one retry interval between attempts.
pub fn drive(session: &mut FillSession, doc: &mut Document, clock: &mut dyn Clock) -> FillState {
    drive_with(session, doc, clock, |_, _| {})
}

/// Like [`drive`], calling `before_tick(attempts_so_far, doc)` ahead of each
/// retry so a host can apply page updates that landed during the wait.
pub fn drive_with<F>(
    session: &mut FillSession,
    doc: &mut Document,
    clock: &mut dyn Clock,
    mut before_tick: F,
) -> FillState
where
    F: FnMut(u32, &mut Document),
{
    let interval = session.config().retry_interval();
    while !session.is_terminal() {
        clock.sleep(interval);
        before_tick(session.attempts(), doc);
        session.tick(doc);
    }
    session.state().clone()
}
