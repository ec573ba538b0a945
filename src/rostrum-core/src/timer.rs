//! Per-speech countdown.
//!
//! The timer is pure state ticked once per second by whoever drives the
//! session (the controller's clock, or a test calling [`SpeechTimer::tick`]
//! directly). Reaching zero while active reports expiry exactly once and
//! deactivates the clock.

/// Outcome of one 1 Hz tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTick {
    /// Clock not running.
    Idle,
    /// Clock decremented; this many seconds remain.
    Running { remaining: u32 },
    /// The countdown just hit zero. Reported once per started countdown.
    Expired,
}

#[derive(Debug, Clone, Default)]
pub struct SpeechTimer {
    remaining: u32,
    active: bool,
}

impl SpeechTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a countdown. Zero seconds means an untimed turn and leaves
    /// the clock idle.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.active = seconds > 0;
    }

    pub fn pause(&mut self) {
        self.active = false;
    }

    /// Resumes a paused countdown. A clock that already ran out stays idle
    /// so expiry cannot fire twice.
    pub fn resume(&mut self) {
        if self.remaining > 0 {
            self.active = true;
        }
    }

    pub fn reset(&mut self, seconds: u32, active: bool) {
        self.remaining = seconds;
        self.active = active && seconds > 0;
    }

    pub fn stop(&mut self) {
        self.remaining = 0;
        self.active = false;
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advances the clock by one second.
    pub fn tick(&mut self) -> TimerTick {
        if !self.active {
            return TimerTick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.active = false;
            TimerTick::Expired
        } else {
            TimerTick::Running {
                remaining: self.remaining,
            }
        }
    }
}

/// Renders seconds as an `MM:SS` clock face.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
