//! Network liveness state machine
//!
//! The node starts in [`LivenessState::SelfTest`] and enters
//! [`LivenessState::Live`] on the first valid payload, never going back. A
//! silence counter runs in both states: it grows on every tick without a
//! payload and is reset by payloads. Crossing the threshold requests a
//! restart, exactly once.

use crate::color::{Rgbw, rgbw};
use crate::frame::PixelFrame;

/// Default silence threshold, in ticks (one tick per second)
pub const DEFAULT_SILENCE_THRESHOLD: u32 = 120;

/// Default self-test channel level
pub const DEFAULT_SELF_TEST_LEVEL: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LivenessState {
    /// No control data received yet
    SelfTest,
    /// Control data has been received at least once
    Live,
}

/// What the controller should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LivenessAction {
    /// Nothing to do
    Idle,
    /// Draw self-test step `step` into the working frame and publish it.
    /// Ticks start at step 1; step 0 belongs to the startup frame.
    SelfTest { step: u32 },
    /// Silence exceeded the threshold; restart the node
    Restart,
}

/// Result of reporting a valid payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadOutcome {
    /// First payload: the working frame must be reset to the
    /// network-active state before applying it
    WentLive,
    /// Already live
    Live,
}

#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    state: LivenessState,
    silence: u32,
    threshold: u32,
    payload_since_tick: bool,
    self_test_step: u32,
    paused: bool,
    restart_requested: bool,
}

impl LivenessMonitor {
    pub const fn new(threshold: u32) -> Self {
        Self {
            state: LivenessState::SelfTest,
            silence: 0,
            threshold,
            payload_since_tick: false,
            self_test_step: 1,
            paused: false,
            restart_requested: false,
        }
    }

    pub const fn state(&self) -> LivenessState {
        self.state
    }

    pub const fn is_live(&self) -> bool {
        matches!(self.state, LivenessState::Live)
    }

    /// Ticks elapsed without a payload
    pub const fn silence(&self) -> u32 {
        self.silence
    }

    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    pub const fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Record a valid payload addressed to this node
    pub fn on_payload(&mut self) -> PayloadOutcome {
        self.silence = 0;
        self.payload_since_tick = true;
        match self.state {
            LivenessState::SelfTest => {
                self.state = LivenessState::Live;
                PayloadOutcome::WentLive
            }
            LivenessState::Live => PayloadOutcome::Live,
        }
    }

    /// Stop counting silence (firmware update in progress)
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
        self.payload_since_tick = true;
    }

    /// Advance one periodic tick
    pub fn tick(&mut self) -> LivenessAction {
        if self.restart_requested || self.paused {
            return LivenessAction::Idle;
        }

        if !core::mem::take(&mut self.payload_since_tick) {
            self.silence = self.silence.saturating_add(1);
        }

        if self.silence > self.threshold {
            self.restart_requested = true;
            return LivenessAction::Restart;
        }

        match self.state {
            LivenessState::SelfTest => {
                let step = self.self_test_step;
                self.self_test_step = self.self_test_step.wrapping_add(1);
                LivenessAction::SelfTest { step }
            }
            LivenessState::Live => LivenessAction::Idle,
        }
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_SILENCE_THRESHOLD)
    }
}

/// Color of a self-test step: red, green, blue, white, repeating
pub const fn self_test_color(step: u32, level: u8) -> Rgbw {
    match step % 4 {
        0 => rgbw(level, 0, 0, 0),
        1 => rgbw(0, level, 0, 0),
        2 => rgbw(0, 0, level, 0),
        _ => rgbw(0, 0, 0, level),
    }
}

/// Draw a self-test step over the whole frame
pub fn draw_self_test<const MAX_PIXELS: usize>(
    frame: &mut PixelFrame<MAX_PIXELS>,
    step: u32,
    level: u8,
) {
    frame.fill(self_test_color(step, level));
}
