//! Firmware update gate
//!
//! While an update is written the render output is held at a fixed color
//! and publication is suppressed. A failed update requests a restart, the
//! same fail-stop policy as network silence.

use crate::color::Rgbw;
use crate::handoff::FramePublisher;

/// Progress reported by the update subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateEvent {
    Started,
    /// Image written; the update subsystem reboots into it
    Finished,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UpdateAction {
    None,
    Restart,
}

#[derive(Debug, Clone)]
pub struct UpdateGate {
    color: Rgbw,
    in_progress: bool,
}

impl UpdateGate {
    pub const fn new(color: Rgbw) -> Self {
        Self {
            color,
            in_progress: false,
        }
    }

    pub const fn in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn on_event<const MAX_PIXELS: usize>(
        &mut self,
        event: UpdateEvent,
        publisher: &FramePublisher<'_, MAX_PIXELS>,
    ) -> UpdateAction {
        match event {
            UpdateEvent::Started => {
                self.in_progress = true;
                publisher.hold(self.color);
                UpdateAction::None
            }
            UpdateEvent::Finished => {
                self.in_progress = false;
                publisher.release();
                UpdateAction::None
            }
            UpdateEvent::Failed => {
                self.in_progress = false;
                UpdateAction::Restart
            }
        }
    }
}
