//! Output frame handoff between the control plane and the render context.
//!
//! The output frame is the only state shared between the two contexts. It
//! lives in a `critical-section` mutex and is touched only to copy a frame
//! in (publish) or out (consume). A [`Signal`] wakes the render context after
//! each publish. Consumption is latest-wins: a frame published before the
//! previous one was consumed simply replaces it.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::color::Rgbw;
use crate::frame::PixelFrame;

/// When the control plane publishes the working frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishPolicy {
    /// After every applied universe payload
    Eager,
    /// Only on an explicit sync signal from the protocol layer
    OnSync,
}

/// Result of a publish attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PublishOutcome {
    /// Frame copied; carries its generation number
    Published(u32),
    /// Output is held (update in progress), frame discarded
    Suppressed,
}

/// What the render context took out of the handoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Consumed {
    /// A published frame of the given generation
    Frame(u32),
    /// The output is held at a fixed color
    Hold(Rgbw),
}

#[derive(Debug)]
struct OutputSlot<const MAX_PIXELS: usize> {
    frame: PixelFrame<MAX_PIXELS>,
    generation: u32,
    ready: bool,
    hold: Option<Rgbw>,
}

/// Double-buffer handoff slot.
///
/// Meant to be placed in a `static` and shared by reference: the control
/// plane gets a [`FramePublisher`], the render context a [`FrameReceiver`].
pub struct FrameHandoff<const MAX_PIXELS: usize> {
    slot: Mutex<RefCell<OutputSlot<MAX_PIXELS>>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl<const MAX_PIXELS: usize> FrameHandoff<MAX_PIXELS> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(OutputSlot {
                frame: PixelFrame::empty(),
                generation: 0,
                ready: false,
                hold: None,
            })),
            wake: Signal::new(),
        }
    }

    /// Get the control-plane handle
    pub const fn publisher(&self) -> FramePublisher<'_, MAX_PIXELS> {
        FramePublisher { handoff: self }
    }

    /// Get the render-context handle
    pub const fn receiver(&self) -> FrameReceiver<'_, MAX_PIXELS> {
        FrameReceiver { handoff: self }
    }

    /// Copy `frame` into the output slot and mark it ready
    ///
    /// Blocks only for the duration of the copy.
    pub fn publish(&self, frame: &PixelFrame<MAX_PIXELS>) -> PublishOutcome {
        let outcome = critical_section::with(|cs| {
            let mut slot = self.slot.borrow(cs).borrow_mut();
            if slot.hold.is_some() {
                return PublishOutcome::Suppressed;
            }
            slot.frame.copy_from(frame);
            slot.generation = slot.generation.wrapping_add(1);
            slot.ready = true;
            PublishOutcome::Published(slot.generation)
        });
        if matches!(outcome, PublishOutcome::Published(_)) {
            self.wake.signal(());
        }
        outcome
    }

    /// Hold the output at `color` and suppress publication until released
    pub fn hold(&self, color: Rgbw) {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow(cs).borrow_mut();
            slot.hold = Some(color);
            slot.ready = true;
        });
        self.wake.signal(());
    }

    /// Lift a hold; the next publish resumes normal output
    pub fn release(&self) {
        critical_section::with(|cs| {
            self.slot.borrow(cs).borrow_mut().hold = None;
        });
    }

    pub fn is_held(&self) -> bool {
        critical_section::with(|cs| self.slot.borrow(cs).borrow().hold.is_some())
    }

    /// Generation of the most recently published frame
    pub fn generation(&self) -> u32 {
        critical_section::with(|cs| self.slot.borrow(cs).borrow().generation)
    }

    /// Copy the ready frame into `out` and clear the ready flag
    ///
    /// Returns `None` when nothing was published since the last take. While
    /// held, `out` keeps its length and is filled with the hold color.
    pub fn try_take(&self, out: &mut PixelFrame<MAX_PIXELS>) -> Option<Consumed> {
        critical_section::with(|cs| {
            let mut slot = self.slot.borrow(cs).borrow_mut();
            if !slot.ready {
                return None;
            }
            slot.ready = false;
            if let Some(color) = slot.hold {
                out.fill(color);
                return Some(Consumed::Hold(color));
            }
            out.copy_from(&slot.frame);
            Some(Consumed::Frame(slot.generation))
        })
    }

    /// Wait until something is published or a hold is placed
    pub async fn wait(&self) {
        self.wake.wait().await;
    }
}

impl<const MAX_PIXELS: usize> Default for FrameHandoff<MAX_PIXELS> {
    fn default() -> Self {
        Self::new()
    }
}

/// Control-plane handle of a [`FrameHandoff`]
#[derive(Clone, Copy)]
pub struct FramePublisher<'a, const MAX_PIXELS: usize> {
    handoff: &'a FrameHandoff<MAX_PIXELS>,
}

impl<const MAX_PIXELS: usize> FramePublisher<'_, MAX_PIXELS> {
    pub fn publish(&self, frame: &PixelFrame<MAX_PIXELS>) -> PublishOutcome {
        self.handoff.publish(frame)
    }

    pub fn hold(&self, color: Rgbw) {
        self.handoff.hold(color);
    }

    pub fn release(&self) {
        self.handoff.release();
    }

    pub fn is_held(&self) -> bool {
        self.handoff.is_held()
    }
}

/// Render-context handle of a [`FrameHandoff`]
#[derive(Clone, Copy)]
pub struct FrameReceiver<'a, const MAX_PIXELS: usize> {
    handoff: &'a FrameHandoff<MAX_PIXELS>,
}

impl<const MAX_PIXELS: usize> FrameReceiver<'_, MAX_PIXELS> {
    pub fn try_take(&self, out: &mut PixelFrame<MAX_PIXELS>) -> Option<Consumed> {
        self.handoff.try_take(out)
    }

    pub async fn wait(&self) {
        self.handoff.wait().await;
    }
}
