//! Render context: drains published frames into the LED driver.
//!
//! The loop sleeps on the handoff signal while nothing is ready, copies the
//! output frame into its own driver buffer under the handoff lock, and only
//! then calls the driver, so the lock is never held across hardware I/O.
//! Access to the output frame cannot time out; re-entering it from inside a
//! critical section is a programming error and panics.

use embassy_time::{Duration, Instant, Timer};

use crate::OutputDriver;
use crate::frame::PixelFrame;
use crate::handoff::{Consumed, FrameReceiver};

/// Default refresh cap (50 FPS)
pub const DEFAULT_FPS: u32 = 50;

/// Default frame duration based on the refresh cap.
pub const DEFAULT_FRAME_DURATION: Duration = Duration::from_millis(1000 / DEFAULT_FPS as u64);

/// Timing of the next allowed render.
#[derive(Debug, Clone, Copy)]
pub struct FrameTiming {
    /// Earliest instant the next frame may be pushed to the driver.
    pub next_deadline: Instant,
    /// How long to wait until then (zero if behind schedule).
    pub sleep_duration: Duration,
}

/// Caps the render cadence with drift correction.
///
/// If the loop falls more than two frames behind (for example after an idle
/// period with no publishes), the backlog is skipped instead of rendering a
/// catch-up burst.
#[derive(Debug, Clone)]
pub struct FramePacer {
    next_frame: Instant,
    frame_duration: Duration,
}

impl FramePacer {
    pub const fn new(frame_duration: Duration) -> Self {
        Self {
            next_frame: Instant::from_millis(0),
            frame_duration,
        }
    }

    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Account for a frame rendered at `now` and return the next deadline.
    pub fn tick(&mut self, now: Instant) -> FrameTiming {
        let max_drift_ms = self.frame_duration.as_millis() * 2;
        if now.as_millis() > self.next_frame.as_millis() + max_drift_ms {
            self.next_frame = now;
        }

        self.next_frame += self.frame_duration;

        let sleep_duration = if self.next_frame.as_millis() > now.as_millis() {
            Duration::from_millis(self.next_frame.as_millis() - now.as_millis())
        } else {
            Duration::from_millis(0)
        };

        FrameTiming {
            next_deadline: self.next_frame,
            sleep_duration,
        }
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_DURATION)
    }
}

/// Render loop bound to one handoff and one output driver.
///
/// # Usage
///
/// ```ignore
/// static HANDOFF: FrameHandoff<MAX_PIXELS> = FrameHandoff::new();
///
/// #[embassy_executor::task]
/// async fn render_task(driver: StripDriver, pixel_count: usize) {
///     let mut render = RenderLoop::new(HANDOFF.receiver(), driver, pixel_count);
///     render.run().await
/// }
/// ```
pub struct RenderLoop<'a, O: OutputDriver, const MAX_PIXELS: usize> {
    output: O,
    frames: FrameReceiver<'a, MAX_PIXELS>,
    buffer: PixelFrame<MAX_PIXELS>,
    pacer: FramePacer,
    last: Option<Consumed>,
}

impl<'a, O: OutputDriver, const MAX_PIXELS: usize> RenderLoop<'a, O, MAX_PIXELS> {
    /// Create a render loop with the default refresh cap.
    ///
    /// `pixel_count` sizes the driver buffer until the first frame arrives.
    pub fn new(frames: FrameReceiver<'a, MAX_PIXELS>, driver: O, pixel_count: usize) -> Self {
        Self::with_pacer(frames, driver, pixel_count, FramePacer::default())
    }

    pub fn with_pacer(
        frames: FrameReceiver<'a, MAX_PIXELS>,
        driver: O,
        pixel_count: usize,
        pacer: FramePacer,
    ) -> Self {
        Self {
            output: driver,
            frames,
            buffer: PixelFrame::new(pixel_count),
            pacer,
            last: None,
        }
    }

    /// Render once if a frame is ready.
    ///
    /// Returns what was rendered, or `None` when nothing was published
    /// since the previous render.
    pub fn poll(&mut self) -> Option<Consumed> {
        let consumed = self.frames.try_take(&mut self.buffer)?;
        self.output.write(self.buffer.as_slice());
        self.last = Some(consumed);
        Some(consumed)
    }

    /// Run forever, rendering each ready frame no faster than the pacer allows.
    pub async fn run(&mut self) -> ! {
        loop {
            self.frames.wait().await;
            if self.poll().is_some() {
                let timing = self.pacer.tick(Instant::now());
                Timer::at(timing.next_deadline).await;
            }
        }
    }

    /// Last thing pushed to the driver
    pub const fn last(&self) -> Option<Consumed> {
        self.last
    }

    /// Frame currently held in the driver buffer
    pub const fn buffer(&self) -> &PixelFrame<MAX_PIXELS> {
        &self.buffer
    }

    pub const fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }
}
