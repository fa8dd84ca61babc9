//! Adapter from `smart-leds` drivers to [`OutputDriver`]

use smart_leds::SmartLedsWrite;

use crate::OutputDriver;
use crate::color::Rgbw;

/// Wraps any RGBW `smart-leds` writer.
///
/// Transmission errors belong to the driver; a failed write is dropped and
/// the next frame is attempted as usual.
pub struct SmartLedsOutput<W> {
    writer: W,
    failed_writes: u32,
}

impl<W> SmartLedsOutput<W>
where
    W: SmartLedsWrite<Color = Rgbw>,
{
    pub const fn new(writer: W) -> Self {
        Self {
            writer,
            failed_writes: 0,
        }
    }

    /// Number of writes the driver rejected
    pub const fn failed_writes(&self) -> u32 {
        self.failed_writes
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W> OutputDriver for SmartLedsOutput<W>
where
    W: SmartLedsWrite<Color = Rgbw>,
{
    fn write(&mut self, pixels: &[Rgbw]) {
        if self.writer.write(pixels.iter().copied()).is_err() {
            self.failed_writes = self.failed_writes.wrapping_add(1);
        }
    }
}
