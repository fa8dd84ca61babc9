//! Fixed-capacity RGBW pixel frame
//!
//! Frames are allocated once at startup. `MAX_PIXELS` is the compile-time
//! capacity; the node's actual pixel count is set at construction and never
//! changes afterwards.

use crate::color::{BLACK, Rgbw};

/// Ordered sequence of RGBW pixels with a fixed length
#[derive(Debug, Clone)]
pub struct PixelFrame<const MAX_PIXELS: usize> {
    pixels: [Rgbw; MAX_PIXELS],
    len: usize,
}

impl<const MAX_PIXELS: usize> PixelFrame<MAX_PIXELS> {
    /// Create an all-black frame of `len` pixels
    ///
    /// `len` is clamped to the frame capacity.
    pub const fn new(len: usize) -> Self {
        let len = if len > MAX_PIXELS { MAX_PIXELS } else { len };
        Self {
            pixels: [BLACK; MAX_PIXELS],
            len,
        }
    }

    /// Create a zero-length frame, used for statically allocated slots
    /// that receive their length on the first copy.
    pub const fn empty() -> Self {
        Self::new(0)
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        MAX_PIXELS
    }

    pub fn as_slice(&self) -> &[Rgbw] {
        &self.pixels[..self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [Rgbw] {
        &mut self.pixels[..self.len]
    }

    /// Get a pixel, `None` past the frame length
    pub fn get(&self, index: usize) -> Option<Rgbw> {
        self.as_slice().get(index).copied()
    }

    /// Set every pixel to `color`
    pub fn fill(&mut self, color: Rgbw) {
        self.as_mut_slice().fill(color);
    }

    /// Set every pixel to black
    pub fn clear(&mut self) {
        self.fill(BLACK);
    }

    /// Overwrite this frame with the contents and length of `source`
    pub fn copy_from(&mut self, source: &Self) {
        self.len = source.len;
        self.pixels[..source.len].copy_from_slice(source.as_slice());
    }
}
