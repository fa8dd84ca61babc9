//! Universe payload assembly
//!
//! Decodes per-universe channel data into the working frame. Only the
//! control-plane context touches the working frame; the render context sees
//! it exclusively through published copies.

use crate::color::{Rgb, WhitePolicy, rgbw, with_white};
use crate::config::ConfigError;
use crate::frame::PixelFrame;
use crate::mapper::{MapError, PixelRange, UniverseMapper};

/// How universe bytes are grouped into pixels
#[derive(Debug, Clone, Copy)]
pub enum ChannelLayout {
    /// 3-byte groups, white derived by the policy
    Rgb(WhitePolicy),
    /// 4-byte groups taken as-is
    Rgbw,
}

impl ChannelLayout {
    pub const fn channels_per_pixel(self) -> u8 {
        match self {
            Self::Rgb(_) => 3,
            Self::Rgbw => 4,
        }
    }
}

/// Owns the working frame and writes universe payloads into it
#[derive(Debug, Clone)]
pub struct FrameAssembler<const MAX_PIXELS: usize> {
    mapper: UniverseMapper,
    layout: ChannelLayout,
    working: PixelFrame<MAX_PIXELS>,
}

impl<const MAX_PIXELS: usize> FrameAssembler<MAX_PIXELS> {
    /// Create an assembler with an all-black working frame sized to the
    /// mapper's pixel count.
    ///
    /// The mapper must address pixels with the layout's channel count.
    pub fn new(mapper: UniverseMapper, layout: ChannelLayout) -> Result<Self, ConfigError> {
        if mapper.channels_per_pixel() != layout.channels_per_pixel() {
            return Err(ConfigError::LayoutMismatch {
                mapper: mapper.channels_per_pixel(),
                layout: layout.channels_per_pixel(),
            });
        }
        Ok(Self {
            working: PixelFrame::new(mapper.pixel_count()),
            mapper,
            layout,
        })
    }

    pub const fn mapper(&self) -> &UniverseMapper {
        &self.mapper
    }

    pub const fn layout(&self) -> ChannelLayout {
        self.layout
    }

    pub const fn frame(&self) -> &PixelFrame<MAX_PIXELS> {
        &self.working
    }

    /// Direct access for full-frame patterns (self-test, clearing)
    pub fn frame_mut(&mut self) -> &mut PixelFrame<MAX_PIXELS> {
        &mut self.working
    }

    /// Resolve the pixel range a payload would write without touching the frame
    pub fn locate(&self, universe: u16, data: &[u8]) -> Result<PixelRange, MapError> {
        self.mapper.map(universe, data.len())
    }

    /// Decode `data` for `universe` into the working frame
    ///
    /// Pixels are overwritten, never accumulated, so applying the same
    /// payload twice leaves the frame as applying it once. Out-of-range
    /// universes leave the frame untouched.
    pub fn apply(&mut self, universe: u16, data: &[u8]) -> Result<PixelRange, MapError> {
        let range = self.locate(universe, data)?;
        let len = self.working.len();
        let pixels = &mut self.working.as_mut_slice()[range.start.min(len)..range.end.min(len)];

        match self.layout {
            ChannelLayout::Rgbw => {
                for (pixel, chunk) in pixels.iter_mut().zip(data.chunks_exact(4)) {
                    *pixel = rgbw(chunk[0], chunk[1], chunk[2], chunk[3]);
                }
            }
            ChannelLayout::Rgb(policy) => {
                for (pixel, chunk) in pixels.iter_mut().zip(data.chunks_exact(3)) {
                    let color = Rgb {
                        r: chunk[0],
                        g: chunk[1],
                        b: chunk[2],
                    };
                    *pixel = with_white(color, policy);
                }
            }
        }

        Ok(range)
    }
}
