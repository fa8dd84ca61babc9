//! Universe to pixel addressing
//!
//! Each node owns a contiguous block of universes starting at
//! `(position - 1) * universe_count`. Inside that block, universe `u`
//! covers pixels starting at `(u - universe_start) * pixels_per_universe`,
//! where `pixels_per_universe = universe_size / channels_per_pixel`.

use core::fmt;
use core::ops::Range;

/// Standard DMX512 universe payload size
pub const DMX_UNIVERSE_SIZE: u16 = 512;

/// Half-open pixel index range `[start, end)` inside a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelRange {
    pub start: usize,
    pub end: usize,
}

impl PixelRange {
    pub const fn len(self) -> usize {
        self.end - self.start
    }

    pub const fn is_empty(self) -> bool {
        self.end == self.start
    }

    /// Last covered pixel, `None` for an empty range
    pub const fn last(self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.end - 1)
        }
    }

    pub const fn as_range(self) -> Range<usize> {
        self.start..self.end
    }
}

/// A payload addressed a universe this node does not own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapError {
    /// Universe precedes the node's first universe
    BelowRange { universe: u16, first: u16 },
    /// Universe follows the node's last universe
    BeyondRange { universe: u16, last: u16 },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BelowRange { universe, first } => {
                write!(f, "universe {universe} is below node range (first {first})")
            }
            Self::BeyondRange { universe, last } => {
                write!(f, "universe {universe} is beyond node range (last {last})")
            }
        }
    }
}

impl core::error::Error for MapError {}

/// Number of whole pixels one universe carries
pub const fn pixels_per_universe(universe_size: u16, channels_per_pixel: u8) -> usize {
    if channels_per_pixel == 0 {
        return 0;
    }
    universe_size as usize / channels_per_pixel as usize
}

/// Number of universes needed to address `pixel_count` pixels
#[allow(clippy::cast_possible_truncation)]
pub const fn universe_count(
    pixel_count: usize,
    universe_size: u16,
    channels_per_pixel: u8,
) -> u16 {
    let stride = pixels_per_universe(universe_size, channels_per_pixel);
    if stride == 0 {
        return 0;
    }
    pixel_count.div_ceil(stride) as u16
}

/// Maps universe payloads of one node to pixel ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniverseMapper {
    universe_start: u16,
    universe_count: u16,
    universe_size: u16,
    channels_per_pixel: u8,
    pixel_count: usize,
}

impl UniverseMapper {
    /// Create a mapper for a node whose block begins at `universe_start`
    pub const fn new(
        universe_start: u16,
        pixel_count: usize,
        universe_size: u16,
        channels_per_pixel: u8,
    ) -> Self {
        Self {
            universe_start,
            universe_count: universe_count(pixel_count, universe_size, channels_per_pixel),
            universe_size,
            channels_per_pixel,
            pixel_count,
        }
    }

    /// Create a mapper for the node at `position` (1-based)
    ///
    /// Returns `None` for position 0 or when the block does not fit into
    /// the 16-bit universe space.
    pub fn for_position(
        position: u32,
        pixel_count: usize,
        universe_size: u16,
        channels_per_pixel: u8,
    ) -> Option<Self> {
        let count = universe_count(pixel_count, universe_size, channels_per_pixel);
        let start = position.checked_sub(1)?.checked_mul(u32::from(count))?;
        let start = u16::try_from(start).ok()?;
        start.checked_add(count)?;
        Some(Self::new(start, pixel_count, universe_size, channels_per_pixel))
    }

    pub const fn universe_start(&self) -> u16 {
        self.universe_start
    }

    pub const fn universe_count(&self) -> u16 {
        self.universe_count
    }

    pub const fn universe_size(&self) -> u16 {
        self.universe_size
    }

    pub const fn channels_per_pixel(&self) -> u8 {
        self.channels_per_pixel
    }

    pub const fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    pub const fn pixels_per_universe(&self) -> usize {
        pixels_per_universe(self.universe_size, self.channels_per_pixel)
    }

    /// Universes the protocol decoder should deliver to this node
    pub const fn universes(&self) -> Range<u16> {
        self.universe_start..self.universe_start.saturating_add(self.universe_count)
    }

    /// Locate the pixels written by a `payload_len` byte payload for `universe`
    ///
    /// Partial trailing pixels are ignored and the range never extends past
    /// the node's last pixel. The returned range may be empty.
    pub fn map(&self, universe: u16, payload_len: usize) -> Result<PixelRange, MapError> {
        let Some(offset) = universe.checked_sub(self.universe_start) else {
            return Err(MapError::BelowRange {
                universe,
                first: self.universe_start,
            });
        };
        if offset >= self.universe_count {
            return Err(MapError::BeyondRange {
                universe,
                last: self
                    .universe_start
                    .saturating_add(self.universe_count)
                    .saturating_sub(1),
            });
        }

        let stride = self.pixels_per_universe();
        let start = usize::from(offset) * stride;
        let span = (payload_len / usize::from(self.channels_per_pixel)).min(stride);
        let end = (start + span).min(self.pixel_count).max(start);

        Ok(PixelRange { start, end })
    }
}
