//! RGB to white channel derivation
//!
//! Three-channel payloads carry no white value. The assembler asks a
//! [`WhitePolicy`] to derive one for every decoded pixel, so strips with a
//! dedicated white die can be driven from plain RGB controllers.

use crate::color::Rgb;

/// Derives the white channel from an RGB triplet
pub type WhitePolicy = fn(color: Rgb) -> u8;

/// Leave the white die dark
pub const fn no_white(_color: Rgb) -> u8 {
    0
}

/// Use the part of the color shared by all three channels
pub fn min_white(color: Rgb) -> u8 {
    color.r.min(color.g).min(color.b)
}

/// Rec.601 luma, integer approximation (77/150/29 out of 256)
#[allow(clippy::cast_possible_truncation)]
pub fn luma_white(color: Rgb) -> u8 {
    let luma = u16::from(color.r) * 77 + u16::from(color.g) * 150 + u16::from(color.b) * 29;
    (luma >> 8) as u8
}
