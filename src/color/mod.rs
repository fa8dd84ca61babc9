mod white;

use smart_leds::{RGB8, RGBW, White};

pub use white::{WhitePolicy, luma_white, min_white, no_white};

pub type Rgb = RGB8;
pub type Rgbw = RGBW<u8>;

/// Fully dark pixel
pub const BLACK: Rgbw = rgbw(0, 0, 0, 0);

/// Create an RGBW color from its four channels
pub const fn rgbw(r: u8, g: u8, b: u8, w: u8) -> Rgbw {
    Rgbw {
        r,
        g,
        b,
        a: White(w),
    }
}

/// Extend an RGB color with a white channel derived by `policy`
#[inline]
pub fn with_white(rgb: Rgb, policy: WhitePolicy) -> Rgbw {
    rgbw(rgb.r, rgb.g, rgb.b, policy(rgb))
}

/// White channel of an RGBW color
#[inline]
pub const fn white_of(color: Rgbw) -> u8 {
    color.a.0
}
