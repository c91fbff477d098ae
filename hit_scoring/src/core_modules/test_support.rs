// Synthetic frame builders shared by the unit tests.

use crate::core_modules::frame::frame::Frame;
use crate::core_modules::pixel::pixel::Pixel;

pub const BACKGROUND: Pixel = Pixel {
    red: 0,
    green: 0,
    blue: 0,
    alpha: 255,
};

pub const TARGET_RED: Pixel = Pixel {
    red: 220,
    green: 20,
    blue: 20,
    alpha: 255,
};

pub const FLASH: Pixel = Pixel {
    red: 255,
    green: 255,
    blue: 255,
    alpha: 255,
};

pub fn blank_frame(width: u32, height: u32) -> Frame {
    Frame::filled(width, height, BACKGROUND).expect("non-zero test frame")
}

/// Paints the half-open rectangle `[x0, x0 + w) x [y0, y0 + h)`.
pub fn paint_rect(frame: &mut Frame, x0: u32, y0: u32, w: u32, h: u32, pixel: Pixel) {
    for y in y0..(y0 + h).min(frame.height()) {
        for x in x0..(x0 + w).min(frame.width()) {
            frame.set_pixel(x, y, pixel);
        }
    }
}
