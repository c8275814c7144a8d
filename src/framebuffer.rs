// Copyright (c) 2026 rezky_nightky

use std::io::Result;

use crate::display::{DisplayDriver, PixelColor};
use crate::font;

/// Packed 1-bit framebuffer, row-major, 8 pixels per byte (MSB leftmost).
///
/// This is the in-memory image of a monochrome panel. It implements
/// `DisplayDriver` with a no-op `present`, which also makes it the display
/// double used by the animator tests.
#[derive(Clone, Debug)]
pub struct Framebuffer {
    width: i32,
    height: i32,
    pitch: usize,
    bits: Vec<u8>,
}

impl Framebuffer {
    pub fn new(width: u16, height: u16) -> Self {
        let width = width as i32;
        let height = height as i32;
        let pitch = (width as usize).div_ceil(8);
        Self {
            width,
            height,
            pitch,
            bits: vec![0u8; pitch * height as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn fill(&mut self, color: PixelColor) {
        let byte = if color.is_on() { 0xFF } else { 0x00 };
        self.bits.fill(byte);
    }

    /// Pixel state at `(x, y)`; out-of-range reads as off.
    pub fn pixel(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        let idx = y as usize * self.pitch + (x as usize) / 8;
        let mask = 0x80u8 >> (x as usize % 8);
        self.bits[idx] & mask != 0
    }

    /// Set or clear one pixel. Out-of-range writes clip silently.
    pub fn plot(&mut self, x: i32, y: i32, color: PixelColor) {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return;
        }
        let idx = y as usize * self.pitch + (x as usize) / 8;
        let mask = 0x80u8 >> (x as usize % 8);
        if color.is_on() {
            self.bits[idx] |= mask;
        } else {
            self.bits[idx] &= !mask;
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: PixelColor) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.plot(xx, yy, color);
            }
        }
    }

    /// Number of lit pixels.
    #[allow(dead_code)]
    pub fn lit_count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }
}

impl DisplayDriver for Framebuffer {
    fn clear(&mut self) -> Result<()> {
        self.fill(PixelColor::Off);
        Ok(())
    }

    fn draw_glyph(
        &mut self,
        x: i32,
        y: i32,
        code: u8,
        fg: PixelColor,
        bg: PixelColor,
        scale_x: i32,
        scale_y: i32,
    ) -> Result<()> {
        let columns = font::glyph(code);
        let sx = scale_x.max(1);
        let sy = scale_y.max(1);

        // Five data columns plus one blank spacing column; the font leaves
        // bit 7 clear so row 7 always paints background.
        for i in 0..=font::GLYPH_COLUMNS as i32 {
            let line = if i == font::GLYPH_COLUMNS as i32 {
                0
            } else {
                columns[i as usize]
            };
            for j in 0..8 {
                let color = if line & (1 << j) != 0 { fg } else { bg };
                if sx == 1 && sy == 1 {
                    self.plot(x + i, y + j, color);
                } else {
                    self.fill_rect(x + i * sx, y + j * sy, sx, sy, color);
                }
            }
        }
        Ok(())
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: PixelColor) -> Result<()> {
        self.plot(x, y, color);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_and_read_back_round_trip() {
        let mut fb = Framebuffer::new(16, 8);
        fb.plot(0, 0, PixelColor::On);
        fb.plot(15, 7, PixelColor::On);
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(15, 7));
        assert!(!fb.pixel(1, 0));

        fb.plot(0, 0, PixelColor::Off);
        assert!(!fb.pixel(0, 0));
    }

    #[test]
    fn out_of_range_writes_clip() {
        let mut fb = Framebuffer::new(8, 8);
        fb.plot(-1, 0, PixelColor::On);
        fb.plot(8, 0, PixelColor::On);
        fb.plot(0, 8, PixelColor::On);
        assert_eq!(fb.lit_count(), 0);
        assert!(!fb.pixel(-1, -1));
    }

    #[test]
    fn clear_blanks_everything() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill(PixelColor::On);
        assert_eq!(fb.lit_count(), 64);
        fb.clear().unwrap();
        assert_eq!(fb.lit_count(), 0);
    }

    #[test]
    fn glyph_blit_paints_foreground_and_background() {
        let mut fb = Framebuffer::new(8, 8);
        fb.fill(PixelColor::On);
        // '!' is a single lit column (0x5F at column 2).
        fb.draw_glyph(0, 0, b'!', PixelColor::On, PixelColor::Off, 1, 1)
            .unwrap();

        assert!(fb.pixel(2, 0));
        assert!(fb.pixel(2, 4));
        assert!(!fb.pixel(2, 5)); // gap before the dot
        assert!(fb.pixel(2, 6));
        // Background must have been painted over the previously lit cell.
        assert!(!fb.pixel(0, 0));
        assert!(!fb.pixel(5, 7)); // spacing column
        // Pixels outside the 6x8 cell stay untouched.
        assert!(fb.pixel(6, 0));
    }

    #[test]
    fn glyph_blit_honors_integer_scale() {
        let mut fb = Framebuffer::new(16, 16);
        fb.draw_glyph(0, 0, b'!', PixelColor::On, PixelColor::Off, 2, 2)
            .unwrap();
        assert!(fb.pixel(4, 0));
        assert!(fb.pixel(5, 1));
        assert!(!fb.pixel(6, 0));
    }
}
