// Copyright (c) 2026 rezky_nightky

use std::io::Result;

/// One-bit pixel value, matching a monochrome panel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelColor {
    Off,
    On,
}

impl PixelColor {
    pub fn is_on(self) -> bool {
        matches!(self, PixelColor::On)
    }
}

/// Capability set of the display collaborator.
///
/// Draw calls are synchronous and side-effect-only; nothing reaches the
/// physical surface until `present`. Coordinates may fall outside the
/// panel, implementations clip.
pub trait DisplayDriver {
    /// Blank the whole frame to the background color.
    fn clear(&mut self) -> Result<()>;

    /// Draw one glyph cell (6x8 including the spacing column) with its
    /// top-left corner at `(x, y)`, magnified by integer factors.
    #[allow(clippy::too_many_arguments)]
    fn draw_glyph(
        &mut self,
        x: i32,
        y: i32,
        code: u8,
        fg: PixelColor,
        bg: PixelColor,
        scale_x: i32,
        scale_y: i32,
    ) -> Result<()>;

    fn draw_pixel(&mut self, x: i32, y: i32, color: PixelColor) -> Result<()>;

    /// Push the composed frame to the surface.
    fn present(&mut self) -> Result<()>;
}
