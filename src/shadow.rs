// Copyright (c) 2026 rezky_nightky

/// One falling highlight band. Each column owns exactly one `Shadow` slot
/// for the animator's lifetime; "reset" reuses the slot with fresh values.
#[derive(Clone, Debug)]
pub struct Shadow {
    /// Column index, fixed at construction (equals the array index).
    pub col: u16,
    /// Top pixel of the band; negative while still above the panel.
    pub pos_y: i32,
    /// Band length in pixels, always > 0.
    pub length: i32,
    /// Fall speed in pixels per second, always > 0.
    pub speed: i32,
    /// Sub-pixel remainder carried between ticks.
    pub position_accumulator: f32,
    /// How far down the leading edge has already triggered symbol updates.
    pub last_char_change_pos: i32,
    /// Set when the band has fully exited the bottom (or by the idle
    /// detector); serviced before the next render.
    pub reset_requested: bool,
}

impl Shadow {
    pub fn new(col: u16) -> Self {
        Self {
            col,
            pos_y: 0,
            length: 1,
            speed: 1,
            position_accumulator: 0.0,
            last_char_change_pos: 0,
            reset_requested: false,
        }
    }

    /// Integrate motion over `dt_seconds` and flag the slot once the band
    /// has fully left through the bottom edge.
    ///
    /// The accumulator keeps the fractional remainder so that slow bands
    /// still creep at high frame rates, while `speed * dt >= 1` turns into
    /// whole-pixel jumps.
    pub fn advance(&mut self, dt_seconds: f32, display_height: i32) {
        self.position_accumulator += self.speed as f32 * dt_seconds;
        let pixels_to_move = self.position_accumulator as i32;

        if pixels_to_move > 0 {
            self.pos_y += pixels_to_move;
            self.position_accumulator -= pixels_to_move as f32;
        }

        if self.pos_y >= display_height {
            self.reset_requested = true;
        }
    }

    /// Whether any part of the band is near the panel, i.e. inside
    /// `[-2 * length, ..)`. Bands below the bottom get flagged by
    /// `advance` before they could matter here.
    pub fn is_near_screen(&self) -> bool {
        self.pos_y > -(self.length * 2)
    }
}
