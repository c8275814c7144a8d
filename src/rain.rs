// Copyright (c) 2026 rezky_nightky

use std::io::Result;

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
};

use crate::clock::{elapsed_millis, Clock};
use crate::display::{DisplayDriver, PixelColor};
use crate::shadow::Shadow;

/// Glyph cell metrics: 6x8 pixels, spacing of `width / 3` between columns.
pub const GLYPH_HEIGHT: i32 = 8;
pub const GLYPH_WIDTH: i32 = 6;

const ANIMATION_FPS: u32 = 60;
const FRAME_INTERVAL_MS: u32 = 1000 / ANIMATION_FPS;
const VISIBILITY_PERIOD_MS: u32 = 1000;

/// Printable code range assigned to grid cells: `'!'..='}'`.
const CODE_LOW: u8 = 33;
const CODE_HIGH: u8 = 126; // exclusive

const SPEED_LOW: i32 = 40;
const SPEED_HIGH: i32 = 80; // exclusive, pixels per second

/// The rain animator: a rows x columns grid of printable symbols plus one
/// falling shadow per column. Erasing each shadow's band over the freshly
/// drawn grid is what produces the trailing-rain illusion.
///
/// All mutable state lives on this struct (including the idle-check
/// timestamp and the RNG), so a fixed seed and an injected clock make the
/// whole simulation deterministic.
pub struct Rain {
    display_height: i32,
    display_width: i32,

    num_rows: usize,
    num_columns: usize,
    column_spacing: i32,

    /// Flat `num_rows * num_columns` grid, row-major.
    characters: Vec<u8>,
    shadows: Vec<Shadow>,

    last_frame_time: u32,
    last_visibility_check: u32,

    rng: StdRng,
    rand_code: Uniform<u8>,
    rand_length: Uniform<i32>,
    rand_speed: Uniform<i32>,
}

impl Rain {
    /// Build an animator for a `width x height` pixel panel.
    ///
    /// Panels smaller than one glyph cell are degenerate; row and column
    /// counts clamp to 1 and the length range collapses to a single value,
    /// but indices stay in bounds by construction.
    pub fn new(height: u16, width: u16, rng: StdRng, clock: &mut impl Clock) -> Self {
        let display_height = height as i32;
        let display_width = width as i32;

        let column_spacing = GLYPH_WIDTH / 3;
        let num_rows = (display_height / GLYPH_HEIGHT).max(1) as usize;
        let num_columns = (display_width / (GLYPH_WIDTH + column_spacing)).max(1) as usize;

        let length_high = ((display_height as f32 * 0.9) as i32).max(GLYPH_HEIGHT + 1);

        let now = clock.now_millis();
        let mut rain = Self {
            display_height,
            display_width,
            num_rows,
            num_columns,
            column_spacing,
            characters: vec![0; num_rows * num_columns],
            shadows: (0..num_columns as u16).map(Shadow::new).collect(),
            last_frame_time: now,
            last_visibility_check: now,
            rng,
            rand_code: Uniform::new(CODE_LOW, CODE_HIGH).expect("valid range"),
            rand_length: Uniform::new(GLYPH_HEIGHT, length_high).expect("valid range"),
            rand_speed: Uniform::new(SPEED_LOW, SPEED_HIGH).expect("valid range"),
        };
        rain.reset();
        rain
    }

    /// Re-randomize the whole grid and restart every shadow above the
    /// panel, staggered by `column % 3` so columns never fall in lockstep.
    pub fn reset(&mut self) {
        for cell in &mut self.characters {
            *cell = self.rand_code.sample(&mut self.rng);
        }

        for shadow in &mut self.shadows {
            shadow.length = self.rand_length.sample(&mut self.rng);

            shadow.pos_y = match shadow.col % 3 {
                0 => -shadow.length + GLYPH_HEIGHT,
                1 => -shadow.length,
                _ => -shadow.length - GLYPH_HEIGHT * 2,
            };

            shadow.speed = self.rand_speed.sample(&mut self.rng);
            shadow.reset_requested = false;
            shadow.position_accumulator = 0.0;
            shadow.last_char_change_pos = shadow.pos_y;
        }
    }

    /// One animation tick. Gated to the target frame rate: if fewer than
    /// `1000 / 60` ms elapsed on the (wrapping) clock, nothing changes and
    /// control returns immediately.
    pub fn update<D: DisplayDriver>(
        &mut self,
        display: &mut D,
        clock: &mut impl Clock,
    ) -> Result<()> {
        let now = clock.now_millis();
        let elapsed = elapsed_millis(self.last_frame_time, now);

        if elapsed < FRAME_INTERVAL_MS {
            return Ok(());
        }

        display.clear()?;

        self.check_shadow_visibility(now);
        self.reset_marked_shadows();
        self.draw_characters(display)?;
        self.update_shadows(display, elapsed)?;

        display.present()?;
        self.last_frame_time = now;
        Ok(())
    }

    fn draw_characters<D: DisplayDriver>(&self, display: &mut D) -> Result<()> {
        let stride = GLYPH_WIDTH + self.column_spacing;
        for row in 0..self.num_rows {
            for col in 0..self.num_columns {
                let x = col as i32 * stride;
                let y = row as i32 * GLYPH_HEIGHT;
                let code = self.characters[row * self.num_columns + col];
                display.draw_glyph(x, y, code, PixelColor::On, PixelColor::Off, 1, 1)?;
            }
        }
        Ok(())
    }

    /// At most once per second: if the whole field is empty (no shadow
    /// within twice its length of the panel), flag every even column for a
    /// restart so the animation can never stay blank. Odd columns are left
    /// alone on purpose; half the field restarting is enough and keeps the
    /// re-entry ragged.
    fn check_shadow_visibility(&mut self, now: u32) {
        if elapsed_millis(self.last_visibility_check, now) <= VISIBILITY_PERIOD_MS {
            return;
        }

        let any_visible = self.shadows.iter().any(|s| s.is_near_screen());

        if !any_visible {
            for shadow in self.shadows.iter_mut().step_by(2) {
                shadow.reset_requested = true;
            }
        }

        self.last_visibility_check = now;
    }

    /// Service `reset_requested` slots: fresh length and speed from the
    /// construction-time ranges, restarted just above the panel.
    fn reset_marked_shadows(&mut self) {
        for shadow in &mut self.shadows {
            if !shadow.reset_requested {
                continue;
            }

            shadow.length = self.rand_length.sample(&mut self.rng);
            shadow.pos_y = -shadow.length;
            shadow.speed = self.rand_speed.sample(&mut self.rng);
            shadow.reset_requested = false;
            shadow.position_accumulator = 0.0;
            shadow.last_char_change_pos = shadow.pos_y;
        }
    }

    fn update_shadows<D: DisplayDriver>(&mut self, display: &mut D, elapsed_ms: u32) -> Result<()> {
        let dt_seconds = elapsed_ms as f32 / 1000.0;

        for idx in 0..self.shadows.len() {
            self.shadows[idx].advance(dt_seconds, self.display_height);
            self.draw_shadow_and_update_chars(display, idx)?;
        }
        Ok(())
    }

    /// Erase the visible part of one shadow's band and re-randomize every
    /// grid row whose top edge the leading edge has newly crossed since
    /// the previous tick.
    fn draw_shadow_and_update_chars<D: DisplayDriver>(
        &mut self,
        display: &mut D,
        idx: usize,
    ) -> Result<()> {
        let (col, top, bottom) = {
            let s = &self.shadows[idx];
            (s.col as i32, s.pos_y, s.pos_y + s.length)
        };

        // Fully above or fully below the panel: nothing to erase yet.
        if bottom < 0 || top >= self.display_height {
            return Ok(());
        }

        let col_start = col * (GLYPH_WIDTH + self.column_spacing);
        let col_end = (col_start + GLYPH_WIDTH).min(self.display_width);
        let start_row = top.max(0);
        let end_row = bottom.min(self.display_height);

        for y in start_row..end_row {
            for x in col_start..col_end {
                display.draw_pixel(x, y, PixelColor::Off)?;
            }
        }

        let char_row_start = (start_row / GLYPH_HEIGHT) as usize;
        let char_row_end = (((end_row - 1) / GLYPH_HEIGHT + 1) as usize).min(self.num_rows);

        let last_change = self.shadows[idx].last_char_change_pos;
        for char_row in char_row_start..char_row_end {
            let char_row_y = char_row as i32 * GLYPH_HEIGHT;

            // The leading edge entered this row since the last check.
            if last_change < char_row_y && top >= char_row_y {
                let code = self.rand_code.sample(&mut self.rng);
                self.characters[char_row * self.num_columns + col as usize] = code;
            }
        }

        let shadow = &mut self.shadows[idx];
        if top > shadow.last_char_change_pos {
            shadow.last_char_change_pos = top;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::clock::ManualClock;
    use crate::framebuffer::Framebuffer;

    const WIDTH: u16 = 128;
    const HEIGHT: u16 = 64;

    fn make_rain(clock: &mut ManualClock) -> Rain {
        Rain::new(HEIGHT, WIDTH, StdRng::seed_from_u64(0x1234567), clock)
    }

    #[test]
    fn grid_dimensions_follow_glyph_metrics() {
        let mut clock = ManualClock::at(0);
        let rain = make_rain(&mut clock);
        assert_eq!(rain.num_rows, 8);
        assert_eq!(rain.num_columns, 16);
        assert_eq!(rain.column_spacing, 2);
    }

    #[test]
    fn degenerate_panels_clamp_to_one_cell() {
        let mut clock = ManualClock::at(0);
        let rain = Rain::new(4, 4, StdRng::seed_from_u64(1), &mut clock);
        assert_eq!(rain.num_rows, 1);
        assert_eq!(rain.num_columns, 1);
    }

    #[test]
    fn reset_draws_lengths_and_speeds_from_documented_ranges() {
        let mut clock = ManualClock::at(0);
        let rain = make_rain(&mut clock);
        let length_high = (HEIGHT as f32 * 0.9) as i32;

        for shadow in &rain.shadows {
            assert!(shadow.length >= GLYPH_HEIGHT && shadow.length < length_high);
            assert!(shadow.speed >= SPEED_LOW && shadow.speed < SPEED_HIGH);
            assert!(!shadow.reset_requested);
            assert_eq!(shadow.position_accumulator, 0.0);
            assert_eq!(shadow.last_char_change_pos, shadow.pos_y);
        }

        for &code in &rain.characters {
            assert!((CODE_LOW..CODE_HIGH).contains(&code));
        }
    }

    #[test]
    fn reset_staggers_start_positions_by_column_group() {
        let mut clock = ManualClock::at(0);
        let rain = make_rain(&mut clock);

        for shadow in &rain.shadows {
            let expected = match shadow.col % 3 {
                0 => -shadow.length + GLYPH_HEIGHT,
                1 => -shadow.length,
                _ => -shadow.length - GLYPH_HEIGHT * 2,
            };
            assert_eq!(shadow.pos_y, expected, "column {}", shadow.col);
        }
    }

    #[test]
    fn update_within_frame_interval_changes_nothing() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);

        clock.advance(20);
        rain.update(&mut fb, &mut clock).unwrap();

        let chars_before = rain.characters.clone();
        let positions_before: Vec<i32> = rain.shadows.iter().map(|s| s.pos_y).collect();
        let accumulators_before: Vec<f32> = rain
            .shadows
            .iter()
            .map(|s| s.position_accumulator)
            .collect();

        clock.advance(FRAME_INTERVAL_MS - 1);
        rain.update(&mut fb, &mut clock).unwrap();

        assert_eq!(rain.characters, chars_before);
        let positions_after: Vec<i32> = rain.shadows.iter().map(|s| s.pos_y).collect();
        let accumulators_after: Vec<f32> = rain
            .shadows
            .iter()
            .map(|s| s.position_accumulator)
            .collect();
        assert_eq!(positions_after, positions_before);
        assert_eq!(accumulators_after, accumulators_before);
    }

    #[test]
    fn update_accepts_frame_across_clock_wraparound() {
        let mut clock = ManualClock::at(u32::MAX - 5);
        let mut rain = make_rain(&mut clock);

        // 15 ms elapsed across the wrap: still gated.
        clock.now = 9;
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);
        rain.update(&mut fb, &mut clock).unwrap();
        assert_eq!(rain.last_frame_time, u32::MAX - 5);

        // 16 ms elapsed: accepted, timestamp moves forward.
        clock.now = 10;
        rain.update(&mut fb, &mut clock).unwrap();
        assert_eq!(rain.last_frame_time, 10);
    }

    #[test]
    fn accepted_update_renders_glyphs_into_the_framebuffer() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);

        clock.advance(17);
        rain.update(&mut fb, &mut clock).unwrap();
        assert!(fb.lit_count() > 0);
    }

    #[test]
    fn leading_edge_position_is_monotonic_between_resets() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);

        // Short run, far from both the bottom edge and the 1 s idle check,
        // so no slot resets in between.
        let mut previous: Vec<i32> = rain
            .shadows
            .iter()
            .map(|s| s.last_char_change_pos)
            .collect();

        for _ in 0..10 {
            clock.advance(17);
            rain.update(&mut fb, &mut clock).unwrap();
            for (shadow, prev) in rain.shadows.iter().zip(&previous) {
                assert!(shadow.last_char_change_pos >= *prev);
            }
            previous = rain
                .shadows
                .iter()
                .map(|s| s.last_char_change_pos)
                .collect();
        }
    }

    #[test]
    fn bottom_exit_marks_shadow_for_reset() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);

        rain.shadows[3].pos_y = HEIGHT as i32 - 1;
        rain.shadows[3].speed = 60;
        rain.shadows[3].position_accumulator = 0.5;

        clock.advance(17);
        rain.update(&mut fb, &mut clock).unwrap();
        assert!(rain.shadows[3].pos_y >= HEIGHT as i32);
        assert!(rain.shadows[3].reset_requested);

        // Servicing restarts the slot just above the panel.
        rain.reset_marked_shadows();
        assert!(!rain.shadows[3].reset_requested);
        assert_eq!(rain.shadows[3].pos_y, -rain.shadows[3].length);
        assert_eq!(rain.shadows[3].position_accumulator, 0.0);
        assert_eq!(
            rain.shadows[3].last_char_change_pos,
            rain.shadows[3].pos_y
        );
    }

    #[test]
    fn empty_field_forces_reset_of_even_columns_only() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);

        for shadow in &mut rain.shadows {
            shadow.pos_y = -(shadow.length * 2);
        }

        rain.check_shadow_visibility(1001);

        // Deliberate half-reset: odd columns stay stale.
        for shadow in &rain.shadows {
            if shadow.col % 2 == 0 {
                assert!(shadow.reset_requested, "even column {}", shadow.col);
            } else {
                assert!(!shadow.reset_requested, "odd column {}", shadow.col);
            }
        }
    }

    #[test]
    fn visibility_check_is_rate_limited_to_one_second() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);

        for shadow in &mut rain.shadows {
            shadow.pos_y = -(shadow.length * 2);
        }

        rain.check_shadow_visibility(1000);
        assert!(rain.shadows.iter().all(|s| !s.reset_requested));

        rain.check_shadow_visibility(1001);
        assert!(rain.shadows[0].reset_requested);
    }

    #[test]
    fn visible_field_does_not_trigger_forced_reset() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);

        for shadow in &mut rain.shadows {
            shadow.pos_y = -(shadow.length * 2);
        }
        // One band near the panel keeps the whole field alive.
        rain.shadows[5].pos_y = 0;

        rain.check_shadow_visibility(1001);
        assert!(rain.shadows.iter().all(|s| !s.reset_requested));
    }

    #[test]
    fn symbol_refresh_fires_exactly_on_row_boundary_crossing() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);

        let col = 4usize;
        let row = 2usize;
        let row_y = row as i32 * GLYPH_HEIGHT;

        // Leading edge just below the row's top pixel, not yet registered.
        rain.shadows[col].pos_y = row_y;
        rain.shadows[col].length = 12;
        rain.shadows[col].last_char_change_pos = row_y - 1;

        // Sentinel outside the printable range marks an untouched cell.
        rain.characters[row * rain.num_columns + col] = 0;

        rain.draw_shadow_and_update_chars(&mut fb, col).unwrap();
        let code = rain.characters[row * rain.num_columns + col];
        assert!((CODE_LOW..CODE_HIGH).contains(&code));
        assert_eq!(rain.shadows[col].last_char_change_pos, row_y);

        // Same position again: the row must not re-trigger.
        rain.characters[row * rain.num_columns + col] = 0;
        rain.draw_shadow_and_update_chars(&mut fb, col).unwrap();
        assert_eq!(rain.characters[row * rain.num_columns + col], 0);
    }

    #[test]
    fn shadow_band_erases_pixels_within_its_column() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);
        fb.fill(PixelColor::On);

        let col = 2usize;
        rain.shadows[col].pos_y = 10;
        rain.shadows[col].length = 20;
        rain.shadows[col].last_char_change_pos = 40; // suppress refreshes

        rain.draw_shadow_and_update_chars(&mut fb, col).unwrap();

        let x0 = col as i32 * (GLYPH_WIDTH + rain.column_spacing);
        for y in 10..30 {
            for x in x0..x0 + GLYPH_WIDTH {
                assert!(!fb.pixel(x, y));
            }
        }
        // Spacing column and the rows above the band stay lit.
        assert!(fb.pixel(x0 + GLYPH_WIDTH, 10));
        assert!(fb.pixel(x0, 9));
        assert!(fb.pixel(x0, 30));
    }

    #[test]
    fn offscreen_bands_are_skipped_entirely() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);
        let mut fb = Framebuffer::new(WIDTH, HEIGHT);
        fb.fill(PixelColor::On);

        rain.shadows[0].pos_y = -50;
        rain.shadows[0].length = 20;
        rain.draw_shadow_and_update_chars(&mut fb, 0).unwrap();

        rain.shadows[1].pos_y = HEIGHT as i32;
        rain.shadows[1].length = 20;
        rain.draw_shadow_and_update_chars(&mut fb, 1).unwrap();

        assert_eq!(fb.lit_count(), WIDTH as usize * HEIGHT as usize);
    }

    #[test]
    fn full_reset_clears_pending_flags() {
        let mut clock = ManualClock::at(0);
        let mut rain = make_rain(&mut clock);

        rain.shadows[0].reset_requested = true;
        rain.reset();
        assert!(rain.shadows.iter().all(|s| !s.reset_requested));
    }
}
