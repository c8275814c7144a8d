// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Error, Result, Stdout, Write};

use crossterm::{cursor, event, style::Print, terminal, ExecutableCommand, QueueableCommand};

use crate::display::{DisplayDriver, PixelColor};
use crate::framebuffer::Framebuffer;

/// Terminal-backed display driver for the 1-bit panel.
///
/// Draw calls land in an in-memory `Framebuffer`; `present` maps every two
/// pixel rows onto one half-block character cell and rewrites only the
/// cells that changed since the previous frame.
pub struct Terminal {
    stdout: Stdout,
    fb: Framebuffer,
    cell_cols: u16,
    cell_rows: u16,
    origin_x: u16,
    origin_y: u16,
    last: Option<Vec<char>>,
    run_buf: String,
}

fn half_block(top: bool, bottom: bool) -> char {
    match (top, bottom) {
        (true, true) => '█',
        (true, false) => '▀',
        (false, true) => '▄',
        (false, false) => ' ',
    }
}

fn center_origin(panel: u16, term: u16) -> u16 {
    term.saturating_sub(panel) / 2
}

impl Terminal {
    /// Enter raw mode and the alternate screen. Fails (with the terminal
    /// restored) when the window cannot fit the panel; the caller refuses
    /// to proceed in that case.
    pub fn new(width: u16, height: u16) -> Result<Self> {
        let cell_cols = width;
        let cell_rows = height.div_ceil(2);

        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<(u16, u16)> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;

            let (tw, th) = terminal::size()?;
            if tw < cell_cols || th < cell_rows {
                return Err(Error::other(format!(
                    "terminal {}x{} cells cannot fit the {}x{} pixel panel ({}x{} cells)",
                    tw, th, width, height, cell_cols, cell_rows
                )));
            }
            Ok((tw, th))
        })();

        let (tw, th) = match init_res {
            Ok(size) => size,
            Err(e) => {
                let _ = out.execute(cursor::Show);
                let _ = out.execute(terminal::EnableLineWrap);
                let _ = out.execute(terminal::LeaveAlternateScreen);
                let _ = terminal::disable_raw_mode();
                let _ = out.flush();
                return Err(e);
            }
        };

        Ok(Self {
            stdout: out,
            fb: Framebuffer::new(width, height),
            cell_cols,
            cell_rows,
            origin_x: center_origin(cell_cols, tw),
            origin_y: center_origin(cell_rows, th),
            last: None,
            run_buf: String::with_capacity(64),
        })
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Recenter the panel after a terminal resize and force a full redraw.
    pub fn handle_resize(&mut self, tw: u16, th: u16) -> Result<()> {
        self.origin_x = center_origin(self.cell_cols, tw);
        self.origin_y = center_origin(self.cell_rows, th);
        self.last = None;
        self.stdout
            .queue(terminal::Clear(terminal::ClearType::All))?;
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let total = self.cell_cols as usize * self.cell_rows as usize;
        let mut cells = Vec::with_capacity(total);
        for cy in 0..self.cell_rows {
            let y = cy as i32 * 2;
            for cx in 0..self.cell_cols {
                let x = cx as i32;
                cells.push(half_block(self.fb.pixel(x, y), self.fb.pixel(x, y + 1)));
            }
        }

        let full_redraw = self
            .last
            .as_ref()
            .map(|l| l.len() != cells.len())
            .unwrap_or(true);

        let width = self.cell_cols as usize;
        let run_buf = &mut self.run_buf;

        for cy in 0..self.cell_rows as usize {
            let row = &cells[cy * width..(cy + 1) * width];
            let last_row = self.last.as_ref().map(|l| &l[cy * width..(cy + 1) * width]);

            let mut cx = 0usize;
            while cx < width {
                let changed =
                    full_redraw || last_row.map(|l| l[cx] != row[cx]).unwrap_or(true);
                if !changed {
                    cx += 1;
                    continue;
                }

                // Batch the contiguous changed span into one Print.
                run_buf.clear();
                let start = cx;
                while cx < width
                    && (full_redraw || last_row.map(|l| l[cx] != row[cx]).unwrap_or(true))
                {
                    run_buf.push(row[cx]);
                    cx += 1;
                }

                self.stdout.queue(cursor::MoveTo(
                    self.origin_x + start as u16,
                    self.origin_y + cy as u16,
                ))?;
                self.stdout.queue(Print(run_buf.as_str()))?;
            }
        }

        self.stdout.flush()?;
        self.last = Some(cells);
        Ok(())
    }
}

impl DisplayDriver for Terminal {
    fn clear(&mut self) -> Result<()> {
        self.fb.clear()
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
        self.fb.draw_glyph(x, y, code, fg, bg, scale_x, scale_y)
    }

    fn draw_pixel(&mut self, x: i32, y: i32, color: PixelColor) -> Result<()> {
        self.fb.draw_pixel(x, y, color)
    }

    fn present(&mut self) -> Result<()> {
        self.render()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.execute(cursor::Show);
        let _ = self.stdout.execute(terminal::EnableLineWrap);
        let _ = self.stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
        let _ = self.stdout.flush();
    }
}

/// Terminal restore for paths that cannot reach the `Terminal` value:
/// panic hook and signal handlers.
pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
