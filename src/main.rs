// Copyright (c) 2026 rezky_nightky

mod clock;
mod config;
mod display;
mod font;
mod framebuffer;
mod rain;
mod shadow;
mod terminal;

use std::thread;
use std::time::{Duration, Instant};

use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyCode, KeyEventKind};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::clock::SystemClock;
use crate::config::{clap_styles, color_enabled_stdout, Args};
use crate::rain::Rain;
use crate::terminal::{restore_terminal_best_effort, Terminal};

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("OLEDRAIN_BUILD")
}

fn require_u16_range(name: &str, v: u16, min: u16, max: u16) -> u16 {
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() {
        eprintln!("failed to apply {} {} (must be a finite number)", name, v);
        std::process::exit(1);
    }
    if v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let mut cmd = Args::command();
    cmd = cmd.styles(clap_styles());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);

    let matches = cmd.get_matches();
    let args = Args::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let width = require_u16_range("--width", args.width, 8, 1024);
    let height = require_u16_range("--height", args.height, 8, 1024);

    let duration_s = args.duration.and_then(|s| {
        if !s.is_finite() {
            eprintln!("failed to apply --duration {} (must be a finite number)", s);
            std::process::exit(1);
        }
        if s <= 0.0 {
            return None;
        }
        Some(require_f64_range("--duration", s, 0.1, 86400.0))
    });

    // One process-wide random source, seeded from OS entropy unless a
    // reproducible run was requested.
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut term = Terminal::new(width, height)?;
    let mut clock = SystemClock::new();
    let mut rain = Rain::new(height, width, rng, &mut clock);

    let start_time = Instant::now();
    let end_time = duration_s.map(|s| start_time + Duration::from_secs_f64(s));

    let mut running = true;
    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }

        while Terminal::poll_event(Duration::from_millis(0))? {
            match Terminal::read_event()? {
                Event::Resize(nw, nh) => term.handle_resize(nw, nh)?,
                Event::Key(k) if k.kind == KeyEventKind::Press => {
                    if args.screensaver {
                        running = false;
                        break;
                    }
                    match k.code {
                        KeyCode::Esc | KeyCode::Char('q') => running = false,
                        KeyCode::Char(' ') => rain.reset(),
                        _ => {}
                    }
                }
                _ => {}
            }
        }

        if !running {
            break;
        }

        rain.update(&mut term, &mut clock)?;

        // Yield between ticks; must stay below the 1000/60 ms frame
        // interval or the gate would skip frames.
        thread::sleep(Duration::from_millis(4));
    }

    Ok(())
}
