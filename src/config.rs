// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;

use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::Parser;

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Green))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

/// Host-side knobs only. The animation itself runs on fixed constants
/// (6x8 glyph cells, 60 fps gate, 33..=125 symbol codes); what the CLI
/// picks is the simulated panel, the seed, and how the session ends.
#[derive(Parser, Debug, Clone)]
#[command(name = "oledrain", version)]
pub struct Args {
    #[arg(
        short = 'W',
        long = "width",
        default_value_t = 128,
        help_heading = "PANEL",
        help = "Panel width in pixels (min 8 max 1024)"
    )]
    pub width: u16,

    #[arg(
        short = 'H',
        long = "height",
        default_value_t = 64,
        help_heading = "PANEL",
        help = "Panel height in pixels (min 8 max 1024)"
    )]
    pub height: u16,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random source for a reproducible run (default: OS entropy)"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400; <=0 disables)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Screensaver mode (exit on any keypress)"
    )]
    pub screensaver: bool,

    #[arg(long = "info", help_heading = "HELP", help = "Show build information")]
    pub info: bool,
}
