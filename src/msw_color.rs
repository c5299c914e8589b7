use std::sync::OnceLock;

use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Color depth the terminal can display
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Depth {
    TrueColor,
    Ansi256,
    Basic,
}

impl Depth {
    /// Detected once per process from stdout's capabilities
    pub fn detect() -> Depth {
        static DEPTH: OnceLock<Depth> = OnceLock::new();
        *DEPTH.get_or_init(|| {
            let support = ColorSupport::stdout();
            if support.has_16m {
                Depth::TrueColor
            } else if support.has_256 {
                Depth::Ansi256
            } else {
                Depth::Basic
            }
        })
    }
}

/// Extends Ratatui's Color so the 16 ANSI colors look the same on every terminal.
pub trait TermMatch {
    fn term_match(self) -> Color;
}

impl TermMatch for Color {
    fn term_match(self) -> Color {
        match_depth(self, Depth::detect())
    }
}

/// Map an ANSI color onto the Windows Terminal "Campbell" scheme at the given depth.
/// Custom RGB and indexed colors pass through unchanged.
pub fn match_depth(color: Color, depth: Depth) -> Color {
    // ((R, G, B), ANSI_256_Index)
    let mapping = match color {
        Color::Black => Some(((12, 12, 12), 232)),
        Color::Red => Some(((197, 15, 31), 160)),
        Color::Green => Some(((19, 161, 14), 28)),
        Color::Yellow => Some(((193, 156, 0), 178)),
        Color::Blue => Some(((0, 55, 218), 20)),
        Color::Magenta => Some(((136, 23, 152), 90)),
        Color::Cyan => Some(((58, 150, 221), 38)),
        Color::Gray => Some(((204, 204, 204), 250)),
        Color::DarkGray => Some(((118, 118, 118), 243)),
        Color::LightRed => Some(((231, 72, 86), 203)),
        Color::LightGreen => Some(((22, 198, 12), 46)),
        Color::LightYellow => Some(((249, 241, 165), 229)),
        Color::LightBlue => Some(((59, 120, 255), 63)),
        Color::LightMagenta => Some(((180, 0, 158), 163)),
        Color::LightCyan => Some(((97, 214, 214), 116)),
        Color::White => Some(((242, 242, 242), 255)),
        _ => None,
    };

    match (mapping, depth) {
        (Some(((r, g, b), _)), Depth::TrueColor) => Color::Rgb(r, g, b),
        (Some((_, index)), Depth::Ansi256) => Color::Indexed(index),
        _ => color,
    }
}

/// Classic per-count colors for revealed numbers 1-8
pub fn number_color(count: u8) -> Color {
    let base = match count {
        1 => Color::LightBlue,
        2 => Color::Green,
        3 => Color::LightRed,
        4 => Color::Blue,
        5 => Color::Red,
        6 => Color::Cyan,
        7 => Color::Magenta,
        _ => Color::White,
    };
    base.term_match()
}
