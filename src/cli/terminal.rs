//! Terminal output styling

use owo_colors::{OwoColorize, colors::css};

/// Whether stdout supports coloured output
fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// How a piece of output should stand out
#[derive(Debug, Clone, Copy)]
pub enum Tone {
    /// Green
    Success,
    /// Amber
    Warning,
    /// Blue
    Info,
    Dim,
}

impl Tone {
    /// Styles `text`, or returns it unchanged when colour is unsupported.
    pub fn paint(self, text: &str) -> String {
        if !supports_color() {
            return text.to_string();
        }
        match self {
            Self::Success => text.fg::<css::Green>().to_string(),
            Self::Warning => text.fg::<css::Orange>().to_string(),
            Self::Info => text.fg::<css::LightBlue>().to_string(),
            Self::Dim => text.dimmed().to_string(),
        }
    }
}
