//! Named colour palettes

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colours of one theme, as `#rrggbb` strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub primary: &'static str,
    pub background: &'static str,
    pub surface: &'static str,
    pub text_primary: &'static str,
}

/// Available themes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
    Blue,
}

impl Theme {
    /// All themes in display order
    pub const ALL: [Theme; 3] = [Theme::Dark, Theme::Light, Theme::Blue];

    /// Parse a theme name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use quillchat::theme::Theme;
    ///
    /// assert_eq!(Theme::parse_str("Blue").unwrap(), Theme::Blue);
    /// assert!(Theme::parse_str("sepia").is_err());
    /// ```
    pub fn parse_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "dark" => Ok(Self::Dark),
            "light" => Ok(Self::Light),
            "blue" => Ok(Self::Blue),
            other => Err(format!(
                "Unknown theme: {}. Must be one of: dark, light, blue",
                other
            )),
        }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Self::Dark => Palette {
                primary: "#6366f1",
                background: "#0f0f1e",
                surface: "#1a1a2e",
                text_primary: "#e5e7eb",
            },
            Self::Light => Palette {
                primary: "#4f46e5",
                background: "#ffffff",
                surface: "#f9fafb",
                text_primary: "#1f2937",
            },
            Self::Blue => Palette {
                primary: "#3b82f6",
                background: "#0a192f",
                surface: "#172a45",
                text_primary: "#ccd6f6",
            },
        }
    }

    /// Paint `text` in this theme's primary colour
    pub fn accent(&self, text: &str) -> ColoredString {
        let (r, g, b) = hex_to_rgb(self.palette().primary).unwrap_or((255, 255, 255));
        text.truecolor(r, g, b)
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dark => write!(f, "dark"),
            Self::Light => write!(f, "light"),
            Self::Blue => write!(f, "blue"),
        }
    }
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some((r, g, b))
}
