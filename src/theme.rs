//! Theme colors loaded from Omarchy/Hyprland system theme
//! Reads colors from ~/.config/omarchy/current/theme/kitty.conf

use ratatui::style::Color;
use std::collections::HashMap;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,        // Active borders, author names
    pub accent_bright: Color, // Section markers in logs
    pub danger: Color,        // Errors, too-long selections (color1/red)
    pub warning: Color,       // Warnings (amber)
    pub info: Color,          // TODO log lines (color6/cyan)
    pub success: Color,       // Likeable selection
    pub text: Color,          // Primary text (foreground)
    pub text_dim: Color,      // Dimmed text (color8/bright black)
    pub bg_selected: Color,   // Selected text background
    pub inactive: Color,      // Inactive borders
    pub header: Color,        // Section headers
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired fallback
        Self {
            accent: Color::Rgb(250, 179, 135),
            accent_bright: Color::Rgb(137, 180, 250),
            danger: Color::Rgb(243, 139, 168),
            warning: Color::Rgb(249, 226, 175),
            info: Color::Rgb(137, 220, 235),
            success: Color::Rgb(166, 218, 149),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(243, 139, 168),
        }
    }
}

impl Theme {
    /// Load theme from Omarchy system theme, falling back to defaults
    pub fn load() -> Self {
        dirs::home_dir()
            .map(|home| home.join(".config/omarchy/current/theme/kitty.conf"))
            .and_then(|path| std::fs::read_to_string(path).ok())
            .and_then(|content| Self::from_kitty_conf(&content))
            .unwrap_or_default()
    }

    /// Map a kitty color scheme onto the theme. `None` if it has no colors.
    fn from_kitty_conf(content: &str) -> Option<Self> {
        let colors = Self::parse_kitty_conf(content);
        if colors.is_empty() {
            return None;
        }

        let fallback = Self::default();
        let pick = |keys: &[&str], default: Color| {
            keys.iter()
                .find_map(|k| colors.get(*k))
                .copied()
                .unwrap_or(default)
        };

        let danger = pick(&["color1"], fallback.danger);
        let accent = pick(&["color2", "color10"], fallback.accent);
        Some(Self {
            accent,
            accent_bright: pick(&["color12", "color4"], fallback.accent_bright),
            danger,
            warning: pick(&["color3", "color11"], fallback.warning),
            info: pick(&["color6", "color14"], fallback.info),
            success: accent,
            text: pick(&["foreground"], fallback.text),
            text_dim: pick(&["color8"], fallback.text_dim),
            bg_selected: pick(&["selection_background", "color0"], fallback.bg_selected),
            inactive: pick(&["inactive_border_color", "color8"], fallback.inactive),
            header: danger,
        })
    }

    /// Parse kitty.conf format: `key #hexcolor`, skipping comments
    fn parse_kitty_conf(content: &str) -> HashMap<String, Color> {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(char::is_whitespace))
            .filter_map(|(key, value)| Some((key.to_string(), Self::parse_hex_color(value)?)))
            .collect()
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(s.get(range)?, 16).ok();

        match s.len() {
            6 => Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            3 => Some(Color::Rgb(
                channel(0..1)? * 17,
                channel(1..2)? * 17,
                channel(2..3)? * 17,
            )),
            _ => None,
        }
    }
}
