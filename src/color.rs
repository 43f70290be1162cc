use std::collections::BTreeMap;

use eframe::egui::{self, Color32};
use palette::{Hsl, IntoColor, Srgb};

use crate::config::ThemeConfig;
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the values of one category column to distinct colours, so the same
/// owner or type keeps its colour across every chart.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given column from its category values.
    pub fn new(column: &str, values: &[CellValue]) -> Self {
        let palette = generate_palette(values.len());
        let mapping = values.iter().cloned().zip(palette).collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Theme: user-picked background and font colours
// ---------------------------------------------------------------------------

/// Parse `#RRGGBB` (leading `#` optional).
pub fn parse_hex_color(s: &str) -> Option<Color32> {
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Purely cosmetic; has no effect on the data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color32,
    pub font: Color32,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::WHITE,
            font: Color32::BLACK,
        }
    }
}

impl Theme {
    pub fn from_config(config: &ThemeConfig) -> Self {
        let fallback = Theme::default();
        Self {
            background: parse_hex_color(&config.background).unwrap_or(fallback.background),
            font: parse_hex_color(&config.font).unwrap_or(fallback.font),
        }
    }

    /// Push the colours into egui's style.
    pub fn apply(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        style.visuals.panel_fill = self.background;
        style.visuals.window_fill = self.background;
        style.visuals.extreme_bg_color = self.background;
        style.visuals.override_text_color = Some(self.font);
        ctx.set_style(style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex_color("#FF8000"), Some(Color32::from_rgb(255, 128, 0)));
        assert_eq!(parse_hex_color("00ff00"), Some(Color32::from_rgb(0, 255, 0)));
        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn color_map_is_stable_per_value() {
        let values = vec![CellValue::Text("Park".into()), CellValue::Text("Museum".into())];
        let map = ColorMap::new("type", &values);
        assert_ne!(map.color_for(&values[0]), map.color_for(&values[1]));
        assert_eq!(map.color_for(&CellValue::Text("Beach".into())), Color32::GRAY);
    }

    #[test]
    fn theme_falls_back_on_bad_colors() {
        let theme = Theme::from_config(&ThemeConfig {
            background: "nope".into(),
            font: "#112233".into(),
        });
        assert_eq!(theme.background, Color32::WHITE);
        assert_eq!(theme.font, Color32::from_rgb(0x11, 0x22, 0x33));
    }
}
