use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::error::MarkupError;

/// Default ink for both typing and drawing (`#000f55`)
pub const DEFAULT_INK: Color32 = Color32::from_rgb(0x00, 0x0f, 0x55);

pub const DEFAULT_FONT_FAMILY: &str = "Homemade Apple";

/// Explicit, self-describing style of a run of text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_family: String,
    pub color: Color32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            color: DEFAULT_INK,
            bold: false,
            italic: false,
            underline: false,
        }
    }
}

/// Discrete style changes supplied by the formatting controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleEvent {
    SetFontFamily(String),
    SetColor(Color32),
    ToggleBold,
    ToggleItalic,
    ToggleUnderline,
}

/// The style the next typed character will carry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleState {
    current: TextStyle,
}

impl StyleState {
    pub fn new(style: TextStyle) -> Self {
        Self { current: style }
    }

    pub fn current(&self) -> &TextStyle {
        &self.current
    }

    /// Copy of the current style, for stamping onto a new run
    pub fn snapshot(&self) -> TextStyle {
        self.current.clone()
    }

    /// Returns true when the event changed the style
    pub fn apply(&mut self, event: StyleEvent) -> bool {
        let before = self.current.clone();
        match event {
            StyleEvent::SetFontFamily(family) => self.current.font_family = family,
            StyleEvent::SetColor(color) => self.current.color = canonical_color(color),
            StyleEvent::ToggleBold => self.current.bold = !self.current.bold,
            StyleEvent::ToggleItalic => self.current.italic = !self.current.italic,
            StyleEvent::ToggleUnderline => self.current.underline = !self.current.underline,
        }
        before != self.current
    }
}

/// Unmultiplied channels that [`Color32::from_rgba_unmultiplied`] maps back
/// onto `color` exactly. Colours outside that mapping get the nearest channels.
pub fn unmultiplied_channels(color: Color32) -> [u8; 4] {
    let premultiplied = color.to_array();
    let alpha = premultiplied[3];
    let mut channels = color.to_srgba_unmultiplied();
    channels[3] = alpha;
    for index in 0..3 {
        // The conversion is per channel, so each one can be searched alone
        let exact = (0..=u8::MAX).find(|&value| {
            let mut candidate = [0, 0, 0, alpha];
            candidate[index] = value;
            let [r, g, b, a] = candidate;
            Color32::from_rgba_unmultiplied(r, g, b, a).to_array()[index] == premultiplied[index]
        });
        if let Some(value) = exact {
            channels[index] = value;
        }
    }
    channels
}

/// The colour as it will read back from markup
pub fn canonical_color(color: Color32) -> Color32 {
    let [r, g, b, a] = unmultiplied_channels(color);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// `#rrggbb` for opaque colours, `#rrggbbaa` otherwise
pub fn color_to_hex(color: Color32) -> String {
    let [r, g, b, a] = unmultiplied_channels(color);
    if a == u8::MAX {
        format!("#{r:02x}{g:02x}{b:02x}")
    } else {
        format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
    }
}

/// Parses `#rrggbbaa`, `#rrggbb` or `#rgb`
pub fn parse_hex_color(literal: &str) -> Result<Color32, MarkupError> {
    let bad = || MarkupError::BadColor(literal.to_owned());
    let digits = literal.trim().strip_prefix('#').ok_or_else(bad)?;
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(bad());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| bad());
    match digits.len() {
        8 => Ok(Color32::from_rgba_unmultiplied(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
            channel(&digits[6..8])?,
        )),
        6 => Ok(Color32::from_rgb(
            channel(&digits[0..2])?,
            channel(&digits[2..4])?,
            channel(&digits[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&digits[i..i + 1]).map(|v| v * 17);
            Ok(Color32::from_rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => Err(bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggles_report_change() {
        let mut state = StyleState::default();
        assert!(state.apply(StyleEvent::ToggleBold));
        assert!(state.current().bold);
        assert!(state.apply(StyleEvent::ToggleBold));
        assert!(!state.current().bold);
        assert!(!state.apply(StyleEvent::SetColor(DEFAULT_INK)));
    }

    #[test]
    fn test_hex_colors() {
        assert_eq!(color_to_hex(DEFAULT_INK), "#000f55");
        assert_eq!(parse_hex_color("#000f55"), Ok(DEFAULT_INK));
        assert_eq!(parse_hex_color("#fff"), Ok(Color32::WHITE));
        assert!(parse_hex_color("000f55").is_err());
        assert!(parse_hex_color("#00zz55").is_err());
        assert!(parse_hex_color("#12345").is_err());
    }

    #[test]
    fn test_translucent_hex_keeps_alpha() {
        let half_red = Color32::from_rgba_unmultiplied(255, 0, 0, 128);
        assert_eq!(color_to_hex(half_red), "#ff000080");
        assert_eq!(parse_hex_color("#ff000080"), Ok(half_red));
        assert_eq!(parse_hex_color(&color_to_hex(Color32::TRANSPARENT)), Ok(Color32::TRANSPARENT));
    }

    #[test]
    fn test_style_colors_survive_hex() {
        // Premultiplied values the unmultiplied mapping cannot produce
        let mut state = StyleState::default();
        state.apply(StyleEvent::SetColor(Color32::from_rgba_premultiplied(200, 10, 90, 128)));
        let color = state.current().color;
        assert_eq!(color.a(), 128);
        assert_eq!(parse_hex_color(&color_to_hex(color)), Ok(color));

        for alpha in [1, 37, 128, 254] {
            let color = canonical_color(Color32::from_rgba_unmultiplied(12, 200, 77, alpha));
            assert_eq!(parse_hex_color(&color_to_hex(color)), Ok(color), "alpha {alpha}");
        }
    }
}
