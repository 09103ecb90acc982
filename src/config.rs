use egui::Color32;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::page::PageSize;
use crate::text::{DEFAULT_FONT_FAMILY, DEFAULT_INK, FontMetrics};

/// Start-up settings for both engines. Every field is optional in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub surface_width: u32,
    pub surface_height: u32,
    #[serde(with = "hex_color")]
    pub background: Color32,
    /// Shared by the typing style and the drawing tools
    #[serde(with = "hex_color")]
    pub ink: Color32,
    pub stroke_width: f32,
    pub opacity: f32,
    pub history_capacity: usize,
    /// Fixed seed for the spray tool; random when absent
    pub spray_seed: Option<u64>,
    pub font_family: String,
    pub font_metrics: BTreeMap<String, FontMetrics>,
    pub page_size: PageSize,
    pub export_resolution: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            surface_width: 850,
            surface_height: 550,
            background: Color32::WHITE,
            ink: DEFAULT_INK,
            stroke_width: 2.0,
            opacity: 1.0,
            history_capacity: 100,
            spray_seed: None,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            font_metrics: BTreeMap::new(),
            page_size: PageSize::default(),
            export_resolution: 3.0,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Serialises colours as `#rrggbb`, or `#rrggbbaa` when translucent
mod hex_color {
    use egui::Color32;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::text::{color_to_hex, parse_hex_color};

    pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color_to_hex(*color))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
        let literal = String::deserialize(deserializer)?;
        parse_hex_color(&literal).map_err(serde::de::Error::custom)
    }
}
