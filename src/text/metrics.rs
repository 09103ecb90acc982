use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-family adjustments that put mixed handwriting fonts on a common
/// baseline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    /// Point size
    pub font_size: f32,
    /// Baseline shift in pixels, positive moves the text down
    pub vertical_offset: f32,
    /// Extra tracking in pixels
    pub letter_spacing: f32,
}

impl FontMetrics {
    pub const FALLBACK: FontMetrics = FontMetrics {
        font_size: 10.0,
        vertical_offset: 0.0,
        letter_spacing: 0.0,
    };

    pub const fn new(font_size: f32, vertical_offset: f32, letter_spacing: f32) -> Self {
        Self {
            font_size,
            vertical_offset,
            letter_spacing,
        }
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::FALLBACK
    }
}

const BUILTIN: &[(&str, FontMetrics)] = &[
    ("Homemade Apple", FontMetrics::new(9.5, -1.0, 0.0)),
    ("Caveat", FontMetrics::new(12.0, 1.0, 0.5)),
    ("Liu Jian Mao Cao", FontMetrics::new(11.0, 2.0, 0.0)),
    ("Indie Flower", FontMetrics::new(10.5, 0.0, 0.3)),
    ("Dawning of a New Day", FontMetrics::new(11.5, -1.5, 0.0)),
    ("Zeyada", FontMetrics::new(12.0, 0.5, 0.2)),
    ("Nanum Pen Script", FontMetrics::new(13.0, 1.5, 0.0)),
];

/// Font-family lookup with a fallback entry for unknown families
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetricsTable {
    entries: BTreeMap<String, FontMetrics>,
    fallback: FontMetrics,
}

impl Default for FontMetricsTable {
    fn default() -> Self {
        Self {
            entries: BUILTIN
                .iter()
                .map(|(family, metrics)| ((*family).to_owned(), *metrics))
                .collect(),
            fallback: FontMetrics::FALLBACK,
        }
    }
}

impl FontMetricsTable {
    /// Bundled handwriting families plus `overrides`
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a String, &'a FontMetrics)>) -> Self {
        let mut table = Self::default();
        for (family, metrics) in overrides {
            table.insert(family.clone(), *metrics);
        }
        table
    }

    pub fn get(&self, family: &str) -> FontMetrics {
        self.entries.get(family).copied().unwrap_or(self.fallback)
    }

    pub fn contains(&self, family: &str) -> bool {
        self.entries.contains_key(family)
    }

    pub fn insert(&mut self, family: impl Into<String>, metrics: FontMetrics) {
        self.entries.insert(family.into(), metrics);
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_family_uses_fallback() {
        let table = FontMetricsTable::default();
        assert!(table.contains("Caveat"));
        assert_eq!(table.get("Comic Sans"), FontMetrics::FALLBACK);
    }

    #[test]
    fn test_overrides_replace_builtins() {
        let overrides = BTreeMap::from([("Caveat".to_owned(), FontMetrics::new(20.0, 0.0, 0.0))]);
        let table = FontMetricsTable::with_overrides(&overrides);
        assert_eq!(table.get("Caveat").font_size, 20.0);
        assert_eq!(table.get("Zeyada"), FontMetrics::new(12.0, 0.5, 0.2));
    }
}
