use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Page formats the composed handwriting can be exported to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageSize {
    #[default]
    A4,
    SmallBook,
    Digest,
    Trade,
    Letter,
}

impl PageSize {
    pub fn all() -> &'static [PageSize] {
        &[
            PageSize::A4,
            PageSize::SmallBook,
            PageSize::Digest,
            PageSize::Trade,
            PageSize::Letter,
        ]
    }

    /// Identifier used by the page-size control
    pub fn id(self) -> &'static str {
        match self {
            PageSize::A4 => "a4",
            PageSize::SmallBook => "small-book",
            PageSize::Digest => "digest",
            PageSize::Trade => "trade",
            PageSize::Letter => "letter",
        }
    }

    /// On-screen page size in pixels before the export resolution multiplier
    pub fn pixel_size(self) -> [u32; 2] {
        match self {
            PageSize::A4 => [400, 565],
            PageSize::SmallBook => [241, 387],
            PageSize::Digest => [266, 411],
            PageSize::Trade => [290, 435],
            PageSize::Letter => [411, 532],
        }
    }

    /// Physical page size in millimetres
    pub fn millimetres(self) -> [f32; 2] {
        match self {
            PageSize::A4 => [210.0, 297.0],
            PageSize::SmallBook => [127.0, 203.2],
            PageSize::Digest => [139.7, 215.9],
            PageSize::Trade => [152.4, 228.6],
            PageSize::Letter => [215.9, 279.4],
        }
    }

    /// Base font size in points used for typed text on this page
    pub fn base_font_pt(self) -> f32 {
        match self {
            PageSize::A4 => 10.0,
            PageSize::SmallBook => 8.0,
            PageSize::Digest => 8.5,
            PageSize::Trade => 9.0,
            PageSize::Letter => 10.5,
        }
    }

    /// Line height in ems
    pub fn line_height_em(self) -> f32 {
        match self {
            PageSize::SmallBook | PageSize::Digest => 1.45,
            PageSize::A4 | PageSize::Trade | PageSize::Letter => 1.5,
        }
    }

    /// Pixel size scaled by the export resolution multiplier (never below 1px)
    pub fn export_size(self, resolution: f32) -> [u32; 2] {
        let [w, h] = self.pixel_size();
        let scale = if resolution.is_finite() && resolution > 0.0 { resolution } else { 1.0 };
        [
            ((w as f32 * scale).round() as u32).max(1),
            ((h as f32 * scale).round() as u32).max(1),
        ]
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Error returned when a page-size identifier is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown page size `{0}`")]
pub struct UnknownPageSize(pub String);

impl FromStr for PageSize {
    type Err = UnknownPageSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageSize::all()
            .iter()
            .copied()
            .find(|page| page.id() == s)
            .ok_or_else(|| UnknownPageSize(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_size_scales_by_resolution() {
        assert_eq!(PageSize::A4.export_size(3.0), [1200, 1695]);
        assert_eq!(PageSize::SmallBook.export_size(1.0), [241, 387]);
        assert_eq!(PageSize::Letter.export_size(f32::NAN), [411, 532]);
    }

    #[test]
    fn test_ids_round_trip() {
        for page in PageSize::all() {
            assert_eq!(page.id().parse::<PageSize>(), Ok(*page));
        }
        assert!("tabloid".parse::<PageSize>().is_err());
    }
}
