use egui::{Color32, Pos2};
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::EngineError;
use crate::page::PageSize;

/// How a pixel operation combines with what is already on the surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompositeMode {
    /// Source-over painting
    Paint,
    /// Destination-out: coverage removes existing alpha instead of adding colour
    Erase,
}

/// Colour, opacity and composite mode shared by every pixel operation of one render
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ink {
    pub color: Color32,
    pub opacity: f32,
    pub mode: CompositeMode,
}

impl Ink {
    pub fn new(color: Color32, opacity: f32, mode: CompositeMode) -> Self {
        Self {
            color,
            opacity: opacity.clamp(0.0, 1.0),
            mode,
        }
    }

    /// Same ink with its opacity scaled by `factor`
    pub fn scaled(self, factor: f32) -> Self {
        Self::new(self.color, self.opacity * factor, self.mode)
    }
}

/// Fixed-size RGBA pixel grid that annotations are painted onto.
///
/// All drawing operations clip against the surface bounds, so callers may pass
/// coordinates that fall outside it.
#[derive(Clone, PartialEq)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

impl RasterSurface {
    /// Creates a fully transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self, EngineError> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidDimensions { width, height });
        }
        Ok(Self {
            pixels: RgbaImage::new(width, height),
        })
    }

    pub fn from_image(pixels: RgbaImage) -> Result<Self, EngineError> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(EngineError::InvalidDimensions {
                width: pixels.width(),
                height: pixels.height(),
            });
        }
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> [u32; 2] {
        [self.width(), self.height()]
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.pixels.get_pixel_checked(x, y).map(|p| p.0)
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Full copy of the current pixels
    pub fn snapshot(&self) -> RgbaImage {
        self.pixels.clone()
    }

    /// Replaces every pixel (and the dimensions) with `snapshot`
    pub fn restore(&mut self, snapshot: &RgbaImage) {
        self.pixels.clone_from(snapshot);
    }

    /// Resets every pixel to transparent
    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }

    /// Reallocates the grid. Content is discarded unless `copy_forward` is set,
    /// in which case the overlapping top-left region is kept.
    pub fn resize(&mut self, width: u32, height: u32, copy_forward: bool) -> Result<(), EngineError> {
        let mut resized = Self::new(width, height)?;
        if copy_forward {
            imageops::replace(&mut resized.pixels, &self.pixels, 0, 0);
        }
        *self = resized;
        Ok(())
    }

    /// Composites `ink` into one pixel with the given coverage in [0, 1]
    pub fn composite_pixel(&mut self, x: i64, y: i64, ink: Ink, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        // Colour alpha, opacity and coverage all scale the effect
        let [r, g, b, a] = ink.color.to_srgba_unmultiplied();
        let strength = (coverage.clamp(0.0, 1.0) * ink.opacity * (a as f32 / 255.0)).clamp(0.0, 1.0);
        if strength <= 0.0 {
            return;
        }

        let dst = self.pixels.get_pixel_mut(x as u32, y as u32);
        match ink.mode {
            CompositeMode::Paint => blend_over(dst, [r, g, b], strength),
            CompositeMode::Erase => {
                // Only alpha is reduced
                let remaining = dst[3] as f32 * (1.0 - strength);
                dst[3] = remaining.round() as u8;
                if dst[3] == 0 {
                    *dst = Rgba([0, 0, 0, 0]);
                }
            }
        }
    }

    /// Single-pixel dab at the pixel containing `pos`
    pub fn dab(&mut self, pos: Pos2, ink: Ink) {
        self.composite_pixel(pos.x.floor() as i64, pos.y.floor() as i64, ink, 1.0);
    }

    /// Strokes a set of segments with round caps as one primitive: each pixel
    /// takes the strongest coverage of any segment and is composited once.
    pub fn stroke_segments(&mut self, segments: &[(Pos2, Pos2)], width: f32, ink: Ink) {
        if segments.is_empty() {
            return;
        }
        let half = width.max(0.0) / 2.0;
        let reach = half + 1.0;

        // Bounding box of every segment, padded by the stroke reach
        let mut min = segments[0].0;
        let mut max = segments[0].0;
        for &(a, b) in segments {
            min = min.min(a).min(b);
            max = max.max(a).max(b);
        }

        self.for_each_in_bounds(min.x - reach, min.y - reach, max.x + reach, max.y + reach, |center| {
            // Nearest segment wins, so joints are not painted twice
            let distance = segments
                .iter()
                .map(|&(a, b)| distance_to_segment(center, a, b))
                .fold(f32::INFINITY, f32::min);
            coverage(distance, half)
        }, ink);
    }

    /// Strokes the outline of a circle. A zero radius renders as a round dot.
    pub fn stroke_circle(&mut self, center: Pos2, radius: f32, width: f32, ink: Ink) {
        let half = width.max(0.0) / 2.0;
        let reach = radius.abs() + half + 1.0;
        self.for_each_in_bounds(
            center.x - reach,
            center.y - reach,
            center.x + reach,
            center.y + reach,
            |p| coverage((p.distance(center) - radius.abs()).abs(), half),
            ink,
        );
    }

    /// Source-over draws `image` with its top-left corner at (`x`, `y`)
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.pixels, image, x, y);
    }

    /// Flattens the surface, optionally onto an opaque background colour
    pub fn flatten(&self, background: Option<Color32>) -> RgbaImage {
        match background {
            None => self.pixels.clone(),
            Some(color) => {
                let [r, g, b, a] = color.to_srgba_unmultiplied();
                let mut out = RgbaImage::from_pixel(self.width(), self.height(), Rgba([r, g, b, a]));
                imageops::overlay(&mut out, &self.pixels, 0, 0);
                out
            }
        }
    }

    /// Encodes the surface as PNG, transparent unless a background is given
    pub fn encode_png(&self, background: Option<Color32>) -> Result<Vec<u8>, EngineError> {
        let flattened = self.flatten(background);
        let mut bytes = Vec::new();
        flattened
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(EngineError::ImageEncode)?;
        Ok(bytes)
    }

    /// Places the drawing on its own page: a background-filled canvas of the
    /// page's export size, with the surface scaled to fit 90% of it and centred.
    pub fn place_on_page(&self, page: PageSize, resolution: f32, background: Color32) -> RgbaImage {
        let [page_w, page_h] = page.export_size(resolution);
        let [r, g, b, a] = background.to_srgba_unmultiplied();
        let mut out = RgbaImage::from_pixel(page_w, page_h, Rgba([r, g, b, a]));

        // Fit within 90% of the page
        let scale = ((page_w as f32 * 0.9) / self.width() as f32)
            .min((page_h as f32 * 0.9) / self.height() as f32);
        let scaled_w = ((self.width() as f32 * scale).round() as u32).max(1);
        let scaled_h = ((self.height() as f32 * scale).round() as u32).max(1);
        let scaled = imageops::resize(&self.pixels, scaled_w, scaled_h, imageops::FilterType::Triangle);

        // Centre on the page
        let x = (page_w as i64 - scaled_w as i64) / 2;
        let y = (page_h as i64 - scaled_h as i64) / 2;
        imageops::overlay(&mut out, &scaled, x, y);
        out
    }

    fn for_each_in_bounds(
        &mut self,
        min_x: f32,
        min_y: f32,
        max_x: f32,
        max_y: f32,
        coverage_at: impl Fn(Pos2) -> f32,
        ink: Ink,
    ) {
        // Clip the box to the surface
        let x0 = min_x.floor().max(0.0) as i64;
        let y0 = min_y.floor().max(0.0) as i64;
        let x1 = (max_x.ceil() as i64).min(self.width() as i64 - 1);
        let y1 = (max_y.ceil() as i64).min(self.height() as i64 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                // Sample at the pixel centre
                let center = Pos2::new(x as f32 + 0.5, y as f32 + 0.5);
                let amount = coverage_at(center);
                if amount > 0.0 {
                    self.composite_pixel(x, y, ink, amount);
                }
            }
        }
    }
}

/// Anti-aliased coverage of a pixel whose centre is `distance` from a shape
/// with half-width `half`
fn coverage(distance: f32, half: f32) -> f32 {
    (half + 0.5 - distance).clamp(0.0, 1.0)
}

/// Unpremultiplied source-over
fn blend_over(dst: &mut Rgba<u8>, src: [u8; 3], src_alpha: f32) {
    let dst_alpha = dst[3] as f32 / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    for channel in 0..3 {
        let s = src[channel] as f32 * src_alpha;
        let d = dst[channel] as f32 * dst_alpha * (1.0 - src_alpha);
        dst[channel] = ((s + d) / out_alpha).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
}

/// Distance from a point to a line segment; degenerate segments measure to the point
pub(crate) fn distance_to_segment(point: Pos2, start: Pos2, end: Pos2) -> f32 {
    let line = end - start;
    let length_sq = line.length_sq();
    if length_sq == 0.0 {
        return point.distance(start);
    }
    let t = ((point - start).dot(line) / length_sq).clamp(0.0, 1.0);
    point.distance(start + line * t)
}
