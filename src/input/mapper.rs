use egui::{Pos2, Rect, Vec2};

/// Converts pointer-device coordinates into surface pixel coordinates.
///
/// The surface may be displayed at a different size than its intrinsic pixel
/// grid (for example when it is shrunk to fit a small viewport). Each axis is
/// scaled by `intrinsic / displayed`. Results are not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    displayed: Rect,
    intrinsic: Vec2,
}

impl CoordinateMapper {
    pub fn new(displayed: Rect, intrinsic: Vec2) -> Self {
        Self { displayed, intrinsic }
    }

    pub fn to_surface(&self, device: Pos2) -> Pos2 {
        let scale = self.scale();
        let local = device - self.displayed.min;
        Pos2::new(local.x * scale.x, local.y * scale.y)
    }

    /// Inverse of [`Self::to_surface`], for drawing overlays in device space
    pub fn to_device(&self, surface: Pos2) -> Pos2 {
        let scale = self.scale();
        self.displayed.min + Vec2::new(surface.x / scale.x, surface.y / scale.y)
    }

    /// Per-axis `intrinsic / displayed`; a collapsed axis maps 1:1
    pub fn scale(&self) -> Vec2 {
        let axis = |intrinsic: f32, displayed: f32| {
            if displayed > 0.0 && intrinsic > 0.0 {
                intrinsic / displayed
            } else {
                1.0
            }
        };
        Vec2::new(
            axis(self.intrinsic.x, self.displayed.width()),
            axis(self.intrinsic.y, self.displayed.height()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_size_display_maps_center_to_center() {
        let intrinsic = Vec2::new(850.0, 550.0);
        let displayed = Rect::from_min_size(Pos2::new(100.0, 40.0), intrinsic * 0.5);
        let mapper = CoordinateMapper::new(displayed, intrinsic);

        let mapped = mapper.to_surface(displayed.center());
        assert!((mapped.x - 425.0).abs() < 1e-3);
        assert!((mapped.y - 275.0).abs() < 1e-3);
    }

    #[test]
    fn test_center_is_scale_independent() {
        let intrinsic = Vec2::new(400.0, 300.0);
        for factor in [0.25, 0.5, 1.0, 1.75] {
            let displayed = Rect::from_min_size(Pos2::new(13.0, 7.0), intrinsic * factor);
            let mapped = CoordinateMapper::new(displayed, intrinsic).to_surface(displayed.center());
            assert!((mapped - Pos2::new(200.0, 150.0)).length() < 1e-3);
        }
    }

    #[test]
    fn test_out_of_bounds_is_not_clamped() {
        let displayed = Rect::from_min_size(Pos2::ZERO, Vec2::new(100.0, 100.0));
        let mapper = CoordinateMapper::new(displayed, Vec2::new(200.0, 200.0));
        assert_eq!(mapper.to_surface(Pos2::new(-10.0, 150.0)), Pos2::new(-20.0, 300.0));
    }

    #[test]
    fn test_device_round_trip() {
        let displayed = Rect::from_min_size(Pos2::new(5.0, 5.0), Vec2::new(50.0, 25.0));
        let mapper = CoordinateMapper::new(displayed, Vec2::new(200.0, 100.0));
        let device = Pos2::new(30.0, 12.0);
        let back = mapper.to_device(mapper.to_surface(device));
        assert!((back - device).length() < 1e-3);
    }
}
