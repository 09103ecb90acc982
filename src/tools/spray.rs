use egui::{Pos2, Vec2};
use rand::Rng;

use super::{Tool, ToolContext};
use crate::surface::CompositeMode;

/// Dabs emitted per pointer move
pub const SPRAY_DENSITY: usize = 20;
/// Spray radius as a multiple of the stroke width
pub const SPRAY_RADIUS_FACTOR: f32 = 3.0;
/// Each dab is painted at this fraction of the configured opacity
pub const SPRAY_OPACITY_FACTOR: f32 = 0.5;

/// Scatters single-pixel dabs around the pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SprayTool;

/// Positions for one spray step, uniformly distributed over the disc of
/// radius `SPRAY_RADIUS_FACTOR * stroke_width` around `center`
pub fn spray_dabs<R: Rng>(center: Pos2, stroke_width: f32, rng: &mut R) -> Vec<Pos2> {
    let radius = stroke_width * SPRAY_RADIUS_FACTOR;
    (0..SPRAY_DENSITY)
        .map(|_| {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            // sqrt keeps the density even across the disc
            let distance = radius * rng.random::<f32>().sqrt();
            center + Vec2::angled(angle) * distance
        })
        .collect()
}

impl Tool for SprayTool {
    fn name(&self) -> &'static str {
        "Spray"
    }

    fn on_pointer_move(&self, ctx: &mut ToolContext<'_>, pos: Pos2) {
        let style = ctx.gesture.tool;
        let ink = style.ink(CompositeMode::Paint).scaled(SPRAY_OPACITY_FACTOR);
        for dab in spray_dabs(pos, style.stroke_width(), &mut *ctx.rng) {
            ctx.surface.dab(dab, ink);
        }
        ctx.gesture.previous = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_every_dab_lies_within_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        let center = Pos2::new(40.0, 40.0);
        for width in [0.5, 1.0, 2.0, 8.0] {
            for _ in 0..50 {
                let dabs = spray_dabs(center, width, &mut rng);
                assert_eq!(dabs.len(), SPRAY_DENSITY);
                for dab in dabs {
                    assert!(dab.distance(center) <= width * SPRAY_RADIUS_FACTOR + 1e-4);
                }
            }
        }
    }
}
