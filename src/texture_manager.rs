use egui::{ColorImage, Context, TextureHandle, TextureId, TextureOptions};

use crate::surface::RasterSurface;

/// GPU copy of the drawing surface, re-uploaded only when the engine
/// revision changes
#[derive(Default)]
pub struct SurfaceTexture {
    handle: Option<TextureHandle>,
    revision: Option<u64>,
    uploads: u64,
}

impl SurfaceTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the texture for `surface`, uploading it if `revision` is new
    pub fn update(&mut self, ctx: &Context, surface: &RasterSurface, revision: u64) -> TextureId {
        // Reuse the uploaded texture while nothing was drawn
        if let Some(handle) = &self.handle {
            if self.revision == Some(revision) {
                return handle.id();
            }
        }

        let [width, height] = surface.size();
        let image = ColorImage::from_rgba_unmultiplied([width as usize, height as usize], surface.as_raw());
        // Update in place so the texture id stays stable
        let handle = match self.handle.take() {
            Some(mut handle) => {
                handle.set(image, TextureOptions::NEAREST);
                handle
            }
            None => ctx.load_texture("drawing_surface", image, TextureOptions::NEAREST),
        };
        let id = handle.id();
        self.handle = Some(handle);
        self.revision = Some(revision);
        self.uploads += 1;
        id
    }

    /// Number of uploads so far
    pub fn uploads(&self) -> u64 {
        self.uploads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_revision_is_cached() {
        let ctx = Context::default();
        let surface = RasterSurface::new(10, 10).unwrap();
        let mut texture = SurfaceTexture::new();

        let first = texture.update(&ctx, &surface, 1);
        let second = texture.update(&ctx, &surface, 1);
        assert_eq!(first, second);
        assert_eq!(texture.uploads(), 1);

        let third = texture.update(&ctx, &surface, 2);
        assert_eq!(first, third);
        assert_eq!(texture.uploads(), 2);
    }
}
