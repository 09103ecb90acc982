use futures::channel::oneshot;
use image::RgbaImage;

pub type DecodeResult = Result<RgbaImage, image::ImageError>;

/// Progress of the most recent artwork import
#[derive(Debug, Default)]
pub enum ImageLoad {
    #[default]
    None,
    /// Decode running on a worker thread
    Pending(oneshot::Receiver<DecodeResult>),
    /// Decoded, waiting for the current gesture to finish before it is drawn
    Ready(RgbaImage),
}

impl ImageLoad {
    pub fn is_none(&self) -> bool {
        matches!(self, ImageLoad::None)
    }
}

/// Whether the surface dimensions are final or still depend on a decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceStatus {
    Ready,
    AwaitingImage,
}

/// Decodes `bytes` on a worker thread. The receiver completes exactly once.
pub fn spawn_decode(bytes: Vec<u8>) -> oneshot::Receiver<DecodeResult> {
    let (send, receive) = oneshot::channel();
    std::thread::spawn(move || {
        let decoded = image::load_from_memory(&bytes).map(|image| image.to_rgba8());
        if send.send(decoded).is_err() {
            log::debug!("image decode finished after its receiver was dropped");
        }
    });
    receive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_garbage_reports_error() {
        let receiver = spawn_decode(vec![1, 2, 3, 4]);
        let result = futures::executor::block_on(receiver).expect("sender dropped");
        assert!(result.is_err());
    }
}
