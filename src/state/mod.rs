mod engine;
mod gesture;
mod image_load;

pub use engine::DrawingEngine;
pub use gesture::{EngineState, Gesture};
pub use image_load::{DecodeResult, ImageLoad, SurfaceStatus, spawn_decode};
