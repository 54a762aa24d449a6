/// Renderer module - the consumer side of the frame pipeline

pub mod renderer;
pub mod frame_ring;
pub mod upload_queue;
pub mod primitives;

pub use renderer::*;
pub use frame_ring::FrameRing;
pub use upload_queue::{PendingGeometry, PendingQueue, PendingTexture};
