/// Graphics device module - the GPU collaborator traits and the types passed to them

pub mod graphics_device;
pub mod buffer;
pub mod texture;
pub mod command;

pub use graphics_device::*;
pub use buffer::*;
pub use texture::*;
pub use command::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
