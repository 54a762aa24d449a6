/// GraphicsDevice trait: the GPU collaborator the renderer drives

use std::sync::Arc;

use crate::error::Result;
use super::buffer::{Buffer, BufferDesc};
use super::command::{ClearValue, DrawCall, RenderTarget, Viewport};
use super::texture::{Texture, TextureDesc};

/// Graphics device trait
///
/// Implemented by device backends. The renderer owns one device and calls it
/// only from the consumer thread; resources are reference counted and freed
/// when dropped.
pub trait GraphicsDevice: Send + Sync {
    /// Poll the device before a frame
    ///
    /// # Returns
    ///
    /// `false` when nothing can be rendered right now (minimized window,
    /// device lost); the renderer skips the frame without consuming it.
    fn update(&mut self) -> bool;

    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor, optionally with initial contents
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor, optionally with initial pixels
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Bind a render target; `None` binds the screen
    ///
    /// The viewport is reset to the target's full size.
    fn set_render_target(&mut self, target: Option<&RenderTarget<'_>>) -> Result<()>;

    /// Restrict drawing to a sub-region of the bound target
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Clear the bound target
    fn clear(&mut self, value: ClearValue) -> Result<()>;

    /// Record one draw
    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()>;

    /// Present the screen
    ///
    /// # Arguments
    ///
    /// * `interval` - Swap interval (0 = immediate, 1 = vsync)
    fn present(&mut self, interval: u32) -> Result<()>;
}
