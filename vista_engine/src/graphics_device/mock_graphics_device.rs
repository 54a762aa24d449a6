/// Mock graphics device for unit tests (no GPU required)
///
/// Every resource creation and command is recorded in a shared
/// `MockDeviceState` so a test can keep inspecting it after the device has
/// been moved into a renderer.

use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use super::buffer::{Buffer, BufferDesc, BufferUsage};
use super::command::{ClearValue, DrawCall, PipelineState, RenderTarget, Viewport};
use super::graphics_device::GraphicsDevice;
use super::texture::{Texture, TextureDesc, TextureFormat, TextureKind};

// ============================================================================
// Mock Buffer
// ============================================================================

#[derive(Debug)]
pub struct MockBuffer {
    pub usage: BufferUsage,
    pub stride: u32,
    pub count: u32,
    pub data: Mutex<Vec<u8>>,
}

impl MockBuffer {
    pub fn new(desc: BufferDesc) -> Self {
        let size = desc.size() as usize;
        let mut data = desc.data.unwrap_or_default();
        data.resize(size, 0);
        Self {
            usage: desc.usage,
            stride: desc.stride,
            count: desc.count,
            data: Mutex::new(data),
        }
    }

    /// Copy of the bytes at element `index`
    pub fn element(&self, index: u32) -> Vec<u8> {
        let start = (index * self.stride) as usize;
        let end = start + self.stride as usize;
        self.data.lock().unwrap()[start..end].to_vec()
    }
}

impl Buffer for MockBuffer {
    fn usage(&self) -> BufferUsage {
        self.usage
    }

    fn stride(&self) -> u32 {
        self.stride
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let mut bytes = self.data.lock().unwrap();
        let start = offset as usize;
        let end = start + data.len();
        if end > bytes.len() {
            return Err(Error::InvalidResource(format!(
                "update of {} bytes at {} overflows a {} byte buffer",
                data.len(),
                offset,
                bytes.len()
            )));
        }
        bytes[start..end].copy_from_slice(data);
        Ok(())
    }
}

// ============================================================================
// Mock Texture
// ============================================================================

#[derive(Debug)]
pub struct MockTexture {
    pub desc: TextureDesc,
}

impl Texture for MockTexture {
    fn kind(&self) -> TextureKind {
        self.desc.kind
    }

    fn format(&self) -> TextureFormat {
        self.desc.format
    }

    fn width(&self) -> u32 {
        self.desc.width
    }

    fn height(&self) -> u32 {
        self.desc.height
    }
}

// ============================================================================
// Recorded commands
// ============================================================================

/// Attachment as (texture creation index, layer, face)
pub type MockAttachment = (usize, u32, u32);

#[derive(Debug, Clone, PartialEq)]
pub enum MockCommand {
    Target {
        colors: Vec<MockAttachment>,
        depth: Option<MockAttachment>,
    },
    Screen,
    Viewport(Viewport),
    Clear(ClearValue),
    Draw {
        pipeline: PipelineState,
        /// Buffer creation indices
        vertices: usize,
        indices: Option<usize>,
        count: u32,
        offset: u32,
        /// (slot, buffer creation index, element)
        uniforms: Vec<(u32, usize, u32)>,
        /// (slot, texture creation index, state)
        textures: Vec<(u32, Option<usize>, u32)>,
    },
    Present,
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

#[derive(Default)]
pub struct MockDeviceState {
    pub buffers: Vec<Arc<MockBuffer>>,
    pub textures: Vec<Arc<MockTexture>>,
    pub commands: Vec<MockCommand>,
    /// Returned by `update`
    pub ready: bool,
    /// Fail every buffer creation whose element count equals this value
    pub fail_buffer_count: Option<u32>,
    /// Fail every texture creation
    pub fail_textures: bool,
}

impl MockDeviceState {
    pub fn buffer_index(&self, buffer: &dyn Buffer) -> usize {
        self.buffers
            .iter()
            .position(|b| std::ptr::addr_eq(Arc::as_ptr(b), buffer as *const dyn Buffer))
            .expect("buffer was not created by this device")
    }

    pub fn texture_index(&self, texture: &dyn Texture) -> usize {
        self.textures
            .iter()
            .position(|t| std::ptr::addr_eq(Arc::as_ptr(t), texture as *const dyn Texture))
            .expect("texture was not created by this device")
    }

    /// Recorded draws, in order
    pub fn draws(&self) -> Vec<&MockCommand> {
        self.commands.iter().filter(|c| matches!(c, MockCommand::Draw { .. })).collect()
    }

    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }
}

pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockDeviceState { ready: true, ..Default::default() })),
        }
    }

    /// Shared handle to the recorded state
    pub fn state(&self) -> Arc<Mutex<MockDeviceState>> {
        self.state.clone()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn update(&mut self) -> bool {
        self.state.lock().unwrap().ready
    }

    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_buffer_count == Some(desc.count) {
            return Err(Error::OutOfMemory);
        }
        let buffer = Arc::new(MockBuffer::new(desc));
        state.buffers.push(buffer.clone());
        Ok(buffer)
    }

    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>> {
        let mut state = self.state.lock().unwrap();
        if state.fail_textures {
            return Err(Error::OutOfMemory);
        }
        let texture = Arc::new(MockTexture { desc });
        state.textures.push(texture.clone());
        Ok(texture)
    }

    fn set_render_target(&mut self, target: Option<&RenderTarget<'_>>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let command = match target {
            None => MockCommand::Screen,
            Some(target) => MockCommand::Target {
                colors: target
                    .colors
                    .iter()
                    .map(|a| (state.texture_index(a.texture), a.layer, a.face))
                    .collect(),
                depth: target.depth.map(|a| (state.texture_index(a.texture), a.layer, a.face)),
            },
        };
        state.commands.push(command);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.state.lock().unwrap().commands.push(MockCommand::Viewport(viewport));
        Ok(())
    }

    fn clear(&mut self, value: ClearValue) -> Result<()> {
        self.state.lock().unwrap().commands.push(MockCommand::Clear(value));
        Ok(())
    }

    fn draw(&mut self, call: &DrawCall<'_>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let command = MockCommand::Draw {
            pipeline: call.pipeline,
            vertices: state.buffer_index(call.vertices),
            indices: call.indices.map(|b| state.buffer_index(b)),
            count: call.count,
            offset: call.offset,
            uniforms: call
                .uniforms
                .iter()
                .map(|u| (u.slot, state.buffer_index(u.buffer), u.element))
                .collect(),
            textures: call
                .textures
                .iter()
                .map(|t| (t.slot, t.texture.map(|t| state.texture_index(t)), t.state))
                .collect(),
        };
        state.commands.push(command);
        Ok(())
    }

    fn present(&mut self, _interval: u32) -> Result<()> {
        self.state.lock().unwrap().commands.push(MockCommand::Present);
        Ok(())
    }
}
