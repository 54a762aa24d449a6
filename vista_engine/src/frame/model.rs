/// Per-frame model record and the flags that steer its draw.

use bitflags::bitflags;

use crate::config::MAX_TEXTURES;
use super::material::MaterialPipeline;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ModelFlags: u32 {
        /// Draw without writing depth
        const NO_DEPTH_OUT = 0x1;
        /// Sort to the front of its list
        const FORCE_DRAW_FIRST = 0x2;
        /// Sort to the back of its list
        const FORCE_DRAW_LAST = 0x4;
        /// Blend even when the material is opaque
        const FORCE_TRANSPARENCY = 0x8;
    }
}

/// Texture binding for one material slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelTexture {
    /// 0 means unbound
    pub texture_id: u32,
    /// Sampler state passed through to the device
    pub texture_state: u32,
}

/// Everything the renderer needs to draw one model submission.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameModel {
    pub pipeline: MaterialPipeline,
    pub vertex_id: u32,
    /// 0 for non-indexed geometry
    pub index_id: u32,
    pub flags: ModelFlags,
    /// First vertex/index
    pub offset: u32,
    /// Vertex/index count, 0 for the whole buffer
    pub count: u32,
    pub textures: [ModelTexture; MAX_TEXTURES],
    buffer_ids: u32,
}

impl FrameModel {
    pub fn new(
        pipeline: MaterialPipeline,
        vertex_id: u32,
        index_id: u32,
        flags: ModelFlags,
        offset: u32,
        count: u32,
    ) -> Self {
        Self {
            pipeline,
            vertex_id,
            index_id,
            flags,
            offset,
            count,
            textures: [ModelTexture::default(); MAX_TEXTURES],
            buffer_ids: 0,
        }
    }

    /// Pack the model-data and animation-data slots (16 bits each)
    pub fn set_buffer_ids(&mut self, model_id: u32, anim_id: u32) {
        self.buffer_ids = (model_id & 0xFFFF) | ((anim_id & 0xFFFF) << 16);
    }

    pub fn model_buffer_id(&self) -> u32 {
        self.buffer_ids & 0xFFFF
    }

    pub fn anim_buffer_id(&self) -> u32 {
        (self.buffer_ids >> 16) & 0xFFFF
    }
}
