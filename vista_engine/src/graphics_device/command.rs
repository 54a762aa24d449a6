/// Render target, pipeline and draw descriptions handed to the device

use glam::IVec4;

use super::buffer::Buffer;
use super::texture::Texture;

/// Viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full depth range viewport from `(x, y, width, height)`
    pub fn from_bounds(bounds: IVec4) -> Self {
        Self {
            x: bounds.x as f32,
            y: bounds.y as f32,
            width: bounds.z as f32,
            height: bounds.w as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// Clear value for the bound attachments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Color clear value (RGBA), applied to every color attachment
    Color([f32; 4]),
    /// Depth clear value
    Depth(f32),
}

/// One image of a texture bound as an attachment
#[derive(Clone, Copy)]
pub struct Attachment<'a> {
    pub texture: &'a dyn Texture,
    /// Array layer (cube arrays: cube index)
    pub layer: u32,
    /// Cube face, 0 for non-cube textures
    pub face: u32,
}

impl<'a> Attachment<'a> {
    pub fn new(texture: &'a dyn Texture) -> Self {
        Self { texture, layer: 0, face: 0 }
    }

    pub fn layer(texture: &'a dyn Texture, layer: u32) -> Self {
        Self { texture, layer, face: 0 }
    }

    pub fn cube_face(texture: &'a dyn Texture, layer: u32, face: u32) -> Self {
        Self { texture, layer, face }
    }
}

/// Off-screen target: color attachments plus an optional depth attachment
#[derive(Clone, Copy)]
pub struct RenderTarget<'a> {
    pub colors: &'a [Attachment<'a>],
    pub depth: Option<Attachment<'a>>,
}

/// Built-in pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    MetallicRoughness,
    SpecularGlossiness,
    Unlit,
    Skybox,
    Cloud,
    /// Depth-only pass for shadow maps
    Shadow,
    UiColor,
    UiTexture,
    UiFont,
    /// Multisample resolve
    PostProcess,
    /// Separable gaussian blur, one direction per draw
    Gaussian,
    /// Final composite of color, emission and highlight
    Final,
    /// Plain fullscreen copy of a single-sample texture
    Blit,
}

/// Pipeline variant selected for one draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineState {
    pub kind: PipelineKind,
    /// Skinned vertex shader instead of the static one
    pub skinned: bool,
    /// Source-alpha blending
    pub blend: bool,
    pub depth_write: bool,
}

impl PipelineState {
    /// Opaque, depth-writing, static-vertex variant
    pub fn new(kind: PipelineKind) -> Self {
        Self { kind, skinned: false, blend: false, depth_write: true }
    }

    /// Fullscreen and UI variant: blended or not, no depth output
    pub fn overlay(kind: PipelineKind, blend: bool) -> Self {
        Self { kind, skinned: false, blend, depth_write: false }
    }
}

/// Uniform block slot bound to one element of a uniform buffer
#[derive(Clone, Copy)]
pub struct UniformBinding<'a> {
    pub slot: u32,
    pub buffer: &'a dyn Buffer,
    pub element: u32,
}

/// Texture slot; `None` binds the device's default texture
#[derive(Clone, Copy)]
pub struct TextureBinding<'a> {
    pub slot: u32,
    pub texture: Option<&'a dyn Texture>,
    /// Sampler state passed through from the model
    pub state: u32,
}

/// One draw submission
#[derive(Clone, Copy)]
pub struct DrawCall<'a> {
    pub pipeline: PipelineState,
    pub vertices: &'a dyn Buffer,
    pub indices: Option<&'a dyn Buffer>,
    /// Vertex or index count
    pub count: u32,
    /// First vertex or index
    pub offset: u32,
    pub uniforms: &'a [UniformBinding<'a>],
    pub textures: &'a [TextureBinding<'a>],
}
