/// Vertex layouts understood by the built-in pipelines.

use bytemuck::{Pod, Zeroable};
use glam::{IVec4, Vec4};

/// Static mesh vertex
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct StaticVertex {
    pub position: Vec4,
    pub tex_coord: Vec4,
    pub tangent: Vec4,
    pub normal: Vec4,
}

/// Skinned mesh vertex; the renderer picks the skinned pipeline by this stride
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SkeletonVertex {
    pub position: Vec4,
    pub tex_coord: Vec4,
    pub tangent: Vec4,
    pub normal: Vec4,
    pub bone_weights: Vec4,
    pub bone_indices: IVec4,
}

/// Particle vertex. `tex_coord.z` carries per-vertex transparency.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ParticleVertex {
    pub position: Vec4,
    pub tex_coord: Vec4,
    pub tangent: Vec4,
    pub normal: Vec4,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct UiVertex {
    pub position: Vec4,
    pub color: Vec4,
    pub tex_coord: Vec4,
}

impl UiVertex {
    pub fn new(position: Vec4, color: Vec4, tex_coord: Vec4) -> Self {
        Self { position, color, tex_coord }
    }
}

pub const STATIC_VERTEX_STRIDE: u32 = std::mem::size_of::<StaticVertex>() as u32;
pub const SKELETON_VERTEX_STRIDE: u32 = std::mem::size_of::<SkeletonVertex>() as u32;
pub const PARTICLE_VERTEX_STRIDE: u32 = std::mem::size_of::<ParticleVertex>() as u32;
pub const UI_VERTEX_STRIDE: u32 = std::mem::size_of::<UiVertex>() as u32;
