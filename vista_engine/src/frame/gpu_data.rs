/// GPU staging blocks written by a frame and uploaded by the renderer.
///
/// All types are `#[repr(C)]` and `Pod` so the renderer can hand them to the
/// device with `bytemuck::cast_slice` without any re-packing.

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, IVec4, Mat4, Vec2, Vec4};

use crate::config::{MAX_BONES, MAX_RAW_PASSES, MAX_TEXTURES};

/// Frame-wide constants shared by every pass
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuGlobalData {
    pub proj_view: [Mat4; MAX_RAW_PASSES],
    pub view_positions: [Vec4; MAX_RAW_PASSES],
    /// x: target index, y/z: cube depth linearization, w: source light index
    pub target_values: [Vec4; MAX_RAW_PASSES],
    pub sun_direction: Vec4,
    pub screen_size: Vec2,
    pub inv_shadow_cube_size: Vec2,
    pub thread_dimensions: IVec2,
    pub tile_size: IVec2,
    pub light_count: i32,
    pub render_output: i32,
    pub _pad: [i32; 2],
}

impl Default for GpuGlobalData {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Per-pass block: view volume corners and the pass slot
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuPassData {
    pub frustum_points: [Vec4; 6],
    pub pass_index: i32,
    pub _pad: [i32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct GpuMaterial {
    pub color_a: Vec4,
    pub color_b: Vec4,
    pub emissive: Vec4,
    pub sub_textures: [Vec4; MAX_TEXTURES],
    /// Bit i set when texture slot i is bound
    pub has_textures: u32,
    pub _pad: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuModelData {
    pub transform: Mat4,
    pub material: GpuMaterial,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct GpuAnimData {
    pub bones: [Mat4; MAX_BONES],
}

impl Default for GpuAnimData {
    fn default() -> Self {
        Self { bones: [Mat4::IDENTITY; MAX_BONES] }
    }
}

/// Light table entry. `shadow_indices` holds shadow pass slots, -1 when unused.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    pub position: Vec4,
    pub direction: Vec4,
    pub color: Vec4,
    pub shadow_indices: IVec4,
}

impl Default for GpuLight {
    fn default() -> Self {
        Self {
            position: Vec4::ZERO,
            direction: Vec4::ZERO,
            color: Vec4::ZERO,
            shadow_indices: IVec4::splat(-1),
        }
    }
}
