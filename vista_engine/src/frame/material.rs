/// Material collaborator interface and GPU material preparation.
///
/// Materials live outside the engine (the editor owns them and animates their
/// colors and texture rectangles over time). The engine only samples them at
/// the material's current time when a model is submitted.

use glam::{Vec2, Vec4};

use crate::config::MAX_TEXTURES;
use super::gpu_data::GpuMaterial;
use super::model::{FrameModel, ModelTexture};

/// Shading pipeline a material renders with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MaterialPipeline {
    #[default]
    MetallicRoughness,
    SpecularGlossiness,
    Unlit,
    Skybox,
    Cloud,
}

/// Color tween slots
pub const EMISSIVE_TWEEN: usize = 0;
/// Albedo, diffuse or unlit color
pub const BASE_COLOR_TWEEN: usize = 1;
/// Metallic-roughness or specular factor
pub const SECONDARY_COLOR_TWEEN: usize = 2;
pub const CLOUD_SETTINGS_A_TWEEN: usize = 0;
pub const CLOUD_SETTINGS_B_TWEEN: usize = 1;

pub const DEFAULT_CLOUD_SETTINGS_A: Vec4 = Vec4::new(1.1, 0.001, 0.5, 0.3);
pub const DEFAULT_CLOUD_SETTINGS_B: Vec4 = Vec4::new(0.2, 1.0, 0.0, 0.0);

/// Texture reference held by a material slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialTexture {
    pub texture_id: u32,
    pub texture_state: u32,
}

pub trait Material {
    fn pipeline(&self) -> MaterialPipeline;

    /// Current animation time
    fn time(&self) -> f32;

    /// Alpha multiplier in [0, 1]
    fn transparency(&self) -> f32;

    fn is_transparent(&self) -> bool;

    /// Texture slots, at most `MAX_TEXTURES` are used
    fn textures(&self) -> &[MaterialTexture];

    /// Sub-rectangle (offset.xy, size.zw) of texture `slot` at `time`, if animated
    fn texture_rect(&self, slot: usize, time: f32) -> Option<Vec4>;

    /// Color of tween `tween` at `time`, if the material defines it
    fn color(&self, tween: usize, time: f32) -> Option<Vec4>;
}

/// Sample `material` into a GPU block and record its textures on `model`.
///
/// Texture rectangles are remapped into the atlas region described by
/// `atlas_position`/`atlas_size`; the material alpha is scaled by
/// `transparency_mult`.
pub fn prepare_gpu_material(
    model: &mut FrameModel,
    material: &dyn Material,
    atlas_position: Vec2,
    atlas_size: Vec2,
    transparency_mult: f32,
) -> GpuMaterial {
    let time = material.time();
    let mut gpu = GpuMaterial::default();
    let alpha = Vec4::new(1.0, 1.0, 1.0, material.transparency() * transparency_mult);

    for (i, texture) in material.textures().iter().take(MAX_TEXTURES).enumerate() {
        model.textures[i] = ModelTexture {
            texture_id: texture.texture_id,
            texture_state: texture.texture_state,
        };
        if texture.texture_id != 0 {
            gpu.has_textures |= 1 << i;
        }
        let rect = material
            .texture_rect(i, time)
            .unwrap_or(Vec4::new(0.0, 0.0, 1.0, 1.0));
        gpu.sub_textures[i] = Vec4::new(
            rect.x + atlas_position.x,
            rect.y + atlas_position.y,
            rect.z * atlas_size.x,
            rect.w * atlas_size.y,
        );
    }

    let color = |tween: usize, default: Vec4| material.color(tween, time).unwrap_or(default);
    let no_emission = Vec4::new(0.0, 0.0, 0.0, 1.0);
    match material.pipeline() {
        MaterialPipeline::MetallicRoughness | MaterialPipeline::SpecularGlossiness => {
            gpu.color_a = color(BASE_COLOR_TWEEN, Vec4::ONE) * alpha;
            gpu.color_b = color(SECONDARY_COLOR_TWEEN, Vec4::ONE);
            gpu.emissive = color(EMISSIVE_TWEEN, no_emission);
        }
        MaterialPipeline::Unlit => {
            gpu.color_a = color(BASE_COLOR_TWEEN, Vec4::ONE) * alpha;
            gpu.emissive = color(EMISSIVE_TWEEN, no_emission);
        }
        MaterialPipeline::Skybox => {}
        MaterialPipeline::Cloud => {
            gpu.color_a = color(CLOUD_SETTINGS_A_TWEEN, DEFAULT_CLOUD_SETTINGS_A);
            gpu.color_b = color(CLOUD_SETTINGS_B_TWEEN, DEFAULT_CLOUD_SETTINGS_B);
            gpu.color_b.w = time;
        }
    }
    gpu
}

// ===== STATIC MATERIAL =====

const MAX_COLOR_TWEENS: usize = 4;

/// Material with fixed colors and rectangles (no animation).
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMaterial {
    pub pipeline: MaterialPipeline,
    pub time: f32,
    pub transparency: f32,
    pub transparent: bool,
    pub textures: Vec<MaterialTexture>,
    pub colors: [Option<Vec4>; MAX_COLOR_TWEENS],
    pub rects: [Option<Vec4>; MAX_TEXTURES],
}

impl StaticMaterial {
    pub fn new(pipeline: MaterialPipeline) -> Self {
        Self {
            pipeline,
            time: 0.0,
            transparency: 1.0,
            transparent: false,
            textures: Vec::new(),
            colors: [None; MAX_COLOR_TWEENS],
            rects: [None; MAX_TEXTURES],
        }
    }

    /// Flat unlit color; translucent when `color.w < 1`
    pub fn unlit(color: Vec4) -> Self {
        let mut material = Self::new(MaterialPipeline::Unlit).with_color(BASE_COLOR_TWEEN, color);
        material.transparent = color.w < 1.0;
        material
    }

    pub fn with_color(mut self, tween: usize, color: Vec4) -> Self {
        if let Some(slot) = self.colors.get_mut(tween) {
            *slot = Some(color);
        }
        self
    }

    pub fn with_texture(mut self, texture: MaterialTexture, rect: Option<Vec4>) -> Self {
        if self.textures.len() < MAX_TEXTURES {
            self.rects[self.textures.len()] = rect;
            self.textures.push(texture);
        }
        self
    }

    pub fn with_transparency(mut self, transparency: f32) -> Self {
        self.transparency = transparency;
        self.transparent = transparency < 1.0;
        self
    }

    pub fn with_time(mut self, time: f32) -> Self {
        self.time = time;
        self
    }
}

impl Material for StaticMaterial {
    fn pipeline(&self) -> MaterialPipeline {
        self.pipeline
    }

    fn time(&self) -> f32 {
        self.time
    }

    fn transparency(&self) -> f32 {
        self.transparency
    }

    fn is_transparent(&self) -> bool {
        self.transparent
    }

    fn textures(&self) -> &[MaterialTexture] {
        &self.textures
    }

    fn texture_rect(&self, slot: usize, _time: f32) -> Option<Vec4> {
        self.rects.get(slot).copied().flatten()
    }

    fn color(&self, tween: usize, _time: f32) -> Option<Vec4> {
        self.colors.get(tween).copied().flatten()
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
