use glam::{Vec2, Vec4};
use super::*;
use crate::frame::model::{FrameModel, ModelFlags};

fn blank_model() -> FrameModel {
    FrameModel::new(MaterialPipeline::Unlit, 1, 0, ModelFlags::empty(), 0, 0)
}

// ============================================================================
// Colors
// ============================================================================

#[test]
fn test_unlit_color_scaled_by_transparency() {
    let material = StaticMaterial::unlit(Vec4::new(1.0, 0.5, 0.25, 1.0)).with_transparency(0.5);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 0.5);
    assert_eq!(gpu.color_a, Vec4::new(1.0, 0.5, 0.25, 0.25));
    assert_eq!(gpu.emissive, Vec4::new(0.0, 0.0, 0.0, 1.0));
}

#[test]
fn test_metallic_roughness_defaults() {
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 1.0);
    assert_eq!(gpu.color_a, Vec4::ONE);
    assert_eq!(gpu.color_b, Vec4::ONE);
}

#[test]
fn test_cloud_defaults_carry_time() {
    let material = StaticMaterial::new(MaterialPipeline::Cloud).with_time(3.5);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 1.0);
    assert_eq!(gpu.color_a, DEFAULT_CLOUD_SETTINGS_A);
    assert_eq!(gpu.color_b.truncate(), DEFAULT_CLOUD_SETTINGS_B.truncate());
    assert_eq!(gpu.color_b.w, 3.5);
}

#[test]
fn test_skybox_leaves_colors_zero() {
    let material = StaticMaterial::new(MaterialPipeline::Skybox).with_color(BASE_COLOR_TWEEN, Vec4::ONE);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 1.0);
    assert_eq!(gpu.color_a, Vec4::ZERO);
}

// ============================================================================
// Textures
// ============================================================================

#[test]
fn test_texture_bits_only_for_bound_slots() {
    let material = StaticMaterial::new(MaterialPipeline::Unlit)
        .with_texture(MaterialTexture { texture_id: 0, texture_state: 0 }, None)
        .with_texture(MaterialTexture { texture_id: 7, texture_state: 3 }, None);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 1.0);
    assert_eq!(gpu.has_textures, 0b10);
    assert_eq!(model.textures[1].texture_id, 7);
    assert_eq!(model.textures[1].texture_state, 3);
}

#[test]
fn test_texture_rect_mapped_into_atlas() {
    let material = StaticMaterial::new(MaterialPipeline::Unlit).with_texture(
        MaterialTexture { texture_id: 1, texture_state: 0 },
        Some(Vec4::new(0.25, 0.5, 0.5, 0.5)),
    );
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::new(0.5, 0.0), Vec2::new(0.5, 0.25), 1.0);
    assert_eq!(gpu.sub_textures[0], Vec4::new(0.75, 0.5, 0.25, 0.125));
}

#[test]
fn test_unanimated_rect_defaults_to_full_texture() {
    let material = StaticMaterial::new(MaterialPipeline::Unlit)
        .with_texture(MaterialTexture { texture_id: 1, texture_state: 0 }, None);
    let mut model = blank_model();
    let gpu = prepare_gpu_material(&mut model, &material, Vec2::ZERO, Vec2::ONE, 1.0);
    assert_eq!(gpu.sub_textures[0], Vec4::new(0.0, 0.0, 1.0, 1.0));
}
