//! Integration tests for the frame pipeline
//!
//! Drive a renderer through the public API the way an application does:
//! upload geometry, build frames from cameras and render them on a
//! recording device. No GPU required.
//!
//! Run with: cargo test --test pipeline_integration_tests

mod common;

use std::f32::consts::FRAC_PI_2;
use std::sync::{Arc, Mutex};

use common::{capture_log, Recording, RecordingDevice};
use vista_engine::glam::{Mat4, Quat, Vec3, Vec4};
use vista_engine::vista::camera::{Camera, CameraFlags};
use vista_engine::vista::config::{FrameCapacities, LogConfig, RendererConfig, MAIN_VIEW_BITS, MAIN_VIEW_PASS};
use vista_engine::vista::device::{BufferUsage, PipelineKind};
use vista_engine::vista::frame::{Frame, Geometry, MaterialPipeline, MeshPrimitive, ModelFlags, SkinnedMesh, StaticMaterial};
use vista_engine::vista::light::Light;
use vista_engine::vista::log::LogSeverity;
use vista_engine::vista::skeleton::Skeleton;
use vista_engine::vista::vertex::{SkeletonVertex, StaticVertex};
use vista_engine::vista::Renderer;

// ============================================================================
// HELPERS
// ============================================================================

fn config() -> RendererConfig {
    RendererConfig {
        capacities: FrameCapacities {
            models: 64,
            lights: 16,
            animations: 8,
            pass_elements: 64,
            particle_vertices: 64,
            ui_vertices: 60,
        },
        log: LogConfig { level: LogSeverity::Warn },
        width: 800,
        height: 600,
        ..Default::default()
    }
}

fn create_renderer() -> (Renderer, Arc<Mutex<Recording>>) {
    let (device, recording) = RecordingDevice::new();
    let (log, _) = capture_log(LogSeverity::Warn);
    let renderer = Renderer::new(Box::new(device), config(), log).unwrap();
    recording.lock().unwrap().reset();
    (renderer, recording)
}

fn main_camera() -> Camera {
    Camera::perspective(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z, Vec3::Y, 4.0 / 3.0, FRAC_PI_2, 0.1, 100.0, CameraFlags::empty())
}

fn build_frame(renderer: &Renderer, build: impl FnOnce(&mut Frame)) {
    let mut frame = renderer.begin_frame().unwrap();
    frame.initialize_pass(MAIN_VIEW_PASS, &mut main_camera());
    build(&mut frame);
    renderer.end_frame(frame);
}

/// A single triangle facing the camera
fn upload_triangle(renderer: &Renderer) -> (u32, u32) {
    let corner = |x: f32, y: f32| StaticVertex {
        position: Vec4::new(x, y, 0.0, 1.0),
        normal: Vec4::Z,
        ..Default::default()
    };
    let vertices = [corner(-1.0, -1.0), corner(1.0, -1.0), corner(0.0, 1.0)];
    let vertex_id = renderer.push_pending_elements(0, BufferUsage::Vertex, &vertices).unwrap();
    let index_id = renderer.push_pending_elements(0, BufferUsage::Index16, &[0u16, 1, 2]).unwrap();
    (vertex_id, index_id)
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_integration_scene_renders_end_to_end() {
    let (renderer, recording) = create_renderer();
    let (vertex_id, index_id) = upload_triangle(&renderer);
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);

    build_frame(&renderer, |frame| {
        frame.push_light(&Light::ambient(Vec3::ONE, 0.2));
        frame.push_light(&Light::directional(Vec3::NEG_Y, Vec3::ONE, 1.0));
        frame.write_geometry(Geometry::new(vertex_id, index_id), 0, MAIN_VIEW_BITS, &Mat4::IDENTITY, &material, ModelFlags::empty());
        frame.write_cube(MAIN_VIEW_BITS, Vec3::new(3.0, 0.0, 0.0), Vec3::ONE, &material, ModelFlags::empty());
    });
    renderer.render().unwrap();

    assert!(renderer.geometry_is_loaded(vertex_id));
    assert!(renderer.geometry_is_loaded(index_id));
    assert_eq!(renderer.current_frame(), Some(0));

    let rec = recording.lock().unwrap();
    assert_eq!(rec.draws_of(PipelineKind::MetallicRoughness), 2);
    assert!(rec.draws.contains(&(PipelineKind::MetallicRoughness, 3)));
    assert!(rec.draws.contains(&(PipelineKind::MetallicRoughness, 36)));
    assert_eq!(rec.draws_of(PipelineKind::Final), 1);
    assert_eq!(rec.draws_of(PipelineKind::Blit), 1);
    assert_eq!(rec.presents, 1);
}

#[test]
fn test_integration_culled_cube_is_not_drawn() {
    let (renderer, recording) = create_renderer();
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);

    build_frame(&renderer, |frame| {
        let behind = frame.write_cube(MAIN_VIEW_BITS, Vec3::new(0.0, 0.0, 30.0), Vec3::ONE, &material, ModelFlags::empty());
        assert_eq!(behind, None);
    });
    renderer.render().unwrap();

    let rec = recording.lock().unwrap();
    assert_eq!(rec.draws_of(PipelineKind::MetallicRoughness), 0);
    assert_eq!(rec.presents, 1);
}

#[test]
fn test_integration_render_before_first_frame_draws_nothing() {
    let (renderer, recording) = create_renderer();
    renderer.render().unwrap();
    assert_eq!(renderer.current_frame(), None);
    assert_eq!(recording.lock().unwrap().presents, 0);
}

#[test]
fn test_integration_last_frame_is_redrawn() {
    let (renderer, recording) = create_renderer();
    let material = StaticMaterial::new(MaterialPipeline::Unlit);
    build_frame(&renderer, |frame| {
        frame.write_cube(MAIN_VIEW_BITS, Vec3::ZERO, Vec3::ONE, &material, ModelFlags::empty());
    });

    renderer.render().unwrap();
    renderer.render().unwrap();
    renderer.render().unwrap();

    assert_eq!(renderer.current_frame(), Some(0));
    let rec = recording.lock().unwrap();
    assert_eq!(rec.presents, 3);
    assert_eq!(rec.draws_of(PipelineKind::Unlit), 3);
}

#[test]
fn test_integration_unready_device_keeps_frame() {
    let (renderer, recording) = create_renderer();
    build_frame(&renderer, |_| {});
    recording.lock().unwrap().ready = false;
    renderer.render().unwrap();
    assert_eq!(renderer.current_frame(), None);
    assert_eq!(recording.lock().unwrap().presents, 0);

    recording.lock().unwrap().ready = true;
    renderer.render().unwrap();
    assert_eq!(renderer.current_frame(), Some(0));
    assert_eq!(recording.lock().unwrap().presents, 1);
}

#[test]
fn test_integration_missing_geometry_is_skipped() {
    let (renderer, recording) = create_renderer();
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);
    let unknown = renderer.next_geometry_id();
    build_frame(&renderer, |frame| {
        frame.write_geometry(Geometry::new(unknown, 0), 0, MAIN_VIEW_BITS, &Mat4::IDENTITY, &material, ModelFlags::empty());
    });
    renderer.render().unwrap();

    let rec = recording.lock().unwrap();
    assert_eq!(rec.draws_of(PipelineKind::MetallicRoughness), 0);
    assert_eq!(rec.presents, 1);
}

#[test]
fn test_integration_shadowed_spot_light_adds_shadow_pass() {
    let (renderer, recording) = create_renderer();
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);

    build_frame(&renderer, |frame| {
        let spot = Light::spot(Vec3::new(0.0, 8.0, 0.0), Vec3::new(0.0, -1.0, 0.1), 0.6, 20.0, Vec3::ONE, 1.0).with_shadow();
        frame.set_shadow_position(Vec3::ZERO);
        assert!(frame.push_light(&spot).is_some());
        frame.initialize_rt_passes(Vec3::splat(-20.0), Vec3::splat(20.0));
        frame.write_cube(u32::MAX, Vec3::ZERO, Vec3::ONE, &material, ModelFlags::empty());
    });
    renderer.render().unwrap();

    let rec = recording.lock().unwrap();
    assert!(rec.draws_of(PipelineKind::Shadow) >= 1);
    assert_eq!(rec.draws_of(PipelineKind::MetallicRoughness), 1);
    // Shadow draws come before the main pass
    let first_shadow = rec.draws.iter().position(|(k, _)| *k == PipelineKind::Shadow).unwrap();
    let first_main = rec.draws.iter().position(|(k, _)| *k == PipelineKind::MetallicRoughness).unwrap();
    assert!(first_shadow < first_main);
}

#[test]
fn test_integration_skinned_mesh_draws() {
    let (renderer, recording) = create_renderer();
    let vertices = [SkeletonVertex { position: Vec4::W, bone_weights: Vec4::X, ..Default::default() }; 3];
    let vertex_id = renderer.push_pending_elements(0, BufferUsage::Vertex, &vertices).unwrap();

    let mut skeleton = Skeleton::new();
    skeleton.push_bone("root", Mat4::IDENTITY, Mat4::IDENTITY, None).unwrap();
    skeleton.push_bone("tip", Mat4::from_translation(Vec3::Y), Mat4::from_translation(Vec3::NEG_Y), Some(0)).unwrap();
    let mut world = [Mat4::IDENTITY; 2];
    skeleton.build_bind_transforms(&mut world);
    skeleton.apply_rotation_to_bone(1, Quat::from_rotation_z(FRAC_PI_2), &mut world);
    let mut matrices = [Mat4::IDENTITY; 2];
    skeleton.build_render_matrices(&world, &mut matrices);
    let (bounds_min, bounds_max) = skeleton.skinned_bounds(&vertices, &matrices, &Mat4::IDENTITY).unwrap();

    let primitives = [MeshPrimitive { offset: 0, count: 3 }];
    let mesh = SkinnedMesh { vertex_id, index_id: 0, primitives: &primitives, bounds_min, bounds_max };
    let material = StaticMaterial::new(MaterialPipeline::MetallicRoughness);
    build_frame(&renderer, |frame| {
        let anim = frame.write_skinned(&mesh, &matrices, MAIN_VIEW_BITS, &Mat4::IDENTITY, &material, ModelFlags::empty());
        assert_eq!(anim, Some(0));
    });
    renderer.render().unwrap();

    assert!(recording.lock().unwrap().draws.contains(&(PipelineKind::MetallicRoughness, 3)));
}

#[test]
fn test_integration_resize_recreates_screen_targets() {
    let (renderer, recording) = create_renderer();
    let before = recording.lock().unwrap().textures.len();
    renderer.resize(1024, 768).unwrap();

    let rec = recording.lock().unwrap();
    assert!(rec.textures.len() > before);
    assert!(rec.textures[before..].iter().all(|&size| size == (1024, 768) || size == (512, 384)));
    drop(rec);
    let globals = renderer.screen_globals().unwrap();
    assert_eq!(globals.screen_size.x, 1024.0);
}
