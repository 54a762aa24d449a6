use glam::Vec3;
use std::f32::consts::FRAC_PI_3;
use super::*;

fn view_camera(position: Vec3, direction: Vec3, far: f32) -> Camera {
    Camera::perspective(position, direction, Vec3::Y, 16.0 / 9.0, FRAC_PI_3, 0.1, far, CameraFlags::empty())
}

/// World-space corners of the full view volume (all 8)
fn view_corners(cam: &Camera) -> Vec<Vec3> {
    let p = cam.frustum_points();
    let (ntl, ntr, nbl) = (p[0].truncate(), p[1].truncate(), p[2].truncate());
    let (ftl, ftr, fbl) = (p[3].truncate(), p[4].truncate(), p[5].truncate());
    let nbr = ntr + nbl - ntl;
    let fbr = ftr + fbl - ftl;
    [ntl, ntr, nbl, nbr, ftl, ftr, fbl, fbr]
        .iter()
        .map(|c| cam.position() + *c)
        .collect()
}

// ============================================================================
// Count / flags
// ============================================================================

#[test]
fn test_cascade_count_capped_at_four() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    let mut out = [Camera::default(); 6];
    let n = make_cascade_camera_views(
        Vec3::new(0.3, -1.0, 0.2), view.position(), &view.frustum_points(),
        Vec3::splat(-10.0), Vec3::splat(10.0), &mut out,
    );
    assert_eq!(n, 4);
}

#[test]
fn test_empty_output_builds_nothing() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    let mut out: [Camera; 0] = [];
    let n = make_cascade_camera_views(
        Vec3::NEG_Y, view.position(), &view.frustum_points(),
        Vec3::splat(-10.0), Vec3::splat(10.0), &mut out,
    );
    assert_eq!(n, 0);
}

#[test]
fn test_cascades_are_ortho_shadow_casters() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    let mut out = [Camera::default(); 2];
    make_cascade_camera_views(
        Vec3::new(0.3, -1.0, 0.2), view.position(), &view.frustum_points(),
        Vec3::splat(-10.0), Vec3::splat(10.0), &mut out,
    );
    for cam in &out {
        assert!(cam.is_ortho());
        assert!(cam.is_shadow_caster());
    }
}

// ============================================================================
// Coverage
// ============================================================================

fn assert_covered(view: &Camera, light: Vec3, count: usize) {
    let mut out = vec![Camera::default(); count];
    let n = make_cascade_camera_views(
        light, view.position(), &view.frustum_points(),
        Vec3::splat(-50.0), Vec3::splat(50.0), &mut out,
    );
    assert_eq!(n, count);
    for corner in view_corners(view) {
        let covered = out.iter().any(|c| c.sphere_in_frustum(corner, 1e-2));
        assert!(covered, "view corner {:?} outside every cascade", corner);
    }
    // Points strictly inside the view volume along the center line
    let (forward, _, _) = view.view_directions();
    for d in [0.5, 5.0, 20.0, 60.0, 99.0] {
        let p = view.position() + forward * d;
        assert!(out.iter().any(|c| c.sphere_in_frustum(p, 1e-2)), "center point at {} uncovered", d);
    }
}

#[test]
fn test_two_cascades_cover_view_frustum() {
    let view = view_camera(Vec3::new(5.0, 3.0, 2.0), Vec3::new(0.2, -0.3, -1.0), 100.0);
    assert_covered(&view, Vec3::new(0.4, -1.0, 0.3), 2);
}

#[test]
fn test_four_cascades_cover_view_frustum() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    assert_covered(&view, Vec3::new(-0.5, -0.8, 0.1), 4);
}

#[test]
fn test_light_parallel_to_world_up() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    assert_covered(&view, Vec3::NEG_Y, 2);
}

#[test]
fn test_near_plane_pulled_back_to_scene() {
    let view = view_camera(Vec3::ZERO, Vec3::NEG_Z, 100.0);
    let mut out = [Camera::default(); 1];
    make_cascade_camera_views(
        Vec3::NEG_Y, view.position(), &view.frustum_points(),
        Vec3::new(-10.0, -5.0, -10.0), Vec3::new(10.0, 40.0, 10.0), &mut out,
    );
    // A caster at the top of the scene must still be in front of the near plane
    assert!(out[0].frustum().distance(crate::camera::PLANE_NEAR, Vec3::new(0.0, 40.0, -1.0)) >= -1e-3);
}
