use super::*;

#[test]
fn test_cone_layout() {
    let (vertices, indices) = cone();
    assert_eq!(vertices.len(), CONE_SEGMENTS + 2);
    assert_eq!(indices.len(), CONE_SEGMENTS * 6);
    assert_eq!(vertices[0].position, Vec4::W);
    assert_eq!(vertices[1].position, Vec4::new(0.0, 0.0, 1.0, 1.0));
    // Last side triangle wraps back to the first ring vertex
    let last = (CONE_SEGMENTS - 1) * 3;
    assert_eq!(&indices[last..last + 3], &[0, 2, CONE_SEGMENTS as u16 + 1]);
    assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
    for ring in &vertices[2..] {
        assert!((ring.position.truncate().truncate().length() - 1.0).abs() < 1e-5);
        assert_eq!(ring.position.z, 1.0);
    }
}

#[test]
fn test_cube_layout() {
    let (vertices, indices) = cube();
    assert_eq!(vertices.len(), 24);
    assert_eq!(indices.len(), 36);
    assert!(indices.iter().all(|&i| i < 24));
    for v in &vertices {
        assert_eq!(v.position.abs().truncate().max_element(), 1.0);
        // Each vertex lies on the face its normal points to
        let n = v.normal.truncate();
        assert_eq!(v.position.truncate().dot(n), 1.0);
    }
}

#[test]
fn test_sphere_is_unit() {
    let vertices = sphere();
    assert_eq!(vertices.len(), SPHERE_STEPS * SPHERE_STEPS * 6);
    for v in &vertices {
        let p = v.position.truncate();
        assert!((p.length() - 1.0).abs() < 1e-4);
        assert_eq!(v.normal.truncate(), p);
        assert_eq!(v.position.w, 1.0);
    }
}

#[test]
fn test_plane_faces_z() {
    let vertices = plane();
    assert_eq!(vertices.len(), 6);
    assert!(vertices.iter().all(|v| v.position.z == 0.0 && v.normal == Vec4::Z));
}

#[test]
fn test_particle_indices_pattern() {
    let indices = particle_indices(10);
    assert_eq!(indices.len(), 12);
    assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
}

#[test]
fn test_copy_quad_flips_v() {
    let quad = copy_quad(Vec2::new(800.0, 600.0), Vec4::new(0.25, 0.0, 0.75, 0.5));
    assert_eq!(quad[0].position, Vec4::new(0.0, 600.0, 0.0, 1.0));
    assert_eq!(quad[0].tex_coord, Vec4::new(0.25, 0.5, 0.0, 0.0));
    assert_eq!(quad[1].tex_coord, Vec4::new(0.25, 1.0, 0.0, 0.0));
    assert_eq!(quad[4].position, Vec4::new(800.0, 600.0, 0.0, 1.0));
    assert_eq!(quad[4].tex_coord, Vec4::new(0.75, 0.5, 0.0, 0.0));
}

#[test]
fn test_fullscreen_quad_covers_clip_space() {
    let quad = fullscreen_quad();
    let min = quad.iter().fold(Vec4::splat(f32::MAX), |m, v| m.min(v.position));
    let max = quad.iter().fold(Vec4::splat(f32::MIN), |m, v| m.max(v.position));
    assert_eq!((min.x, min.y, max.x, max.y), (-1.0, -1.0, 1.0, 1.0));
}
