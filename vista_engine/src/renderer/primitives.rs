/// Built-in geometry created when the renderer starts.
///
/// Unit-sized shapes the frame writers scale into place: a cube spanning
/// [-1, 1], a unit sphere, a cone with its apex at the origin and a unit
/// base at z = 1, and a [-1, 1] plane facing +Z.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Vec2, Vec3, Vec4};

use crate::vertex::{StaticVertex, UiVertex};

pub const CONE_SEGMENTS: usize = 30;
pub const SPHERE_STEPS: usize = 20;

fn vertex(position: Vec4, tex_coord: Vec4, tangent: Vec4, normal: Vec4) -> StaticVertex {
    StaticVertex { position, tex_coord, tangent, normal }
}

/// Apex, base center, then the base ring
pub fn cone() -> (Vec<StaticVertex>, Vec<u16>) {
    let mut vertices = Vec::with_capacity(CONE_SEGMENTS + 2);
    let mut indices = vec![0u16; CONE_SEGMENTS * 6];
    vertices.push(vertex(Vec4::W, Vec4::ZERO, Vec4::ZERO, Vec4::ZERO));
    vertices.push(vertex(Vec4::new(0.0, 0.0, 1.0, 1.0), Vec4::ZERO, Vec4::ZERO, Vec4::ZERO));

    let segments = CONE_SEGMENTS as u16;
    for n in 0..CONE_SEGMENTS {
        let theta = TAU / CONE_SEGMENTS as f32 * n as f32;
        let dir = Vec2::from_angle(theta);
        vertices.push(vertex(Vec4::new(dir.x, dir.y, 1.0, 1.0), Vec4::ZERO, Vec4::ZERO, Vec4::ZERO));

        let current = n as u16 + 2;
        let next = (n as u16 + 1) % segments + 2;
        let side = n * 3;
        let base = side + CONE_SEGMENTS * 3;
        indices[side..side + 3].copy_from_slice(&[0, next, current]);
        indices[base..base + 3].copy_from_slice(&[1, current, next]);
    }
    (vertices, indices)
}

/// 24 vertices (4 per face, flat normals) and 36 indices
pub fn cube() -> (Vec<StaticVertex>, Vec<u16>) {
    let indices = vec![
        0, 2, 1, 1, 2, 3, // back
        4, 5, 6, 5, 7, 6, // front
        8, 9, 10, 9, 11, 10, // left
        12, 14, 13, 13, 14, 15, // right
        16, 17, 18, 17, 19, 18, // top
        20, 22, 21, 21, 22, 23, // bottom
    ];
    // (position, uv) per corner; faces share tangent and normal
    type Face = ([(Vec3, Vec2); 4], Vec4, Vec4);
    let faces: [Face; 6] = [
        (
            [
                (Vec3::new(-1.0, -1.0, -1.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(1.0, -1.0, -1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(-1.0, 1.0, -1.0), Vec2::new(1.0, 0.0)),
                (Vec3::new(1.0, 1.0, -1.0), Vec2::new(0.0, 0.0)),
            ],
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, -1.0, 0.0),
        ),
        (
            [
                (Vec3::new(-1.0, -1.0, 1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(1.0, -1.0, 1.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(-1.0, 1.0, 1.0), Vec2::new(0.0, 0.0)),
                (Vec3::new(1.0, 1.0, 1.0), Vec2::new(1.0, 0.0)),
            ],
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
        ),
        (
            [
                (Vec3::new(-1.0, -1.0, -1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(-1.0, -1.0, 1.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(-1.0, 1.0, -1.0), Vec2::new(0.0, 0.0)),
                (Vec3::new(-1.0, 1.0, 1.0), Vec2::new(1.0, 0.0)),
            ],
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(-1.0, 0.0, 0.0, 0.0),
        ),
        (
            [
                (Vec3::new(1.0, -1.0, -1.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(1.0, -1.0, 1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(1.0, 1.0, -1.0), Vec2::new(1.0, 0.0)),
                (Vec3::new(1.0, 1.0, 1.0), Vec2::new(0.0, 0.0)),
            ],
            Vec4::new(0.0, 1.0, 0.0, 1.0),
            Vec4::new(1.0, 0.0, 0.0, 0.0),
        ),
        (
            [
                (Vec3::new(-1.0, 1.0, -1.0), Vec2::new(0.0, 0.0)),
                (Vec3::new(-1.0, 1.0, 1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(1.0, 1.0, -1.0), Vec2::new(1.0, 0.0)),
                (Vec3::new(1.0, 1.0, 1.0), Vec2::new(1.0, 1.0)),
            ],
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
        ),
        (
            [
                (Vec3::new(-1.0, -1.0, -1.0), Vec2::new(0.0, 1.0)),
                (Vec3::new(-1.0, -1.0, 1.0), Vec2::new(0.0, 0.0)),
                (Vec3::new(1.0, -1.0, -1.0), Vec2::new(1.0, 1.0)),
                (Vec3::new(1.0, -1.0, 1.0), Vec2::new(1.0, 0.0)),
            ],
            Vec4::new(1.0, 0.0, 0.0, 1.0),
            Vec4::new(0.0, -1.0, 0.0, 0.0),
        ),
    ];
    let vertices = faces
        .iter()
        .flat_map(|(corners, tangent, normal)| {
            corners.iter().map(move |(position, uv)| {
                vertex(position.extend(1.0), Vec4::new(uv.x, uv.y, 0.0, 0.0), *tangent, *normal)
            })
        })
        .collect();
    (vertices, indices)
}

/// Non-indexed unit sphere, two triangles per latitude/longitude cell
pub fn sphere() -> Vec<StaticVertex> {
    let mut vertices = Vec::with_capacity(SPHERE_STEPS * SPHERE_STEPS * 6);
    let u_step = 1.0 / (SPHERE_STEPS as f32 + 1.0);
    let v_step = 1.0 / SPHERE_STEPS as f32;
    let point = |h: f32, v: f32| Vec3::new(h.cos() * v.cos(), v.sin(), h.sin() * v.cos());
    let corner = |p: Vec3, uv: Vec2| {
        let (_, up) = p.any_orthonormal_pair();
        vertex(p.extend(1.0), Vec4::new(uv.x, uv.y, 0.0, 0.0), up.extend(1.0), p.extend(0.0))
    };

    let mut v = FRAC_PI_2;
    for y in 1..=SPHERE_STEPS {
        let nv = FRAC_PI_2 + PI / SPHERE_STEPS as f32 * y as f32;
        let mut h = 0.0f32;
        for x in 1..=SPHERE_STEPS {
            let nh = TAU / SPHERE_STEPS as f32 * x as f32;
            let (fx, fy) = (x as f32, y as f32);
            let top_left = corner(point(h, v), Vec2::new((fx - 1.0) * u_step, (fy - 1.0) * v_step));
            let btm_left = corner(point(h, nv), Vec2::new((fx - 1.0) * u_step, fy * v_step));
            let top_right = corner(point(nh, v), Vec2::new(fx * u_step, (fy - 1.0) * v_step));
            let btm_right = corner(point(nh, nv), Vec2::new(fx * u_step, fy * v_step));
            vertices.extend_from_slice(&[top_left, top_right, btm_right, top_left, btm_right, btm_left]);
            h = nh;
        }
        v = nv;
    }
    vertices
}

/// Two triangles on z = 0 facing +Z
pub fn plane() -> Vec<StaticVertex> {
    let tangent = Vec4::new(1.0, 0.0, 0.0, 1.0);
    let normal = Vec4::Z;
    [
        (-1.0, -1.0, 0.0, 0.0),
        (1.0, -1.0, 1.0, 0.0),
        (-1.0, 1.0, 0.0, 1.0),
        (1.0, -1.0, 1.0, 0.0),
        (1.0, 1.0, 1.0, 1.0),
        (-1.0, 1.0, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, u, v)| vertex(Vec4::new(x, y, 0.0, 1.0), Vec4::new(u, v, 0.0, 1.0), tangent, normal))
    .collect()
}

/// Two triangles per particle quad: (n, n+1, n+2) and (n+2, n+3, n)
pub fn particle_indices(max_vertices: usize) -> Vec<u32> {
    (0..(max_vertices / 4) as u32)
        .flat_map(|quad| {
            let n = quad * 4;
            [n, n + 1, n + 2, n + 2, n + 3, n]
        })
        .collect()
}

/// Clip-space fullscreen quad used by resolve, blur and composite draws
pub fn fullscreen_quad() -> [UiVertex; 6] {
    let corner = |x: f32, y: f32, u: f32, v: f32| UiVertex::new(Vec4::new(x, y, 0.0, 1.0), Vec4::ONE, Vec4::new(u, v, 0.0, 0.0));
    [
        corner(-1.0, 1.0, 0.0, 0.0),
        corner(-1.0, -1.0, 0.0, 1.0),
        corner(1.0, -1.0, 1.0, 1.0),
        corner(1.0, -1.0, 1.0, 1.0),
        corner(1.0, 1.0, 1.0, 0.0),
        corner(-1.0, 1.0, 0.0, 0.0),
    ]
}

/// Screen-space quad sampling `view_bounds` (x0, y0, x1, y1 in [0, 1], y down)
/// of a `size` texture, with y flipped for the export copy
pub fn copy_quad(size: Vec2, view_bounds: Vec4) -> [UiVertex; 6] {
    let tl = Vec4::new(view_bounds.x, 1.0 - view_bounds.y, 0.0, 0.0);
    let tr = Vec4::new(view_bounds.z, 1.0 - view_bounds.y, 0.0, 0.0);
    let bl = Vec4::new(view_bounds.x, 1.0 - view_bounds.w, 0.0, 0.0);
    let br = Vec4::new(view_bounds.z, 1.0 - view_bounds.w, 0.0, 0.0);
    let at = |x: f32, y: f32, uv: Vec4| UiVertex::new(Vec4::new(x, y, 0.0, 1.0), Vec4::ONE, uv);
    [
        at(0.0, size.y, bl),
        at(0.0, 0.0, tl),
        at(size.x, 0.0, tr),
        at(size.x, 0.0, tr),
        at(size.x, size.y, br),
        at(0.0, size.y, bl),
    ]
}

#[cfg(test)]
#[path = "primitives_tests.rs"]
mod tests;
