/// Cascaded shadow cameras for directional lights.

use glam::{Vec3, Vec4};
use super::camera::{Camera, CameraFlags};

/// Hard cap on cascades per light
pub const MAX_CASCADES: usize = 4;

/// Distance (world units) that the first two splits share at most
const CASCADE_NEAR_SPAN: f32 = 600.0;

/// Build up to 4 orthographic shadow cameras covering slices of a view frustum.
///
/// `points` are the view camera's `frustum_points()` (relative to
/// `view_position`). One camera is written per slot of `out`, capped at 4;
/// the number written is returned. Each box is fit in light space around its
/// slice and its near plane is pulled back towards the light so every corner
/// of the scene AABB lies in front of it.
pub fn make_cascade_camera_views(
    light_dir: Vec3,
    view_position: Vec3,
    points: &[Vec4; 6],
    scene_min: Vec3,
    scene_max: Vec3,
    out: &mut [Camera],
) -> usize {
    let count = out.len().min(MAX_CASCADES);
    if count == 0 {
        return 0;
    }
    let light_dir = light_dir.try_normalize().unwrap_or(Vec3::NEG_Y);

    let mut up = Vec3::Y;
    if up.dot(light_dir).abs() >= 1.0 - f32::EPSILON {
        up = Vec3::Z;
    }
    let right = light_dir.cross(up).normalize();
    let up = right.cross(light_dir);

    let ntl = points[0].truncate();
    let ntr = points[1].truncate();
    let nbl = points[2].truncate();
    let ftl = points[3].truncate();
    let ftr = points[4].truncate();
    let fbl = points[5].truncate();
    let nbr = ntl + (ntr - ntl) + (nbl - ntl);
    let fbr = ftl + (ftr - ftl) + (fbl - ftl);

    let edges = [ftl - ntl, ftr - ntr, fbl - nbl, fbr - nbr];
    let starts = [ntl, ntr, nbl, nbr];

    let far = points[1].w;
    let span = CASCADE_NEAR_SPAN.min(far * 0.6);
    let mut splits = [0.0, (span * 0.33) / far, span / far, 0.6, 1.0];
    splits[count] = 1.0;

    let scene_corners = [
        scene_min,
        Vec3::new(scene_max.x, scene_min.y, scene_min.z),
        Vec3::new(scene_min.x, scene_max.y, scene_min.z),
        Vec3::new(scene_max.x, scene_max.y, scene_min.z),
        Vec3::new(scene_min.x, scene_min.y, scene_max.z),
        Vec3::new(scene_max.x, scene_min.y, scene_max.z),
        Vec3::new(scene_min.x, scene_max.y, scene_max.z),
        scene_max,
    ];

    for (i, camera) in out.iter_mut().take(count).enumerate() {
        let (a, b) = (splits[i], splits[i + 1]);
        let mut slice = [Vec3::ZERO; 8];
        for c in 0..4 {
            slice[c] = starts[c] + edges[c] * a;
            slice[c + 4] = starts[c] + edges[c] * b;
        }

        let origin = slice[0];
        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        for p in &slice[1..] {
            let c = *p - origin;
            let local = Vec3::new(right.dot(c), up.dot(c), light_dir.dot(c));
            min = min.min(local);
            max = max.max(local);
        }

        let world_origin = view_position + origin;
        for corner in &scene_corners {
            min.z = min.z.min(light_dir.dot(*corner - world_origin));
        }

        *camera = Camera::ortho(
            world_origin + light_dir * min.z,
            light_dir,
            up,
            min.x,
            max.x,
            min.y,
            max.y,
            0.0,
            max.z - min.z,
            CameraFlags::SHADOW_CASTER,
        );
    }
    count
}

#[cfg(test)]
#[path = "cascade_tests.rs"]
mod tests;
