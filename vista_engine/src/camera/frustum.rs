/// Frustum: six world-space half-spaces for visibility culling.
///
/// Each plane is a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed offset
/// - A point P is inside if dot(normal, P) + D >= 0 for all planes
///
/// Cameras build their planes relative to their own position and translate
/// them into world space with `from_relative_planes`. Passes keep a copy, so a
/// camera can move after its pass was initialized without affecting culling.

use glam::{Vec3, Vec4};

/// Frustum plane indices
pub const PLANE_NEAR: usize = 0;
pub const PLANE_FAR: usize = 1;
pub const PLANE_LEFT: usize = 2;
pub const PLANE_RIGHT: usize = 3;
pub const PLANE_BOTTOM: usize = 4;
pub const PLANE_TOP: usize = 5;

/// Six frustum planes: near, far, left, right, bottom, top
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub planes: [Vec4; 6],
}

impl Default for Frustum {
    /// Degenerate frustum that accepts everything
    fn default() -> Self {
        Self { planes: [Vec4::ZERO; 6] }
    }
}

impl Frustum {
    /// Translate planes expressed relative to `origin` into world space.
    pub fn from_relative_planes(origin: Vec3, relative: [Vec4; 6]) -> Self {
        let mut planes = relative;
        for plane in &mut planes {
            let normal = plane.truncate();
            plane.w -= normal.dot(origin);
        }
        Self { planes }
    }

    /// Signed distance from `point` to plane `index`
    #[inline]
    pub fn distance(&self, index: usize, point: Vec3) -> f32 {
        let plane = self.planes[index];
        plane.truncate().dot(point) + plane.w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance(i, point) >= 0.0)
    }

    /// True when the sphere is inside or intersecting every plane.
    pub fn contains_sphere(&self, center: Vec3, radius: f32) -> bool {
        (0..6).all(|i| self.distance(i, center) >= -radius)
    }

    /// Cone test: apex at `apex`, opening along `direction` for `length`, half-angle `theta`.
    ///
    /// For each plane, the base-rim point furthest along the plane normal is
    /// tested together with the apex; the cone is culled only when both lie
    /// behind the same plane.
    pub fn contains_cone(&self, apex: Vec3, direction: Vec3, length: f32, theta: f32) -> bool {
        let radius = theta.tan() * length;
        let base = apex + direction * length;
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let towards = normal.cross(direction).cross(direction).normalize_or_zero();
            let rim = base - towards * radius;
            normal.dot(apex) + plane.w >= 0.0 || normal.dot(rim) + plane.w >= 0.0
        })
    }

    /// Test if an AABB intersects this frustum.
    ///
    /// Uses the "positive vertex" test: for each plane, find the AABB corner
    /// most in the direction of the plane normal. If that corner is outside,
    /// the AABB is fully outside. May return false positives, never false negatives.
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();

            let p_vertex = Vec3::new(
                if normal.x >= 0.0 { max.x } else { min.x },
                if normal.y >= 0.0 { max.y } else { min.y },
                if normal.z >= 0.0 { max.z } else { min.z },
            );

            if normal.dot(p_vertex) + plane.w < 0.0 {
                return false;
            }
        }

        true
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
