/// Camera: view/projection state and world-space frustum for one pass.
///
/// A camera is one of three projection kinds (perspective, orthographic or an
/// omnidirectional point camera used for cube shadows). All mutating setters
/// rebuild the frustum, so `frustum()` is always consistent with the pose.
///
/// Matrices follow the GL clip convention (depth in [-1, 1]).

use bitflags::bitflags;
use glam::{Mat4, Vec2, Vec3, Vec4};
use super::frustum::Frustum;

bitflags! {
    /// Per-camera rendering roles
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CameraFlags: u32 {
        /// Pass renders depth into a shadow target
        const SHADOW_CASTER = 0x1;
        /// Pass renders a reflection probe
        const REFLECTION = 0x2;
    }
}

/// Projection parameters, tagged by kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective { fov: f32, aspect: f32, near: f32, far: f32 },
    Ortho { left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32 },
    Point { radius: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    position: Vec3,
    direction: Vec3,
    up: Vec3,
    projection: Projection,
    flags: CameraFlags,
    pass_id: u32,
    frustum: Frustum,
}

impl Default for Camera {
    fn default() -> Self {
        Camera::perspective(
            Vec3::ZERO,
            Vec3::NEG_Z,
            Vec3::Y,
            1.0,
            std::f32::consts::FRAC_PI_2,
            0.1,
            1000.0,
            CameraFlags::empty(),
        )
    }
}

impl Camera {
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        aspect: f32,
        fov: f32,
        near: f32,
        far: f32,
        flags: CameraFlags,
    ) -> Self {
        Self::with_projection(
            position,
            direction,
            up,
            Projection::Perspective { fov, aspect, near, far },
            flags,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn ortho(
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
        flags: CameraFlags,
    ) -> Self {
        Self::with_projection(
            position,
            direction,
            up,
            Projection::Ortho { left, right, bottom, top, near, far },
            flags,
        )
    }

    /// Omnidirectional camera covering a sphere of `radius` around `position`
    pub fn point(position: Vec3, radius: f32, flags: CameraFlags) -> Self {
        Self::with_projection(position, Vec3::NEG_Z, Vec3::Y, Projection::Point { radius }, flags)
    }

    pub fn with_projection(
        position: Vec3,
        direction: Vec3,
        up: Vec3,
        projection: Projection,
        flags: CameraFlags,
    ) -> Self {
        let mut camera = Self {
            position,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Z),
            up,
            projection,
            flags,
            pass_id: 0,
            frustum: Frustum::default(),
        };
        camera.build_frustum();
        camera
    }

    // ===== GETTERS =====

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn flags(&self) -> CameraFlags {
        self.flags
    }

    pub fn is_ortho(&self) -> bool {
        matches!(self.projection, Projection::Ortho { .. })
    }

    pub fn is_point(&self) -> bool {
        matches!(self.projection, Projection::Point { .. })
    }

    pub fn is_shadow_caster(&self) -> bool {
        self.flags.contains(CameraFlags::SHADOW_CASTER)
    }

    pub fn is_reflection(&self) -> bool {
        self.flags.contains(CameraFlags::REFLECTION)
    }

    pub fn pass_id(&self) -> u32 {
        self.pass_id
    }

    /// 0 for pass ids past the 32 raw passes
    pub fn pass_bit(&self) -> u32 {
        1u32.checked_shl(self.pass_id).unwrap_or(0)
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    /// Orthonormal (forward, right, up) basis.
    ///
    /// When `up` is parallel to the view direction, +Z is used instead.
    pub fn view_directions(&self) -> (Vec3, Vec3, Vec3) {
        let forward = self.direction;
        let mut up = self.up;
        if forward.dot(up).abs() >= 1.0 - f32::EPSILON {
            up = Vec3::Z;
        }
        let right = forward.cross(up).normalize_or_zero();
        let up = right.cross(forward);
        (forward, right, up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        let (forward, _, up) = self.view_directions();
        Mat4::look_to_rh(self.position, forward, up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { fov, aspect, near, far } => {
                Mat4::perspective_rh_gl(fov, aspect, near, far)
            }
            Projection::Ortho { left, right, bottom, top, near, far } => {
                Mat4::orthographic_rh_gl(left, right, bottom, top, near, far)
            }
            Projection::Point { radius } => {
                let inv = 1.0 / radius;
                Mat4::from_scale(Vec3::splat(inv))
            }
        }
    }

    pub fn proj_view_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Corner points of the view volume relative to the camera position.
    ///
    /// Order: near-top-left, near-top-right, near-bottom-left,
    /// far-top-left, far-top-right, far-bottom-left. The near distance is
    /// stored in `[0].w` and the far distance in `[1].w`.
    pub fn frustum_points(&self) -> [Vec4; 6] {
        let (forward, right, up) = self.view_directions();
        let (near_c, far_c, l_n, r_n, b_n, t_n, l_f, r_f, b_f, t_f, near, far) = match self.projection {
            Projection::Perspective { fov, aspect, near, far } => {
                let t = (fov * 0.5).tan();
                let nh = near * t;
                let nw = nh * aspect;
                let fh = far * t;
                let fw = fh * aspect;
                (forward * near, forward * far, -nw, nw, -nh, nh, -fw, fw, -fh, fh, near, far)
            }
            Projection::Ortho { left, right: r, bottom, top, near, far } => {
                (forward * near, forward * far, left, r, bottom, top, left, r, bottom, top, near, far)
            }
            Projection::Point { radius } => (
                -forward * radius,
                forward * radius,
                -radius, radius, -radius, radius,
                -radius, radius, -radius, radius,
                -radius, radius,
            ),
        };

        let corner = |center: Vec3, x: f32, y: f32| (center + right * x + up * y).extend(0.0);
        let mut points = [
            corner(near_c, l_n, t_n),
            corner(near_c, r_n, t_n),
            corner(near_c, l_n, b_n),
            corner(far_c, l_f, t_f),
            corner(far_c, r_f, t_f),
            corner(far_c, l_f, b_f),
        ];
        points[0].w = near;
        points[1].w = far;
        points
    }

    // ===== SETTERS =====

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.build_frustum();
    }

    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.try_normalize().unwrap_or(self.direction);
        self.build_frustum();
    }

    pub fn set_up(&mut self, up: Vec3) {
        self.up = up;
        self.build_frustum();
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
        self.build_frustum();
    }

    /// Only perspective cameras carry an aspect ratio; others are unchanged.
    pub fn set_aspect(&mut self, new_aspect: f32) {
        if let Projection::Perspective { aspect, .. } = &mut self.projection {
            *aspect = new_aspect;
            self.build_frustum();
        }
    }

    pub fn set_shadow_caster(&mut self, enabled: bool) {
        self.flags.set(CameraFlags::SHADOW_CASTER, enabled);
    }

    pub fn set_reflection(&mut self, enabled: bool) {
        self.flags.set(CameraFlags::REFLECTION, enabled);
    }

    /// Recorded by `Frame::initialize_pass`
    pub fn set_pass_id(&mut self, pass_id: u32) {
        self.pass_id = pass_id;
    }

    /// Direction as (yaw, pitch) in radians
    pub fn spherical_direction(&self) -> Vec2 {
        let d = self.direction;
        Vec2::new(d.z.atan2(d.x), d.y.clamp(-1.0, 1.0).asin())
    }

    pub fn set_spherical_direction(&mut self, angles: Vec2) {
        let c = angles.y.cos();
        self.set_direction(Vec3::new(angles.x.cos() * c, angles.y.sin(), angles.x.sin() * c));
    }

    // ===== FRUSTUM =====

    /// Recompute the six world-space planes from the pose and projection.
    pub fn build_frustum(&mut self) {
        let (f, r, u) = self.view_directions();
        let relative = match self.projection {
            Projection::Perspective { fov, aspect, near, far } => {
                let nh = near * (fov * 0.5).tan();
                let nw = nh * aspect;
                let nc = f * near;
                [
                    f.extend(-near),
                    (-f).extend(far),
                    (nc - r * nw).cross(u).normalize_or_zero().extend(0.0),
                    u.cross(nc + r * nw).normalize_or_zero().extend(0.0),
                    r.cross(nc - u * nh).normalize_or_zero().extend(0.0),
                    (nc + u * nh).cross(r).normalize_or_zero().extend(0.0),
                ]
            }
            Projection::Ortho { left, right, bottom, top, near, far } => [
                f.extend(-near),
                (-f).extend(far),
                r.extend(-left),
                (-r).extend(right),
                u.extend(-bottom),
                (-u).extend(top),
            ],
            Projection::Point { radius } => [
                f.extend(radius),
                (-f).extend(radius),
                r.extend(radius),
                (-r).extend(radius),
                u.extend(radius),
                (-u).extend(radius),
            ],
        };
        self.frustum = Frustum::from_relative_planes(self.position, relative);
    }

    pub fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        self.frustum.contains_sphere(center, radius)
    }

    pub fn cone_in_frustum(&self, apex: Vec3, direction: Vec3, length: f32, theta: f32) -> bool {
        self.frustum.contains_cone(apex, direction, length, theta)
    }

    pub fn aabb_in_frustum(&self, min: Vec3, max: Vec3) -> bool {
        self.frustum.intersects_aabb(min, max)
    }

    // ===== SCREEN MAPPING =====

    /// World point to window coordinates; z holds depth in [0, 1].
    ///
    /// Returns `None` for points on the camera plane.
    pub fn project(&self, point: Vec3, window: Vec2) -> Option<Vec3> {
        let clip = self.proj_view_matrix() * point.extend(1.0);
        if clip.w.abs() <= f32::EPSILON {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec3::new(
            (ndc.x * 0.5 + 0.5) * window.x,
            (ndc.y * 0.5 + 0.5) * window.y,
            (ndc.z + 1.0) * 0.5,
        ))
    }

    /// Window coordinates and depth in [0, 1] back to a world point.
    pub fn unproject(&self, screen: Vec2, depth: f32, window: Vec2) -> Vec3 {
        let ndc = (screen / window * 2.0 - Vec2::ONE).extend(depth * 2.0 - 1.0).extend(1.0);
        let world = self.proj_view_matrix().inverse() * ndc;
        if world.w.abs() <= f32::EPSILON {
            return self.position;
        }
        world.truncate() / world.w
    }

    /// Cast the ray under `screen` against `plane` (normal.xyz, offset w).
    pub fn unproject_against_plane(&self, screen: Vec2, window: Vec2, plane: Vec4) -> Option<Vec3> {
        let near = self.unproject(screen, 0.0, window);
        let far = self.unproject(screen, 1.0, window);
        let dir = far - near;
        let normal = plane.truncate();
        let denom = normal.dot(dir);
        if denom.abs() <= f32::EPSILON {
            return None;
        }
        let t = -(normal.dot(near) + plane.w) / denom;
        if t < 0.0 {
            return None;
        }
        Some(near + dir * t)
    }
}

/// Pass bits of every camera whose frustum contains the sphere
pub fn passes_for_sphere_in_cameras(cameras: &[Camera], center: Vec3, radius: f32) -> u32 {
    cameras
        .iter()
        .filter(|c| c.sphere_in_frustum(center, radius))
        .fold(0, |bits, c| bits | c.pass_bit())
}

/// Pass bits of every camera whose frustum contains the cone
pub fn passes_for_cone_in_cameras(
    cameras: &[Camera],
    apex: Vec3,
    direction: Vec3,
    length: f32,
    theta: f32,
) -> u32 {
    cameras
        .iter()
        .filter(|c| c.cone_in_frustum(apex, direction, length, theta))
        .fold(0, |bits, c| bits | c.pass_bit())
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
