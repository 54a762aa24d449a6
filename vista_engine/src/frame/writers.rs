/// Submission helpers built on `Frame::push_model`.
///
/// These place built-in primitive geometry (cube, sphere, cone, particle
/// quads) with a transform and cull it against the frame's passes before
/// pushing it. Debug variants draw with a flat unlit color.

use glam::{Mat4, Vec2, Vec3, Vec4};

use super::frame::Frame;
use super::gpu_data::GpuMaterial;
use super::material::{prepare_gpu_material, Material, MaterialPipeline};
use super::model::{FrameModel, ModelFlags};
use crate::config::MAX_BONES;
use crate::vertex::ParticleVertex;

/// Geometry ids of the built-in primitives, created by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrimitiveIds {
    pub cube_vertex: u32,
    pub cube_index: u32,
    pub sphere_vertex: u32,
    pub cone_vertex: u32,
    pub cone_index: u32,
    pub plane_vertex: u32,
    pub particle_vertex: u32,
    pub particle_index: u32,
}

/// Vertex/index buffer pair plus the drawn range (count 0 draws everything)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Geometry {
    pub vertex_id: u32,
    pub index_id: u32,
    pub offset: u32,
    pub count: u32,
}

impl Geometry {
    pub fn new(vertex_id: u32, index_id: u32) -> Self {
        Self { vertex_id, index_id, offset: 0, count: 0 }
    }

    pub fn range(mut self, offset: u32, count: u32) -> Self {
        self.offset = offset;
        self.count = count;
        self
    }
}

/// Index range of one mesh primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshPrimitive {
    pub offset: u32,
    pub count: u32,
}

/// A skinned mesh ready to submit: its geometry, primitive ranges and
/// world bounds for the current pose
#[derive(Debug, Clone, Copy)]
pub struct SkinnedMesh<'a> {
    pub vertex_id: u32,
    pub index_id: u32,
    pub primitives: &'a [MeshPrimitive],
    pub bounds_min: Vec3,
    pub bounds_max: Vec3,
}

/// Colors used by `write_debug_axis` (positive, negative half-axis)
const AXIS_COLORS: [(Vec4, Vec4); 3] = [
    (Vec4::new(1.0, 0.0, 0.0, 1.0), Vec4::new(0.5, 0.0, 0.0, 0.5)),
    (Vec4::new(0.0, 1.0, 0.0, 1.0), Vec4::new(0.0, 0.5, 0.0, 0.5)),
    (Vec4::new(0.0, 0.0, 1.0, 1.0), Vec4::new(0.0, 0.0, 0.5, 0.5)),
];

/// Unit cube stretched between `a` and `b`; returns (transform, midpoint, half length)
fn line_transform(a: Vec3, b: Vec3, thickness: f32) -> (Mat4, Vec3, f32) {
    let delta = b - a;
    let length = delta.length();
    let dir = delta.try_normalize().unwrap_or(Vec3::Z);
    let (right, up) = dir.any_orthonormal_pair();
    let rotation = Mat4::from_cols(right.extend(0.0), up.extend(0.0), dir.extend(0.0), Vec4::W);
    let half = length * 0.5;
    let mid = a + dir * half;
    let transform = Mat4::from_translation(mid) * rotation * Mat4::from_scale(Vec3::new(thickness, thickness, half));
    (transform, mid, half)
}

/// Unit cone (apex at origin, base at z = 1) opened to `theta` and aimed along `dir`
fn cone_transform(position: Vec3, dir: Vec3, theta: f32, length: f32) -> Mat4 {
    let dir = dir.try_normalize().unwrap_or(Vec3::Z);
    let radius = theta.tan() * length;
    let d = Vec3::Z.dot(dir);
    let rotation = if d < -1.0 + f32::EPSILON {
        Mat4::from_scale(Vec3::new(1.0, 1.0, -1.0))
    } else if d < 1.0 - f32::EPSILON {
        let up = Vec3::Z.cross(dir).normalize();
        let right = up.cross(dir).normalize();
        let up = dir.cross(right);
        Mat4::from_cols(right.extend(0.0), up.extend(0.0), dir.extend(0.0), Vec4::W)
    } else {
        Mat4::IDENTITY
    };
    Mat4::from_translation(position) * rotation * Mat4::from_scale(Vec3::new(radius, radius, length))
}

fn cube_transform(position: Vec3, size: Vec3) -> (Mat4, Vec3) {
    let half = size * 0.5;
    (Mat4::from_translation(position) * Mat4::from_scale(half), half)
}

impl Frame {
    /// Sample `material` and push geometry into `pass_bits`; `None` when no
    /// pass is targeted or the model table is full.
    pub fn write_geometry(
        &mut self,
        geometry: Geometry,
        anim_id: u32,
        pass_bits: u32,
        transform: &Mat4,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<u32> {
        if pass_bits == 0 {
            return None;
        }
        let mut model = FrameModel::new(
            material.pipeline(),
            geometry.vertex_id,
            geometry.index_id,
            flags,
            geometry.offset,
            geometry.count,
        );
        let gpu = prepare_gpu_material(&mut model, material, Vec2::ZERO, Vec2::ONE, 1.0);
        self.push_model(&model, pass_bits, anim_id, transform, &gpu, material.is_transparent())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_mesh_primitive(
        &mut self,
        vertex_id: u32,
        index_id: u32,
        primitive: &MeshPrimitive,
        anim_id: u32,
        pass_bits: u32,
        transform: &Mat4,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<u32> {
        let geometry = Geometry::new(vertex_id, index_id).range(primitive.offset, primitive.count);
        self.write_geometry(geometry, anim_id, pass_bits, transform, material, flags)
    }

    /// Cull a skinned mesh by its bounds, store `render_matrices` in a new
    /// animation slot and push every primitive against it. Returns the
    /// animation id, `None` when nothing sees the mesh or the animation
    /// table is full.
    pub fn write_skinned(
        &mut self,
        mesh: &SkinnedMesh<'_>,
        render_matrices: &[Mat4],
        target_bits: u32,
        transform: &Mat4,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<u32> {
        let pass_bits = self.pass_bits_in_aabb(mesh.bounds_min, mesh.bounds_max, target_bits);
        if pass_bits == 0 {
            return None;
        }
        let anim_id = self.next_animation()?;
        if let Some(slot) = self.animation_mut(anim_id) {
            let count = render_matrices.len().min(MAX_BONES);
            slot.bones[..count].copy_from_slice(&render_matrices[..count]);
        }
        for primitive in mesh.primitives {
            self.write_mesh_primitive(mesh.vertex_id, mesh.index_id, primitive, anim_id, pass_bits, transform, material, flags);
        }
        Some(anim_id)
    }

    /// Flat-colored unlit geometry; translucent when `color.w < 1`.
    pub fn write_debug_geometry(
        &mut self,
        geometry: Geometry,
        pass_bits: u32,
        transform: &Mat4,
        color: Vec4,
        flags: ModelFlags,
    ) -> Option<u32> {
        if pass_bits == 0 {
            return None;
        }
        let model = FrameModel::new(
            MaterialPipeline::Unlit,
            geometry.vertex_id,
            geometry.index_id,
            flags,
            geometry.offset,
            geometry.count,
        );
        let material = GpuMaterial {
            color_a: color,
            ..GpuMaterial::default()
        };
        self.push_model(&model, pass_bits, 0, transform, &material, color.w < 1.0)
    }

    // ===== LINES AND POINTS =====

    pub fn write_debug_line(&mut self, pass_bits: u32, a: Vec3, b: Vec3, thickness: f32, color: Vec4, flags: ModelFlags) -> Option<u32> {
        let (transform, mid, half) = line_transform(a, b, thickness);
        let bits = self.pass_bits_in_sphere(mid, half, pass_bits);
        let cube = Geometry::new(self.primitives.cube_vertex, self.primitives.cube_index);
        self.write_debug_geometry(cube, bits, &transform, color, flags)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_line(
        &mut self,
        pass_bits: u32,
        a: Vec3,
        b: Vec3,
        thickness: f32,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<u32> {
        let (transform, mid, half) = line_transform(a, b, thickness);
        let bits = self.pass_bits_in_sphere(mid, half, pass_bits);
        let cube = Geometry::new(self.primitives.cube_vertex, self.primitives.cube_index);
        self.write_geometry(cube, 0, bits, &transform, material, flags)
    }

    pub fn write_debug_point(&mut self, pass_bits: u32, position: Vec3, radius: f32, color: Vec4, flags: ModelFlags) -> Option<u32> {
        let transform = Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius));
        let bits = self.pass_bits_in_sphere(position, radius.abs(), pass_bits);
        let sphere = Geometry::new(self.primitives.sphere_vertex, 0);
        self.write_debug_geometry(sphere, bits, &transform, color, flags)
    }

    pub fn write_point(&mut self, pass_bits: u32, position: Vec3, radius: f32, material: &dyn Material, flags: ModelFlags) -> Option<u32> {
        let transform = Mat4::from_translation(position) * Mat4::from_scale(Vec3::splat(radius));
        let bits = self.pass_bits_in_sphere(position, radius.abs(), pass_bits);
        let sphere = Geometry::new(self.primitives.sphere_vertex, 0);
        self.write_geometry(sphere, 0, bits, &transform, material, flags)
    }

    // ===== SHAPES =====

    #[allow(clippy::too_many_arguments)]
    pub fn write_debug_cone(
        &mut self,
        pass_bits: u32,
        position: Vec3,
        dir: Vec3,
        theta: f32,
        length: f32,
        color: Vec4,
        flags: ModelFlags,
    ) -> Option<u32> {
        let transform = cone_transform(position, dir, theta, length);
        let bits = self.pass_bits_in_sphere(position, length * 1.5, pass_bits);
        let cone = Geometry::new(self.primitives.cone_vertex, self.primitives.cone_index);
        self.write_debug_geometry(cone, bits, &transform, color, flags)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_cone(
        &mut self,
        pass_bits: u32,
        position: Vec3,
        dir: Vec3,
        theta: f32,
        length: f32,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<u32> {
        let transform = cone_transform(position, dir, theta, length);
        let bits = self.pass_bits_in_sphere(position, length, pass_bits);
        let cone = Geometry::new(self.primitives.cone_vertex, self.primitives.cone_index);
        self.write_geometry(cone, 0, bits, &transform, material, flags)
    }

    pub fn write_debug_cube(&mut self, pass_bits: u32, position: Vec3, size: Vec3, color: Vec4, flags: ModelFlags) -> Option<u32> {
        let (transform, half) = cube_transform(position, size);
        let bits = self.pass_bits_in_aabb(position - half, position + half, pass_bits);
        let cube = Geometry::new(self.primitives.cube_vertex, self.primitives.cube_index);
        self.write_debug_geometry(cube, bits, &transform, color, flags)
    }

    pub fn write_cube(&mut self, pass_bits: u32, position: Vec3, size: Vec3, material: &dyn Material, flags: ModelFlags) -> Option<u32> {
        let (transform, half) = cube_transform(position, size);
        let bits = self.pass_bits_in_aabb(position - half, position + half, pass_bits);
        let cube = Geometry::new(self.primitives.cube_vertex, self.primitives.cube_index);
        self.write_geometry(cube, 0, bits, &transform, material, flags)
    }

    /// Twelve edges of the box as debug lines; returns how many were stored.
    pub fn write_debug_aabb(&mut self, pass_bits: u32, min: Vec3, max: Vec3, thickness: f32, color: Vec4, flags: ModelFlags) -> usize {
        let lo = [
            min,
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
        ];
        let hi = [
            max,
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, min.y, max.z),
        ];
        let edges = [
            (lo[0], lo[1]), (lo[0], lo[2]), (lo[1], lo[3]), (lo[2], lo[3]),
            (hi[0], hi[1]), (hi[0], hi[2]), (hi[1], hi[3]), (hi[2], hi[3]),
            (lo[0], hi[3]), (lo[1], hi[2]), (lo[2], hi[1]), (lo[3], hi[0]),
        ];
        edges
            .iter()
            .filter(|(a, b)| self.write_debug_line(pass_bits, *a, *b, thickness, color, flags).is_some())
            .count()
    }

    /// Axis gizmo for `transform`: bright positive and dim negative half-axes.
    #[allow(clippy::too_many_arguments)]
    pub fn write_debug_axis(
        &mut self,
        pass_bits: u32,
        transform: &Mat4,
        length: f32,
        thickness: f32,
        ignore_scale: bool,
        flags: ModelFlags,
    ) -> usize {
        let origin = transform.w_axis.truncate();
        let mut written = 0;
        for (i, (positive, negative)) in AXIS_COLORS.iter().enumerate() {
            let mut axis = transform.transform_vector3(Vec3::AXES[i]);
            if ignore_scale {
                axis = axis.normalize_or_zero();
            }
            axis *= length;
            written += self.write_debug_line(pass_bits, origin, origin + axis, thickness, *positive, flags).is_some() as usize;
            written += self.write_debug_line(pass_bits, origin, origin - axis, thickness, *negative, flags).is_some() as usize;
        }
        written
    }

    // ===== PARTICLES =====

    /// Reserve `count` particle vertices drawn with `material`.
    ///
    /// The returned slice is filled by the caller, four vertices per quad.
    pub fn prepare_particles(
        &mut self,
        pass_bits: u32,
        count: usize,
        material: &dyn Material,
        flags: ModelFlags,
    ) -> Option<&mut [ParticleVertex]> {
        let index_count = u32::try_from(count / 4).ok().and_then(|quads| quads.checked_mul(6))?;
        let offset = self.write_particles(count)?;
        let geometry = Geometry::new(self.primitives.particle_vertex, self.primitives.particle_index)
            .range((offset / 4) * 6, index_count);
        self.write_geometry(geometry, 0, pass_bits, &Mat4::IDENTITY, material, flags);
        Some(self.particles_mut(offset, count))
    }
}

/// Camera-facing quad centered on `position`; returns the unwritten tail.
#[allow(clippy::too_many_arguments)]
pub fn write_particle_rect<'a>(
    out: &'a mut [ParticleVertex],
    position: Vec3,
    right: Vec3,
    up: Vec3,
    bottom_left: Vec2,
    top_right: Vec2,
    transparency: f32,
    normal: Vec3,
    tangent: Vec3,
) -> Option<&'a mut [ParticleVertex]> {
    let corners = [
        position - right - up,
        position - right + up,
        position + right + up,
        position + right - up,
    ];
    write_quad(out, corners, bottom_left, top_right, transparency, normal, tangent)
}

/// Ribbon of width `2 * thickness` from `a` to `b`; returns the unwritten tail.
#[allow(clippy::too_many_arguments)]
pub fn write_particle_line<'a>(
    out: &'a mut [ParticleVertex],
    a: Vec3,
    b: Vec3,
    up: Vec3,
    thickness: f32,
    bottom_left: Vec2,
    top_right: Vec2,
    transparency: f32,
    normal: Vec3,
    tangent: Vec3,
) -> Option<&'a mut [ParticleVertex]> {
    let dir = (b - a).normalize_or_zero();
    let perp = dir.cross(up) * thickness;
    let corners = [a + perp, a - perp, b - perp, b + perp];
    write_quad(out, corners, bottom_left, top_right, transparency, normal, tangent)
}

fn write_quad(
    out: &mut [ParticleVertex],
    corners: [Vec3; 4],
    bottom_left: Vec2,
    top_right: Vec2,
    transparency: f32,
    normal: Vec3,
    tangent: Vec3,
) -> Option<&mut [ParticleVertex]> {
    let (quad, rest) = out.split_first_chunk_mut::<4>()?;
    let tex_coords = [
        Vec2::new(bottom_left.x, bottom_left.y),
        Vec2::new(bottom_left.x, top_right.y),
        Vec2::new(top_right.x, top_right.y),
        Vec2::new(top_right.x, bottom_left.y),
    ];
    for ((vertex, corner), tc) in quad.iter_mut().zip(corners).zip(tex_coords) {
        *vertex = ParticleVertex {
            position: corner.extend(1.0),
            tex_coord: Vec4::new(tc.x, tc.y, transparency, 0.0),
            tangent: tangent.extend(0.0),
            normal: normal.extend(0.0),
        };
    }
    Some(rest)
}

#[cfg(test)]
#[path = "writers_tests.rs"]
mod tests;
