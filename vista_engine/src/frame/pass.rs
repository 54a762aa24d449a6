/// Pass: one camera's view of one frame.
///
/// A pass snapshots a camera's frustum and position when it is initialized and
/// then accumulates draw elements into two fixed-capacity lists (opaque and
/// transparent). Slots are reserved with an atomic fetch-add so several
/// producer threads can push into the same pass through a shared reference.
/// Each element packs its sort key and model index into one `AtomicU64`:
/// the upper 32 bits hold an order-preserving encoding of the squared
/// distance, the lower 32 bits the model index.
///
/// A pass only accepts elements or gets drawn while its stamp equals the
/// current frame id; stale passes from earlier frames are ignored without
/// being cleared.

use std::f32::consts::FRAC_PI_2;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use bitflags::bitflags;
use glam::Vec3;

use crate::camera::{Camera, CameraFlags, Frustum, Projection};
use crate::engine_warn;
use crate::light::{Light, LightKind};
use crate::log::EngineLog;
use super::gpu_data::{GpuGlobalData, GpuPassData};
use super::model::ModelFlags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PassFlags: u32 {
        const SHADOWED = 0x1;
        const POINT = 0x2;
        const REFLECTION = 0x4;
    }
}

/// Squared distance used for FORCE_DRAW_FIRST
pub const DRAW_FIRST_DISTANCE: f32 = 0.0;
/// Squared distance used for FORCE_DRAW_LAST
pub const DRAW_LAST_DISTANCE: f32 = 1_000_000.0;

/// Cube face view directions: -X, +X, -Y, +Y, -Z, +Z
const FACE_DIRECTIONS: [Vec3; 6] = [
    Vec3::NEG_X,
    Vec3::X,
    Vec3::NEG_Y,
    Vec3::Y,
    Vec3::NEG_Z,
    Vec3::Z,
];
const FACE_UPS: [Vec3; 6] = [
    Vec3::NEG_Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::Z,
    Vec3::NEG_Y,
    Vec3::NEG_Y,
];
const FACE_NEAR: f32 = 0.1;

/// Stamp of a pass that was never initialized
const UNINITIALIZED: u32 = u32::MAX;

/// A sorted draw entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Element {
    pub index: u32,
    pub distance_sq: f32,
}

#[inline]
fn distance_key(distance_sq: f32) -> u32 {
    let bits = distance_sq.to_bits();
    if bits & 0x8000_0000 != 0 { !bits } else { bits | 0x8000_0000 }
}

#[inline]
fn key_distance(key: u32) -> f32 {
    let bits = if key & 0x8000_0000 != 0 { key & 0x7FFF_FFFF } else { !key };
    f32::from_bits(bits)
}

#[inline]
fn pack(index: u32, distance_sq: f32) -> u64 {
    ((distance_key(distance_sq) as u64) << 32) | index as u64
}

#[inline]
fn unpack(slot: u64) -> Element {
    Element {
        index: slot as u32,
        distance_sq: key_distance((slot >> 32) as u32),
    }
}

pub struct Pass {
    frustum: Frustum,
    position: Vec3,
    forward: Vec3,
    right: Vec3,
    up: Vec3,
    opaque: Box<[AtomicU64]>,
    transparent: Box<[AtomicU64]>,
    opaque_count: AtomicU32,
    transparent_count: AtomicU32,
    flags: PassFlags,
    target_index: u32,
    target_face: u32,
    source_index: u32,
    frame_id: u32,
    log: EngineLog,
}

impl Pass {
    /// Allocate both element lists with `capacity` slots each.
    pub fn new(capacity: usize, log: EngineLog) -> Self {
        let slots = || (0..capacity).map(|_| AtomicU64::new(0)).collect::<Box<[_]>>();
        Self {
            frustum: Frustum::default(),
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            opaque: slots(),
            transparent: slots(),
            opaque_count: AtomicU32::new(0),
            transparent_count: AtomicU32::new(0),
            flags: PassFlags::empty(),
            target_index: 0,
            target_face: 0,
            source_index: 0,
            frame_id: UNINITIALIZED,
            log,
        }
    }

    /// Snapshot `camera` for frame `frame_id` and write its GPU-side data.
    ///
    /// Point cameras are rendered one cube face per pass; `target_face`
    /// selects the face. Counts are reset and the stamp is written last.
    #[allow(clippy::too_many_arguments)]
    pub fn initialize(
        &mut self,
        camera: &Camera,
        global: &mut GpuGlobalData,
        pass_data: &mut GpuPassData,
        target_index: u32,
        target_face: u32,
        source_index: u32,
        frame_id: u32,
        pass_id: usize,
    ) {
        self.position = camera.position();
        *self.opaque_count.get_mut() = 0;
        *self.transparent_count.get_mut() = 0;

        let mut flags = PassFlags::empty();
        flags.set(PassFlags::SHADOWED, camera.is_shadow_caster());
        flags.set(PassFlags::POINT, camera.is_point());
        flags.set(PassFlags::REFLECTION, camera.is_reflection());
        self.flags = flags;

        if let Projection::Point { radius } = *camera.projection() {
            let face = (target_face as usize).min(5);
            let face_camera = Camera::perspective(
                self.position,
                FACE_DIRECTIONS[face],
                FACE_UPS[face],
                1.0,
                FRAC_PI_2,
                FACE_NEAR,
                radius,
                CameraFlags::empty(),
            );
            self.snapshot(&face_camera, global, pass_data, pass_id);
            let (near, far) = (FACE_NEAR, radius);
            global.target_values[pass_id].y = (far + near) / (near - far);
            global.target_values[pass_id].z = 2.0 * far * near / (near - far);
        } else {
            self.snapshot(camera, global, pass_data, pass_id);
        }

        global.target_values[pass_id].x = target_index as f32;
        global.target_values[pass_id].w = source_index as f32;
        global.view_positions[pass_id] = self.position.extend(1.0);
        pass_data.pass_index = pass_id as i32;

        self.target_index = target_index;
        self.target_face = target_face;
        self.source_index = source_index;
        self.frame_id = frame_id;
    }

    fn snapshot(&mut self, camera: &Camera, global: &mut GpuGlobalData, pass_data: &mut GpuPassData, pass_id: usize) {
        let (forward, right, up) = camera.view_directions();
        self.forward = forward;
        self.right = right;
        self.up = up;
        self.frustum = *camera.frustum();
        pass_data.frustum_points = camera.frustum_points();
        global.proj_view[pass_id] = camera.proj_view_matrix();
    }

    /// Reserve a slot and record model `id` at `position`.
    ///
    /// Returns false (with a warning) when the list is full.
    pub fn push_element(&self, id: u32, flags: ModelFlags, position: Vec3, transparent: bool) -> bool {
        let mut distance_sq = position.distance_squared(self.position);
        if flags.contains(ModelFlags::FORCE_DRAW_FIRST) {
            distance_sq = DRAW_FIRST_DISTANCE;
        }
        if flags.contains(ModelFlags::FORCE_DRAW_LAST) {
            distance_sq = DRAW_LAST_DISTANCE;
        }

        let (list, count, name) = if transparent {
            (&self.transparent, &self.transparent_count, "Transparent")
        } else {
            (&self.opaque, &self.opaque_count, "Opaque")
        };

        let slot = count.fetch_add(1, Ordering::Relaxed) as usize;
        match list.get(slot) {
            Some(entry) => {
                entry.store(pack(id, distance_sq), Ordering::Relaxed);
                true
            }
            None => {
                engine_warn!(self.log, "vista::Pass", "{} element list exhausted ({} slots)", name, list.len());
                false
            }
        }
    }

    /// Clamp counts and sort: opaque nearest first, transparent farthest first.
    ///
    /// No-op unless the pass was initialized for `frame_id`.
    pub fn finalize(&mut self, frame_id: u32) {
        if !self.is_initialized(frame_id) {
            return;
        }
        let opaque = (*self.opaque_count.get_mut() as usize).min(self.opaque.len());
        let transparent = (*self.transparent_count.get_mut() as usize).min(self.transparent.len());
        *self.opaque_count.get_mut() = opaque as u32;
        *self.transparent_count.get_mut() = transparent as u32;

        self.opaque[..opaque].sort_unstable_by_key(|slot| slot.load(Ordering::Relaxed));
        self.transparent[..transparent]
            .sort_unstable_by_key(|slot| std::cmp::Reverse(slot.load(Ordering::Relaxed)));
    }

    // ===== GETTERS =====

    pub fn is_initialized(&self, frame_id: u32) -> bool {
        self.frame_id == frame_id
    }

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn flags(&self) -> PassFlags {
        self.flags
    }

    pub fn is_shadowed(&self) -> bool {
        self.flags.contains(PassFlags::SHADOWED)
    }

    pub fn is_point(&self) -> bool {
        self.flags.contains(PassFlags::POINT)
    }

    pub fn is_reflection(&self) -> bool {
        self.flags.contains(PassFlags::REFLECTION)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// (forward, right, up) of the camera, or of the cube face for point passes
    pub fn view_directions(&self) -> (Vec3, Vec3, Vec3) {
        (self.forward, self.right, self.up)
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn target_index(&self) -> u32 {
        self.target_index
    }

    pub fn target_face(&self) -> u32 {
        self.target_face
    }

    pub fn source_index(&self) -> u32 {
        self.source_index
    }

    pub fn capacity(&self) -> usize {
        self.opaque.len()
    }

    pub fn opaque_count(&self) -> usize {
        (self.opaque_count.load(Ordering::Relaxed) as usize).min(self.opaque.len())
    }

    pub fn transparent_count(&self) -> usize {
        (self.transparent_count.load(Ordering::Relaxed) as usize).min(self.transparent.len())
    }

    pub fn opaque_elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.opaque[..self.opaque_count()]
            .iter()
            .map(|slot| unpack(slot.load(Ordering::Relaxed)))
    }

    pub fn transparent_elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.transparent[..self.transparent_count()]
            .iter()
            .map(|slot| unpack(slot.load(Ordering::Relaxed)))
    }

    // ===== VISIBILITY =====

    pub fn sphere_in_frustum(&self, center: Vec3, radius: f32) -> bool {
        self.frustum.contains_sphere(center, radius)
    }

    /// Conservative: tests the box's bounding sphere inflated by half.
    pub fn aabb_in_frustum(&self, min: Vec3, max: Vec3) -> bool {
        let (center, radius) = aabb_sphere(min, max);
        self.sphere_in_frustum(center, radius)
    }

    pub fn cone_in_frustum(&self, apex: Vec3, direction: Vec3, length: f32, theta: f32) -> bool {
        self.frustum.contains_cone(apex, direction, length, theta)
    }

    /// Ambient and directional lights always affect the view.
    pub fn light_in_frustum(&self, light: &Light) -> bool {
        match light.kind() {
            LightKind::Ambient | LightKind::Directional => true,
            LightKind::Point => self.sphere_in_frustum(light.world_position(), light.point_radius()),
            LightKind::Spot => self.cone_in_frustum(
                light.world_position(),
                light.world_direction(),
                light.spot_length(),
                light.spot_theta(),
            ),
        }
    }
}

/// Center and culling radius used for box tests against passes
pub(crate) fn aabb_sphere(min: Vec3, max: Vec3) -> (Vec3, f32) {
    let half = (max - min) * 0.5;
    (min + half, half.max_element() * 1.5)
}

#[cfg(test)]
#[path = "pass_tests.rs"]
mod tests;
