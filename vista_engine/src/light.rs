/// Light: the submission-side description of a scene light.
///
/// The light kind is encoded in `position.w` so a light uploads to the GPU as
/// three plain vectors:
/// - `w < 0`: ambient, intensity `-(w + 1)`
/// - `w == 0`: directional, `direction.xyz` is the light direction
/// - `w == 1`: point, `direction.x` inner radius, `direction.y` falloff radius
/// - otherwise: spot, half-angle `w - 1`, `direction.w` length
///
/// `color.w` carries the intensity for every kind except ambient.

use bitflags::bitflags;
use glam::{Vec3, Vec4};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct LightFlags: u32 {
        const SHADOW_CASTER = 0x1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
}

impl LightKind {
    /// Decode a kind from an encoded `position.w`
    pub fn from_w(w: f32) -> Self {
        if w < 0.0 {
            LightKind::Ambient
        } else if w == 0.0 {
            LightKind::Directional
        } else if w == 1.0 {
            LightKind::Point
        } else {
            LightKind::Spot
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec4,
    pub direction: Vec4,
    pub color: Vec4,
    pub flags: LightFlags,
}

impl Light {
    pub fn ambient(color: Vec3, intensity: f32) -> Self {
        Self {
            position: Vec4::new(0.0, 0.0, 0.0, -1.0 - intensity),
            direction: Vec4::ZERO,
            color: color.extend(1.0),
            flags: LightFlags::empty(),
        }
    }

    pub fn directional(direction: Vec3, color: Vec3, intensity: f32) -> Self {
        Self {
            position: Vec4::ZERO,
            direction: direction.normalize_or_zero().extend(0.0),
            color: color.extend(intensity),
            flags: LightFlags::empty(),
        }
    }

    pub fn point(position: Vec3, inner_radius: f32, falloff_radius: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            position: position.extend(1.0),
            direction: Vec4::new(inner_radius, falloff_radius, 0.0, 0.0),
            color: color.extend(intensity),
            flags: LightFlags::empty(),
        }
    }

    /// `theta` is the cone half-angle in radians
    pub fn spot(position: Vec3, direction: Vec3, theta: f32, length: f32, color: Vec3, intensity: f32) -> Self {
        Self {
            position: position.extend(1.0 + theta),
            direction: direction.normalize_or_zero().extend(length),
            color: color.extend(intensity),
            flags: LightFlags::empty(),
        }
    }

    pub fn with_shadow(mut self) -> Self {
        self.flags.insert(LightFlags::SHADOW_CASTER);
        self
    }

    // ===== GETTERS =====

    pub fn kind(&self) -> LightKind {
        LightKind::from_w(self.position.w)
    }

    pub fn is_shadow_caster(&self) -> bool {
        self.flags.contains(LightFlags::SHADOW_CASTER)
    }

    pub fn world_position(&self) -> Vec3 {
        self.position.truncate()
    }

    pub fn world_direction(&self) -> Vec3 {
        self.direction.truncate()
    }

    pub fn intensity(&self) -> f32 {
        match self.kind() {
            LightKind::Ambient => -(self.position.w + 1.0),
            _ => self.color.w,
        }
    }

    pub fn point_inner_radius(&self) -> f32 {
        self.direction.x
    }

    pub fn point_falloff_radius(&self) -> f32 {
        self.direction.y
    }

    pub fn point_radius(&self) -> f32 {
        self.direction.x + self.direction.y
    }

    pub fn spot_theta(&self) -> f32 {
        self.position.w - 1.0
    }

    pub fn spot_length(&self) -> f32 {
        self.direction.w
    }

    /// World bounds; ambient and directional lights collapse to their position.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let p = self.world_position();
        let reach = match self.kind() {
            LightKind::Ambient | LightKind::Directional => 0.0,
            LightKind::Point => self.point_radius(),
            LightKind::Spot => self.spot_length(),
        };
        (p - Vec3::splat(reach), p + Vec3::splat(reach))
    }

    // ===== SETTERS =====

    pub fn set_shadow_caster(&mut self, enabled: bool) {
        self.flags.set(LightFlags::SHADOW_CASTER, enabled);
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        match self.kind() {
            LightKind::Ambient => self.position.w = -1.0 - intensity,
            _ => self.color.w = intensity,
        }
    }

    pub fn set_point_inner_radius(&mut self, radius: f32) {
        self.direction.x = radius;
    }

    pub fn set_point_falloff_radius(&mut self, radius: f32) {
        self.direction.y = radius;
    }

    pub fn set_spot_theta(&mut self, theta: f32) {
        self.position.w = 1.0 + theta;
    }

    pub fn set_spot_length(&mut self, length: f32) {
        self.direction.w = length;
    }
}

#[cfg(test)]
#[path = "light_tests.rs"]
mod tests;
