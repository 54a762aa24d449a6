/// Frame: the per-frame submission surface.
///
/// A frame owns 32 raw passes and every table the producer fills while it
/// builds one frame (models, lights, animation matrices, particle vertices,
/// UI geometry). All tables have a fixed capacity chosen at construction;
/// their cursors only grow during a frame and are reset by
/// `initialize_frame`. A full table drops the submission with a warning.
///
/// Pass layout:
/// - `0`: main view
/// - `1`: outline (highlighted objects)
/// - `2..8`: shadow passes allocated by `initialize_rt_passes`
/// - `9..32`: extra cube faces of point-light shadows

use glam::{IVec2, IVec4, Mat4, Vec3, Vec4};

use crate::camera::{make_cascade_camera_views, Camera, CameraFlags};
use crate::config::{
    FrameCapacities, CASCADE_COUNT, MAIN_VIEW_BITS, MAIN_VIEW_PASS, MAX_BONES, MAX_PASSES, MAX_RAW_PASSES,
    MAX_SHADOW_RTS, RT_FIRST_PASS,
};
use crate::light::{Light, LightKind};
use crate::log::EngineLog;
use crate::vertex::ParticleVertex;
use crate::{engine_error, engine_trace, engine_warn};
use super::gpu_data::{GpuAnimData, GpuGlobalData, GpuLight, GpuMaterial, GpuModelData, GpuPassData};
use super::model::FrameModel;
use super::pass::{aabb_sphere, Element, Pass};
use super::ui::UiFrame;
use super::writers::PrimitiveIds;

/// Extra raw passes consumed by a point-light shadow (faces 1 to 5)
const POINT_EXTRA_FACES: usize = 5;

pub struct Frame {
    passes: Box<[Pass]>,
    pass_data: Box<[GpuPassData]>,
    global: Box<GpuGlobalData>,

    models: Box<[FrameModel]>,
    model_data: Box<[GpuModelData]>,
    model_count: usize,

    lights: Box<[GpuLight]>,
    /// Passes each light is visible from (bit 0: main view)
    light_pass_bits: Box<[u32]>,
    light_count: usize,

    animations: Box<[GpuAnimData]>,
    animation_count: usize,

    particles: Box<[ParticleVertex]>,
    particle_count: usize,

    ui: UiFrame,

    /// Shadow casters ordered by priority (lowest first)
    shadow_casters: [Element; MAX_SHADOW_RTS],
    shadow_count: usize,
    shadow_position: Vec3,
    shadow_array_count: usize,
    shadow_cube_count: usize,
    raw_pass_count: usize,

    view_bounds: Vec4,
    target_view_bounds: IVec4,
    target_texture_size: IVec2,
    sprite_frame: u32,

    frame_id: u32,
    pub(crate) primitives: PrimitiveIds,
    log: EngineLog,
}

impl Frame {
    /// Allocate every table once; frames are reused for the whole run.
    pub fn new(capacities: &FrameCapacities, primitives: PrimitiveIds, log: EngineLog) -> Self {
        let passes = (0..MAX_RAW_PASSES)
            .map(|_| Pass::new(capacities.pass_elements, log.clone()))
            .collect::<Box<[_]>>();
        Self {
            passes,
            pass_data: vec![GpuPassData::default(); MAX_RAW_PASSES].into_boxed_slice(),
            global: Box::default(),
            models: vec![FrameModel::default(); capacities.models].into_boxed_slice(),
            model_data: vec![GpuModelData::default(); capacities.models].into_boxed_slice(),
            model_count: 0,
            lights: vec![GpuLight::default(); capacities.lights].into_boxed_slice(),
            light_pass_bits: vec![0; capacities.lights].into_boxed_slice(),
            light_count: 0,
            animations: vec![GpuAnimData::default(); capacities.animations].into_boxed_slice(),
            animation_count: 0,
            particles: vec![ParticleVertex::default(); capacities.particle_vertices].into_boxed_slice(),
            particle_count: 0,
            ui: UiFrame::new(capacities.ui_vertices, log.clone()),
            shadow_casters: [Element { index: 0, distance_sq: 0.0 }; MAX_SHADOW_RTS],
            shadow_count: 0,
            shadow_position: Vec3::ZERO,
            shadow_array_count: 0,
            shadow_cube_count: 0,
            raw_pass_count: 0,
            view_bounds: Vec4::ZERO,
            target_view_bounds: IVec4::ZERO,
            target_texture_size: IVec2::ZERO,
            sprite_frame: 0,
            frame_id: 0,
            primitives,
            log,
        }
    }

    /// Start building frame `frame_id`. Pass stamps are left alone; passes
    /// from earlier frames simply stop matching.
    pub fn initialize_frame(&mut self, frame_id: u32) {
        self.ui.reset();
        self.model_count = 0;
        self.animation_count = 0;
        self.light_count = 0;
        self.particle_count = 0;
        self.shadow_count = 0;
        self.shadow_array_count = 0;
        self.shadow_cube_count = 0;
        self.raw_pass_count = 0;
        self.target_texture_size = IVec2::ZERO;
        self.view_bounds = Vec4::ZERO;
        self.target_view_bounds = IVec4::ZERO;
        self.sprite_frame = 0;
        self.frame_id = frame_id;
        engine_trace!(self.log, "vista::Frame", "Frame {} initialized", frame_id);
    }

    /// Sort every live pass and publish the light count.
    pub fn finalize_frame(&mut self) {
        let frame_id = self.frame_id;
        for pass in self.passes.iter_mut() {
            pass.finalize(frame_id);
        }
        self.global.light_count = self.light_count as i32;
    }

    // ===== PASSES =====

    /// Initialize pass `pass_id` from `camera`; returns the pass bit.
    pub fn initialize_pass(&mut self, pass_id: usize, camera: &mut Camera) -> u32 {
        self.initialize_pass_with_target(pass_id, 0, 0, 0, camera)
    }

    /// Initialize pass `pass_id` rendering into `target_id`/`target_face`
    /// for light `source_index`; returns the pass bit (0 for a bad id).
    pub fn initialize_pass_with_target(
        &mut self,
        pass_id: usize,
        target_id: u32,
        target_face: u32,
        source_index: u32,
        camera: &mut Camera,
    ) -> u32 {
        if pass_id >= MAX_RAW_PASSES {
            engine_error!(self.log, "vista::Frame", "Pass id {} out of range (max {})", pass_id, MAX_RAW_PASSES);
            return 0;
        }
        self.passes[pass_id].initialize(
            camera,
            &mut self.global,
            &mut self.pass_data[pass_id],
            target_id,
            target_face,
            source_index,
            self.frame_id,
            pass_id,
        );
        camera.set_pass_id(pass_id as u32);
        1 << pass_id
    }

    /// Allocate shadow passes for the queued shadow casters.
    ///
    /// Requires an initialized main view. Directional lights get up to two
    /// cascades, spot lights one perspective pass, point lights one pass
    /// plus five extra cube faces. Lights that do not fit get no shadow.
    pub fn initialize_rt_passes(&mut self, scene_min: Vec3, scene_max: Vec3) {
        if !self.passes[MAIN_VIEW_PASS].is_initialized(self.frame_id) {
            return;
        }
        self.shadow_array_count = 0;
        self.shadow_cube_count = 0;

        let mut offset = RT_FIRST_PASS;
        let mut i = 0;
        while i < self.shadow_count && offset < RT_FIRST_PASS + MAX_PASSES {
            let light_index = self.shadow_casters[i].index;
            let light = self.lights[light_index as usize];
            match LightKind::from_w(light.position.w) {
                LightKind::Directional => self.make_directional_passes(light_index, &light, &mut offset, scene_min, scene_max),
                LightKind::Spot => self.make_spot_pass(light_index, &light, &mut offset),
                LightKind::Point => self.make_point_passes(light_index, &light, &mut offset),
                LightKind::Ambient => {}
            }
            i += 1;
        }
        engine_trace!(
            self.log,
            "vista::Frame",
            "Shadow passes: {} array, {} cube, {} extra faces",
            self.shadow_array_count,
            self.shadow_cube_count,
            self.raw_pass_count
        );
    }

    fn make_directional_passes(&mut self, light_index: u32, light: &GpuLight, offset: &mut usize, scene_min: Vec3, scene_max: Vec3) {
        if self.shadow_array_count >= MAX_SHADOW_RTS || *offset >= MAX_PASSES {
            return;
        }
        let count = CASCADE_COUNT
            .min(MAX_PASSES - *offset)
            .min(MAX_SHADOW_RTS - self.shadow_array_count);

        let view_position = self.passes[MAIN_VIEW_PASS].position();
        let points = self.pass_data[MAIN_VIEW_PASS].frustum_points;
        let mut cascades = [Camera::default(); CASCADE_COUNT];
        let written = make_cascade_camera_views(
            light.direction.truncate(),
            view_position,
            &points,
            scene_min,
            scene_max,
            &mut cascades[..count],
        );
        if written == 0 {
            return;
        }
        for (i, camera) in cascades[..written].iter_mut().enumerate() {
            let target = self.shadow_array_count as u32;
            self.initialize_pass_with_target(*offset + i, target, 0, light_index, camera);
            self.shadow_array_count += 1;
        }

        let shadow = &mut self.lights[light_index as usize].shadow_indices;
        shadow.x = *offset as i32;
        *offset += 1;
        if written == 2 {
            shadow.y = *offset as i32;
            *offset += 1;
        }
    }

    fn make_spot_pass(&mut self, light_index: u32, light: &GpuLight, offset: &mut usize) {
        if self.shadow_array_count >= MAX_SHADOW_RTS || *offset >= MAX_PASSES {
            return;
        }
        let theta = light.position.w - 1.0;
        let length = light.direction.w;
        let mut camera = Camera::perspective(
            light.position.truncate(),
            light.direction.truncate(),
            Vec3::Y,
            1.0,
            theta * 2.0,
            0.1,
            length,
            CameraFlags::SHADOW_CASTER,
        );
        let target = self.shadow_array_count as u32;
        self.initialize_pass_with_target(*offset, target, 0, light_index, &mut camera);
        self.shadow_array_count += 1;
        self.lights[light_index as usize].shadow_indices.x = *offset as i32;
        *offset += 1;
    }

    fn make_point_passes(&mut self, light_index: u32, light: &GpuLight, offset: &mut usize) {
        if self.shadow_cube_count >= MAX_SHADOW_RTS || *offset >= MAX_PASSES {
            return;
        }
        if MAX_PASSES + self.raw_pass_count + POINT_EXTRA_FACES > MAX_RAW_PASSES {
            return;
        }
        let radius = light.direction.x + light.direction.y;
        let mut camera = Camera::point(light.position.truncate(), radius, CameraFlags::SHADOW_CASTER);
        let target = self.shadow_cube_count as u32;

        self.initialize_pass_with_target(*offset, target, 0, light_index, &mut camera);
        for face in 1..=POINT_EXTRA_FACES {
            let pass_id = MAX_PASSES + self.raw_pass_count + face;
            self.initialize_pass_with_target(pass_id, target, face as u32, light_index, &mut camera);
        }
        self.lights[light_index as usize].shadow_indices.x = *offset as i32;
        *offset += 1;
        self.raw_pass_count += POINT_EXTRA_FACES;
        self.shadow_cube_count += 1;
    }

    /// Bits of the passes in `target_bits` that are live and see the sphere
    pub fn pass_bits_in_sphere(&self, center: Vec3, radius: f32, target_bits: u32) -> u32 {
        let mut bits = 0;
        for (i, pass) in self.passes.iter().enumerate() {
            let bit = 1u32 << i;
            if target_bits & bit == 0 || !pass.is_initialized(self.frame_id) {
                continue;
            }
            if pass.sphere_in_frustum(center, radius) {
                bits |= bit;
            }
        }
        bits
    }

    /// Box version of `pass_bits_in_sphere`, tested through the box's
    /// inflated bounding sphere.
    pub fn pass_bits_in_aabb(&self, min: Vec3, max: Vec3, target_bits: u32) -> u32 {
        let (center, radius) = aabb_sphere(min, max);
        self.pass_bits_in_sphere(center, radius, target_bits)
    }

    // ===== TABLES =====

    /// Store a model and push it into every live pass in `pass_bits`.
    ///
    /// The model position is the translation column of `transform`.
    pub fn push_model(
        &mut self,
        model: &FrameModel,
        pass_bits: u32,
        anim_id: u32,
        transform: &Mat4,
        material: &GpuMaterial,
        transparent: bool,
    ) -> Option<u32> {
        if self.model_count >= self.models.len() {
            engine_warn!(self.log, "vista::Frame", "Model table exhausted ({} models)", self.models.len());
            return None;
        }
        let id = self.model_count;
        self.model_data[id] = GpuModelData {
            transform: *transform,
            material: *material,
        };
        let mut stored = *model;
        stored.set_buffer_ids(id as u32, anim_id);
        self.models[id] = stored;

        let position = transform.w_axis.truncate();
        for (i, pass) in self.passes.iter().enumerate() {
            if pass_bits & (1 << i) == 0 || !pass.is_initialized(self.frame_id) {
                continue;
            }
            pass.push_element(id as u32, model.flags, position, transparent);
        }
        self.model_count += 1;
        Some(id as u32)
    }

    /// Store a light and, for shadow casters, rank it for a shadow slot.
    ///
    /// A light outside the main view is still stored (it can light shadow
    /// and reflection passes) but is left out of the main view's visible set.
    /// Directional casters rank first; the rest by distance to the shadow
    /// focus. Only the best `MAX_SHADOW_RTS` casters are kept.
    pub fn push_light(&mut self, light: &Light) -> Option<u32> {
        if self.light_count >= self.lights.len() {
            engine_warn!(self.log, "vista::Frame", "Light table exhausted ({} lights)", self.lights.len());
            return None;
        }
        let id = self.light_count;
        self.light_count += 1;
        self.lights[id] = GpuLight {
            position: light.position,
            direction: light.direction,
            color: light.color,
            shadow_indices: IVec4::splat(-1),
        };

        let main_view = &self.passes[MAIN_VIEW_PASS];
        if !main_view.is_initialized(self.frame_id) {
            self.light_pass_bits[id] = 0;
            return Some(id as u32);
        }
        self.light_pass_bits[id] = if main_view.light_in_frustum(light) { MAIN_VIEW_BITS } else { 0 };
        if !light.is_shadow_caster() {
            return Some(id as u32);
        }
        let priority = match light.kind() {
            LightKind::Ambient => return Some(id as u32),
            LightKind::Directional => 0.0,
            LightKind::Point | LightKind::Spot => self.shadow_position.distance_squared(light.world_position()),
        };

        let count = self.shadow_count;
        let at = self.shadow_casters[..count].partition_point(|e| e.distance_sq <= priority);
        if at == count && count >= MAX_SHADOW_RTS {
            return Some(id as u32);
        }
        let end = (count + 1).min(MAX_SHADOW_RTS);
        for j in (at + 1..end).rev() {
            self.shadow_casters[j] = self.shadow_casters[j - 1];
        }
        self.shadow_casters[at] = Element {
            index: id as u32,
            distance_sq: priority,
        };
        self.shadow_count = end;
        Some(id as u32)
    }

    /// Reserve an animation slot; fill it through `animation_mut`.
    pub fn next_animation(&mut self) -> Option<u32> {
        if self.animation_count >= self.animations.len() {
            engine_warn!(self.log, "vista::Frame", "Animation table exhausted ({} entries)", self.animations.len());
            return None;
        }
        let id = self.animation_count;
        self.animation_count += 1;
        Some(id as u32)
    }

    /// Copy up to 32 bone matrices into a new animation slot.
    pub fn push_animation(&mut self, bones: &[Mat4]) -> Option<u32> {
        let id = self.next_animation()?;
        let count = bones.len().min(MAX_BONES);
        self.animations[id as usize].bones[..count].copy_from_slice(&bones[..count]);
        Some(id)
    }

    /// Reserve `count` particle vertices; all or nothing.
    pub fn write_particles(&mut self, count: usize) -> Option<u32> {
        let Some(end) = self.particle_count.checked_add(count).filter(|&end| end <= self.particles.len()) else {
            engine_warn!(self.log, "vista::Frame", "Particle table exhausted ({} vertices)", self.particles.len());
            return None;
        };
        let offset = self.particle_count;
        self.particle_count = end;
        Some(offset as u32)
    }

    // ===== FRAME STATE =====

    /// Focus point used to rank point and spot shadow casters
    pub fn set_shadow_position(&mut self, position: Vec3) {
        self.shadow_position = position;
    }

    pub fn set_sun_direction(&mut self, direction: Vec3) {
        self.global.sun_direction = direction.extend(0.0);
    }

    /// Export copy: normalized source rect and target pixel rect
    pub fn set_export_view(&mut self, view_bounds: Vec4, target_bounds: IVec4) {
        self.view_bounds = view_bounds;
        self.target_view_bounds = target_bounds;
    }

    /// Export copy: output texture size and sprite frame (0 clears the target)
    pub fn set_export_target(&mut self, texture_size: IVec2, sprite_frame: u32) {
        self.target_texture_size = texture_size;
        self.sprite_frame = sprite_frame;
    }

    /// Which buffer the composite shows (and the export layer it lands in)
    pub fn set_render_output(&mut self, output: i32) {
        self.global.render_output = output;
    }

    // ===== ACCESSORS =====

    pub fn frame_id(&self) -> u32 {
        self.frame_id
    }

    pub fn pass(&self, pass_id: usize) -> Option<&Pass> {
        self.passes.get(pass_id)
    }

    pub fn passes(&self) -> &[Pass] {
        &self.passes
    }

    pub fn pass_data(&self) -> &[GpuPassData] {
        &self.pass_data
    }

    pub fn global(&self) -> &GpuGlobalData {
        &self.global
    }

    pub(crate) fn global_mut(&mut self) -> &mut GpuGlobalData {
        &mut self.global
    }

    pub fn models(&self) -> &[FrameModel] {
        &self.models[..self.model_count]
    }

    pub fn model_data(&self) -> &[GpuModelData] {
        &self.model_data[..self.model_count]
    }

    pub fn lights(&self) -> &[GpuLight] {
        &self.lights[..self.light_count]
    }

    /// Pass bits the light was found visible from; 0 for unknown ids.
    pub fn light_pass_bits(&self, id: u32) -> u32 {
        self.light_pass_bits[..self.light_count].get(id as usize).copied().unwrap_or(0)
    }

    /// Ids of the lights visible from the main view
    pub fn main_view_lights(&self) -> impl Iterator<Item = u32> + '_ {
        self.light_pass_bits[..self.light_count]
            .iter()
            .enumerate()
            .filter(|(_, &bits)| bits & MAIN_VIEW_BITS != 0)
            .map(|(id, _)| id as u32)
    }

    pub fn animations(&self) -> &[GpuAnimData] {
        &self.animations[..self.animation_count]
    }

    pub fn animation_mut(&mut self, id: u32) -> Option<&mut GpuAnimData> {
        self.animations[..self.animation_count].get_mut(id as usize)
    }

    pub fn particles(&self) -> &[ParticleVertex] {
        &self.particles[..self.particle_count]
    }

    /// Vertices reserved by `write_particles`
    pub fn particles_mut(&mut self, offset: u32, count: usize) -> &mut [ParticleVertex] {
        let start = (offset as usize).min(self.particle_count);
        let end = start.saturating_add(count).min(self.particle_count);
        &mut self.particles[start..end]
    }

    pub fn ui(&self) -> &UiFrame {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut UiFrame {
        &mut self.ui
    }

    pub fn shadow_casters(&self) -> &[Element] {
        &self.shadow_casters[..self.shadow_count]
    }

    pub fn shadow_array_count(&self) -> usize {
        self.shadow_array_count
    }

    pub fn shadow_cube_count(&self) -> usize {
        self.shadow_cube_count
    }

    pub fn view_bounds(&self) -> Vec4 {
        self.view_bounds
    }

    pub fn target_view_bounds(&self) -> IVec4 {
        self.target_view_bounds
    }

    pub fn target_texture_size(&self) -> IVec2 {
        self.target_texture_size
    }

    pub fn sprite_frame(&self) -> u32 {
        self.sprite_frame
    }

    pub fn primitives(&self) -> &PrimitiveIds {
        &self.primitives
    }

    pub(crate) fn log(&self) -> &EngineLog {
        &self.log
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
