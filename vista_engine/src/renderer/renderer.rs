/// Renderer: the consumer side of the frame pipeline.
///
/// The producer thread fills frames obtained from `begin_frame` and queues
/// CPU geometry and images with the `push_pending_*` calls. The consumer
/// thread calls `render` once per display frame, which turns pending data
/// into device resources, uploads the newest finished frame and replays its
/// passes on the device.
///
/// Every method takes `&self`, so one `Arc<Renderer>` serves both threads.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use bytemuck::{Pod, Zeroable};
use glam::{IVec2, IVec4, Mat4, Vec2, Vec4};
use rustc_hash::FxHashMap;

use crate::config::{
    Quality, RenderSettings, RendererConfig, GLOW_RADIUS, LOCAL_THREADS, MAIN_VIEW_PASS,
    MAX_FRAMES, MAX_PENDING_UPLOADS, MAX_RAW_PASSES, MAX_SHADOW_RTS, MAX_TEXTURES,
    OUTLINE_PASS, RENDER_OUTPUT_LAYERS, RENDER_OUTPUT_MASK, RT_FIRST_PASS, TILE_SIZE,
};
use crate::error::{Error, Result};
use crate::frame::{
    Frame, FrameModel, GpuAnimData, GpuGlobalData, GpuLight, GpuModelData, GpuPassData,
    MaterialPipeline, ModelFlags, PrimitiveIds, UiTexture,
};
use crate::graphics_device::{
    Attachment, Buffer, BufferDesc, BufferUsage, ClearValue, DrawCall, GraphicsDevice, Image,
    PipelineKind, PipelineState, RenderTarget, Texture, TextureBinding, TextureDesc,
    TextureFlags, TextureFormat, TextureKind, UniformBinding, Viewport,
};
use crate::log::EngineLog;
use crate::vertex::{ParticleVertex, UiVertex, SKELETON_VERTEX_STRIDE};
use crate::{engine_debug, engine_err, engine_error, engine_info, engine_warn};
use super::frame_ring::FrameRing;
use super::primitives;
use super::upload_queue::{PendingGeometry, PendingQueue, PendingTexture};

// ===== CONSTANTS =====

const SOURCE: &str = "vista::Renderer";

/// Uniform slots shared by every model pipeline
const GLOBAL_SLOT: u32 = 0;
const PASS_SLOT: u32 = 1;
const ANIMATION_SLOT: u32 = 2;
const MODEL_SLOT: u32 = 3;
const LIGHTS_SLOT: u32 = 4;

/// 5-tap gaussian weights, center last
const GAUSSIAN_WEIGHTS: Vec4 = Vec4::new(0.06136, 0.24477, 0.38774, 0.0);

/// Texture slots a material pipeline samples
fn texture_slots(pipeline: MaterialPipeline) -> usize {
    match pipeline {
        MaterialPipeline::MetallicRoughness | MaterialPipeline::SpecularGlossiness => 5,
        MaterialPipeline::Unlit => 4,
        MaterialPipeline::Skybox => 3,
        MaterialPipeline::Cloud => 0,
    }
}

fn pipeline_kind(pipeline: MaterialPipeline) -> PipelineKind {
    match pipeline {
        MaterialPipeline::MetallicRoughness => PipelineKind::MetallicRoughness,
        MaterialPipeline::SpecularGlossiness => PipelineKind::SpecularGlossiness,
        MaterialPipeline::Unlit => PipelineKind::Unlit,
        MaterialPipeline::Skybox => PipelineKind::Skybox,
        MaterialPipeline::Cloud => PipelineKind::Cloud,
    }
}

/// Pipeline variant for one model draw.
///
/// Shadow passes use the depth-only pipeline and blend only forced
/// transparency. Other passes blend transparent-list elements and skip
/// depth output for `NO_DEPTH_OUT` models.
pub fn pipeline_state(model: &FrameModel, skinned: bool, transparent: bool, shadowed: bool) -> PipelineState {
    let forced = model.flags.contains(ModelFlags::FORCE_TRANSPARENCY);
    if shadowed {
        return PipelineState {
            kind: PipelineKind::Shadow,
            skinned,
            blend: forced,
            depth_write: true,
        };
    }
    PipelineState {
        kind: pipeline_kind(model.pipeline),
        skinned,
        blend: transparent || forced,
        depth_write: !model.flags.contains(ModelFlags::NO_DEPTH_OUT),
    }
}

/// Screen-derived globals copied into each frame at apply time
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenGlobals {
    pub screen_size: Vec2,
    pub tile_size: IVec2,
    pub thread_dimensions: IVec2,
    pub inv_shadow_cube_size: Vec2,
}

impl ScreenGlobals {
    fn write_to(&self, global: &mut GpuGlobalData) {
        global.screen_size = self.screen_size;
        global.tile_size = self.tile_size;
        global.thread_dimensions = self.thread_dimensions;
        global.inv_shadow_cube_size = self.inv_shadow_cube_size;
    }
}

/// Compute groups covering the light-culling tiles of a `width` x `height` screen
pub fn thread_dimensions(width: u32, height: u32) -> IVec2 {
    let tiles = (IVec2::new(width as i32, height as i32) + (TILE_SIZE - 1)) / TILE_SIZE;
    (tiles + (LOCAL_THREADS - 1)) / LOCAL_THREADS
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct GaussianKernel {
    factor: Vec4,
    direction: Vec4,
}

// ===== DEVICE-SIDE STATE =====

/// Per-frame uniform and vertex blocks, created once
#[derive(Clone)]
struct FrameBlocks {
    global: Arc<dyn Buffer>,
    passes: Arc<dyn Buffer>,
    animations: Arc<dyn Buffer>,
    models: Arc<dyn Buffer>,
    lights: Arc<dyn Buffer>,
    particles: Arc<dyn Buffer>,
    ui_vertices: Arc<dyn Buffer>,
    ui_projection: Arc<dyn Buffer>,
    fullscreen: Arc<dyn Buffer>,
    copy: Arc<dyn Buffer>,
}

struct ShadowTargets {
    quality: Quality,
    array: Arc<dyn Texture>,
    cubes: Arc<dyn Texture>,
}

struct ReflectionTargets {
    quality: Quality,
    #[allow(dead_code)]
    depth: Arc<dyn Texture>,
    #[allow(dead_code)]
    cubes: [Arc<dyn Texture>; 2],
}

/// Size-dependent targets, rebuilt on resize and on sample count changes
#[derive(Clone)]
struct ScreenTargets {
    size: IVec2,
    color_ms: Arc<dyn Texture>,
    emission_ms: Arc<dyn Texture>,
    depth: Arc<dyn Texture>,
    color: Arc<dyn Texture>,
    emission: Arc<dyn Texture>,
    final_screen: Arc<dyn Texture>,
    highlight_ms: Arc<dyn Texture>,
    highlight: Arc<dyn Texture>,
    blur_temp: Arc<dyn Texture>,
    blur_emission: Arc<dyn Texture>,
    blur_highlight: Arc<dyn Texture>,
    gaussian: Arc<dyn Buffer>,
}

#[derive(Clone)]
struct OutputTarget {
    size: IVec2,
    texture: Arc<dyn Texture>,
}

/// Everything only the consumer touches: the device and what it created
struct DeviceState {
    device: Box<dyn GraphicsDevice>,
    geometry: FxHashMap<u32, Option<Arc<dyn Buffer>>>,
    textures: FxHashMap<u32, Option<Arc<dyn Texture>>>,
    blocks: FrameBlocks,
    settings: RenderSettings,
    shadows: Option<ShadowTargets>,
    reflections: Option<ReflectionTargets>,
    screen: Option<ScreenTargets>,
    output: Option<OutputTarget>,
    screen_globals: ScreenGlobals,
    log: EngineLog,
}

fn create_block<T: Pod>(device: &mut dyn GraphicsDevice, usage: BufferUsage, count: usize) -> Result<Arc<dyn Buffer>> {
    device.create_buffer(BufferDesc::new(usage, std::mem::size_of::<T>() as u32, count as u32))
}

fn render_target(
    device: &mut dyn GraphicsDevice,
    kind: TextureKind,
    format: TextureFormat,
    size: IVec2,
    flags: TextureFlags,
) -> Result<Arc<dyn Texture>> {
    device.create_texture(TextureDesc::render_target(
        kind,
        format,
        size.x.max(1) as u32,
        size.y.max(1) as u32,
        flags | TextureFlags::RENDER_TARGET,
    ))
}

impl DeviceState {
    // ===== SETTINGS AND SCREEN =====

    fn apply_settings(&mut self, settings: RenderSettings) -> Result<()> {
        let device = self.device.as_mut();

        if self.shadows.as_ref().map_or(true, |s| s.quality != settings.shadow_quality) {
            let quality = settings.shadow_quality;
            let array_size = IVec2::splat(quality.shadow_size() as i32);
            let cube_size = IVec2::splat(quality.shadow_cube_size() as i32);
            let flags = TextureFlags::LINEAR | TextureFlags::COMPARE_DEPTH;
            let layers = MAX_SHADOW_RTS as u32;
            self.shadows = Some(ShadowTargets {
                quality,
                array: render_target(device, TextureKind::Texture2DArray { layers }, TextureFormat::Depth32, array_size, flags)?,
                cubes: render_target(device, TextureKind::CubeArray { layers }, TextureFormat::Depth32, cube_size, flags)?,
            });
            self.screen_globals.inv_shadow_cube_size = Vec2::splat(1.0 / quality.shadow_cube_size() as f32);
            engine_debug!(self.log, SOURCE, "Shadow targets at {:?} ({} texels)", quality, quality.shadow_size());
        }

        if self.reflections.as_ref().map_or(true, |r| r.quality != settings.reflection_quality) {
            let quality = settings.reflection_quality;
            let size = IVec2::splat(quality.reflection_size() as i32);
            let cube_flags = TextureFlags::LINEAR | TextureFlags::MIPMAPS;
            self.reflections = Some(ReflectionTargets {
                quality,
                depth: render_target(device, TextureKind::Texture2D, TextureFormat::Depth24Stencil8, size, TextureFlags::empty())?,
                cubes: [
                    render_target(device, TextureKind::Cube, TextureFormat::Rgba8, size, cube_flags)?,
                    render_target(device, TextureKind::Cube, TextureFormat::Rgba8, size, cube_flags)?,
                ],
            });
            engine_debug!(self.log, SOURCE, "Reflection targets at {:?} ({} texels)", quality, quality.reflection_size());
        }

        let samples_changed = self.settings.sample_count != settings.sample_count;
        self.settings = settings;
        if samples_changed {
            if let Some(size) = self.screen.as_ref().map(|s| s.size) {
                self.resize(size.x as u32, size.y as u32)?;
            }
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            engine_debug!(self.log, SOURCE, "Ignoring resize to {}x{}", width, height);
            return Ok(());
        }
        let device = self.device.as_mut();
        let size = IVec2::new(width as i32, height as i32);
        let half = (size / 2).max(IVec2::ONE);
        let samples = TextureKind::Texture2DMs { samples: self.settings.sample_count.max(1) };
        let single = TextureKind::Texture2D;
        let (rgba, depth) = (TextureFormat::Rgba8, TextureFormat::Depth24Stencil8);
        let linear = TextureFlags::LINEAR;

        let kernel = [
            GaussianKernel { factor: GAUSSIAN_WEIGHTS, direction: Vec4::new(GLOW_RADIUS / width as f32, 0.0, 0.0, 0.0) },
            GaussianKernel { factor: GAUSSIAN_WEIGHTS, direction: Vec4::new(0.0, GLOW_RADIUS / height as f32, 0.0, 0.0) },
        ];

        self.screen = Some(ScreenTargets {
            size,
            color_ms: render_target(device, samples, rgba, size, TextureFlags::empty())?,
            emission_ms: render_target(device, samples, rgba, size, TextureFlags::empty())?,
            depth: render_target(device, samples, depth, size, TextureFlags::empty())?,
            color: render_target(device, single, rgba, size, linear)?,
            emission: render_target(device, single, rgba, size, linear)?,
            final_screen: render_target(device, single, rgba, size, linear)?,
            highlight_ms: render_target(device, samples, rgba, size, TextureFlags::empty())?,
            highlight: render_target(device, single, rgba, size, linear)?,
            blur_temp: render_target(device, single, rgba, half, linear)?,
            blur_emission: render_target(device, single, rgba, half, linear)?,
            blur_highlight: render_target(device, single, rgba, half, linear)?,
            gaussian: device.create_buffer(BufferDesc::with_data(BufferUsage::Uniform, &kernel))?,
        });

        let projection = Mat4::orthographic_rh(0.0, width as f32, 0.0, height as f32, 0.0, 1.0);
        self.blocks.ui_projection.update(0, bytemuck::bytes_of(&projection))?;

        self.screen_globals.screen_size = Vec2::new(width as f32, height as f32);
        self.screen_globals.tile_size = IVec2::splat(TILE_SIZE);
        self.screen_globals.thread_dimensions = thread_dimensions(width, height);
        engine_info!(self.log, SOURCE, "Screen targets resized to {}x{}", width, height);
        Ok(())
    }

    // ===== PENDING DATA =====

    fn process_pending_geometry(&mut self, queue: &PendingQueue<PendingGeometry>, budget: usize) {
        for _ in 0..budget {
            let Some(pending) = queue.pop() else { break };
            let buffer = if pending.count > 0 {
                let desc = BufferDesc {
                    usage: pending.usage,
                    stride: pending.stride,
                    count: pending.count,
                    data: Some(pending.data),
                };
                match self.device.create_buffer(desc) {
                    Ok(buffer) => Some(buffer),
                    Err(e) => {
                        engine_error!(self.log, SOURCE, "Failed to create buffer for geometry {}: {}", pending.id, e);
                        continue;
                    }
                }
            } else {
                None
            };
            self.geometry.insert(pending.id, buffer);
        }
    }

    fn process_pending_textures(&mut self, queue: &PendingQueue<PendingTexture>, budget: usize) {
        for _ in 0..budget {
            let Some(pending) = queue.pop() else { break };
            let texture = match pending.image {
                Some(image) => match self.device.create_texture(image.into_desc()) {
                    Ok(texture) => Some(texture),
                    Err(e) => {
                        engine_error!(self.log, SOURCE, "Failed to create texture {}: {}", pending.id, e);
                        continue;
                    }
                },
                None => None,
            };
            self.textures.insert(pending.id, texture);
        }
    }

    // ===== FRAME UPLOAD =====

    /// Finalize `frame` and copy its staging blocks to the device
    fn apply_frame(&mut self, frame: &mut Frame) -> Result<()> {
        frame.finalize_frame();
        self.screen_globals.write_to(frame.global_mut());

        let blocks = &self.blocks;
        blocks.lights.update(0, bytemuck::cast_slice(frame.lights()))?;
        blocks.global.update(0, bytemuck::bytes_of(frame.global()))?;
        blocks.passes.update(0, bytemuck::cast_slice(frame.pass_data()))?;
        blocks.animations.update(0, bytemuck::cast_slice(frame.animations()))?;
        blocks.models.update(0, bytemuck::cast_slice(frame.model_data()))?;
        blocks.particles.update(0, bytemuck::cast_slice(frame.particles()))?;
        blocks.ui_vertices.update(0, bytemuck::cast_slice(frame.ui().vertices()))?;
        Ok(())
    }

    // ===== DRAWING =====

    fn draw_frame(&mut self, frame: &Frame) -> Result<()> {
        let Some(screen) = self.screen.clone() else {
            engine_warn!(self.log, SOURCE, "No screen targets, frame {} skipped", frame.frame_id());
            return Ok(());
        };
        let blocks = self.blocks.clone();

        for pass_id in RT_FIRST_PASS..MAX_RAW_PASSES {
            let live = frame
                .pass(pass_id)
                .is_some_and(|p| p.is_initialized(frame.frame_id()) && p.is_shadowed());
            if live {
                self.render_shadow_pass(frame, pass_id)?;
            }
        }

        // Main view into color and emission
        self.bind(&[&*screen.color_ms, &*screen.emission_ms], Some(&*screen.depth))?;
        self.device.clear(ClearValue::Color([0.0; 4]))?;
        self.device.clear(ClearValue::Depth(1.0))?;
        self.render_pass(frame, MAIN_VIEW_PASS)?;

        self.bind(&[&*screen.color], None)?;
        self.fullscreen(&blocks, PipelineKind::PostProcess, &[&*screen.color_ms], None)?;
        self.bind(&[&*screen.emission], None)?;
        self.fullscreen(&blocks, PipelineKind::PostProcess, &[&*screen.emission_ms], None)?;

        // Outline of highlighted models
        self.bind(&[&*screen.highlight_ms], Some(&*screen.depth))?;
        self.device.clear(ClearValue::Color([0.0; 4]))?;
        self.render_pass(frame, OUTLINE_PASS)?;
        self.bind(&[&*screen.highlight], None)?;
        self.fullscreen(&blocks, PipelineKind::PostProcess, &[&*screen.highlight_ms], None)?;

        self.blur(&blocks, &screen, &*screen.emission, &*screen.blur_emission)?;
        self.blur(&blocks, &screen, &*screen.highlight, &*screen.blur_highlight)?;

        self.bind(&[&*screen.final_screen], None)?;
        self.fullscreen(
            &blocks,
            PipelineKind::Final,
            &[&*screen.color, &*screen.blur_emission, &*screen.highlight, &*screen.blur_highlight],
            None,
        )?;

        self.copy_output(frame, &blocks, &screen)?;

        self.device.set_render_target(None)?;
        self.fullscreen(&blocks, PipelineKind::Blit, &[&*screen.final_screen], None)?;
        self.draw_ui(frame, &blocks)?;
        self.device.present(1)
    }

    fn bind(&mut self, colors: &[&dyn Texture], depth: Option<&dyn Texture>) -> Result<()> {
        let attachments: Vec<Attachment<'_>> = colors.iter().map(|t| Attachment::new(*t)).collect();
        self.device.set_render_target(Some(&RenderTarget {
            colors: &attachments,
            depth: depth.map(Attachment::new),
        }))
    }

    /// Fullscreen quad sampling `sources` in slot order
    fn fullscreen(
        &mut self,
        blocks: &FrameBlocks,
        kind: PipelineKind,
        sources: &[&dyn Texture],
        uniform: Option<UniformBinding<'_>>,
    ) -> Result<()> {
        let textures: Vec<TextureBinding<'_>> = sources
            .iter()
            .enumerate()
            .map(|(slot, t)| TextureBinding { slot: slot as u32, texture: Some(*t), state: 0 })
            .collect();
        let uniforms: Vec<UniformBinding<'_>> = uniform.into_iter().collect();
        self.device.draw(&DrawCall {
            pipeline: PipelineState::overlay(kind, false),
            vertices: blocks.fullscreen.as_ref(),
            indices: None,
            count: blocks.fullscreen.count(),
            offset: 0,
            uniforms: &uniforms,
            textures: &textures,
        })
    }

    /// Two-pass gaussian: horizontal into the temp target, vertical into `result`
    fn blur(&mut self, blocks: &FrameBlocks, screen: &ScreenTargets, source: &dyn Texture, result: &dyn Texture) -> Result<()> {
        let kernel = screen.gaussian.as_ref();
        self.bind(&[&*screen.blur_temp], None)?;
        let horizontal = UniformBinding { slot: 0, buffer: kernel, element: 0 };
        self.fullscreen(blocks, PipelineKind::Gaussian, &[source], Some(horizontal))?;
        self.bind(&[result], None)?;
        let vertical = UniformBinding { slot: 0, buffer: kernel, element: 1 };
        self.fullscreen(blocks, PipelineKind::Gaussian, &[&*screen.blur_temp], Some(vertical))
    }

    fn render_shadow_pass(&mut self, frame: &Frame, pass_id: usize) -> Result<()> {
        let Some(pass) = frame.pass(pass_id) else { return Ok(()) };
        let Some(shadows) = self.shadows.as_ref() else { return Ok(()) };
        let depth = if pass.is_point() {
            Attachment::cube_face(shadows.cubes.as_ref(), pass.target_index(), pass.target_face())
        } else {
            Attachment::layer(shadows.array.as_ref(), pass.target_index())
        };
        self.device.set_render_target(Some(&RenderTarget { colors: &[], depth: Some(depth) }))?;
        self.device.clear(ClearValue::Depth(1.0))?;
        self.render_pass(frame, pass_id)
    }

    fn render_pass(&mut self, frame: &Frame, pass_id: usize) -> Result<()> {
        let Some(pass) = frame.pass(pass_id) else { return Ok(()) };
        if !pass.is_initialized(frame.frame_id()) {
            return Ok(());
        }
        let shadowed = pass.is_shadowed();
        let models = frame.models();
        for element in pass.opaque_elements() {
            if let Some(model) = models.get(element.index as usize) {
                self.render_model(model, pass_id as u32, false, shadowed)?;
            }
        }
        for element in pass.transparent_elements() {
            if let Some(model) = models.get(element.index as usize) {
                self.render_model(model, pass_id as u32, true, shadowed)?;
            }
        }
        Ok(())
    }

    /// Draw one model; models whose geometry is not loaded are skipped
    fn render_model(&mut self, model: &FrameModel, pass_id: u32, transparent: bool, shadowed: bool) -> Result<()> {
        let Some(Some(vertices)) = self.geometry.get(&model.vertex_id) else {
            return Ok(());
        };
        let mut count = vertices.count();
        let indices: Option<&dyn Buffer> = if model.index_id != 0 {
            let Some(Some(indices)) = self.geometry.get(&model.index_id) else {
                return Ok(());
            };
            count = indices.count();
            Some(indices.as_ref())
        } else {
            None
        };
        if model.count != 0 {
            count = model.count;
        }

        let skinned = vertices.stride() == SKELETON_VERTEX_STRIDE;
        let pipeline = pipeline_state(model, skinned, transparent, shadowed);

        let mut textures = [TextureBinding { slot: 0, texture: None, state: 0 }; MAX_TEXTURES];
        let texture_count = if shadowed { 0 } else { texture_slots(model.pipeline) };
        for (slot, binding) in textures[..texture_count].iter_mut().enumerate() {
            let source = &model.textures[slot];
            *binding = TextureBinding {
                slot: slot as u32,
                texture: self.textures.get(&source.texture_id).and_then(|t| t.as_deref()),
                state: source.texture_state,
            };
        }

        let blocks = &self.blocks;
        let uniforms = [
            UniformBinding { slot: GLOBAL_SLOT, buffer: blocks.global.as_ref(), element: 0 },
            UniformBinding { slot: PASS_SLOT, buffer: blocks.passes.as_ref(), element: pass_id },
            UniformBinding { slot: ANIMATION_SLOT, buffer: blocks.animations.as_ref(), element: model.anim_buffer_id() },
            UniformBinding { slot: MODEL_SLOT, buffer: blocks.models.as_ref(), element: model.model_buffer_id() },
            UniformBinding { slot: LIGHTS_SLOT, buffer: blocks.lights.as_ref(), element: 0 },
        ];

        self.device.draw(&DrawCall {
            pipeline,
            vertices: vertices.as_ref(),
            indices,
            count,
            offset: model.offset,
            uniforms: &uniforms,
            textures: &textures[..texture_count],
        })
    }

    /// Copy the final image into the export texture, if one was requested
    fn copy_output(&mut self, frame: &Frame, blocks: &FrameBlocks, screen: &ScreenTargets) -> Result<()> {
        let requested = frame.target_texture_size();
        let current = self.output.as_ref().map_or(IVec2::ZERO, |o| o.size);
        if requested.x > 0 && requested != current {
            let kind = TextureKind::Texture2DArray { layers: RENDER_OUTPUT_LAYERS };
            let texture = render_target(self.device.as_mut(), kind, TextureFormat::Rgba8, requested, TextureFlags::LINEAR)?;
            engine_debug!(self.log, SOURCE, "Export texture resized to {}x{}", requested.x, requested.y);
            self.output = Some(OutputTarget { size: requested, texture });
        }
        let Some(output) = self.output.clone() else { return Ok(()) };
        let bounds = frame.target_view_bounds();
        if bounds == IVec4::ZERO {
            return Ok(());
        }

        let quad = primitives::copy_quad(screen.size.as_vec2(), frame.view_bounds());
        blocks.copy.update(0, bytemuck::cast_slice(&quad))?;

        let layer = ((frame.global().render_output & RENDER_OUTPUT_MASK) as u32).min(RENDER_OUTPUT_LAYERS - 1);
        let colors = [Attachment::layer(output.texture.as_ref(), layer)];
        self.device.set_render_target(Some(&RenderTarget { colors: &colors, depth: None }))?;
        self.device.set_viewport(Viewport::from_bounds(bounds))?;
        if frame.sprite_frame() == 0 {
            self.device.clear(ClearValue::Color([0.0; 4]))?;
        }
        let textures = [TextureBinding { slot: 0, texture: Some(screen.final_screen.as_ref()), state: 0 }];
        let uniforms = [UniformBinding { slot: 0, buffer: blocks.ui_projection.as_ref(), element: 0 }];
        self.device.draw(&DrawCall {
            pipeline: PipelineState::overlay(PipelineKind::UiTexture, false),
            vertices: blocks.copy.as_ref(),
            indices: None,
            count: quad.len() as u32,
            offset: 0,
            uniforms: &uniforms,
            textures: &textures,
        })
    }

    fn draw_ui(&mut self, frame: &Frame, blocks: &FrameBlocks) -> Result<()> {
        let uniforms = [UniformBinding { slot: 0, buffer: blocks.ui_projection.as_ref(), element: 0 }];
        for batch in frame.ui().batches() {
            let (kind, texture_id) = match batch.texture {
                UiTexture::Color => (PipelineKind::UiColor, None),
                UiTexture::Texture(id) => (PipelineKind::UiTexture, Some(id)),
                UiTexture::Font(id) => (PipelineKind::UiFont, Some(id)),
            };
            let texture = texture_id.and_then(|id| self.textures.get(&id)).and_then(|t| t.as_deref());
            let textures = [TextureBinding { slot: 0, texture, state: 0 }];
            let bound = if texture_id.is_some() { &textures[..] } else { &[] };
            self.device.draw(&DrawCall {
                pipeline: PipelineState::overlay(kind, true),
                vertices: blocks.ui_vertices.as_ref(),
                indices: None,
                count: batch.count,
                offset: batch.offset,
                uniforms: &uniforms,
                textures: bound,
            })?;
        }
        Ok(())
    }
}

// ===== RENDERER =====

pub struct Renderer {
    ring: FrameRing,
    geometry_queue: PendingQueue<PendingGeometry>,
    texture_queue: PendingQueue<PendingTexture>,
    next_geometry_id: AtomicU32,
    next_texture_id: AtomicU32,
    primitives: PrimitiveIds,
    upload_budget: usize,
    state: Mutex<DeviceState>,
    log: EngineLog,
}

impl Renderer {
    /// Create the renderer, its per-frame blocks, the built-in primitives
    /// and the screen targets for `config.width` x `config.height`.
    pub fn new(mut device: Box<dyn GraphicsDevice>, config: RendererConfig, log: EngineLog) -> Result<Self> {
        log.set_level(config.log.level);
        if config.width == 0 || config.height == 0 {
            engine_error!(log, SOURCE, "Cannot start with a {}x{} screen", config.width, config.height);
            return Err(Error::InitializationFailed(format!("screen size {}x{}", config.width, config.height)));
        }
        let caps = config.capacities;
        let dev = device.as_mut();

        let particle_indices = primitives::particle_indices(caps.particle_vertices);
        let blocks = FrameBlocks {
            global: create_block::<GpuGlobalData>(dev, BufferUsage::Uniform, 1)?,
            passes: create_block::<GpuPassData>(dev, BufferUsage::Uniform, MAX_RAW_PASSES)?,
            animations: create_block::<GpuAnimData>(dev, BufferUsage::Storage, caps.animations.max(1))?,
            models: create_block::<GpuModelData>(dev, BufferUsage::Storage, caps.models.max(1))?,
            lights: create_block::<GpuLight>(dev, BufferUsage::Storage, caps.lights.max(1))?,
            particles: create_block::<ParticleVertex>(dev, BufferUsage::Vertex, caps.particle_vertices.max(1))?,
            ui_vertices: create_block::<UiVertex>(dev, BufferUsage::Vertex, caps.ui_vertices.max(1))?,
            ui_projection: create_block::<Mat4>(dev, BufferUsage::Uniform, 1)?,
            fullscreen: dev.create_buffer(BufferDesc::with_data(BufferUsage::Vertex, &primitives::fullscreen_quad()))?,
            copy: create_block::<UiVertex>(dev, BufferUsage::Vertex, 6)?,
        };

        let next_geometry_id = AtomicU32::new(0);
        let next_id = || next_geometry_id.fetch_add(1, Ordering::Relaxed) + 1;
        let mut geometry: FxHashMap<u32, Option<Arc<dyn Buffer>>> = FxHashMap::default();

        let (cone_vertices, cone_indices) = primitives::cone();
        let (cube_vertices, cube_indices) = primitives::cube();
        let mut ids = PrimitiveIds::default();
        let mut register = |buffer: Arc<dyn Buffer>| {
            let id = next_id();
            geometry.insert(id, Some(buffer));
            id
        };
        ids.cone_vertex = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Vertex, &cone_vertices))?);
        ids.cone_index = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Index16, &cone_indices))?);
        ids.cube_vertex = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Vertex, &cube_vertices))?);
        ids.cube_index = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Index16, &cube_indices))?);
        ids.sphere_vertex = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Vertex, &primitives::sphere()))?);
        ids.plane_vertex = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Vertex, &primitives::plane()))?);
        ids.particle_vertex = register(blocks.particles.clone());
        ids.particle_index = register(dev.create_buffer(BufferDesc::with_data(BufferUsage::Index32, &particle_indices))?);

        let frames = (0..MAX_FRAMES)
            .map(|_| Frame::new(&caps, ids, log.clone()))
            .collect();

        let mut state = DeviceState {
            device,
            geometry,
            textures: FxHashMap::default(),
            blocks,
            settings: config.settings,
            shadows: None,
            reflections: None,
            screen: None,
            output: None,
            screen_globals: ScreenGlobals::default(),
            log: log.clone(),
        };
        state.apply_settings(config.settings)?;
        state.resize(config.width, config.height)?;

        engine_info!(
            log,
            SOURCE,
            "Renderer created ({} frames, {} models, {} lights per frame)",
            MAX_FRAMES,
            caps.models,
            caps.lights
        );

        Ok(Self {
            ring: FrameRing::new(frames, log.clone()),
            geometry_queue: PendingQueue::new(MAX_PENDING_UPLOADS),
            texture_queue: PendingQueue::new(MAX_PENDING_UPLOADS),
            next_geometry_id,
            next_texture_id: AtomicU32::new(0),
            primitives: ids,
            upload_budget: config.upload_budget,
            state: Mutex::new(state),
            log,
        })
    }

    fn state(&self) -> Result<MutexGuard<'_, DeviceState>> {
        self.state
            .lock()
            .map_err(|_| engine_err!(self.log, SOURCE, "Device state lock poisoned"))
    }

    // ===== PRODUCER SIDE =====

    /// Open the next frame; `None` while the consumer is two frames behind.
    pub fn begin_frame(&self) -> Option<MutexGuard<'_, Frame>> {
        self.ring.begin_frame()
    }

    /// Publish a frame returned by `begin_frame`.
    pub fn end_frame(&self, frame: MutexGuard<'_, Frame>) {
        self.ring.end_frame(frame);
    }

    pub fn next_geometry_id(&self) -> u32 {
        self.next_geometry_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn next_texture_id(&self) -> u32 {
        self.next_texture_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Queue raw geometry bytes for upload.
    ///
    /// `id` 0 allocates a new id; an existing id is replaced once processed.
    /// Empty data (or a zero stride) unloads the id. Returns the id, or
    /// `None` when the queue is full.
    pub fn push_pending_geometry(&self, id: u32, usage: BufferUsage, stride: u32, data: Vec<u8>) -> Option<u32> {
        if self.geometry_queue.len() >= self.geometry_queue.capacity() {
            engine_warn!(self.log, SOURCE, "Pending geometry queue full, upload dropped");
            return None;
        }
        let id = if id == 0 { self.next_geometry_id() } else { id };
        let count = if stride == 0 { 0 } else { (data.len() / stride as usize) as u32 };
        let pending = PendingGeometry { id, usage, stride, count, data };
        match self.geometry_queue.push(pending) {
            Ok(()) => Some(id),
            Err(_) => {
                engine_warn!(self.log, SOURCE, "Pending geometry queue full, upload dropped");
                None
            }
        }
    }

    /// Typed form of `push_pending_geometry`
    pub fn push_pending_elements<T: Pod>(&self, id: u32, usage: BufferUsage, elements: &[T]) -> Option<u32> {
        let stride = std::mem::size_of::<T>() as u32;
        self.push_pending_geometry(id, usage, stride, bytemuck::cast_slice(elements).to_vec())
    }

    /// Queue an image for upload; `None` unloads the id.
    pub fn push_pending_texture(&self, id: u32, image: Option<Image>) -> Option<u32> {
        if self.texture_queue.len() >= self.texture_queue.capacity() {
            engine_warn!(self.log, SOURCE, "Pending texture queue full, upload dropped");
            return None;
        }
        let id = if id == 0 { self.next_texture_id() } else { id };
        match self.texture_queue.push(PendingTexture { id, image }) {
            Ok(()) => Some(id),
            Err(_) => {
                engine_warn!(self.log, SOURCE, "Pending texture queue full, upload dropped");
                None
            }
        }
    }

    pub fn geometry_is_loaded(&self, id: u32) -> bool {
        self.state().is_ok_and(|s| matches!(s.geometry.get(&id), Some(Some(_))))
    }

    pub fn texture_is_loaded(&self, id: u32) -> bool {
        self.state().is_ok_and(|s| matches!(s.textures.get(&id), Some(Some(_))))
    }

    pub fn primitives(&self) -> &PrimitiveIds {
        &self.primitives
    }

    // ===== CONSUMER SIDE =====

    /// Render one display frame.
    ///
    /// Drains up to the upload budget from each pending queue, applies the
    /// oldest finished frame if there is one, then draws the most recently
    /// applied frame. Does nothing while the device is not ready or before
    /// the first frame has been finished.
    pub fn render(&self) -> Result<()> {
        let mut state = self.state()?;
        if !state.device.update() {
            return Ok(());
        }
        state.process_pending_geometry(&self.geometry_queue, self.upload_budget);
        state.process_pending_textures(&self.texture_queue, self.upload_budget);

        let frame = match self.ring.next_unread() {
            Some(index) => {
                let mut frame = self.ring.lock(index);
                let applied = state.apply_frame(&mut frame);
                self.ring.mark_read();
                applied?;
                frame
            }
            None => match self.ring.last_read() {
                Some(index) => self.ring.lock(index),
                None => return Ok(()),
            },
        };
        state.draw_frame(&frame)
    }

    /// Change shadow/reflection quality or the sample count
    pub fn apply_settings(&self, settings: RenderSettings) -> Result<()> {
        self.state()?.apply_settings(settings)
    }

    /// Recreate the screen targets for a new window size
    pub fn resize(&self, width: u32, height: u32) -> Result<()> {
        self.state()?.resize(width, height)
    }

    pub fn settings(&self) -> Result<RenderSettings> {
        Ok(self.state()?.settings)
    }

    pub fn screen_globals(&self) -> Result<ScreenGlobals> {
        Ok(self.state()?.screen_globals)
    }

    /// Export texture (one layer per render output mode), once requested
    pub fn output_texture(&self) -> Result<Option<Arc<dyn Texture>>> {
        Ok(self.state()?.output.as_ref().map(|o| o.texture.clone()))
    }

    /// Index of the frame currently on screen
    pub fn current_frame(&self) -> Option<u32> {
        self.ring.last_read()
    }

    /// Frames finished by the producer so far
    pub fn frames_written(&self) -> u32 {
        self.ring.write_index()
    }

    pub fn log(&self) -> &EngineLog {
        &self.log
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
