/// Renderer configuration
///
/// Capacities are fixed when the renderer is built; every per-frame table is
/// allocated once from them and reused. Quality settings can change at runtime
/// through `Renderer::apply_settings`.

use crate::log::LogSeverity;

/// Number of frames in flight
pub const MAX_FRAMES: usize = 3;

/// Raw pass slots per frame (main view, outline, shadow/reflection passes and cube faces)
pub const MAX_RAW_PASSES: usize = 32;

/// Passes addressable from the shadow allocator; cube faces 1..5 live past this
pub const MAX_PASSES: usize = 8;

pub const MAIN_VIEW_PASS: usize = 0;
pub const OUTLINE_PASS: usize = 1;
/// First pass slot handed to shadow/reflection cameras
pub const RT_FIRST_PASS: usize = 2;

pub const MAIN_VIEW_BITS: u32 = 1 << MAIN_VIEW_PASS;
pub const OUTLINE_BITS: u32 = 1 << OUTLINE_PASS;

/// Cascades per directional shadow
pub const CASCADE_COUNT: usize = 2;
/// Shadow array layers and shadow cube slots (each)
pub const MAX_SHADOW_RTS: usize = 4;

pub const MAX_BONES: usize = 32;
pub const MAX_TEXTURES: usize = 6;

/// Pending upload queue slots (geometry and texture, each)
pub const MAX_PENDING_UPLOADS: usize = 1024;
/// Pending uploads drained per rendered frame
pub const DEFAULT_UPLOAD_BUDGET: usize = 5;

/// Light-culling tile edge and compute group edge, in pixels/tiles
pub const TILE_SIZE: i32 = 32;
pub const LOCAL_THREADS: i32 = 32;

/// Render output mode bits in `GpuGlobalData::render_output`
pub const RENDER_OUTPUT_MASK: i32 = 0xFF;
/// Layers of the export texture (one per render output mode)
pub const RENDER_OUTPUT_LAYERS: u32 = 5;

/// Gaussian blur radius for emission and highlight glow, in pixels
pub const GLOW_RADIUS: f32 = 10.0;

// ===== CAPACITIES =====

/// Per-frame table sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCapacities {
    pub models: usize,
    pub lights: usize,
    pub animations: usize,
    /// Opaque and transparent list length, per pass
    pub pass_elements: usize,
    pub particle_vertices: usize,
    pub ui_vertices: usize,
}

impl Default for FrameCapacities {
    fn default() -> Self {
        Self {
            models: 65536,
            lights: 1024,
            animations: 16384,
            pass_elements: 65536,
            particle_vertices: 8048 * 4,
            ui_vertices: 1024 * 6,
        }
    }
}

// ===== QUALITY =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Ultra,
    High,
    Medium,
    Low,
}

impl Quality {
    /// Edge of one shadow array layer, in texels
    pub fn shadow_size(self) -> u32 {
        match self {
            Quality::Ultra => 2048,
            Quality::High => 1024,
            Quality::Medium => 512,
            Quality::Low => 256,
        }
    }

    /// Edge of one shadow cube face, in texels
    pub fn shadow_cube_size(self) -> u32 {
        self.shadow_size() / 2
    }

    /// Edge of one reflection cube face, in texels
    pub fn reflection_size(self) -> u32 {
        match self {
            Quality::Ultra => 1024,
            Quality::High => 512,
            Quality::Medium => 256,
            Quality::Low => 128,
        }
    }
}

/// Runtime-adjustable render settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderSettings {
    pub shadow_quality: Quality,
    pub reflection_quality: Quality,
    pub sample_count: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            shadow_quality: Quality::High,
            reflection_quality: Quality::High,
            sample_count: 4,
        }
    }
}

// ===== LOG CONFIG =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogSeverity,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: LogSeverity::Info }
    }
}

// ===== RENDERER CONFIG =====

/// Configuration for renderer creation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub capacities: FrameCapacities,
    pub settings: RenderSettings,
    pub log: LogConfig,
    /// Initial screen size
    pub width: u32,
    pub height: u32,
    /// Pending uploads drained per frame, per queue
    pub upload_budget: usize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            capacities: FrameCapacities::default(),
            settings: RenderSettings::default(),
            log: LogConfig::default(),
            width: 1280,
            height: 720,
            upload_budget: DEFAULT_UPLOAD_BUDGET,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
