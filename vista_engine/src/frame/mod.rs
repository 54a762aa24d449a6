//! Frame module: per-frame submission tables, passes and GPU staging data.
//!
//! The producer fills a `Frame` (models, lights, animations, particles, UI)
//! and initializes its passes from cameras; the renderer later finalizes
//! the frame and uploads its staging blocks.

mod frame;
mod gpu_data;
mod material;
mod model;
mod pass;
mod ui;
mod writers;

pub use frame::Frame;
pub use gpu_data::{GpuAnimData, GpuGlobalData, GpuLight, GpuMaterial, GpuModelData, GpuPassData};
pub use material::{
    prepare_gpu_material, Material, MaterialPipeline, MaterialTexture, StaticMaterial,
    BASE_COLOR_TWEEN, CLOUD_SETTINGS_A_TWEEN, CLOUD_SETTINGS_B_TWEEN, DEFAULT_CLOUD_SETTINGS_A,
    DEFAULT_CLOUD_SETTINGS_B, EMISSIVE_TWEEN, SECONDARY_COLOR_TWEEN,
};
pub use model::{FrameModel, ModelFlags, ModelTexture};
pub use pass::{Element, Pass, PassFlags, DRAW_FIRST_DISTANCE, DRAW_LAST_DISTANCE};
pub use ui::{UiBatch, UiFrame, UiTexture, MAX_UI_BATCHES};
pub use writers::{
    write_particle_line, write_particle_rect, Geometry, MeshPrimitive, PrimitiveIds, SkinnedMesh,
};
