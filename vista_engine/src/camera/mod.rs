//! Camera module: projection math, world-space frustums and shadow cascades.
//!
//! Cameras are owned by the caller. A frame snapshots what it needs when a
//! pass is initialized from a camera.

mod camera;
mod cascade;
mod frustum;

pub use camera::{
    Camera, CameraFlags, Projection,
    passes_for_cone_in_cameras, passes_for_sphere_in_cameras,
};
pub use cascade::{make_cascade_camera_views, MAX_CASCADES};
pub use frustum::{
    Frustum,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
