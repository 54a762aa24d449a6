/*!
# Vista Engine

Frame pipeline and visibility/pass scheduler for a real-time 3D renderer.

A producer thread (game/update loop) fills one of three rotating frames:
it initializes passes from cameras, culls submissions against them and
writes models, lights, animations, particles and UI. The render thread
takes the newest finished frame, uploads its staging blocks and replays
the passes against a `GraphicsDevice`.

## Architecture

- **Frame**: per-frame submission tables and passes
- **Camera**: projection math, frustums and shadow cascades
- **Renderer**: frame ring, pending-upload queues and the draw schedule
- **GraphicsDevice**: trait the GPU backend implements
- **Skeleton**: bone hierarchies for skinned meshes
*/

// Internal modules
mod error;
pub mod log;
pub mod camera;
pub mod config;
pub mod frame;
pub mod graphics_device;
pub mod light;
pub mod renderer;
pub mod skeleton;
pub mod vertex;

// Main vista namespace module
pub mod vista {
    // Error types
    pub use crate::error::{Error, Result};

    // Renderer and its frame ring
    pub use crate::renderer::Renderer;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{DefaultLogger, EngineLog, LogEntry, LogSeverity, Logger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod config {
        pub use crate::config::*;
    }

    pub mod frame {
        pub use crate::frame::*;
    }

    pub mod light {
        pub use crate::light::*;
    }

    // Device collaborator traits and descriptors
    pub mod device {
        pub use crate::graphics_device::*;
    }

    pub mod render {
        pub use crate::renderer::*;
    }

    pub mod skeleton {
        pub use crate::skeleton::*;
    }

    pub mod vertex {
        pub use crate::vertex::*;
    }
}

// Re-export math library at crate root
pub use glam;
