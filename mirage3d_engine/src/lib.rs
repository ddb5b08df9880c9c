/*!
# Mirage3D Engine

Core traits and types for the Mirage3D offscreen face-overlay renderer.

This crate provides the platform-agnostic GPU API (trait-based dynamic
polymorphism, one backend crate per graphics API) and the offscreen pipeline
built on top of it: a scene graph is rendered into a texture that can be
sampled as a material, and the texture memory can be copied back into a CPU
pixel buffer.

## Architecture

- **GraphicsDevice**: Factory trait for creating GPU resources and submitting work
- **Texture / RenderTarget**: Color surfaces, drawable and shader-readable
- **CommandList**: Recorded GPU commands
- **Fence**: Completion signal for one submission
- **OffscreenRenderer**: Renders a scene snapshot into an offscreen target
- **TextureProvisioner**: Allocates pre-filled offscreen targets
- **PixelBufferBridge**: Converts target memory into pixel buffers

Backend implementations provide concrete types that implement these traits.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod offscreen;
pub mod scene;
pub mod content;

// Main mirage3d namespace module
pub mod mirage3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (logging)
    pub use crate::engine::Engine;

    // Graphics device factory trait
    pub use crate::graphics_device::GraphicsDevice;

    // Configuration
    pub use crate::config::{Config, OffscreenConfig, DeviceLossPolicy, DebugSeverity};

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Render sub-module with all GPU abstraction types
    pub mod render {
        pub use crate::graphics_device::*;
    }

    // Offscreen pipeline sub-module
    pub mod offscreen {
        pub use crate::offscreen::*;
    }

    // Scene sub-module
    pub mod scene {
        pub use crate::scene::*;
    }

    // Virtual content sub-module
    pub mod content {
        pub use crate::content::*;
    }
}

// Re-export math library at crate root
pub use glam;
