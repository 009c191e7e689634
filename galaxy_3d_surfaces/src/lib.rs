/*!
# Galaxy 3D Surfaces

Render surfaces for the Galaxy 3D engine: the framebuffers that rendering is
directed to and the buffers attached to them.

All GPU work goes through the `GraphicsDevice` trait, so the surfaces are
independent of the graphics backend.

## Architecture

- **SurfaceAttachment / FramebufferAttachment**: Buffers that can be attached
  to a framebuffer (`Renderbuffer`, `TextureAttachment`)
- **RenderSurface**: Trait for anything rendering can be directed to,
  implemented by `Framebuffer`
- **SurfaceManager**: Owns the on-screen surface, the multisampling and
  picking surfaces, and keeps registered surfaces sized with the display
- **EnvironmentMapTexture**: Cube texture rendered from the scene a few faces
  at a time

GPU objects are either owned (created lazily, deleted on drop) or borrowed
from the window system (never deleted).
*/

// Internal modules
mod error;
pub mod log;
pub mod pixel;
pub mod graphics_device;
pub mod surface;
pub mod target;
pub mod environment;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Surface manager and its configuration
    pub use crate::target::{DisplaySurface, SurfaceManager, SurfaceManagerConfig};

    // Logging sub-module (types and logger control, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        pub use crate::log::{set_logger, reset_logger, log, log_detailed};
        // Note: engine_* macros are NOT re-exported here - they are internal only
    }

    // GPU binding layer
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Pixel formats, sizes and colors
    pub mod pixel {
        pub use crate::pixel::*;
    }

    // Attachments and framebuffers
    pub mod surface {
        pub use crate::surface::*;
    }

    // Environment maps
    pub mod environment {
        pub use crate::environment::*;
    }
}

// Re-export math library at crate root
pub use glam;
