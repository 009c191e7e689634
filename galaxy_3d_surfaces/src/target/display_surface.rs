/// Platform display description and surface manager configuration

use crate::graphics_device::{FramebufferId, RenderbufferId};
use crate::pixel::{PixelFormat, SurfaceSize};

/// GPU objects the window system created for on-screen display
///
/// These objects are borrowed: the surface manager binds and resizes its
/// view of them, but never deletes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplaySurface {
    /// Framebuffer presented to the screen
    pub framebuffer_id: FramebufferId,
    /// Color renderbuffer attached to that framebuffer
    pub color_renderbuffer_id: RenderbufferId,
    /// Depth renderbuffer, when the window system provides one
    pub depth_renderbuffer_id: Option<RenderbufferId>,
    /// Format of the depth renderbuffer; ignored when there is none
    pub depth_format: PixelFormat,
    /// Current size in pixels
    pub size: SurfaceSize,
    /// Format of the color renderbuffer
    pub color_format: PixelFormat,
}

/// Surface manager configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceManagerConfig {
    /// Depth buffer format, or `None` to render without depth
    pub depth_format: Option<PixelFormat>,
    /// Samples per pixel; values above 1 enable multisampling
    pub pixel_samples: u32,
}

impl Default for SurfaceManagerConfig {
    fn default() -> Self {
        Self {
            depth_format: Some(PixelFormat::D16_UNORM),
            pixel_samples: 1,
        }
    }
}
