/// Attachment traits - pixel buffers that surfaces render into
///
/// An attachment holds color, depth or stencil content for a surface.
/// Framebuffer attachments can additionally be bound into a GPU framebuffer
/// in a given slot. Attachments are shared between surfaces through
/// `SharedAttachment`, and identified by pointer when deduplicating.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{AttachmentSlot, FramebufferId};
use crate::pixel::{Color4B, PixelFormat, PixelRect, SurfaceSize};
use super::texture_attachment::TextureAttachment;

/// Pixel buffer usable by a render surface
pub trait SurfaceAttachment: Send + Sync {
    /// Size in pixels
    fn size(&self) -> SurfaceSize;

    /// Storage format
    fn pixel_format(&self) -> PixelFormat;

    /// Samples per pixel
    fn pixel_samples(&self) -> u32 {
        1
    }

    /// Resize the attachment
    ///
    /// Owning attachments reallocate their GPU storage, discarding the
    /// content. Borrowed attachments only update the reported size.
    /// Resizing to the current size does nothing once storage exists.
    fn resize_to(&self, size: SurfaceSize) -> Result<()>;

    /// Replace part of the content with tightly packed, bottom-row-first pixels
    ///
    /// Only color attachments backed by a texture support this; for every
    /// other attachment it is a no-op.
    ///
    /// # Panics
    ///
    /// Implementations that support replacement panic if `rect` does not
    /// fit inside the attachment or `pixels` holds fewer pixels than `rect`.
    fn replace_pixels(&self, _rect: PixelRect, _pixels: &[Color4B]) -> Result<()> {
        Ok(())
    }

    /// True if dropping this attachment releases its GPU object
    fn is_managing_gpu_resource(&self) -> bool;

    fn name(&self) -> Option<String>;

    fn set_name(&self, name: &str);
}

/// Attachment that can be bound into a GPU framebuffer
pub trait FramebufferAttachment: SurfaceAttachment {
    /// Attach to `framebuffer` in `slot`, creating the GPU object if needed
    fn bind_to_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot) -> Result<()>;

    /// Detach from `framebuffer` in `slot`
    fn unbind_from_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot);

    /// Name an unnamed attachment after the framebuffer it is bound to
    fn derive_name_from_framebuffer(&self, framebuffer_name: &str, slot: AttachmentSlot) {
        if self.name().is_none() {
            self.set_name(&format!("{} {}", framebuffer_name, slot));
        }
    }

    /// Downcast to a texture-backed attachment
    fn as_texture_attachment(&self) -> Option<&TextureAttachment> {
        None
    }
}

/// Attachment shared between surfaces
pub type SharedAttachment = Arc<dyn FramebufferAttachment>;

/// Identity of a shared attachment, stable for its lifetime
pub fn attachment_key(attachment: &SharedAttachment) -> usize {
    Arc::as_ptr(attachment) as *const () as usize
}

/// True if both handles point at the same attachment
pub fn same_attachment(a: &SharedAttachment, b: &SharedAttachment) -> bool {
    attachment_key(a) == attachment_key(b)
}
