/// Framebuffer - GPU framebuffer object implementing RenderSurface
///
/// A framebuffer either manages its GPU framebuffer (created on first use,
/// deleted on drop) or wraps one supplied by the window system. Assigning
/// an attachment aligns its size with the framebuffer and, unless
/// `should_bind_gl_attachments` is off, rebinds the slot on the GPU.

use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentSlot, BufferMask, FramebufferId, GpuObject, GraphicsDevice, TextureKind,
};
use crate::pixel::{Color4B, PixelFormat, PixelRect, SurfaceSize};
use crate::{engine_debug, engine_error, engine_trace};
use super::attachment::{same_attachment, SharedAttachment};
use super::gpu_handle::GpuHandle;
use super::render_surface::RenderSurface;
use super::render_texture::RenderTexture;
use super::renderbuffer::Renderbuffer;
use super::texture_attachment::TextureAttachment;

struct FramebufferState {
    name: Option<String>,
    /// Size used while no attachment is present
    size: SurfaceSize,
    color: Option<SharedAttachment>,
    depth: Option<SharedAttachment>,
    stencil: Option<SharedAttachment>,
    is_on_screen: bool,
    should_bind_gl_attachments: bool,
}

impl FramebufferState {
    fn slot(&self, slot: AttachmentSlot) -> &Option<SharedAttachment> {
        match slot {
            AttachmentSlot::Color => &self.color,
            AttachmentSlot::Depth => &self.depth,
            AttachmentSlot::Stencil => &self.stencil,
        }
    }

    fn slot_mut(&mut self, slot: AttachmentSlot) -> &mut Option<SharedAttachment> {
        match slot {
            AttachmentSlot::Color => &mut self.color,
            AttachmentSlot::Depth => &mut self.depth,
            AttachmentSlot::Stencil => &mut self.stencil,
        }
    }

    fn size(&self) -> SurfaceSize {
        self.color
            .as_ref()
            .or(self.depth.as_ref())
            .or(self.stencil.as_ref())
            .map(|attachment| attachment.size())
            .unwrap_or(self.size)
    }
}

pub struct Framebuffer {
    device: Arc<dyn GraphicsDevice>,
    handle: Mutex<GpuHandle<FramebufferId>>,
    state: Mutex<FramebufferState>,
}

impl Framebuffer {
    // ===== CONSTRUCTION =====

    /// Create an owning framebuffer with zero size
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self::with_size(device, SurfaceSize::ZERO)
    }

    /// Create an owning framebuffer
    ///
    /// Attachments assigned while the framebuffer has no other attachment
    /// are resized to `size`.
    pub fn with_size(device: Arc<dyn GraphicsDevice>, size: SurfaceSize) -> Self {
        Self::from_handle(device, GpuHandle::managed(), size)
    }

    /// Wrap an existing GPU framebuffer, which is never deleted by this instance
    pub fn with_framebuffer_id(
        device: Arc<dyn GraphicsDevice>,
        id: FramebufferId,
        size: SurfaceSize,
    ) -> Self {
        Self::from_handle(device, GpuHandle::borrowed(id), size)
    }

    fn from_handle(
        device: Arc<dyn GraphicsDevice>,
        handle: GpuHandle<FramebufferId>,
        size: SurfaceSize,
    ) -> Self {
        Self {
            device,
            handle: Mutex::new(handle),
            state: Mutex::new(FramebufferState {
                name: None,
                size,
                color: None,
                depth: None,
                stencil: None,
                is_on_screen: false,
                should_bind_gl_attachments: true,
            }),
        }
    }

    /// Set the name before adding attachments so that it propagates to them
    pub fn with_name(mut self, name: &str) -> Self {
        self.state.get_mut().name = Some(name.to_string());
        self
    }

    /// Create a framebuffer rendering color into a new 2D texture, with a
    /// new depth renderbuffer of `depth_format`
    ///
    /// Opaque surfaces use `R5G6B5_UNORM` color, others `R8G8B8A8_UNORM`.
    pub fn color_texture_surface(
        device: Arc<dyn GraphicsDevice>,
        size: SurfaceSize,
        is_opaque: bool,
        depth_format: PixelFormat,
    ) -> Result<Self> {
        let depth: SharedAttachment = Arc::new(Renderbuffer::new(device.clone(), depth_format));
        Self::color_texture_surface_with_depth_attachment(device, size, is_opaque, depth)
    }

    /// Create a framebuffer rendering color into a new 2D texture, sharing
    /// an existing depth attachment
    pub fn color_texture_surface_with_depth_attachment(
        device: Arc<dyn GraphicsDevice>,
        size: SurfaceSize,
        is_opaque: bool,
        depth: SharedAttachment,
    ) -> Result<Self> {
        let color_format = if is_opaque {
            PixelFormat::R5G6B5_UNORM
        } else {
            PixelFormat::R8G8B8A8_UNORM
        };
        Self::color_texture_surface_with_format(device, size, color_format, depth)
    }

    /// Create a framebuffer rendering color into a new 2D texture of
    /// `color_format`, sharing an existing depth attachment
    pub fn color_texture_surface_with_format(
        device: Arc<dyn GraphicsDevice>,
        size: SurfaceSize,
        color_format: PixelFormat,
        depth: SharedAttachment,
    ) -> Result<Self> {
        let framebuffer = Self::with_size(device.clone(), size);
        let texture = Arc::new(RenderTexture::new(device, TextureKind::Texture2d, color_format));
        framebuffer.set_color_texture(Some(texture))?;
        framebuffer.set_depth_attachment(Some(depth))?;
        Ok(framebuffer)
    }

    // ===== PROPERTIES =====

    /// GPU framebuffer id, created on first access for owning framebuffers
    pub fn framebuffer_id(&self) -> Result<FramebufferId> {
        let mut handle = self.handle.lock();
        let created = handle.peek().is_none();
        let device = &self.device;
        let id = handle.get_or_create(|| device.create_framebuffer())?;
        if created {
            engine_trace!("galaxy3d::Framebuffer", "Created framebuffer {}", id.0);
            if let Some(name) = &self.state.lock().name {
                device.set_debug_label(GpuObject::Framebuffer(id), name);
            }
        }
        Ok(id)
    }

    /// True if dropping this framebuffer deletes the GPU framebuffer
    pub fn is_managing_gpu_resource(&self) -> bool {
        self.handle.lock().is_managing()
    }

    pub fn name(&self) -> Option<String> {
        self.state.lock().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        self.state.lock().name = Some(name.to_string());
        if let Some(id) = self.handle.lock().peek() {
            self.device.set_debug_label(GpuObject::Framebuffer(id), name);
        }
    }

    pub fn should_bind_gl_attachments(&self) -> bool {
        self.state.lock().should_bind_gl_attachments
    }

    /// Whether assigning attachments also binds them on the GPU
    ///
    /// Turn off while mirroring a framebuffer whose attachments were bound
    /// elsewhere, such as the window system's.
    pub fn set_should_bind_gl_attachments(&self, should_bind: bool) {
        self.state.lock().should_bind_gl_attachments = should_bind;
    }

    /// Texture behind the color attachment, if it is texture-backed
    pub fn color_texture(&self) -> Option<Arc<RenderTexture>> {
        let attachment = self.color_attachment()?;
        let texture = attachment.as_texture_attachment()?.texture().clone();
        Some(texture)
    }

    /// Render color into `texture`, wrapped in a new texture attachment
    pub fn set_color_texture(&self, texture: Option<Arc<RenderTexture>>) -> Result<()> {
        let attachment = Self::wrap_texture(texture)?;
        self.set_color_attachment(attachment)
    }

    /// Texture behind the depth attachment, if it is texture-backed
    pub fn depth_texture(&self) -> Option<Arc<RenderTexture>> {
        let attachment = self.depth_attachment()?;
        let texture = attachment.as_texture_attachment()?.texture().clone();
        Some(texture)
    }

    /// Render depth into `texture`, wrapped in a new texture attachment
    pub fn set_depth_texture(&self, texture: Option<Arc<RenderTexture>>) -> Result<()> {
        let attachment = Self::wrap_texture(texture)?;
        self.set_depth_attachment(attachment)
    }

    fn wrap_texture(texture: Option<Arc<RenderTexture>>) -> Result<Option<SharedAttachment>> {
        match texture {
            Some(texture) => {
                let attachment: SharedAttachment = Arc::new(TextureAttachment::new(texture)?);
                Ok(Some(attachment))
            }
            None => Ok(None),
        }
    }

    // ===== ATTACHMENT ASSIGNMENT =====

    fn assign_attachment(
        &self,
        slot: AttachmentSlot,
        attachment: Option<SharedAttachment>,
    ) -> Result<()> {
        let (previous, size, should_bind, name) = {
            let state = self.state.lock();
            (
                state.slot(slot).clone(),
                state.size(),
                state.should_bind_gl_attachments,
                state.name.clone(),
            )
        };

        match (&previous, &attachment) {
            (None, None) => return Ok(()),
            (Some(a), Some(b)) if same_attachment(a, b) => return Ok(()),
            _ => {}
        }

        if let Some(attachment) = &attachment {
            if !size.is_zero() && attachment.size() != size {
                attachment.resize_to(size)?;
            }
        }

        if should_bind {
            let id = self.framebuffer_id()?;
            if let Some(previous) = &previous {
                previous.unbind_from_framebuffer(id, slot);
            }
            if let Some(attachment) = &attachment {
                attachment.bind_to_framebuffer(id, slot)?;
            }
        }

        if let (Some(attachment), Some(name)) = (&attachment, &name) {
            attachment.derive_name_from_framebuffer(name, slot);
        }

        *self.state.lock().slot_mut(slot) = attachment;
        Ok(())
    }

    /// Rebind the current attachment of `slot` on the GPU
    ///
    /// Needed after retargeting a texture attachment to another face or
    /// mipmap level.
    pub fn rebind_attachment(&self, slot: AttachmentSlot) -> Result<()> {
        let attachment = self.state.lock().slot(slot).clone();
        if let Some(attachment) = attachment {
            let id = self.framebuffer_id()?;
            attachment.bind_to_framebuffer(id, slot)?;
        }
        Ok(())
    }

    // ===== CONTENT =====

    fn clear_content(&self, mut mask: BufferMask) -> Result<()> {
        self.activate()?;

        // A combined depth-stencil buffer is cleared as a whole
        if mask.contains(BufferMask::DEPTH) {
            let state = self.state.lock();
            if let (Some(depth), Some(stencil)) = (&state.depth, &state.stencil) {
                if same_attachment(depth, stencil) {
                    mask |= BufferMask::STENCIL;
                }
            }
        }

        let previous_mask = self.device.write_mask();
        let needed_mask = previous_mask | mask;
        if needed_mask != previous_mask {
            self.device.set_write_mask(needed_mask);
        }
        self.device.clear(mask);
        if needed_mask != previous_mask {
            self.device.set_write_mask(previous_mask);
        }
        Ok(())
    }
}

impl RenderSurface for Framebuffer {
    fn size(&self) -> SurfaceSize {
        self.state.lock().size()
    }

    fn is_on_screen(&self) -> bool {
        self.state.lock().is_on_screen
    }

    fn set_is_on_screen(&self, is_on_screen: bool) {
        self.state.lock().is_on_screen = is_on_screen;
    }

    fn color_attachment(&self) -> Option<SharedAttachment> {
        self.state.lock().color.clone()
    }

    fn set_color_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()> {
        self.assign_attachment(AttachmentSlot::Color, attachment)
    }

    fn depth_attachment(&self) -> Option<SharedAttachment> {
        self.state.lock().depth.clone()
    }

    fn set_depth_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()> {
        let previous = self.depth_attachment();
        self.assign_attachment(AttachmentSlot::Depth, attachment.clone())?;

        match &attachment {
            Some(depth) if depth.pixel_format().has_stencil() => {
                self.assign_attachment(AttachmentSlot::Stencil, attachment.clone())
            }
            _ => {
                let stencil = self.stencil_attachment();
                match (&previous, &stencil) {
                    (Some(previous), Some(stencil)) if same_attachment(previous, stencil) => {
                        self.assign_attachment(AttachmentSlot::Stencil, None)
                    }
                    _ => Ok(()),
                }
            }
        }
    }

    fn stencil_attachment(&self) -> Option<SharedAttachment> {
        self.state.lock().stencil.clone()
    }

    fn set_stencil_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()> {
        self.assign_attachment(AttachmentSlot::Stencil, attachment)
    }

    fn validate(&self) -> bool {
        let (slots, name) = {
            let state = self.state.lock();
            (
                [
                    (AttachmentSlot::Color, state.color.clone()),
                    (AttachmentSlot::Depth, state.depth.clone()),
                    (AttachmentSlot::Stencil, state.stencil.clone()),
                ],
                state.name.clone().unwrap_or_else(|| "Framebuffer".to_string()),
            )
        };

        let size = self.size();
        let mut sizes_agree = true;
        for (slot, attachment) in &slots {
            if let Some(attachment) = attachment {
                let attachment_size = attachment.size();
                if attachment_size != size {
                    engine_error!("galaxy3d::Framebuffer",
                        "{}: {} attachment is {}x{} but surface is {}x{}",
                        name, slot, attachment_size.width, attachment_size.height,
                        size.width, size.height);
                    sizes_agree = false;
                }
            }
        }
        if !sizes_agree {
            return false;
        }

        let id = match self.framebuffer_id() {
            Ok(id) => id,
            Err(err) => {
                engine_error!("galaxy3d::Framebuffer", "{}: no GPU framebuffer: {}", name, err);
                return false;
            }
        };
        let status = self.device.framebuffer_status(id);
        if !status.is_complete() {
            engine_error!("galaxy3d::Framebuffer",
                "{} (id {}) is incomplete: {:?}", name, id.0, status);
            return false;
        }
        true
    }

    fn activate(&self) -> Result<()> {
        let id = self.framebuffer_id()?;
        if self.device.bound_framebuffer() != id {
            self.device.bind_framebuffer(id);
        }
        Ok(())
    }

    fn clear_color_content(&self) -> Result<()> {
        self.clear_content(BufferMask::COLOR)
    }

    fn clear_depth_content(&self) -> Result<()> {
        self.clear_content(BufferMask::DEPTH)
    }

    fn clear_stencil_content(&self) -> Result<()> {
        self.clear_content(BufferMask::STENCIL)
    }

    fn clear_color_and_depth_content(&self) -> Result<()> {
        self.clear_content(BufferMask::COLOR | BufferMask::DEPTH)
    }

    fn read_color_content_from(&self, rect: PixelRect) -> Result<Vec<Color4B>> {
        let size = self.size();
        assert!(
            rect.fits_within(size),
            "Rect {:?} does not fit in {}x{} surface",
            rect, size.width, size.height
        );

        let id = self.framebuffer_id()?;
        let previous = self.device.bound_framebuffer();
        if previous != id {
            self.device.bind_framebuffer(id);
        }
        let result = self.device.read_pixels(rect);
        if previous != id {
            self.device.bind_framebuffer(previous);
        }

        match result {
            Err(Error::Unsupported(reason)) => {
                engine_debug!("galaxy3d::Framebuffer",
                    "Color content of framebuffer {} is not readable: {}", id.0, reason);
                Ok(Vec::new())
            }
            other => other,
        }
    }

    fn replace_color_pixels(&self, rect: PixelRect, pixels: &[Color4B]) -> Result<()> {
        match self.color_attachment() {
            Some(color) => color.replace_pixels(rect, pixels),
            None => Ok(()),
        }
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        if let Some(id) = self.handle.get_mut().take_managed() {
            self.device.delete_framebuffer(id);
            engine_trace!("galaxy3d::Framebuffer", "Deleted framebuffer {}", id.0);
        }
    }
}

#[cfg(test)]
#[path = "framebuffer_tests.rs"]
mod tests;
