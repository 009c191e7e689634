/// Renderbuffer attachment - non-sampled GPU storage for a surface
///
/// A renderbuffer either manages its GPU renderbuffer (created lazily,
/// deleted on drop) or wraps one created elsewhere, typically by the
/// window system for on-screen display.

use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::graphics_device::{AttachmentSlot, FramebufferId, GpuObject, GraphicsDevice, RenderbufferId};
use crate::pixel::{PixelFormat, SurfaceSize};
use crate::{engine_debug, engine_trace};
use super::attachment::{FramebufferAttachment, SurfaceAttachment};
use super::gpu_handle::GpuHandle;

struct RenderbufferState {
    handle: GpuHandle<RenderbufferId>,
    size: SurfaceSize,
    has_storage: bool,
    name: Option<String>,
}

pub struct Renderbuffer {
    device: Arc<dyn GraphicsDevice>,
    format: PixelFormat,
    samples: u32,
    state: Mutex<RenderbufferState>,
}

impl Renderbuffer {
    /// Create an owning, single-sampled renderbuffer with zero size
    ///
    /// No GPU object exists until the renderbuffer is resized or bound.
    pub fn new(device: Arc<dyn GraphicsDevice>, format: PixelFormat) -> Self {
        Self::with_samples(device, format, 1)
    }

    /// Create an owning renderbuffer with `samples` samples per pixel
    pub fn with_samples(device: Arc<dyn GraphicsDevice>, format: PixelFormat, samples: u32) -> Self {
        Self {
            device,
            format,
            samples: samples.max(1),
            state: Mutex::new(RenderbufferState {
                handle: GpuHandle::managed(),
                size: SurfaceSize::ZERO,
                has_storage: false,
                name: None,
            }),
        }
    }

    /// Create an owning renderbuffer and allocate its storage at `size`
    pub fn with_size(
        device: Arc<dyn GraphicsDevice>,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Result<Self> {
        let renderbuffer = Self::new(device, format);
        renderbuffer.resize_to(size)?;
        Ok(renderbuffer)
    }

    /// Wrap an existing GPU renderbuffer of known size
    ///
    /// The wrapped renderbuffer is never deleted by this instance, and
    /// resizing it only updates the reported size.
    pub fn with_renderbuffer_id(
        device: Arc<dyn GraphicsDevice>,
        id: RenderbufferId,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Self {
        Self::with_renderbuffer_id_and_samples(device, id, size, format, 1)
    }

    /// Wrap an existing multisampled GPU renderbuffer of known size
    pub fn with_renderbuffer_id_and_samples(
        device: Arc<dyn GraphicsDevice>,
        id: RenderbufferId,
        size: SurfaceSize,
        format: PixelFormat,
        samples: u32,
    ) -> Self {
        Self {
            device,
            format,
            samples: samples.max(1),
            state: Mutex::new(RenderbufferState {
                handle: GpuHandle::borrowed(id),
                size,
                has_storage: true,
                name: None,
            }),
        }
    }

    /// GPU renderbuffer id, created on first access for owning renderbuffers
    pub fn renderbuffer_id(&self) -> Result<RenderbufferId> {
        let mut state = self.state.lock();
        self.ensure_id(&mut state)
    }

    fn ensure_id(&self, state: &mut RenderbufferState) -> Result<RenderbufferId> {
        let created = state.handle.peek().is_none();
        let device = &self.device;
        let id = state.handle.get_or_create(|| device.create_renderbuffer())?;
        if created {
            engine_trace!("galaxy3d::Renderbuffer", "Created renderbuffer {}", id.0);
            if let Some(name) = &state.name {
                device.set_debug_label(GpuObject::Renderbuffer(id), name);
            }
        }
        Ok(id)
    }

    /// Number of samples per pixel
    pub fn pixel_samples(&self) -> u32 {
        self.samples
    }

    /// Bind this renderbuffer as the current renderbuffer
    ///
    /// Used to leave the display color buffer bound for presentation.
    pub fn bind(&self) -> Result<()> {
        let id = self.renderbuffer_id()?;
        self.device.bind_renderbuffer(id);
        Ok(())
    }
}

impl SurfaceAttachment for Renderbuffer {
    fn size(&self) -> SurfaceSize {
        self.state.lock().size
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn pixel_samples(&self) -> u32 {
        self.samples
    }

    fn resize_to(&self, size: SurfaceSize) -> Result<()> {
        let mut state = self.state.lock();
        if state.size == size && state.has_storage {
            return Ok(());
        }

        if state.handle.is_managing() && !size.is_zero() {
            let id = self.ensure_id(&mut state)?;
            self.device.allocate_renderbuffer_storage(id, size, self.format, self.samples)?;
            state.has_storage = true;
            engine_debug!("galaxy3d::Renderbuffer",
                "Allocated renderbuffer {} at {}x{} ({:?}, {} samples)",
                id.0, size.width, size.height, self.format, self.samples);
        }

        state.size = size;
        Ok(())
    }

    fn is_managing_gpu_resource(&self) -> bool {
        self.state.lock().handle.is_managing()
    }

    fn name(&self) -> Option<String> {
        self.state.lock().name.clone()
    }

    fn set_name(&self, name: &str) {
        let mut state = self.state.lock();
        state.name = Some(name.to_string());
        if let Some(id) = state.handle.peek() {
            self.device.set_debug_label(GpuObject::Renderbuffer(id), name);
        }
    }
}

impl FramebufferAttachment for Renderbuffer {
    fn bind_to_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot) -> Result<()> {
        let id = self.renderbuffer_id()?;
        self.device.attach_renderbuffer(framebuffer, slot, id)
    }

    fn unbind_from_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot) {
        self.device.detach_attachment(framebuffer, slot);
    }
}

impl Drop for Renderbuffer {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().handle.take_managed() {
            self.device.delete_renderbuffer(id);
            engine_trace!("galaxy3d::Renderbuffer", "Deleted renderbuffer {}", id.0);
        }
    }
}

#[cfg(test)]
#[path = "renderbuffer_tests.rs"]
mod tests;
