/// Render texture - 2D or cube texture that surfaces can render into
///
/// Sampling configuration is out of scope here: a render texture only
/// knows its storage, its ownership and the clamp-to-edge wrapping that
/// render targets need.

use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::graphics_device::{GpuObject, GraphicsDevice, TextureFace, TextureId, TextureKind};
use crate::pixel::{encode_pixels, Color4B, PixelFormat, PixelRect, SurfaceSize};
use crate::{engine_debug, engine_trace};
use super::gpu_handle::GpuHandle;

struct RenderTextureState {
    handle: GpuHandle<TextureId>,
    size: SurfaceSize,
    has_storage: bool,
    name: Option<String>,
}

pub struct RenderTexture {
    device: Arc<dyn GraphicsDevice>,
    kind: TextureKind,
    format: PixelFormat,
    state: Mutex<RenderTextureState>,
}

impl RenderTexture {
    /// Create an owning texture with zero size
    pub fn new(device: Arc<dyn GraphicsDevice>, kind: TextureKind, format: PixelFormat) -> Self {
        Self {
            device,
            kind,
            format,
            state: Mutex::new(RenderTextureState {
                handle: GpuHandle::managed(),
                size: SurfaceSize::ZERO,
                has_storage: false,
                name: None,
            }),
        }
    }

    /// Create an owning texture and allocate storage for all its faces
    pub fn with_size(
        device: Arc<dyn GraphicsDevice>,
        kind: TextureKind,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Result<Self> {
        let texture = Self::new(device, kind, format);
        texture.resize_to(size)?;
        Ok(texture)
    }

    /// Wrap an existing GPU texture, which is never deleted by this instance
    pub fn with_texture_id(
        device: Arc<dyn GraphicsDevice>,
        id: TextureId,
        kind: TextureKind,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Self {
        Self {
            device,
            kind,
            format,
            state: Mutex::new(RenderTextureState {
                handle: GpuHandle::borrowed(id),
                size,
                has_storage: true,
                name: None,
            }),
        }
    }

    /// GPU texture id, created on first access for owning textures
    pub fn texture_id(&self) -> Result<TextureId> {
        let mut state = self.state.lock();
        self.ensure_id(&mut state)
    }

    fn ensure_id(&self, state: &mut RenderTextureState) -> Result<TextureId> {
        let created = state.handle.peek().is_none();
        let device = &self.device;
        let kind = self.kind;
        let id = state.handle.get_or_create(|| device.create_texture(kind))?;
        if created {
            engine_trace!("galaxy3d::RenderTexture", "Created {:?} texture {}", kind, id.0);
            if let Some(name) = &state.name {
                device.set_debug_label(GpuObject::Texture(id), name);
            }
        }
        Ok(id)
    }

    pub(crate) fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn kind(&self) -> TextureKind {
        self.kind
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Size of the base mipmap level
    pub fn size(&self) -> SurfaceSize {
        self.state.lock().size
    }

    pub fn is_managing_gpu_resource(&self) -> bool {
        self.state.lock().handle.is_managing()
    }

    pub fn name(&self) -> Option<String> {
        self.state.lock().name.clone()
    }

    pub fn set_name(&self, name: &str) {
        let mut state = self.state.lock();
        state.name = Some(name.to_string());
        if let Some(id) = state.handle.peek() {
            self.device.set_debug_label(GpuObject::Texture(id), name);
        }
    }

    /// Resize the base mipmap level of every face
    ///
    /// Owning textures reallocate their storage; borrowed textures only
    /// update the reported size.
    pub fn resize_to(&self, size: SurfaceSize) -> Result<()> {
        let mut state = self.state.lock();
        if state.size == size && state.has_storage {
            return Ok(());
        }

        if state.handle.is_managing() && !size.is_zero() {
            let id = self.ensure_id(&mut state)?;
            for face in TextureFace::all_of(self.kind) {
                self.device.allocate_texture_storage(id, face, 0, size, self.format)?;
            }
            state.has_storage = true;
            engine_debug!("galaxy3d::RenderTexture",
                "Allocated {:?} texture {} at {}x{} ({:?})",
                self.kind, id.0, size.width, size.height, self.format);
        }

        state.size = size;
        Ok(())
    }

    /// Use clamp-to-edge wrapping, as render targets require
    pub fn set_clamp_to_edge(&self) -> Result<()> {
        let id = self.texture_id()?;
        self.device.set_texture_clamp_to_edge(id);
        Ok(())
    }

    /// Replace part of one face/mip image with `Color4B` pixels
    ///
    /// Pixels are tightly packed, bottom row first. They are converted to
    /// the texture's storage format before upload. Depth textures ignore
    /// the call.
    ///
    /// # Panics
    ///
    /// Panics if `rect` does not fit inside the image or `pixels` holds
    /// fewer pixels than `rect`, for color textures only.
    pub fn replace_pixels(
        &self,
        face: TextureFace,
        mipmap_level: u32,
        rect: PixelRect,
        pixels: &[Color4B],
    ) -> Result<()> {
        // Depth and stencil storage has no color representation
        if !self.format.is_color() {
            return Ok(());
        }

        let image_size = self.size().at_mip_level(mipmap_level);
        assert!(
            rect.fits_within(image_size),
            "Rect {:?} does not fit in {}x{} texture image",
            rect, image_size.width, image_size.height
        );
        assert!(
            pixels.len() >= rect.pixel_count(),
            "{} pixels supplied for a {}x{} rect",
            pixels.len(), rect.width, rect.height
        );

        let Some(bytes) = encode_pixels(self.format, &pixels[..rect.pixel_count()]) else {
            return Ok(());
        };
        let id = self.texture_id()?;
        self.device.write_texture_pixels(id, face, mipmap_level, rect, self.format, &bytes)
    }
}

impl Drop for RenderTexture {
    fn drop(&mut self) {
        if let Some(id) = self.state.get_mut().handle.take_managed() {
            self.device.delete_texture(id);
            engine_trace!("galaxy3d::RenderTexture", "Deleted texture {}", id.0);
        }
    }
}
