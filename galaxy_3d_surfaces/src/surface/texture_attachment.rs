/// Texture attachment - renders into one face and mipmap level of a texture

use std::sync::Arc;
use parking_lot::Mutex;

use crate::error::Result;
use crate::graphics_device::{AttachmentSlot, FramebufferId, TextureFace};
use crate::pixel::{Color4B, PixelFormat, PixelRect, SurfaceSize};
use super::attachment::{FramebufferAttachment, SurfaceAttachment};
use super::render_texture::RenderTexture;
use crate::engine_bail;

struct TextureAttachmentState {
    face: TextureFace,
    mipmap_level: u32,
    name: Option<String>,
}

pub struct TextureAttachment {
    texture: Arc<RenderTexture>,
    state: Mutex<TextureAttachmentState>,
}

impl TextureAttachment {
    /// Attach the first face and base level of `texture`
    ///
    /// The texture is switched to clamp-to-edge wrapping.
    pub fn new(texture: Arc<RenderTexture>) -> Result<Self> {
        let face = TextureFace::first_of(texture.kind());
        Self::with_face(texture, face, 0)
    }

    pub fn with_face(texture: Arc<RenderTexture>, face: TextureFace, mipmap_level: u32) -> Result<Self> {
        if face.kind() != texture.kind() {
            engine_bail!("galaxy3d::TextureAttachment",
                "Face {:?} does not belong to a {:?} texture", face, texture.kind());
        }
        texture.set_clamp_to_edge()?;
        Ok(Self {
            texture,
            state: Mutex::new(TextureAttachmentState {
                face,
                mipmap_level,
                name: None,
            }),
        })
    }

    pub fn texture(&self) -> &Arc<RenderTexture> {
        &self.texture
    }

    pub fn face(&self) -> TextureFace {
        self.state.lock().face
    }

    /// Target another face of the texture
    ///
    /// Only the attachment changes; the owning framebuffer must rebind it
    /// before the new face receives rendering.
    pub fn set_face(&self, face: TextureFace) {
        self.state.lock().face = face;
    }

    pub fn mipmap_level(&self) -> u32 {
        self.state.lock().mipmap_level
    }

    pub fn set_mipmap_level(&self, mipmap_level: u32) {
        self.state.lock().mipmap_level = mipmap_level;
    }
}

impl SurfaceAttachment for TextureAttachment {
    fn size(&self) -> SurfaceSize {
        self.texture.size().at_mip_level(self.mipmap_level())
    }

    fn pixel_format(&self) -> PixelFormat {
        self.texture.pixel_format()
    }

    fn resize_to(&self, size: SurfaceSize) -> Result<()> {
        self.texture.resize_to(size)
    }

    fn replace_pixels(&self, rect: PixelRect, pixels: &[Color4B]) -> Result<()> {
        let (face, mipmap_level) = {
            let state = self.state.lock();
            (state.face, state.mipmap_level)
        };
        self.texture.replace_pixels(face, mipmap_level, rect, pixels)
    }

    fn is_managing_gpu_resource(&self) -> bool {
        self.texture.is_managing_gpu_resource()
    }

    fn name(&self) -> Option<String> {
        self.state.lock().name.clone()
    }

    fn set_name(&self, name: &str) {
        self.state.lock().name = Some(name.to_string());
        if self.texture.name().is_none() {
            self.texture.set_name(name);
        }
    }
}

impl FramebufferAttachment for TextureAttachment {
    fn bind_to_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot) -> Result<()> {
        let id = self.texture.texture_id()?;
        let (face, mipmap_level) = {
            let state = self.state.lock();
            (state.face, state.mipmap_level)
        };
        self.texture.device().attach_texture(framebuffer, slot, id, face, mipmap_level)
    }

    fn unbind_from_framebuffer(&self, framebuffer: FramebufferId, slot: AttachmentSlot) {
        self.texture.device().detach_attachment(framebuffer, slot);
    }

    fn as_texture_attachment(&self) -> Option<&TextureAttachment> {
        Some(self)
    }
}

#[cfg(test)]
#[path = "texture_attachment_tests.rs"]
mod tests;
