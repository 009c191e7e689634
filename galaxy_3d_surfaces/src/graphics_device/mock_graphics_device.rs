/// Mock GraphicsDevice for unit tests (no GPU required)
///
/// Tracks every GPU object, attachment and binding in plain collections and
/// records each call as a command string, so surface logic can be checked
/// without a graphics context.

use parking_lot::{Mutex, MutexGuard};
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::graphics_device::{
    AttachmentSlot, BufferMask, FramebufferId, FramebufferStatus, GpuObject, GraphicsDevice,
    RenderbufferId, TextureFace, TextureId, TextureKind,
};
use crate::pixel::{decode_pixels, Color4B, PixelFormat, PixelRect, SurfaceSize};

// ============================================================================
// Mock resources
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MockRenderbuffer {
    /// None until storage is allocated
    pub storage: Option<(SurfaceSize, PixelFormat, u32)>,
    pub allocations: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockTextureImage {
    pub size: SurfaceSize,
    pub format: PixelFormat,
    /// Packed storage bytes, bottom row first
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MockTexture {
    pub kind: TextureKind,
    pub images: FxHashMap<(TextureFace, u32), MockTextureImage>,
    pub clamp_to_edge: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockAttached {
    Renderbuffer(RenderbufferId),
    Texture { id: TextureId, face: TextureFace, mipmap_level: u32 },
}

// ============================================================================
// Mock device state
// ============================================================================

pub struct MockDeviceState {
    next_id: u32,
    pub commands: Vec<String>,
    pub renderbuffers: FxHashMap<RenderbufferId, MockRenderbuffer>,
    pub framebuffers: FxHashMap<FramebufferId, FxHashMap<AttachmentSlot, MockAttached>>,
    pub textures: FxHashMap<TextureId, MockTexture>,
    pub deleted_renderbuffers: Vec<RenderbufferId>,
    pub deleted_framebuffers: Vec<FramebufferId>,
    pub deleted_textures: Vec<TextureId>,
    pub bound_framebuffer: FramebufferId,
    pub bound_renderbuffer: Option<RenderbufferId>,
    pub write_mask: BufferMask,
    /// (bound framebuffer, cleared buffers, write mask at clear time)
    pub clears: Vec<(FramebufferId, BufferMask, BufferMask)>,
    pub resolves: Vec<(FramebufferId, FramebufferId, SurfaceSize)>,
    pub discards: Vec<(FramebufferId, BufferMask)>,
    pub labels: FxHashMap<GpuObject, String>,
    /// Framebuffers whose color content cannot be read back
    pub unreadable: Vec<FramebufferId>,
    /// Make every storage allocation fail with OutOfMemory
    pub fail_allocations: bool,
}

impl Default for MockDeviceState {
    fn default() -> Self {
        Self {
            next_id: 1,
            commands: Vec::new(),
            renderbuffers: FxHashMap::default(),
            framebuffers: FxHashMap::default(),
            textures: FxHashMap::default(),
            deleted_renderbuffers: Vec::new(),
            deleted_framebuffers: Vec::new(),
            deleted_textures: Vec::new(),
            bound_framebuffer: FramebufferId::DEFAULT,
            bound_renderbuffer: None,
            write_mask: BufferMask::all(),
            clears: Vec::new(),
            resolves: Vec::new(),
            discards: Vec::new(),
            labels: FxHashMap::default(),
            unreadable: Vec::new(),
            fail_allocations: false,
        }
    }
}

impl MockDeviceState {
    fn next_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn attached_size(&self, attached: &MockAttached) -> Option<SurfaceSize> {
        match attached {
            MockAttached::Renderbuffer(id) => self
                .renderbuffers
                .get(id)
                .and_then(|rb| rb.storage)
                .map(|(size, _, _)| size),
            MockAttached::Texture { id, face, mipmap_level } => self
                .textures
                .get(id)
                .and_then(|tex| tex.images.get(&(*face, *mipmap_level)))
                .map(|image| image.size),
        }
    }

    fn attached_samples(&self, attached: &MockAttached) -> u32 {
        match attached {
            MockAttached::Renderbuffer(id) => self
                .renderbuffers
                .get(id)
                .and_then(|rb| rb.storage)
                .map(|(_, _, samples)| samples)
                .unwrap_or(1),
            MockAttached::Texture { .. } => 1,
        }
    }
}

// ============================================================================
// Mock device
// ============================================================================

pub struct MockGraphicsDevice {
    state: Mutex<MockDeviceState>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockDeviceState::default()),
        }
    }

    /// Inspect or tweak the recorded device state
    pub fn state(&self) -> MutexGuard<'_, MockDeviceState> {
        self.state.lock()
    }

    /// Simulate a renderbuffer created and sized by the window system
    pub fn external_renderbuffer(&self, size: SurfaceSize, format: PixelFormat) -> RenderbufferId {
        let mut state = self.state.lock();
        let id = RenderbufferId(state.next_id());
        state.renderbuffers.insert(id, MockRenderbuffer {
            storage: Some((size, format, 1)),
            allocations: 0,
        });
        id
    }

    /// Simulate a framebuffer created by the window system
    pub fn external_framebuffer(&self) -> FramebufferId {
        let mut state = self.state.lock();
        let id = FramebufferId(state.next_id());
        state.framebuffers.insert(id, FxHashMap::default());
        id
    }

    pub fn attached(&self, framebuffer: FramebufferId, slot: AttachmentSlot) -> Option<MockAttached> {
        self.state
            .lock()
            .framebuffers
            .get(&framebuffer)
            .and_then(|slots| slots.get(&slot).copied())
    }

    pub fn renderbuffer(&self, id: RenderbufferId) -> Option<MockRenderbuffer> {
        self.state.lock().renderbuffers.get(&id).cloned()
    }

    pub fn texture(&self, id: TextureId) -> Option<MockTexture> {
        self.state.lock().textures.get(&id).cloned()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.lock().commands.clear();
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_renderbuffer(&self) -> Result<RenderbufferId> {
        let mut state = self.state.lock();
        let id = RenderbufferId(state.next_id());
        state.renderbuffers.insert(id, MockRenderbuffer { storage: None, allocations: 0 });
        state.commands.push(format!("create_renderbuffer {}", id.0));
        Ok(id)
    }

    fn delete_renderbuffer(&self, id: RenderbufferId) {
        let mut state = self.state.lock();
        state.renderbuffers.remove(&id);
        state.deleted_renderbuffers.push(id);
        state.commands.push(format!("delete_renderbuffer {}", id.0));
    }

    fn allocate_renderbuffer_storage(
        &self,
        id: RenderbufferId,
        size: SurfaceSize,
        format: PixelFormat,
        samples: u32,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_allocations {
            return Err(Error::OutOfMemory);
        }
        let rb = state
            .renderbuffers
            .get_mut(&id)
            .ok_or_else(|| Error::InvalidResource(format!("Unknown renderbuffer {}", id.0)))?;
        rb.storage = Some((size, format, samples));
        rb.allocations += 1;
        state.bound_renderbuffer = Some(id);
        state.commands.push(format!(
            "allocate_renderbuffer_storage {} {}x{}",
            id.0, size.width, size.height
        ));
        Ok(())
    }

    fn bind_renderbuffer(&self, id: RenderbufferId) {
        let mut state = self.state.lock();
        state.bound_renderbuffer = Some(id);
        state.commands.push(format!("bind_renderbuffer {}", id.0));
    }

    fn create_framebuffer(&self) -> Result<FramebufferId> {
        let mut state = self.state.lock();
        let id = FramebufferId(state.next_id());
        state.framebuffers.insert(id, FxHashMap::default());
        state.commands.push(format!("create_framebuffer {}", id.0));
        Ok(id)
    }

    fn delete_framebuffer(&self, id: FramebufferId) {
        let mut state = self.state.lock();
        state.framebuffers.remove(&id);
        state.deleted_framebuffers.push(id);
        if state.bound_framebuffer == id {
            state.bound_framebuffer = FramebufferId::DEFAULT;
        }
        state.commands.push(format!("delete_framebuffer {}", id.0));
    }

    fn bind_framebuffer(&self, id: FramebufferId) {
        let mut state = self.state.lock();
        state.bound_framebuffer = id;
        state.commands.push(format!("bind_framebuffer {}", id.0));
    }

    fn bound_framebuffer(&self) -> FramebufferId {
        self.state.lock().bound_framebuffer
    }

    fn framebuffer_status(&self, id: FramebufferId) -> FramebufferStatus {
        let state = self.state.lock();
        let slots = match state.framebuffers.get(&id) {
            Some(slots) => slots,
            None if id == FramebufferId::DEFAULT => return FramebufferStatus::Complete,
            None => return FramebufferStatus::Unsupported,
        };
        if slots.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }

        let mut common_size = None;
        let mut common_samples = None;
        for attached in slots.values() {
            let size = match state.attached_size(attached) {
                Some(size) if !size.is_zero() => size,
                _ => return FramebufferStatus::IncompleteAttachment,
            };
            if *common_size.get_or_insert(size) != size {
                return FramebufferStatus::IncompleteDimensions;
            }
            let samples = state.attached_samples(attached);
            if *common_samples.get_or_insert(samples) != samples {
                return FramebufferStatus::IncompleteMultisample;
            }
        }
        FramebufferStatus::Complete
    }

    fn attach_renderbuffer(
        &self,
        framebuffer: FramebufferId,
        slot: AttachmentSlot,
        renderbuffer: RenderbufferId,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if !state.renderbuffers.contains_key(&renderbuffer) {
            return Err(Error::InvalidResource(format!("Unknown renderbuffer {}", renderbuffer.0)));
        }
        let slots = state
            .framebuffers
            .get_mut(&framebuffer)
            .ok_or_else(|| Error::InvalidResource(format!("Unknown framebuffer {}", framebuffer.0)))?;
        slots.insert(slot, MockAttached::Renderbuffer(renderbuffer));
        state.commands.push(format!(
            "attach_renderbuffer {} {} {}",
            framebuffer.0, slot, renderbuffer.0
        ));
        Ok(())
    }

    fn attach_texture(
        &self,
        framebuffer: FramebufferId,
        slot: AttachmentSlot,
        texture: TextureId,
        face: TextureFace,
        mipmap_level: u32,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if !state.textures.contains_key(&texture) {
            return Err(Error::InvalidResource(format!("Unknown texture {}", texture.0)));
        }
        let slots = state
            .framebuffers
            .get_mut(&framebuffer)
            .ok_or_else(|| Error::InvalidResource(format!("Unknown framebuffer {}", framebuffer.0)))?;
        slots.insert(slot, MockAttached::Texture { id: texture, face, mipmap_level });
        state.commands.push(format!(
            "attach_texture {} {} {} {:?} {}",
            framebuffer.0, slot, texture.0, face, mipmap_level
        ));
        Ok(())
    }

    fn detach_attachment(&self, framebuffer: FramebufferId, slot: AttachmentSlot) {
        let mut state = self.state.lock();
        if let Some(slots) = state.framebuffers.get_mut(&framebuffer) {
            slots.remove(&slot);
        }
        state.commands.push(format!("detach_attachment {} {}", framebuffer.0, slot));
    }

    fn write_mask(&self) -> BufferMask {
        self.state.lock().write_mask
    }

    fn set_write_mask(&self, mask: BufferMask) {
        let mut state = self.state.lock();
        state.write_mask = mask;
        state.commands.push(format!("set_write_mask {:?}", mask));
    }

    fn clear(&self, mask: BufferMask) {
        let mut state = self.state.lock();
        let bound = state.bound_framebuffer;
        let write_mask = state.write_mask;
        state.clears.push((bound, mask, write_mask));
        state.commands.push(format!("clear {:?}", mask));
    }

    fn resolve_multisample(
        &self,
        source: FramebufferId,
        destination: FramebufferId,
        size: SurfaceSize,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state.resolves.push((source, destination, size));
        state.commands.push(format!("resolve_multisample {} {}", source.0, destination.0));
        Ok(())
    }

    fn discard_attachments(&self, framebuffer: FramebufferId, mask: BufferMask) {
        let mut state = self.state.lock();
        state.discards.push((framebuffer, mask));
        state.commands.push(format!("discard_attachments {} {:?}", framebuffer.0, mask));
    }

    fn read_pixels(&self, rect: PixelRect) -> Result<Vec<Color4B>> {
        let mut state = self.state.lock();
        let bound = state.bound_framebuffer;
        state.commands.push(format!("read_pixels {}", bound.0));
        if state.unreadable.contains(&bound) {
            return Err(Error::Unsupported(format!("Framebuffer {} is not readable", bound.0)));
        }

        let color = state
            .framebuffers
            .get(&bound)
            .and_then(|slots| slots.get(&AttachmentSlot::Color).copied());
        match color {
            Some(MockAttached::Texture { id, face, mipmap_level }) => {
                let image = state
                    .textures
                    .get(&id)
                    .and_then(|tex| tex.images.get(&(face, mipmap_level)))
                    .ok_or_else(|| Error::InvalidResource(format!("Texture {} has no storage", id.0)))?;
                let bpp = image.format.bytes_per_pixel();
                let mut pixels = Vec::with_capacity(rect.pixel_count());
                for row in rect.y..rect.y + rect.height {
                    let start = (row as usize * image.size.width as usize + rect.x as usize) * bpp;
                    let end = start + rect.width as usize * bpp;
                    let decoded = decode_pixels(image.format, &image.data[start..end])
                        .ok_or_else(|| Error::Unsupported("Depth texture read-back".to_string()))?;
                    pixels.extend(decoded);
                }
                Ok(pixels)
            }
            // Renderbuffer content is not simulated
            Some(MockAttached::Renderbuffer(_)) => Ok(vec![Color4B::TRANSPARENT; rect.pixel_count()]),
            None => Err(Error::InvalidResource(format!("Framebuffer {} has no color", bound.0))),
        }
    }

    fn create_texture(&self, kind: TextureKind) -> Result<TextureId> {
        let mut state = self.state.lock();
        let id = TextureId(state.next_id());
        state.textures.insert(id, MockTexture {
            kind,
            images: FxHashMap::default(),
            clamp_to_edge: false,
        });
        state.commands.push(format!("create_texture {} {:?}", id.0, kind));
        Ok(id)
    }

    fn delete_texture(&self, id: TextureId) {
        let mut state = self.state.lock();
        state.textures.remove(&id);
        state.deleted_textures.push(id);
        state.commands.push(format!("delete_texture {}", id.0));
    }

    fn allocate_texture_storage(
        &self,
        id: TextureId,
        face: TextureFace,
        mipmap_level: u32,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_allocations {
            return Err(Error::OutOfMemory);
        }
        let texture = state
            .textures
            .get_mut(&id)
            .ok_or_else(|| Error::InvalidResource(format!("Unknown texture {}", id.0)))?;
        texture.images.insert((face, mipmap_level), MockTextureImage {
            size,
            format,
            data: vec![0; size.pixel_count() * format.bytes_per_pixel()],
        });
        state.commands.push(format!(
            "allocate_texture_storage {} {:?} {}x{}",
            id.0, face, size.width, size.height
        ));
        Ok(())
    }

    fn write_texture_pixels(
        &self,
        id: TextureId,
        face: TextureFace,
        mipmap_level: u32,
        rect: PixelRect,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()> {
        let mut state = self.state.lock();
        let image = state
            .textures
            .get_mut(&id)
            .and_then(|tex| tex.images.get_mut(&(face, mipmap_level)))
            .ok_or_else(|| Error::InvalidResource(format!("Texture {} has no storage", id.0)))?;
        if image.format != format || !rect.fits_within(image.size) {
            return Err(Error::InvalidResource(format!("Bad upload into texture {}", id.0)));
        }
        let bpp = format.bytes_per_pixel();
        let row_bytes = rect.width as usize * bpp;
        if data.len() < row_bytes * rect.height as usize {
            return Err(Error::InvalidResource(format!("Short upload into texture {}", id.0)));
        }
        for (i, row) in (rect.y..rect.y + rect.height).enumerate() {
            let start = (row as usize * image.size.width as usize + rect.x as usize) * bpp;
            image.data[start..start + row_bytes]
                .copy_from_slice(&data[i * row_bytes..(i + 1) * row_bytes]);
        }
        state.commands.push(format!("write_texture_pixels {} {:?}", id.0, face));
        Ok(())
    }

    fn set_texture_clamp_to_edge(&self, id: TextureId) {
        let mut state = self.state.lock();
        if let Some(texture) = state.textures.get_mut(&id) {
            texture.clamp_to_edge = true;
        }
        state.commands.push(format!("set_texture_clamp_to_edge {}", id.0));
    }

    fn set_debug_label(&self, object: GpuObject, label: &str) {
        self.state.lock().labels.insert(object, label.to_string());
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
