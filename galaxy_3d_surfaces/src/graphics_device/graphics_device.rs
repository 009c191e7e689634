/// GraphicsDevice trait - the GPU binding layer used by surfaces
///
/// Surfaces and attachments never talk to a graphics API directly. Every
/// GPU side effect (object creation, storage allocation, binding, clears,
/// read-back) goes through this trait so that backends and test doubles
/// can be swapped freely.

use std::fmt;
use bitflags::bitflags;
use crate::error::Result;
use crate::pixel::{Color4B, PixelFormat, PixelRect, SurfaceSize};

// ===== GPU OBJECT IDS =====

/// GPU renderbuffer name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderbufferId(pub u32);

/// GPU framebuffer name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

impl FramebufferId {
    /// The window-system framebuffer
    pub const DEFAULT: FramebufferId = FramebufferId(0);
}

/// GPU texture name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Any GPU object that can carry a debug label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GpuObject {
    Renderbuffer(RenderbufferId),
    Framebuffer(FramebufferId),
    Texture(TextureId),
}

// ===== ATTACHMENT SLOTS =====

/// Role of an attachment inside a framebuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentSlot {
    Color,
    Depth,
    Stencil,
}

impl AttachmentSlot {
    pub fn name(&self) -> &'static str {
        match self {
            AttachmentSlot::Color => "color",
            AttachmentSlot::Depth => "depth",
            AttachmentSlot::Stencil => "stencil",
        }
    }

    /// Write/clear mask bit matching this slot
    pub fn buffer_mask(&self) -> BufferMask {
        match self {
            AttachmentSlot::Color => BufferMask::COLOR,
            AttachmentSlot::Depth => BufferMask::DEPTH,
            AttachmentSlot::Stencil => BufferMask::STENCIL,
        }
    }
}

impl fmt::Display for AttachmentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ===== TEXTURE TARGETS =====

/// Dimensionality of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureKind {
    Texture2d,
    Cube,
}

/// One face of a cube texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PositiveX,
    NegativeX,
    PositiveY,
    NegativeY,
    PositiveZ,
    NegativeZ,
}

impl CubeFace {
    /// All faces in rendering order
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    pub fn index(&self) -> usize {
        match self {
            CubeFace::PositiveX => 0,
            CubeFace::NegativeX => 1,
            CubeFace::PositiveY => 2,
            CubeFace::NegativeY => 3,
            CubeFace::PositiveZ => 4,
            CubeFace::NegativeZ => 5,
        }
    }

    /// Following face in rendering order, wrapping after `NegativeZ`
    pub fn next(&self) -> CubeFace {
        CubeFace::ALL[(self.index() + 1) % CubeFace::ALL.len()]
    }
}

/// Image of a texture that an attachment renders into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFace {
    /// The single image of a 2D texture
    Texture2d,
    /// One face of a cube texture
    Cube(CubeFace),
}

impl TextureFace {
    /// Default face for a texture of the given kind
    pub fn first_of(kind: TextureKind) -> TextureFace {
        match kind {
            TextureKind::Texture2d => TextureFace::Texture2d,
            TextureKind::Cube => TextureFace::Cube(CubeFace::PositiveX),
        }
    }

    /// Kind of texture this face belongs to
    pub fn kind(&self) -> TextureKind {
        match self {
            TextureFace::Texture2d => TextureKind::Texture2d,
            TextureFace::Cube(_) => TextureKind::Cube,
        }
    }

    /// Every face that makes up a texture of the given kind
    pub fn all_of(kind: TextureKind) -> Vec<TextureFace> {
        match kind {
            TextureKind::Texture2d => vec![TextureFace::Texture2d],
            TextureKind::Cube => CubeFace::ALL.iter().map(|f| TextureFace::Cube(*f)).collect(),
        }
    }
}

// ===== MASKS & STATUS =====

bitflags! {
    /// Buffers affected by a write mask or a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferMask: u32 {
        const COLOR = 1 << 0;
        const DEPTH = 1 << 1;
        const STENCIL = 1 << 2;
    }
}

/// Completeness of a framebuffer as reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramebufferStatus {
    Complete,
    /// An attachment has no storage or an unusable format
    IncompleteAttachment,
    /// No attachment at all
    MissingAttachment,
    /// Attachments disagree on size
    IncompleteDimensions,
    /// The combination of formats is not supported
    Unsupported,
    /// Attachments disagree on sample count
    IncompleteMultisample,
}

impl FramebufferStatus {
    pub fn is_complete(&self) -> bool {
        *self == FramebufferStatus::Complete
    }
}

// ===== DEVICE TRAIT =====

/// GPU binding layer
///
/// All calls are synchronous and must be issued from the thread owning
/// the GPU context. Failures are reported through `Result` and never
/// retried by callers.
pub trait GraphicsDevice: Send + Sync {
    // ----- Renderbuffers -----

    fn create_renderbuffer(&self) -> Result<RenderbufferId>;

    fn delete_renderbuffer(&self, id: RenderbufferId);

    /// (Re)allocate the storage of a renderbuffer, discarding its content
    fn allocate_renderbuffer_storage(
        &self,
        id: RenderbufferId,
        size: SurfaceSize,
        format: PixelFormat,
        samples: u32,
    ) -> Result<()>;

    fn bind_renderbuffer(&self, id: RenderbufferId);

    // ----- Framebuffers -----

    fn create_framebuffer(&self) -> Result<FramebufferId>;

    fn delete_framebuffer(&self, id: FramebufferId);

    /// Make `id` the current render target
    fn bind_framebuffer(&self, id: FramebufferId);

    /// Currently bound render target
    fn bound_framebuffer(&self) -> FramebufferId;

    fn framebuffer_status(&self, id: FramebufferId) -> FramebufferStatus;

    fn attach_renderbuffer(
        &self,
        framebuffer: FramebufferId,
        slot: AttachmentSlot,
        renderbuffer: RenderbufferId,
    ) -> Result<()>;

    fn attach_texture(
        &self,
        framebuffer: FramebufferId,
        slot: AttachmentSlot,
        texture: TextureId,
        face: TextureFace,
        mipmap_level: u32,
    ) -> Result<()>;

    fn detach_attachment(&self, framebuffer: FramebufferId, slot: AttachmentSlot);

    // ----- Masks & clears -----

    fn write_mask(&self) -> BufferMask;

    fn set_write_mask(&self, mask: BufferMask);

    /// Clear the given buffers of the bound framebuffer
    fn clear(&self, mask: BufferMask);

    // ----- Resolve & read-back -----

    /// Downsample the color content of `source` into `destination`
    fn resolve_multisample(
        &self,
        source: FramebufferId,
        destination: FramebufferId,
        size: SurfaceSize,
    ) -> Result<()>;

    /// Hint that the content of some attachments is no longer needed
    fn discard_attachments(&self, _framebuffer: FramebufferId, _mask: BufferMask) {}

    /// Blocking read of the bound framebuffer's color content
    ///
    /// Rows are returned bottom row first. Returns `Error::Unsupported`
    /// when the color storage is not host-readable.
    fn read_pixels(&self, rect: PixelRect) -> Result<Vec<Color4B>>;

    // ----- Textures -----

    fn create_texture(&self, kind: TextureKind) -> Result<TextureId>;

    fn delete_texture(&self, id: TextureId);

    /// (Re)allocate one face/mip image of a texture, discarding its content
    fn allocate_texture_storage(
        &self,
        id: TextureId,
        face: TextureFace,
        mipmap_level: u32,
        size: SurfaceSize,
        format: PixelFormat,
    ) -> Result<()>;

    /// Upload packed pixels in `format`'s storage layout into `rect`
    fn write_texture_pixels(
        &self,
        id: TextureId,
        face: TextureFace,
        mipmap_level: u32,
        rect: PixelRect,
        format: PixelFormat,
        data: &[u8],
    ) -> Result<()>;

    fn set_texture_clamp_to_edge(&self, id: TextureId);

    // ----- Debugging -----

    fn set_debug_label(&self, _object: GpuObject, _label: &str) {}
}
