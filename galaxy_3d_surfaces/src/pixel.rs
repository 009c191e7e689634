//! Pixel types shared by attachments and surfaces
//!
//! Sizes, rectangles, pixel storage formats and the `Color4B` host-side
//! pixel, plus the conversions between `Color4B` and packed storage formats.

use winit::dpi::PhysicalSize;

// ===== COLOR =====

/// 8-bit RGBA color, the host-side pixel used for read-back and write-back
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Color4B {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color4B {
    pub const BLACK: Color4B = Color4B { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Color4B = Color4B { r: 255, g: 255, b: 255, a: 255 };
    pub const TRANSPARENT: Color4B = Color4B { r: 0, g: 0, b: 0, a: 0 };

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

// ===== SIZE & RECT =====

/// Size of a surface or attachment in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const ZERO: SurfaceSize = SurfaceSize { width: 0, height: 0 };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero
    pub fn is_zero(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Size of the given mipmap level of a texture of this size
    ///
    /// Each level halves both dimensions, never going below 1 unless the
    /// base dimension is itself 0.
    pub fn at_mip_level(&self, level: u32) -> SurfaceSize {
        let shrink = |d: u32| -> u32 {
            if d == 0 {
                0
            } else {
                d.checked_shr(level).unwrap_or(0).max(1)
            }
        };
        SurfaceSize::new(shrink(self.width), shrink(self.height))
    }

    /// Multiply both dimensions by `factor`
    pub fn scaled(&self, factor: u32) -> SurfaceSize {
        SurfaceSize::new(self.width * factor, self.height * factor)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl From<PhysicalSize<u32>> for SurfaceSize {
    fn from(size: PhysicalSize<u32>) -> Self {
        SurfaceSize::new(size.width, size.height)
    }
}

impl From<(u32, u32)> for SurfaceSize {
    fn from((width, height): (u32, u32)) -> Self {
        SurfaceSize::new(width, height)
    }
}

/// Rectangular area of pixels, origin at the bottom-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering a whole surface of the given size
    pub const fn from_size(size: SurfaceSize) -> Self {
        Self { x: 0, y: 0, width: size.width, height: size.height }
    }

    pub fn size(&self) -> SurfaceSize {
        SurfaceSize::new(self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True if the rectangle lies completely inside a surface of `size`
    pub fn fits_within(&self, size: SurfaceSize) -> bool {
        let right = self.x as u64 + self.width as u64;
        let top = self.y as u64 + self.height as u64;
        right <= size.width as u64 && top <= size.height as u64
    }
}

// ===== PIXEL FORMAT =====

/// Storage format of an attachment
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    // Color formats
    R8G8B8A8_UNORM,
    R8G8B8_UNORM,
    R4G4B4A4_UNORM,
    R5G5B5A1_UNORM,
    R5G6B5_UNORM,

    // Depth / stencil formats
    D16_UNORM,
    D24_UNORM,
    D24_UNORM_S8_UINT,
    S8_UINT,
}

impl PixelFormat {
    pub fn has_depth(&self) -> bool {
        matches!(self, PixelFormat::D16_UNORM | PixelFormat::D24_UNORM | PixelFormat::D24_UNORM_S8_UINT)
    }

    pub fn has_stencil(&self) -> bool {
        matches!(self, PixelFormat::D24_UNORM_S8_UINT | PixelFormat::S8_UINT)
    }

    pub fn is_color(&self) -> bool {
        !self.has_depth() && !self.has_stencil()
    }

    /// Bytes used by one pixel in GPU storage
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::R8G8B8A8_UNORM => 4,
            PixelFormat::R8G8B8_UNORM => 3,
            PixelFormat::R4G4B4A4_UNORM
            | PixelFormat::R5G5B5A1_UNORM
            | PixelFormat::R5G6B5_UNORM
            | PixelFormat::D16_UNORM => 2,
            PixelFormat::D24_UNORM | PixelFormat::D24_UNORM_S8_UINT => 4,
            PixelFormat::S8_UINT => 1,
        }
    }

    /// Texel format used when this format backs a texture
    ///
    /// `None` for stencil-only storage, which cannot back a texture.
    pub fn texel_format(&self) -> Option<TexelFormat> {
        match self {
            PixelFormat::R8G8B8A8_UNORM
            | PixelFormat::R4G4B4A4_UNORM
            | PixelFormat::R5G5B5A1_UNORM => Some(TexelFormat::Rgba),
            PixelFormat::R8G8B8_UNORM | PixelFormat::R5G6B5_UNORM => Some(TexelFormat::Rgb),
            PixelFormat::D16_UNORM | PixelFormat::D24_UNORM => Some(TexelFormat::DepthComponent),
            PixelFormat::D24_UNORM_S8_UINT => Some(TexelFormat::DepthStencil),
            PixelFormat::S8_UINT => None,
        }
    }

    /// Texel component type used when this format backs a texture
    pub fn texel_type(&self) -> Option<TexelType> {
        match self {
            PixelFormat::R8G8B8A8_UNORM | PixelFormat::R8G8B8_UNORM => Some(TexelType::UnsignedByte),
            PixelFormat::R4G4B4A4_UNORM => Some(TexelType::UnsignedShort4444),
            PixelFormat::R5G5B5A1_UNORM => Some(TexelType::UnsignedShort5551),
            PixelFormat::R5G6B5_UNORM => Some(TexelType::UnsignedShort565),
            PixelFormat::D16_UNORM => Some(TexelType::UnsignedShort),
            PixelFormat::D24_UNORM => Some(TexelType::UnsignedInt),
            PixelFormat::D24_UNORM_S8_UINT => Some(TexelType::UnsignedInt248),
            PixelFormat::S8_UINT => None,
        }
    }
}

/// Component layout of a texel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelFormat {
    Rgba,
    Rgb,
    DepthComponent,
    DepthStencil,
}

/// Component packing of a texel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TexelType {
    UnsignedByte,
    UnsignedShort565,
    UnsignedShort4444,
    UnsignedShort5551,
    UnsignedShort,
    UnsignedInt,
    UnsignedInt248,
}

// ===== CONVERSIONS =====

/// Pack `Color4B` pixels into the storage layout of a color format
///
/// Packed 16-bit formats are written little-endian. Returns `None` for
/// depth and stencil formats, which have no color representation.
pub fn encode_pixels(format: PixelFormat, pixels: &[Color4B]) -> Option<Vec<u8>> {
    let bytes = match format {
        PixelFormat::R8G8B8A8_UNORM => bytemuck::cast_slice::<Color4B, u8>(pixels).to_vec(),
        PixelFormat::R8G8B8_UNORM => pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect(),
        PixelFormat::R4G4B4A4_UNORM => pack_u16(pixels, |p| {
            (p.r as u16 >> 4) << 12 | (p.g as u16 >> 4) << 8 | (p.b as u16 >> 4) << 4 | (p.a as u16 >> 4)
        }),
        PixelFormat::R5G5B5A1_UNORM => pack_u16(pixels, |p| {
            (p.r as u16 >> 3) << 11 | (p.g as u16 >> 3) << 6 | (p.b as u16 >> 3) << 1 | (p.a as u16 >> 7)
        }),
        PixelFormat::R5G6B5_UNORM => pack_u16(pixels, |p| {
            (p.r as u16 >> 3) << 11 | (p.g as u16 >> 2) << 5 | (p.b as u16 >> 3)
        }),
        _ => return None,
    };
    Some(bytes)
}

/// Unpack storage bytes of a color format into `Color4B` pixels
///
/// Channels narrower than 8 bits are expanded by bit replication so that
/// full-intensity values decode to 255. Trailing bytes that do not form a
/// whole pixel are ignored. Returns `None` for depth and stencil formats.
pub fn decode_pixels(format: PixelFormat, bytes: &[u8]) -> Option<Vec<Color4B>> {
    let pixels = match format {
        PixelFormat::R8G8B8A8_UNORM => bytes
            .chunks_exact(4)
            .map(|c| Color4B::new(c[0], c[1], c[2], c[3]))
            .collect(),
        PixelFormat::R8G8B8_UNORM => bytes
            .chunks_exact(3)
            .map(|c| Color4B::new(c[0], c[1], c[2], 255))
            .collect(),
        PixelFormat::R4G4B4A4_UNORM => unpack_u16(bytes, |v| {
            Color4B::new(
                expand(v >> 12, 4),
                expand(v >> 8, 4),
                expand(v >> 4, 4),
                expand(v, 4),
            )
        }),
        PixelFormat::R5G5B5A1_UNORM => unpack_u16(bytes, |v| {
            Color4B::new(
                expand(v >> 11, 5),
                expand(v >> 6, 5),
                expand(v >> 1, 5),
                if v & 1 == 1 { 255 } else { 0 },
            )
        }),
        PixelFormat::R5G6B5_UNORM => unpack_u16(bytes, |v| {
            Color4B::new(expand(v >> 11, 5), expand(v >> 5, 6), expand(v, 5), 255)
        }),
        _ => return None,
    };
    Some(pixels)
}

fn pack_u16(pixels: &[Color4B], pack: impl Fn(&Color4B) -> u16) -> Vec<u8> {
    pixels.iter().flat_map(|p| pack(p).to_le_bytes()).collect()
}

fn unpack_u16(bytes: &[u8], unpack: impl Fn(u16) -> Color4B) -> Vec<Color4B> {
    bytes
        .chunks_exact(2)
        .map(|c| unpack(u16::from_le_bytes([c[0], c[1]])))
        .collect()
}

/// Widen the low `bits` bits of `value` to 8 bits
fn expand(value: u16, bits: u32) -> u8 {
    let mask = (1u16 << bits) - 1;
    let v = value & mask;
    ((v << (8 - bits)) | (v >> (2 * bits).saturating_sub(8))) as u8
}

#[cfg(test)]
#[path = "pixel_tests.rs"]
mod tests;
