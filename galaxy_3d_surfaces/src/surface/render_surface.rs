/// RenderSurface trait - a target that scenes can be rendered into
///
/// A render surface holds up to three attachments (color, depth and
/// stencil) and knows how to activate itself, clear its content and read
/// back or replace color pixels.

use crate::error::Result;
use crate::pixel::{Color4B, PixelRect, SurfaceSize};
use super::attachment::SharedAttachment;

pub trait RenderSurface: Send + Sync {
    /// Common size of the attachments, or the configured size when the
    /// surface has none
    fn size(&self) -> SurfaceSize;

    /// True if the surface is displayed on screen
    fn is_on_screen(&self) -> bool;

    fn set_is_on_screen(&self, is_on_screen: bool);

    fn color_attachment(&self) -> Option<SharedAttachment>;

    fn set_color_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()>;

    fn depth_attachment(&self) -> Option<SharedAttachment>;

    /// Set the depth attachment
    ///
    /// A depth format carrying a stencil component also becomes the
    /// stencil attachment.
    fn set_depth_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()>;

    fn stencil_attachment(&self) -> Option<SharedAttachment>;

    fn set_stencil_attachment(&self, attachment: Option<SharedAttachment>) -> Result<()>;

    /// Check that the surface can be rendered into
    ///
    /// Failures are logged. A surface that does not validate is
    /// misconfigured and must not be used.
    fn validate(&self) -> bool;

    /// Make this surface the current render target
    fn activate(&self) -> Result<()>;

    fn clear_color_content(&self) -> Result<()>;

    fn clear_depth_content(&self) -> Result<()>;

    fn clear_stencil_content(&self) -> Result<()>;

    fn clear_color_and_depth_content(&self) -> Result<()>;

    /// Read color pixels, bottom row first
    ///
    /// Surfaces whose color content cannot be read back return an empty
    /// `Vec`. The previously bound render target is restored afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `rect` does not fit inside the surface.
    fn read_color_content_from(&self, rect: PixelRect) -> Result<Vec<Color4B>>;

    /// Replace color pixels, bottom row first
    ///
    /// Does nothing unless the color attachment supports replacement.
    fn replace_color_pixels(&self, rect: PixelRect, pixels: &[Color4B]) -> Result<()>;
}
