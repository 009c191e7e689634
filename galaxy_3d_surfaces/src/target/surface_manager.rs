/// Surface manager for on-screen rendering.
///
/// Wraps the display surface, an optional multisampling surface and a
/// lazily created picking surface. Off-screen surfaces can be registered
/// so that their attachments follow the display size.

use std::sync::Arc;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::graphics_device::{BufferMask, GraphicsDevice};
use crate::pixel::{PixelFormat, SurfaceSize, TexelFormat, TexelType};
use crate::surface::{
    attachment_key, same_attachment, Framebuffer, RenderSurface, Renderbuffer, SharedAttachment,
    SurfaceAttachment,
};
use crate::{engine_debug, engine_error, engine_info};
use super::display_surface::{DisplaySurface, SurfaceManagerConfig};

/// Identity of a registered surface
fn surface_key(surface: &Arc<dyn RenderSurface>) -> usize {
    Arc::as_ptr(surface) as *const () as usize
}

/// Surface manager (explicitly constructed, one per display)
///
/// Rendering goes to `rendering_surface()`. When multisampling, call
/// `resolve_multisampling()` once the frame is drawn to move the result
/// into the view surface for presentation.
pub struct SurfaceManager {
    device: Arc<dyn GraphicsDevice>,
    config: SurfaceManagerConfig,
    view_surface: Arc<Framebuffer>,
    view_color_buffer: Arc<Renderbuffer>,
    multisample_surface: Option<Arc<Framebuffer>>,
    picking_surface: Option<Arc<Framebuffer>>,
    surfaces: FxHashMap<usize, Arc<dyn RenderSurface>>,
}

impl SurfaceManager {
    /// Create the surfaces for a display
    ///
    /// The view surface mirrors the display framebuffer and its color
    /// renderbuffer without rebinding them. If the display has no depth
    /// renderbuffer and multisampling is off, a depth renderbuffer is
    /// created and bound to the display framebuffer. With more than one
    /// sample per pixel, an off-screen multisampling surface is created.
    ///
    /// # Errors
    ///
    /// Returns an error if GPU storage cannot be allocated or the
    /// multisampling surface is incomplete.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        display: DisplaySurface,
        config: SurfaceManagerConfig,
    ) -> Result<Self> {
        let samples = config.pixel_samples.max(1);

        let view_surface = Arc::new(
            Framebuffer::with_framebuffer_id(device.clone(), display.framebuffer_id, display.size)
                .with_name("Display surface"),
        );
        view_surface.set_is_on_screen(true);

        // Display attachments are already bound by the window system
        view_surface.set_should_bind_gl_attachments(false);
        let view_color_buffer = Arc::new(Renderbuffer::with_renderbuffer_id(
            device.clone(),
            display.color_renderbuffer_id,
            display.size,
            display.color_format,
        ));
        view_surface.set_color_attachment(Some(view_color_buffer.clone()))?;
        if let Some(depth_id) = display.depth_renderbuffer_id {
            view_surface.set_depth_attachment(Some(Arc::new(Renderbuffer::with_renderbuffer_id(
                device.clone(),
                depth_id,
                display.size,
                display.depth_format,
            ))))?;
        }
        view_surface.set_should_bind_gl_attachments(true);

        if display.depth_renderbuffer_id.is_none() && samples == 1 {
            if let Some(depth_format) = config.depth_format {
                view_surface.set_depth_attachment(Some(Arc::new(Renderbuffer::new(
                    device.clone(),
                    depth_format,
                ))))?;
            }
        }

        let multisample_surface = if samples > 1 {
            Some(Self::create_multisample_surface(&device, &display, &config, samples)?)
        } else {
            None
        };

        engine_info!("galaxy3d::SurfaceManager",
            "Display surface {}x{} ({:?}), {} samples per pixel",
            display.size.width, display.size.height, display.color_format, samples);

        Ok(Self {
            device,
            config,
            view_surface,
            view_color_buffer,
            multisample_surface,
            picking_surface: None,
            surfaces: FxHashMap::default(),
        })
    }

    fn create_multisample_surface(
        device: &Arc<dyn GraphicsDevice>,
        display: &DisplaySurface,
        config: &SurfaceManagerConfig,
        samples: u32,
    ) -> Result<Arc<Framebuffer>> {
        let surface = Arc::new(
            Framebuffer::with_size(device.clone(), display.size).with_name("Multisampling surface"),
        );
        surface.set_color_attachment(Some(Arc::new(Renderbuffer::with_samples(
            device.clone(),
            display.color_format,
            samples,
        ))))?;
        if let Some(depth_format) = config.depth_format {
            surface.set_depth_attachment(Some(Arc::new(Renderbuffer::with_samples(
                device.clone(),
                depth_format,
                samples,
            ))))?;
        }

        if !surface.validate() {
            engine_error!("galaxy3d::SurfaceManager",
                "Multisampling surface with {} samples is incomplete", samples);
            return Err(Error::InitializationFailed(format!(
                "Multisampling surface with {} samples is incomplete",
                samples
            )));
        }
        Ok(surface)
    }

    // ===== SURFACES =====

    /// The on-screen surface
    pub fn view_surface(&self) -> &Arc<Framebuffer> {
        &self.view_surface
    }

    /// Replace the on-screen surface
    ///
    /// `color_buffer` must be the surface's color attachment. It is the
    /// renderbuffer bound for presentation after a multisample resolve.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if `color_buffer` is not
    /// attached to `surface`.
    pub fn set_view_surface(
        &mut self,
        surface: Arc<Framebuffer>,
        color_buffer: Arc<Renderbuffer>,
    ) -> Result<()> {
        let color: SharedAttachment = color_buffer.clone();
        match surface.color_attachment() {
            Some(attached) if same_attachment(&attached, &color) => {}
            _ => {
                return Err(Error::InvalidConfiguration(
                    "View color buffer must be the color attachment of the view surface".to_string(),
                ));
            }
        }

        surface.set_is_on_screen(true);
        engine_debug!("galaxy3d::SurfaceManager",
            "View surface replaced, {}x{}", surface.size().width, surface.size().height);
        self.view_surface = surface;
        self.view_color_buffer = color_buffer;
        Ok(())
    }

    /// The off-screen multisampling surface, if multisampling is in use
    pub fn multisample_surface(&self) -> Option<&Arc<Framebuffer>> {
        self.multisample_surface.as_ref()
    }

    /// Replace or remove the multisampling surface
    ///
    /// Rendering follows the change immediately: with `None`, the view
    /// surface becomes the rendering surface and resolving does nothing.
    pub fn set_multisample_surface(&mut self, surface: Option<Arc<Framebuffer>>) {
        match &surface {
            Some(surface) => engine_debug!("galaxy3d::SurfaceManager",
                "Multisampling surface set, {} samples per pixel",
                surface.color_attachment().map_or(1, |color| color.pixel_samples())),
            None => engine_debug!("galaxy3d::SurfaceManager", "Multisampling surface removed"),
        }
        self.multisample_surface = surface;
    }

    /// Surface that rendering should be directed to
    ///
    /// The multisampling surface if present, otherwise the view surface.
    pub fn rendering_surface(&self) -> Arc<Framebuffer> {
        match &self.multisample_surface {
            Some(surface) => surface.clone(),
            None => self.view_surface.clone(),
        }
    }

    /// Surface used for node picking, created on first access
    ///
    /// The picking surface has its own RGBA color renderbuffer. It shares
    /// the view's depth buffer unless multisampling is in use, in which
    /// case it gets a single-sampled depth buffer of its own. It is
    /// registered for automatic resizing.
    pub fn picking_surface(&mut self) -> Result<Arc<Framebuffer>> {
        if let Some(surface) = &self.picking_surface {
            return Ok(surface.clone());
        }

        let surface = Arc::new(
            Framebuffer::with_size(self.device.clone(), self.size()).with_name("Picking surface"),
        );
        surface.set_color_attachment(Some(Arc::new(Renderbuffer::new(
            self.device.clone(),
            PixelFormat::R8G8B8A8_UNORM,
        ))))?;

        let depth: Option<SharedAttachment> = if self.is_multisampling() {
            self.config.depth_format.map(|format| -> SharedAttachment {
                Arc::new(Renderbuffer::new(self.device.clone(), format))
            })
        } else {
            self.view_surface.depth_attachment()
        };
        surface.set_depth_attachment(depth)?;

        engine_debug!("galaxy3d::SurfaceManager",
            "Created picking surface {}x{}", surface.size().width, surface.size().height);

        self.set_picking_surface(Some(surface.clone()));
        Ok(surface)
    }

    /// Replace or remove the picking surface
    ///
    /// The previous picking surface is unregistered and the new one is
    /// registered for automatic resizing. After removal, the next call to
    /// `picking_surface()` creates a fresh one.
    pub fn set_picking_surface(&mut self, surface: Option<Arc<Framebuffer>>) {
        if let Some(previous) = self.picking_surface.take() {
            let previous: Arc<dyn RenderSurface> = previous;
            self.remove_surface(&previous);
        }
        if let Some(surface) = &surface {
            self.add_surface(surface.clone());
        }
        self.picking_surface = surface;
    }

    /// Register a surface whose attachments follow the display size
    ///
    /// Registering the same surface twice has no effect.
    pub fn add_surface(&mut self, surface: Arc<dyn RenderSurface>) {
        self.surfaces.entry(surface_key(&surface)).or_insert(surface);
    }

    /// Unregister a surface; unknown surfaces are ignored
    pub fn remove_surface(&mut self, surface: &Arc<dyn RenderSurface>) {
        self.surfaces.remove(&surface_key(surface));
    }

    /// Number of surfaces registered for automatic resizing
    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    // ===== RESIZING =====

    /// Resize the view, multisampling and registered surfaces
    ///
    /// Attachments shared between surfaces are resized only once.
    pub fn resize_to(&mut self, size: impl Into<SurfaceSize>) -> Result<()> {
        let size = size.into();

        let mut surfaces: Vec<Arc<dyn RenderSurface>> = Vec::with_capacity(self.surfaces.len() + 2);
        surfaces.push(self.view_surface.clone());
        if let Some(surface) = &self.multisample_surface {
            surfaces.push(surface.clone());
        }
        surfaces.extend(self.surfaces.values().cloned());

        let mut visited: FxHashSet<usize> = FxHashSet::default();
        for surface in &surfaces {
            let attachments = [
                surface.color_attachment(),
                surface.depth_attachment(),
                surface.stencil_attachment(),
            ];
            for attachment in attachments.into_iter().flatten() {
                if visited.insert(attachment_key(&attachment)) {
                    attachment.resize_to(size)?;
                }
            }
        }

        engine_debug!("galaxy3d::SurfaceManager",
            "Resized {} attachments of {} surfaces to {}x{}",
            visited.len(), surfaces.len(), size.width, size.height);
        Ok(())
    }

    // ===== MULTISAMPLING =====

    /// Resolve the multisampling surface into the view surface
    ///
    /// Discards the multisampled content afterwards and leaves the view's
    /// color renderbuffer bound for presentation. Does nothing when
    /// multisampling is off.
    pub fn resolve_multisampling(&self) -> Result<()> {
        let Some(multisample_surface) = &self.multisample_surface else {
            return Ok(());
        };

        let source = multisample_surface.framebuffer_id()?;
        let destination = self.view_surface.framebuffer_id()?;
        self.device.resolve_multisample(source, destination, self.size())?;

        let mut discard = BufferMask::COLOR;
        if multisample_surface.depth_attachment().is_some() {
            discard |= BufferMask::DEPTH;
        }
        if multisample_surface.stencil_attachment().is_some() {
            discard |= BufferMask::STENCIL;
        }
        self.device.discard_attachments(source, discard);

        self.view_color_buffer.bind()
    }

    /// Samples per pixel of the rendering surface
    pub fn pixel_samples(&self) -> u32 {
        self.rendering_surface()
            .color_attachment()
            .map_or(1, |color| color.pixel_samples())
            .max(1)
    }

    pub fn is_multisampling(&self) -> bool {
        self.multisample_surface.is_some()
    }

    /// Size in multisampled pixels
    ///
    /// Each dimension is scaled by the square root of the sample count,
    /// rounded up: 4 samples double the width and height.
    pub fn multisampling_size(&self) -> SurfaceSize {
        let factor = (self.pixel_samples() as f64).sqrt().ceil() as u32;
        self.size().scaled(factor)
    }

    // ===== FORMATS =====

    /// Size of the view surface in pixels
    pub fn size(&self) -> SurfaceSize {
        self.view_surface.size()
    }

    /// The view's color renderbuffer
    pub fn view_color_buffer(&self) -> &Arc<Renderbuffer> {
        &self.view_color_buffer
    }

    pub fn color_format(&self) -> PixelFormat {
        self.view_color_buffer.pixel_format()
    }

    /// Format of the depth buffer used while rendering, if any
    pub fn depth_format(&self) -> Option<PixelFormat> {
        self.rendering_surface()
            .depth_attachment()
            .map(|attachment| attachment.pixel_format())
    }

    /// Format of the stencil buffer used while rendering, if any
    pub fn stencil_format(&self) -> Option<PixelFormat> {
        self.rendering_surface()
            .stencil_attachment()
            .map(|attachment| attachment.pixel_format())
    }

    /// Texel format of a texture matching the view's color buffer
    pub fn color_texel_format(&self) -> Option<TexelFormat> {
        self.color_format().texel_format()
    }

    /// Texel type of a texture matching the view's color buffer
    pub fn color_texel_type(&self) -> Option<TexelType> {
        self.color_format().texel_type()
    }

    /// Texel format of a texture matching the depth buffer
    pub fn depth_texel_format(&self) -> Option<TexelFormat> {
        self.depth_format().and_then(|format| format.texel_format())
    }

    /// Texel type of a texture matching the depth buffer
    pub fn depth_texel_type(&self) -> Option<TexelType> {
        self.depth_format().and_then(|format| format.texel_type())
    }
}

#[cfg(test)]
#[path = "surface_manager_tests.rs"]
mod tests;
