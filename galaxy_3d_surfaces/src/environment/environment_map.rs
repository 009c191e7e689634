/// Environment map texture.
///
/// A cube texture filled by rendering the scene from a location in each of
/// the six axis directions. Rendering all six faces is costly, so each
/// snapshot may render only some of them: `faces_per_snapshot` spreads the
/// work over successive snapshots, cycling through the faces in a fixed
/// order (+X, -X, +Y, -Y, +Z, -Z).

use std::sync::Arc;
use glam::Vec3;

use crate::error::{Error, Result};
use crate::graphics_device::{AttachmentSlot, CubeFace, GraphicsDevice, TextureFace, TextureKind};
use crate::pixel::{PixelFormat, SurfaceSize};
use crate::surface::{
    Framebuffer, RenderSurface, RenderTexture, Renderbuffer, SharedAttachment, TextureAttachment,
};
use crate::{engine_debug, engine_error, engine_trace};
use super::face_camera::FaceCamera;

/// Credit tolerance so that fractional rates like 0.1 still add up to a
/// whole face after ten snapshots.
const FACE_CREDIT_EPSILON: f32 = 1e-5;

/// Depth buffer used while rendering the faces
#[derive(Clone)]
pub enum DepthSource {
    /// Create a dedicated depth renderbuffer of this format
    Format(PixelFormat),
    /// Use an existing depth attachment, typically shared between
    /// environment maps of the same size
    Shared(SharedAttachment),
}

/// Environment map creation descriptor
#[derive(Clone)]
pub struct EnvironmentMapDesc {
    /// Length of each side of the cube faces, in pixels
    pub side_length: u32,
    pub color_format: PixelFormat,
    pub depth: DepthSource,
    /// Near clip distance of the face cameras
    pub near: f32,
    /// Far clip distance of the face cameras
    pub far: f32,
}

impl EnvironmentMapDesc {
    /// RGBA color backed by a new 16-bit depth buffer
    pub fn new(side_length: u32) -> Self {
        Self {
            side_length,
            color_format: PixelFormat::R8G8B8A8_UNORM,
            depth: DepthSource::Format(PixelFormat::D16_UNORM),
            near: 0.1,
            far: 1000.0,
        }
    }

    /// RGBA color backed by an existing depth attachment
    pub fn with_depth_attachment(side_length: u32, depth: SharedAttachment) -> Self {
        Self {
            depth: DepthSource::Shared(depth),
            ..Self::new(side_length)
        }
    }
}

/// Scene that can be drawn into an environment map face
///
/// Implemented for closures taking the render surface and the face camera.
pub trait EnvironmentScene {
    /// Draw the scene as seen by `camera` into the active `surface`
    ///
    /// The surface is already bound and cleared when this is called.
    fn draw_environment(&mut self, surface: &Framebuffer, camera: &FaceCamera) -> Result<()>;
}

impl<F> EnvironmentScene for F
where
    F: FnMut(&Framebuffer, &FaceCamera) -> Result<()>,
{
    fn draw_environment(&mut self, surface: &Framebuffer, camera: &FaceCamera) -> Result<()> {
        self(surface, camera)
    }
}

/// Cube texture rendered incrementally from the scene
pub struct EnvironmentMapTexture {
    device: Arc<dyn GraphicsDevice>,
    texture: Arc<RenderTexture>,
    color_attachment: Arc<TextureAttachment>,
    render_surface: Arc<Framebuffer>,
    near: f32,
    far: f32,
    faces_per_snapshot: f32,
    face_credit: f32,
    current_face: CubeFace,
}

impl EnvironmentMapTexture {
    /// Create the cube texture and the framebuffer that renders into it
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` for a zero side length or
    /// invalid clip planes, or a device error if storage cannot be
    /// allocated.
    pub fn new(device: Arc<dyn GraphicsDevice>, desc: EnvironmentMapDesc) -> Result<Self> {
        if desc.side_length == 0 {
            return Err(Error::InvalidConfiguration(
                "Environment map side length must be non-zero".to_string(),
            ));
        }
        if !(desc.near > 0.0 && desc.far > desc.near) {
            return Err(Error::InvalidConfiguration(format!(
                "Invalid environment map clip planes: near {} far {}",
                desc.near, desc.far
            )));
        }

        let size = SurfaceSize::new(desc.side_length, desc.side_length);
        let texture = Arc::new(RenderTexture::with_size(
            device.clone(),
            TextureKind::Cube,
            size,
            desc.color_format,
        )?);
        texture.set_name("Environment map");
        let color_attachment = Arc::new(TextureAttachment::new(texture.clone())?);

        let render_surface = Arc::new(
            Framebuffer::with_size(device.clone(), size).with_name("Environment map surface"),
        );
        render_surface.set_color_attachment(Some(color_attachment.clone()))?;

        let depth: SharedAttachment = match desc.depth {
            DepthSource::Format(format) => Arc::new(Renderbuffer::new(device.clone(), format)),
            DepthSource::Shared(attachment) => attachment,
        };
        render_surface.set_depth_attachment(Some(depth))?;

        if !render_surface.validate() {
            engine_error!("galaxy3d::EnvironmentMap",
                "Environment map surface {}x{} is incomplete", size.width, size.height);
            return Err(Error::InitializationFailed(
                "Environment map surface is incomplete".to_string(),
            ));
        }

        Ok(Self {
            device,
            texture,
            color_attachment,
            render_surface,
            near: desc.near,
            far: desc.far,
            faces_per_snapshot: 1.0,
            face_credit: 0.0,
            current_face: CubeFace::PositiveX,
        })
    }

    // ===== ACCESSORS =====

    /// The cube texture, for use as a material texture
    pub fn texture(&self) -> &Arc<RenderTexture> {
        &self.texture
    }

    /// Surface the faces are rendered through
    pub fn render_surface(&self) -> &Arc<Framebuffer> {
        &self.render_surface
    }

    pub fn side_length(&self) -> u32 {
        self.texture.size().width
    }

    /// Face rendered by the next snapshot
    pub fn current_face(&self) -> CubeFace {
        self.current_face
    }

    pub fn faces_per_snapshot(&self) -> f32 {
        self.faces_per_snapshot
    }

    /// Set how many faces each snapshot renders
    ///
    /// Fractional values spread a face over several snapshots: 0.25 renders
    /// one face every fourth snapshot. Values of 6 or more render the whole
    /// cube on every snapshot.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if `faces` is not positive.
    pub fn set_faces_per_snapshot(&mut self, faces: f32) -> Result<()> {
        if !(faces > 0.0) {
            return Err(Error::InvalidConfiguration(format!(
                "Faces per snapshot must be positive, got {}",
                faces
            )));
        }
        self.faces_per_snapshot = faces;
        Ok(())
    }

    // ===== SNAPSHOTS =====

    /// Render the faces due this snapshot from `location`
    ///
    /// Each face is cleared and then drawn by `scene` with a camera facing
    /// it. The framebuffer bound before the call is bound again afterwards.
    /// Returns the number of faces rendered.
    pub fn generate_snapshot<S>(&mut self, scene: &mut S, location: Vec3) -> Result<u32>
    where
        S: EnvironmentScene + ?Sized,
    {
        let face_count = self.take_due_faces();
        if face_count == 0 {
            return Ok(0);
        }

        let previous = self.device.bound_framebuffer();
        let result = self.render_faces(scene, location, face_count);
        if self.device.bound_framebuffer() != previous {
            self.device.bind_framebuffer(previous);
        }
        result?;

        engine_debug!("galaxy3d::EnvironmentMap",
            "Rendered {} environment map faces, next face {:?}", face_count, self.current_face);
        Ok(face_count)
    }

    fn take_due_faces(&mut self) -> u32 {
        self.face_credit += self.faces_per_snapshot;
        if self.face_credit >= CubeFace::ALL.len() as f32 {
            self.face_credit = 0.0;
            return CubeFace::ALL.len() as u32;
        }
        let due = (self.face_credit + FACE_CREDIT_EPSILON).floor();
        self.face_credit = (self.face_credit - due).max(0.0);
        due as u32
    }

    fn render_faces<S>(&mut self, scene: &mut S, location: Vec3, face_count: u32) -> Result<()>
    where
        S: EnvironmentScene + ?Sized,
    {
        for _ in 0..face_count {
            let face = self.current_face;
            self.color_attachment.set_face(TextureFace::Cube(face));
            self.render_surface.rebind_attachment(AttachmentSlot::Color)?;
            self.render_surface.activate()?;
            self.render_surface.clear_color_and_depth_content()?;

            engine_trace!("galaxy3d::EnvironmentMap", "Rendering face {:?}", face);
            let camera = FaceCamera::new(face, location, self.near, self.far);
            scene.draw_environment(&self.render_surface, &camera)?;

            self.current_face = face.next();
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "environment_map_tests.rs"]
mod tests;
