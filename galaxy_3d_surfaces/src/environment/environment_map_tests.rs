//! Unit tests for environment_map.rs
//!
//! A recording scene captures which face each draw call targeted, so that
//! face scheduling can be checked against the mock device bindings.

use std::sync::Arc;
use glam::Vec3;
use crate::error::{Error, Result};
use crate::graphics_device::mock_graphics_device::{MockAttached, MockGraphicsDevice};
use crate::graphics_device::*;
use crate::pixel::*;
use crate::surface::{same_attachment, Framebuffer, RenderSurface, Renderbuffer, SharedAttachment};
use super::*;

fn mock() -> (Arc<MockGraphicsDevice>, Arc<dyn GraphicsDevice>) {
    let mock = Arc::new(MockGraphicsDevice::new());
    let device: Arc<dyn GraphicsDevice> = mock.clone();
    (mock, device)
}

/// Records each face camera and the texture face attached when drawing
struct RecordingScene {
    mock: Arc<MockGraphicsDevice>,
    cameras: Vec<FaceCamera>,
    attached_faces: Vec<Option<TextureFace>>,
}

impl RecordingScene {
    fn new(mock: &Arc<MockGraphicsDevice>) -> Self {
        Self { mock: mock.clone(), cameras: Vec::new(), attached_faces: Vec::new() }
    }

    fn faces(&self) -> Vec<CubeFace> {
        self.cameras.iter().map(|camera| camera.face()).collect()
    }
}

impl EnvironmentScene for RecordingScene {
    fn draw_environment(&mut self, surface: &Framebuffer, camera: &FaceCamera) -> Result<()> {
        let id = surface.framebuffer_id()?;
        assert_eq!(self.mock.state().bound_framebuffer, id);
        let face = match self.mock.attached(id, AttachmentSlot::Color) {
            Some(MockAttached::Texture { face, .. }) => Some(face),
            _ => None,
        };
        self.attached_faces.push(face);
        self.cameras.push(*camera);
        Ok(())
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_allocates_cube_and_surface() {
    let (mock, device) = mock();
    let env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(64)).unwrap();

    assert_eq!(env.side_length(), 64);
    assert_eq!(env.faces_per_snapshot(), 1.0);
    assert_eq!(env.current_face(), CubeFace::PositiveX);

    let texture = mock.texture(env.texture().texture_id().unwrap()).unwrap();
    assert_eq!(texture.kind, TextureKind::Cube);
    assert_eq!(texture.images.len(), 6);
    assert!(texture.clamp_to_edge);

    let surface = env.render_surface();
    assert!(surface.validate());
    assert_eq!(surface.size(), SurfaceSize::new(64, 64));
    let depth = surface.depth_attachment().unwrap();
    assert_eq!(depth.pixel_format(), PixelFormat::D16_UNORM);
    assert_eq!(depth.size(), SurfaceSize::new(64, 64));
    assert!(Arc::ptr_eq(&surface.color_texture().unwrap(), env.texture()));
}

#[test]
fn test_invalid_descriptors_rejected() {
    let (_mock, device) = mock();

    let zero = EnvironmentMapTexture::new(device.clone(), EnvironmentMapDesc::new(0));
    assert!(matches!(zero, Err(Error::InvalidConfiguration(_))));

    let mut desc = EnvironmentMapDesc::new(16);
    desc.near = 10.0;
    desc.far = 1.0;
    let inverted = EnvironmentMapTexture::new(device, desc);
    assert!(matches!(inverted, Err(Error::InvalidConfiguration(_))));
}

#[test]
fn test_depth_attachment_shared_between_maps() {
    let (_mock, device) = mock();
    let depth: SharedAttachment = Arc::new(Renderbuffer::new(device.clone(), PixelFormat::D16_UNORM));

    let first = EnvironmentMapTexture::new(
        device.clone(),
        EnvironmentMapDesc::with_depth_attachment(32, depth.clone()),
    )
    .unwrap();
    let second = EnvironmentMapTexture::new(
        device,
        EnvironmentMapDesc::with_depth_attachment(32, depth.clone()),
    )
    .unwrap();

    assert!(same_attachment(&first.render_surface().depth_attachment().unwrap(), &depth));
    assert!(same_attachment(&second.render_surface().depth_attachment().unwrap(), &depth));
    assert_eq!(depth.size(), SurfaceSize::new(32, 32));
}

// ============================================================================
// FACE SCHEDULING
// ============================================================================

#[test]
fn test_one_face_per_snapshot_cycles_in_order() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    let mut scene = RecordingScene::new(&mock);

    for _ in 0..6 {
        assert_eq!(env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap(), 1);
    }

    assert_eq!(scene.faces(), CubeFace::ALL.to_vec());
    let expected: Vec<Option<TextureFace>> =
        CubeFace::ALL.iter().map(|face| Some(TextureFace::Cube(*face))).collect();
    assert_eq!(scene.attached_faces, expected);

    // The cycle wraps around
    env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap();
    assert_eq!(scene.faces().last(), Some(&CubeFace::PositiveX));
}

#[test]
fn test_half_face_per_snapshot_renders_every_other_call() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(0.5).unwrap();
    let mut scene = RecordingScene::new(&mock);

    let counts: Vec<u32> = (0..12)
        .map(|_| env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap())
        .collect();

    assert_eq!(counts, vec![0, 1, 0, 1, 0, 1, 0, 1, 0, 1, 0, 1]);
    assert_eq!(scene.faces(), CubeFace::ALL.to_vec());
}

#[test]
fn test_fractional_rate_accumulates_to_whole_face() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(0.1).unwrap();
    let mut scene = RecordingScene::new(&mock);

    let counts: Vec<u32> = (0..10)
        .map(|_| env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap())
        .collect();

    assert_eq!(counts.iter().sum::<u32>(), 1);
    assert_eq!(counts[9], 1);
}

#[test]
fn test_two_faces_per_snapshot() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(2.0).unwrap();
    let mut scene = RecordingScene::new(&mock);

    for _ in 0..3 {
        assert_eq!(env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap(), 2);
    }
    assert_eq!(scene.faces(), CubeFace::ALL.to_vec());
    assert_eq!(env.current_face(), CubeFace::PositiveX);
}

#[test]
fn test_six_or_more_renders_whole_cube_every_call() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(7.5).unwrap();
    let mut scene = RecordingScene::new(&mock);

    assert_eq!(env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap(), 6);
    assert_eq!(env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap(), 6);
    assert_eq!(scene.cameras.len(), 12);
}

#[test]
fn test_non_positive_rate_rejected() {
    let (_mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();

    for invalid in [0.0, -1.0, f32::NAN] {
        let result = env.set_faces_per_snapshot(invalid);
        assert!(matches!(result, Err(Error::InvalidConfiguration(_))), "{} accepted", invalid);
    }
    assert_eq!(env.faces_per_snapshot(), 1.0);
}

// ============================================================================
// RENDERING
// ============================================================================

#[test]
fn test_each_face_cleared_before_drawing() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(3.0).unwrap();
    let id = env.render_surface().framebuffer_id().unwrap();
    let mut scene = RecordingScene::new(&mock);

    env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap();

    let clears = mock.state().clears.clone();
    assert_eq!(clears.len(), 3);
    for (framebuffer, mask, _) in clears {
        assert_eq!(framebuffer, id);
        assert_eq!(mask, BufferMask::COLOR | BufferMask::DEPTH);
    }
}

#[test]
fn test_cameras_positioned_at_location() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(16)).unwrap();
    env.set_faces_per_snapshot(6.0).unwrap();
    let mut scene = RecordingScene::new(&mock);
    let location = Vec3::new(4.0, 5.0, -6.0);

    env.generate_snapshot(&mut scene, location).unwrap();

    for camera in &scene.cameras {
        assert_eq!(camera.location(), location);
    }
}

#[test]
fn test_previous_binding_restored() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device.clone(), EnvironmentMapDesc::new(16)).unwrap();
    let display = mock.external_framebuffer();
    device.bind_framebuffer(display);
    let mut scene = RecordingScene::new(&mock);

    env.generate_snapshot(&mut scene, Vec3::ZERO).unwrap();

    assert_eq!(mock.state().bound_framebuffer, display);
}

#[test]
fn test_closure_scene() {
    let (_mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device, EnvironmentMapDesc::new(8)).unwrap();
    let mut drawn = Vec::new();

    let mut scene = |_surface: &Framebuffer, camera: &FaceCamera| -> Result<()> {
        drawn.push(camera.face());
        Ok(())
    };
    env.generate_snapshot(&mut scene, Vec3::ONE).unwrap();
    env.generate_snapshot(&mut scene, Vec3::ONE).unwrap();

    assert_eq!(drawn, vec![CubeFace::PositiveX, CubeFace::NegativeX]);
}

#[test]
fn test_scene_error_propagates_and_restores_binding() {
    let (mock, device) = mock();
    let mut env = EnvironmentMapTexture::new(device.clone(), EnvironmentMapDesc::new(8)).unwrap();
    let display = mock.external_framebuffer();
    device.bind_framebuffer(display);

    let mut failing = |_surface: &Framebuffer, _camera: &FaceCamera| -> Result<()> {
        Err(Error::BackendError("draw failed".to_string()))
    };
    let result = env.generate_snapshot(&mut failing, Vec3::ZERO);

    assert!(matches!(result, Err(Error::BackendError(_))));
    assert_eq!(mock.state().bound_framebuffer, display);
    // The failed face is attempted again next time
    assert_eq!(env.current_face(), CubeFace::PositiveX);
}
