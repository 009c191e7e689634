//! Environment map module - cube textures rendered from the scene.
//!
//! An environment map renders the scene from a location into the six faces
//! of a cube texture, a few faces per snapshot.

mod environment_map;
mod face_camera;

pub use environment_map::{DepthSource, EnvironmentMapDesc, EnvironmentMapTexture, EnvironmentScene};
pub use face_camera::FaceCamera;
