//! Display surface management module
//!
//! Provides the surface manager that owns the on-screen surface, the
//! optional multisampling and picking surfaces, and coordinates resizing
//! of off-screen surfaces with the display.

mod display_surface;
mod surface_manager;

pub use display_surface::{DisplaySurface, SurfaceManagerConfig};
pub use surface_manager::SurfaceManager;
