/// Graphics device module - GPU binding layer and its object ids

pub mod graphics_device;

pub use graphics_device::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
