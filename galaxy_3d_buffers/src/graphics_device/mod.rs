/// Graphics device module - the device collaborator seen by the buffer layer

// Module declarations
pub mod graphics_device;
pub mod buffer;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use buffer::*;

// Mock graphics device (no GPU required), used by unit and integration tests
pub mod mock_graphics_device;
pub use mock_graphics_device::MockGraphicsDevice;
