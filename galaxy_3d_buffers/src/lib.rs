/*!
# Galaxy 3D Buffers

GPU buffer views for the Galaxy 3D engine.

This crate provides the platform-agnostic vertex, index and joint buffer
handles. A handle either owns a device allocation or aliases a range of an
allocation owned by another handle, so a single large allocation can be
carved into many short-lived logical buffers without further device
allocations. Backends (Vulkan, mock) plug in through the `GraphicsDevice`
trait.

## Architecture

- **GraphicsDevice / NativeBuffer**: backend traits creating and mapping native buffers
- **BufferArena**: owner of every backing allocation, addressed by generational keys
- **BufferView**: owning or borrowing view over a backing allocation
- **VertexBuffer / IndexBuffer / JointBuffer**: the three view specializations
- **Engine**: buffer arena singleton and global logger
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod graphics_device;
pub mod buffer;
pub mod utils;

// Main galaxy3d namespace module
pub mod galaxy3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine singleton
    pub use crate::engine::Engine;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device collaborator sub-module
    pub mod device {
        pub use crate::graphics_device::*;
    }

    // Buffer views sub-module
    pub mod buffer {
        pub use crate::buffer::*;
        pub use crate::utils::{Align16, STREAMING_ALIGNMENT};
    }
}

// Re-export math library at crate root
pub use glam;
