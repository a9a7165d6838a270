/// Native buffer descriptor, bind targets and map intents

use bitflags::bitflags;

bitflags! {
    /// Native bind target of a backing allocation
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferBindFlags: u32 {
        /// Vertex buffer
        const VERTEX = 1 << 0;
        /// Index buffer
        const INDEX = 1 << 1;
        /// Constant (uniform) buffer, used for joint matrix palettes
        const CONSTANT = 1 << 2;
    }
}

/// Descriptor for creating a native buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Allocation size in bytes (already rounded to the allocation granularity)
    pub size: u64,
    /// Native bind target
    pub bind: BufferBindFlags,
}

/// CPU access requested when mapping a buffer
///
/// Only `Write` is supported by vertex, index and joint buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferMapType {
    /// Read-back mapping (not supported for these buffer kinds)
    Read,
    /// Write-only, discard mapping
    Write,
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
