/// GraphicsDevice trait - factory for native buffer objects
///
/// This is the only part of the graphics backend the buffer layer talks to.
/// Backends (Vulkan, the CPU mock...) implement both traits below.

use std::ptr::NonNull;

use crate::error::Result;
use crate::graphics_device::BufferDesc;

/// Native buffer object
///
/// The native allocation is destroyed when the object is dropped.
/// None of these calls are reentrant for a given buffer.
pub trait NativeBuffer: Send + Sync {
    /// Allocation size in bytes
    fn size(&self) -> u64;

    /// Backend identifier of the allocation (diagnostics only)
    fn native_id(&self) -> u64;

    /// Map `byte_size` bytes starting at `byte_offset` for CPU writes
    ///
    /// Previous contents may be discarded. The returned pointer addresses
    /// `byte_offset` and stays valid until [`NativeBuffer::unmap`] is called
    /// or the buffer is dropped.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceExhausted` if the device cannot provide a pointer.
    fn map_for_write(&mut self, byte_offset: u64, byte_size: u64) -> Result<NonNull<u8>>;

    /// Commit the mapped range back to the device
    fn unmap(&mut self) -> Result<()>;

    /// Overwrite `data.len()` bytes at `byte_offset`, telling the device the
    /// previous contents do not need to be preserved
    fn update_discard(&mut self, byte_offset: u64, data: &[u8]) -> Result<()>;
}

/// Graphics device trait
///
/// Implemented by backend-specific devices (e.g., VulkanGraphicsDevice).
pub trait GraphicsDevice: Send + Sync {
    /// Create a native buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor (size and bind target)
    /// * `initial_data` - Content to seed the buffer with at creation time.
    ///   May be shorter than `desc.size`, the remaining bytes are zeroed.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceExhausted` if the device refuses the allocation.
    fn create_buffer(
        &mut self,
        desc: BufferDesc,
        initial_data: Option<&[u8]>,
    ) -> Result<Box<dyn NativeBuffer>>;
}
