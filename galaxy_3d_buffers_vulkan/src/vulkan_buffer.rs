/// VulkanBuffer - Vulkan implementation of the NativeBuffer trait
///
/// Memory is host-visible and host-coherent (`CpuToGpu`) and stays
/// persistently mapped, so mapping hands out the allocation pointer and
/// unmapping only clears the mapped state.

use ash::vk::{self, Handle};
use galaxy_3d_buffers::galaxy3d::{Error, Result};
use galaxy_3d_buffers::galaxy3d::device::{BufferBindFlags, NativeBuffer};
use galaxy_3d_buffers::{engine_bail, engine_error};
use gpu_allocator::vulkan::Allocation;
use std::ptr::NonNull;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

pub struct VulkanBuffer {
    /// Shared GPU context (device, allocator)
    ctx: Arc<GpuContext>,
    /// Vulkan buffer
    pub(crate) buffer: vk::Buffer,
    /// GPU memory allocation
    pub(crate) allocation: Option<Allocation>,
    /// Buffer size in bytes
    size: u64,
    bind: BufferBindFlags,
    mapped: bool,
}

impl VulkanBuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        buffer: vk::Buffer,
        allocation: Allocation,
        size: u64,
        bind: BufferBindFlags,
    ) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
            bind,
            mapped: false,
        }
    }

    /// Native bind target the buffer was created for
    pub fn bind_flags(&self) -> BufferBindFlags {
        self.bind
    }

    fn mapped_ptr(&self) -> Result<NonNull<u8>> {
        self.allocation
            .as_ref()
            .and_then(|allocation| allocation.mapped_ptr())
            .map(|ptr| ptr.cast::<u8>())
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "Buffer {:#x} is not CPU-accessible", self.native_id());
                Error::BackendError("Buffer is not CPU-accessible".to_string())
            })
    }

    fn check_range(&self, byte_offset: u64, byte_size: u64) -> Result<()> {
        if byte_offset.checked_add(byte_size).map_or(true, |end| end > self.size) {
            engine_bail!("galaxy3d::vulkan",
                "Range {}+{} exceeds buffer size {}", byte_offset, byte_size, self.size);
        }
        Ok(())
    }

    /// Copy `data` into the persistent mapping at `byte_offset`
    pub(crate) fn write(&mut self, byte_offset: u64, data: &[u8]) -> Result<()> {
        self.check_range(byte_offset, data.len() as u64)?;
        let ptr = self.mapped_ptr()?;
        // SAFETY: the range was checked against the allocation size and the
        // mapping stays valid for the lifetime of the allocation.
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr(),
                ptr.as_ptr().add(byte_offset as usize),
                data.len(),
            );
        }
        Ok(())
    }
}

impl NativeBuffer for VulkanBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn native_id(&self) -> u64 {
        self.buffer.as_raw()
    }

    fn map_for_write(&mut self, byte_offset: u64, byte_size: u64) -> Result<NonNull<u8>> {
        if self.mapped {
            engine_bail!("galaxy3d::vulkan", "Buffer {:#x} is already mapped", self.native_id());
        }
        self.check_range(byte_offset, byte_size)?;
        let ptr = self.mapped_ptr().map_err(|e| Error::ResourceExhausted(e.to_string()))?;
        self.mapped = true;
        // SAFETY: byte_offset is inside the allocation (checked above)
        Ok(unsafe { NonNull::new_unchecked(ptr.as_ptr().add(byte_offset as usize)) })
    }

    fn unmap(&mut self) -> Result<()> {
        if !self.mapped {
            engine_bail!("galaxy3d::vulkan", "Buffer {:#x} is not mapped", self.native_id());
        }
        self.mapped = false;
        Ok(())
    }

    fn update_discard(&mut self, byte_offset: u64, data: &[u8]) -> Result<()> {
        if self.mapped {
            engine_bail!("galaxy3d::vulkan", "Discard update of mapped buffer {:#x}", self.native_id());
        }
        self.write(byte_offset, data)
    }
}

impl Drop for VulkanBuffer {
    fn drop(&mut self) {
        unsafe {
            // Free GPU memory
            if let Some(allocation) = self.allocation.take() {
                // Don't panic if lock fails - we still need to destroy the buffer
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            // Destroy buffer
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
