/*!
# Galaxy 3D Buffers - Vulkan Backend

Headless Vulkan implementation of the galaxy_3d_buffers `GraphicsDevice`
trait, using Ash for Vulkan bindings and gpu-allocator for memory
management.

```no_run
use galaxy_3d_buffers::galaxy3d::Engine;
use galaxy_3d_buffers::galaxy3d::buffer::{BufferArenaConfig, VertexBuffer};
use galaxy_3d_buffers_vulkan::galaxy3d::{VulkanDeviceConfig, VulkanGraphicsDevice};

Engine::initialize()?;
let device = VulkanGraphicsDevice::new(VulkanDeviceConfig::default())?;
let arena = Engine::create_buffer_arena(device, BufferArenaConfig::default())?;
let mut vertices = VertexBuffer::new(&arena);
vertices.allocate(None, 4096)?;
# Ok::<(), galaxy_3d_buffers::galaxy3d::Error>(())
```
*/

mod vulkan_context;
mod vulkan_buffer;
mod vulkan_device;
#[cfg(feature = "vulkan-validation")]
mod vulkan_debug;

pub mod galaxy3d {
    pub use crate::vulkan_buffer::VulkanBuffer;
    pub use crate::vulkan_device::{buffer_usage_to_vk, VulkanDeviceConfig, VulkanGraphicsDevice};
}
