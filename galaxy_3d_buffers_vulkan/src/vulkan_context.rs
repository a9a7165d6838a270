/// GpuContext - Shared GPU objects for all Vulkan buffers
///
/// Every `VulkanBuffer` keeps an `Arc<GpuContext>`, so the device, allocator
/// and instance are torn down only once the last buffer is gone.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so it is dropped BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Physical device the logical device was created on
    pub physical_device: vk::PhysicalDevice,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    instance: ash::Instance,

    /// Debug utils loader (for validation layers)
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,

    /// Debug messenger handle
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,

    /// Vulkan library, must outlive the instance
    _entry: ash::Entry,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        graphics_queue_family: u32,
        allocator: Allocator,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            physical_device,
            graphics_queue_family,
            instance,
            debug_utils_loader,
            debug_messenger,
            _entry: entry,
        }
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Drop allocator: free VkDeviceMemory pages BEFORE destroying device
            ManuallyDrop::drop(&mut self.allocator);

            // 2. Destroy debug messenger BEFORE device and instance
            if let (Some(debug_utils), Some(messenger)) =
                (&self.debug_utils_loader, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 3. Destroy device and instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}
