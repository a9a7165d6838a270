/// VulkanGraphicsDevice - headless Vulkan implementation of GraphicsDevice
///
/// Creates an instance without any surface extension, picks the first
/// physical device exposing a graphics queue and serves buffers from a
/// gpu-allocator `Allocator`.

use ash::vk;
use galaxy_3d_buffers::galaxy3d::{Error, Result};
use galaxy_3d_buffers::galaxy3d::device::{BufferBindFlags, BufferDesc, GraphicsDevice, NativeBuffer};
use galaxy_3d_buffers::{engine_err, engine_error, engine_info, engine_warn};
use gpu_allocator::vulkan::{AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use std::ffi::CString;
use std::sync::Arc;

use crate::vulkan_buffer::VulkanBuffer;
use crate::vulkan_context::GpuContext;

// ===== CONFIG =====

/// Vulkan device configuration
#[derive(Debug, Clone)]
pub struct VulkanDeviceConfig {
    /// Enable VK_LAYER_KHRONOS_validation (needs the `vulkan-validation` feature)
    pub enable_validation: bool,
    /// Application name reported to the driver
    pub app_name: String,
    /// Application version reported to the driver
    pub app_version: u32,
}

impl Default for VulkanDeviceConfig {
    fn default() -> Self {
        Self {
            enable_validation: cfg!(debug_assertions),
            app_name: "Galaxy3D Application".to_string(),
            app_version: vk::make_api_version(0, 1, 0, 0),
        }
    }
}

/// Vulkan usage flags for a native bind target
///
/// Every buffer is also a transfer destination.
pub fn buffer_usage_to_vk(bind: BufferBindFlags) -> vk::BufferUsageFlags {
    let mut usage = vk::BufferUsageFlags::TRANSFER_DST;
    if bind.contains(BufferBindFlags::VERTEX) {
        usage |= vk::BufferUsageFlags::VERTEX_BUFFER;
    }
    if bind.contains(BufferBindFlags::INDEX) {
        usage |= vk::BufferUsageFlags::INDEX_BUFFER;
    }
    if bind.contains(BufferBindFlags::CONSTANT) {
        usage |= vk::BufferUsageFlags::UNIFORM_BUFFER;
    }
    usage
}

// ===== DEVICE =====

/// Headless Vulkan graphics device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
}

impl VulkanGraphicsDevice {
    /// Create a new headless Vulkan device
    ///
    /// # Errors
    ///
    /// Returns `Error::InitializationFailed` if the Vulkan library, instance,
    /// physical device, logical device or allocator cannot be created.
    pub fn new(config: VulkanDeviceConfig) -> Result<Self> {
        unsafe {
            // Create Vulkan Entry
            let entry = ash::Entry::load()
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to load Vulkan library: {:?}", e);
                    Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
                })?;

            // Application Info
            let app_name = CString::new(config.app_name.clone())
                .map_err(|e| Error::InitializationFailed(format!("Invalid application name: {}", e)))?;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(config.app_version)
                .engine_name(c"Galaxy3D")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let enable_validation = config.enable_validation && cfg!(feature = "vulkan-validation");
            if config.enable_validation && !enable_validation {
                engine_warn!("galaxy3d::vulkan",
                    "Validation requested but the vulkan-validation feature is disabled");
            }

            // Headless: no surface extension, only debug utils when validating
            let extension_names = if enable_validation {
                vec![ash::ext::debug_utils::NAME.as_ptr()]
            } else {
                vec![]
            };
            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry
                .create_instance(&create_info, None)
                .map_err(|e| {
                    engine_error!("galaxy3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
                })?;

            let (debug_utils_loader, debug_messenger) =
                match Self::create_debug_messenger(&entry, &instance, enable_validation) {
                    Ok(debug) => debug,
                    Err(e) => {
                        instance.destroy_instance(None);
                        return Err(e);
                    }
                };

            let destroy_instance = |instance: &ash::Instance| {
                if let (Some(loader), Some(messenger)) = (&debug_utils_loader, debug_messenger) {
                    loader.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            // Pick Physical Device and graphics queue family
            let (physical_device, graphics_family_index) = match Self::pick_physical_device(&instance) {
                Ok(picked) => picked,
                Err(e) => {
                    destroy_instance(&instance);
                    return Err(e);
                }
            };

            // Create Logical Device
            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family_index)
                .queue_priorities(&queue_priorities)];
            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos);

            let device = match instance.create_device(physical_device, &device_create_info, None) {
                Ok(device) => device,
                Err(e) => {
                    engine_error!("galaxy3d::vulkan", "Failed to create logical device: {:?}", e);
                    destroy_instance(&instance);
                    return Err(Error::InitializationFailed(format!("Failed to create device: {:?}", e)));
                }
            };

            // Create GPU allocator
            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    engine_error!("galaxy3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                    device.destroy_device(None);
                    destroy_instance(&instance);
                    return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            engine_info!("galaxy3d::vulkan", "Vulkan device ready: {}",
                properties.device_name_as_c_str().map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|_| "unknown".to_string()));

            Ok(Self {
                ctx: Arc::new(GpuContext::new(
                    entry,
                    instance,
                    physical_device,
                    device,
                    graphics_family_index,
                    allocator,
                    debug_utils_loader,
                    debug_messenger,
                )),
            })
        }
    }

    #[cfg(feature = "vulkan-validation")]
    unsafe fn create_debug_messenger(
        entry: &ash::Entry,
        instance: &ash::Instance,
        enable_validation: bool,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        if !enable_validation {
            return Ok((None, None));
        }
        let debug_utils = ash::ext::debug_utils::Instance::new(entry, instance);
        let messenger = debug_utils
            .create_debug_utils_messenger(&crate::vulkan_debug::messenger_create_info(), None)
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to create debug messenger: {:?}", e);
                Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
            })?;
        Ok((Some(debug_utils), Some(messenger)))
    }

    #[cfg(not(feature = "vulkan-validation"))]
    unsafe fn create_debug_messenger(
        _entry: &ash::Entry,
        _instance: &ash::Instance,
        _enable_validation: bool,
    ) -> Result<(Option<ash::ext::debug_utils::Instance>, Option<vk::DebugUtilsMessengerEXT>)> {
        Ok((None, None))
    }

    unsafe fn pick_physical_device(instance: &ash::Instance) -> Result<(vk::PhysicalDevice, u32)> {
        let physical_devices = instance
            .enumerate_physical_devices()
            .map_err(|e| {
                engine_error!("galaxy3d::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!("Failed to enumerate physical devices: {:?}", e))
            })?;

        physical_devices
            .into_iter()
            .find_map(|physical_device| {
                instance
                    .get_physical_device_queue_family_properties(physical_device)
                    .iter()
                    .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|index| (physical_device, index as u32))
            })
            .ok_or_else(|| {
                engine_error!("galaxy3d::vulkan", "No Vulkan-capable GPU with a graphics queue found");
                Error::InitializationFailed("No Vulkan-capable GPU found".to_string())
            })
    }

    /// Physical device the logical device was created on
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.ctx.physical_device
    }

    /// Graphics queue family the device was created with
    pub fn graphics_queue_family(&self) -> u32 {
        self.ctx.graphics_queue_family
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&mut self, desc: BufferDesc, initial_data: Option<&[u8]>) -> Result<Box<dyn NativeBuffer>> {
        if desc.size == 0 {
            return Err(engine_err!("galaxy3d::vulkan", "Cannot create a zero-sized buffer"));
        }
        if let Some(data) = initial_data {
            if data.len() as u64 > desc.size {
                return Err(engine_err!("galaxy3d::vulkan",
                    "Initial data of {} bytes exceeds buffer size {}", data.len(), desc.size));
            }
        }

        let device = &self.ctx.device;
        unsafe {
            let buffer_create_info = vk::BufferCreateInfo::default()
                .size(desc.size)
                .usage(buffer_usage_to_vk(desc.bind))
                .sharing_mode(vk::SharingMode::EXCLUSIVE);

            let buffer = device.create_buffer(&buffer_create_info, None)
                .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = device.get_buffer_memory_requirements(buffer);

            let allocation = {
                let mut allocator = match self.ctx.allocator.lock() {
                    Ok(allocator) => allocator,
                    Err(_) => {
                        device.destroy_buffer(buffer, None);
                        return Err(Error::BackendError("Allocator lock poisoned".to_string()));
                    }
                };
                allocator.allocate(&AllocationCreateDesc {
                    name: "galaxy3d buffer",
                    requirements,
                    location: MemoryLocation::CpuToGpu,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
            };
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(e) => {
                    device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("galaxy3d::vulkan", "Out of GPU memory for buffer (required: {:.2} MB): {}", size_mb, e);
                    return Err(Error::ResourceExhausted(format!("buffer of {} bytes: {}", desc.size, e)));
                }
            };

            // From here the VulkanBuffer drop frees the allocation and destroys the buffer
            let mut native = VulkanBuffer::new(Arc::clone(&self.ctx), buffer, allocation, desc.size, desc.bind);

            let memory = native.allocation.as_ref().map(|a| (a.memory(), a.offset()));
            if let Some((memory, offset)) = memory {
                device.bind_buffer_memory(buffer, memory, offset)
                    .map_err(|e| engine_err!("galaxy3d::vulkan", "Failed to bind buffer memory: {:?}", e))?;
            }

            if let Some(data) = initial_data {
                native.write(0, data)?;
            }

            Ok(Box::new(native))
        }
    }
}

#[cfg(test)]
#[path = "vulkan_device_tests.rs"]
mod tests;
