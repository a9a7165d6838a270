/// Unit tests for VulkanGraphicsDevice helpers (no GPU required).

use super::*;

#[test]
fn test_buffer_usage_to_vk_per_bind_target() {
    assert_eq!(
        buffer_usage_to_vk(BufferBindFlags::VERTEX),
        vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
    );
    assert_eq!(
        buffer_usage_to_vk(BufferBindFlags::INDEX),
        vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
    );
    assert_eq!(
        buffer_usage_to_vk(BufferBindFlags::CONSTANT),
        vk::BufferUsageFlags::UNIFORM_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
    );
}

#[test]
fn test_buffer_usage_to_vk_combined() {
    let usage = buffer_usage_to_vk(BufferBindFlags::VERTEX | BufferBindFlags::INDEX);
    assert!(usage.contains(vk::BufferUsageFlags::VERTEX_BUFFER));
    assert!(usage.contains(vk::BufferUsageFlags::INDEX_BUFFER));
    assert!(!usage.contains(vk::BufferUsageFlags::UNIFORM_BUFFER));
}

#[test]
fn test_default_config() {
    let config = VulkanDeviceConfig::default();
    assert_eq!(config.enable_validation, cfg!(debug_assertions));
    assert_eq!(config.app_name, "Galaxy3D Application");
    assert_eq!(config.app_version, vk::make_api_version(0, 1, 0, 0));
}
