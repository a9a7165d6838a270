//! Integration tests for VulkanGraphicsDevice backend
//!
//! These tests verify that VulkanGraphicsDevice correctly implements the GraphicsDevice trait
//! and serves the buffer views. All tests require a GPU and are marked with #[ignore].
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use galaxy_3d_buffers::galaxy3d::{Engine, Error};
use galaxy_3d_buffers::galaxy3d::buffer::{
    Align16, BufferArena, BufferArenaConfig, IndexBuffer, JointBuffer, JointMat, VertexBuffer,
};
use galaxy_3d_buffers::galaxy3d::device::{BufferBindFlags, BufferDesc, BufferMapType, GraphicsDevice};
use galaxy_3d_buffers_vulkan::galaxy3d::{VulkanDeviceConfig, VulkanGraphicsDevice};
use serial_test::serial;

fn create_device() -> VulkanGraphicsDevice {
    VulkanGraphicsDevice::new(VulkanDeviceConfig {
        enable_validation: false,
        ..Default::default()
    })
    .unwrap()
}

// ============================================================================
// NATIVE BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_buffer_with_initial_data() {
    let mut device = create_device();
    let desc = BufferDesc { size: 64, bind: BufferBindFlags::VERTEX };

    let mut buffer = device.create_buffer(desc, Some(&[1u8; 32])).unwrap();

    assert_eq!(buffer.size(), 64);
    assert_ne!(buffer.native_id(), 0);
    let ptr = buffer.map_for_write(0, 64).unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 32) };
    assert_eq!(bytes, &[1u8; 32]);
    buffer.unmap().unwrap();
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_device_exposes_selected_gpu() {
    let device = create_device();
    assert_ne!(device.physical_device(), ash::vk::PhysicalDevice::default());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_zero_sized_buffer_fails() {
    let mut device = create_device();
    let desc = BufferDesc { size: 0, bind: BufferBindFlags::INDEX };
    assert!(device.create_buffer(desc, None).is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_map_twice_fails() {
    let mut device = create_device();
    let desc = BufferDesc { size: 48, bind: BufferBindFlags::CONSTANT };
    let mut buffer = device.create_buffer(desc, None).unwrap();

    buffer.map_for_write(0, 48).unwrap();
    assert!(buffer.map_for_write(0, 48).is_err());
    buffer.unmap().unwrap();
    assert!(buffer.unmap().is_err());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_update_discard_out_of_range_fails() {
    let mut device = create_device();
    let desc = BufferDesc { size: 16, bind: BufferBindFlags::VERTEX };
    let mut buffer = device.create_buffer(desc, None).unwrap();

    assert!(buffer.update_discard(8, &[0u8; 16]).is_err());
    assert!(buffer.update_discard(0, &[0u8; 16]).is_ok());
}

// ============================================================================
// BUFFER VIEW TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_views_over_arena() {
    let arena = BufferArena::shared(create_device(), BufferArenaConfig::default());

    let data = Align16([3u8; 256]);
    let mut owner = VertexBuffer::new(&arena);
    owner.allocate(Some(&data[..]), 256).unwrap();
    let mut sub = VertexBuffer::new(&arena);
    sub.reference_range(&owner, 64, 64);

    owner.write_mapped(|bytes| bytes[64..128].fill(9)).unwrap();

    let ptr = owner.map_buffer(BufferMapType::Write).unwrap();
    let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 256) };
    assert_eq!(&bytes[..64], &[3u8; 64]);
    assert_eq!(&bytes[64..128], &[9u8; 64]);
    owner.unmap_buffer().unwrap();

    drop(sub);
    drop(owner);
    assert!(arena.lock().unwrap().is_empty());
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_joint_and_index_buffers() {
    let arena = BufferArena::shared(create_device(), BufferArenaConfig::default());

    let mut joints = JointBuffer::new(&arena);
    joints.allocate(Some(&[JointMat::IDENTITY; 4][..]), 4).unwrap();
    assert_eq!(joints.size_bytes(), 192);

    let indices = Align16([0u32, 1, 2, 2]);
    let mut index_buffer = IndexBuffer::new(&arena);
    index_buffer.allocate_from(&indices.0[..]).unwrap();
    assert_eq!(index_buffer.capacity(), 16);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_stale_alias_is_guarded() {
    let arena = BufferArena::shared(create_device(), BufferArenaConfig::default());

    let mut owner = VertexBuffer::new(&arena);
    owner.allocate(None, 64).unwrap();
    let mut alias = VertexBuffer::new(&arena);
    alias.reference(&owner);
    owner.release();

    assert!(matches!(alias.map_buffer(BufferMapType::Write), Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_engine_lifecycle() {
    Engine::initialize().unwrap();
    let arena = Engine::create_buffer_arena(create_device(), BufferArenaConfig::default()).unwrap();

    let mut vertices = VertexBuffer::new(&arena);
    vertices.allocate(None, 1024).unwrap();
    drop(vertices);
    drop(arena);

    Engine::shutdown();
}
