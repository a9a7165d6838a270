/// Index buffer - byte-addressed view bound as index input.

use crate::buffer::buffer_view::{BufferKind, BufferView};
use crate::graphics_device::BufferBindFlags;
use crate::utils::round_up_16;

/// Marker for index buffer views
#[derive(Debug, Clone, Copy)]
pub struct IndexKind;

impl BufferKind for IndexKind {
    const NAME: &'static str = "index";
    const SOURCE: &'static str = "galaxy3d::IndexBuffer";
    const BIND: BufferBindFlags = BufferBindFlags::INDEX;
    const ELEMENT_SIZE: u64 = 1;
    const UNIT: &'static str = "bytes";
    const SEED_AT_CREATION: bool = true;
    const REFERENCE_REQUIRES_UNMAPPED_SOURCE: bool = false;

    type Element = u8;

    fn alloc_size(count: usize) -> u64 {
        round_up_16(count as u64)
    }
}

/// Index buffer view; capacity and offset are in bytes
pub type IndexBuffer = BufferView<IndexKind>;
