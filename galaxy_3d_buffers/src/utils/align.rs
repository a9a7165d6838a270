/// Alignment helpers for streaming copies into device memory.
///
/// Every CPU-side source slice handed to `allocate` or `update` must start
/// on a 16-byte boundary; `Align16` is the usual way to get one for plain
/// byte arrays.
///
/// # Example
///
/// ```ignore
/// let data = Align16([0u8; 256]);
/// vertex_buffer.allocate(Some(&data[..]), 256)?;
/// ```

use std::ops::{Deref, DerefMut};

/// Alignment required for source data and allocation sizes
pub const STREAMING_ALIGNMENT: usize = 16;

/// Whether `ptr` is on a 16-byte boundary
pub fn is_16_byte_aligned<T>(ptr: *const T) -> bool {
    (ptr as usize) % STREAMING_ALIGNMENT == 0
}

/// Round `size` up to the next multiple of 16
pub const fn round_up_16(size: u64) -> u64 {
    (size + 15) & !15
}

/// Wrapper forcing 16-byte alignment on its content
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Align16<T>(pub T);

impl<T> Deref for Align16<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Align16<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

#[cfg(test)]
#[path = "align_tests.rs"]
mod tests;
