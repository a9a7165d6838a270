/// Mock graphics device (no GPU required)
///
/// Keeps every native buffer in CPU memory so the buffer layer can be tested
/// without a graphics backend. The device and all buffers it creates share
/// one `MockDeviceState`; cloning the device clones the handle, which lets a
/// test keep an observer while the arena owns the device.

use std::ptr::NonNull;
use std::sync::{Arc, Mutex, MutexGuard};

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::engine_bail;
use crate::graphics_device::{BufferBindFlags, BufferDesc, GraphicsDevice, NativeBuffer};

// ============================================================================
// Mock device state
// ============================================================================

/// One live allocation
struct MockAllocation {
    /// u128 storage keeps the memory 16-byte aligned
    memory: Vec<u128>,
    size: u64,
    bind: BufferBindFlags,
    mapped: bool,
}

impl MockAllocation {
    fn bytes(&self) -> &[u8] {
        &bytemuck::cast_slice::<u128, u8>(&self.memory)[..self.size as usize]
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        let size = self.size as usize;
        &mut bytemuck::cast_slice_mut::<u128, u8>(&mut self.memory)[..size]
    }
}

#[derive(Default)]
struct MockDeviceState {
    next_id: u64,
    allocations: FxHashMap<u64, MockAllocation>,
    last_created: Option<u64>,
    created: u32,
    destroyed: u32,
    maps: u32,
    unmaps: u32,
    discard_updates: u32,
    fail_next_create: bool,
    fail_next_map: bool,
    fail_next_update: bool,
}

fn lock_state(state: &Mutex<MockDeviceState>) -> Result<MutexGuard<'_, MockDeviceState>> {
    state
        .lock()
        .map_err(|_| Error::BackendError("Mock device state lock poisoned".to_string()))
}

// ============================================================================
// Mock Buffer
// ============================================================================

/// Native buffer living in CPU memory
pub struct MockBuffer {
    id: u64,
    size: u64,
    state: Arc<Mutex<MockDeviceState>>,
}

impl NativeBuffer for MockBuffer {
    fn size(&self) -> u64 {
        self.size
    }

    fn native_id(&self) -> u64 {
        self.id
    }

    fn map_for_write(&mut self, byte_offset: u64, byte_size: u64) -> Result<NonNull<u8>> {
        let mut state = lock_state(&self.state)?;
        if state.fail_next_map {
            state.fail_next_map = false;
            return Err(Error::ResourceExhausted(format!(
                "mock buffer {} refused to map {} bytes", self.id, byte_size
            )));
        }
        if byte_offset + byte_size > self.size {
            engine_bail!("galaxy3d::mock",
                "Map range {}..{} exceeds buffer size {}",
                byte_offset, byte_offset + byte_size, self.size);
        }
        state.maps += 1;

        let id = self.id;
        let allocation = match state.allocations.get_mut(&id) {
            Some(allocation) => allocation,
            None => engine_bail!("galaxy3d::mock", "Buffer {} was destroyed", id),
        };
        if allocation.mapped {
            engine_bail!("galaxy3d::mock", "Buffer {} is already mapped", id);
        }
        allocation.mapped = true;

        let ptr = allocation.bytes_mut()[byte_offset as usize..].as_mut_ptr();
        NonNull::new(ptr)
            .ok_or_else(|| Error::ResourceExhausted(format!("mock buffer {} returned a null pointer", id)))
    }

    fn unmap(&mut self) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        state.unmaps += 1;
        match state.allocations.get_mut(&self.id) {
            Some(allocation) if allocation.mapped => {
                allocation.mapped = false;
                Ok(())
            }
            Some(_) => engine_bail!("galaxy3d::mock", "Buffer {} is not mapped", self.id),
            None => engine_bail!("galaxy3d::mock", "Buffer {} was destroyed", self.id),
        }
    }

    fn update_discard(&mut self, byte_offset: u64, data: &[u8]) -> Result<()> {
        let mut state = lock_state(&self.state)?;
        if state.fail_next_update {
            state.fail_next_update = false;
            return Err(Error::BackendError(format!(
                "mock buffer {} refused a {} byte update", self.id, data.len()
            )));
        }
        let end = byte_offset + data.len() as u64;
        if end > self.size {
            engine_bail!("galaxy3d::mock",
                "Update range {}..{} exceeds buffer size {}", byte_offset, end, self.size);
        }
        state.discard_updates += 1;

        let id = self.id;
        let allocation = match state.allocations.get_mut(&id) {
            Some(allocation) => allocation,
            None => engine_bail!("galaxy3d::mock", "Buffer {} was destroyed", id),
        };
        if allocation.mapped {
            engine_bail!("galaxy3d::mock", "Buffer {} cannot be updated while mapped", id);
        }
        allocation.bytes_mut()[byte_offset as usize..end as usize].copy_from_slice(data);
        Ok(())
    }
}

impl Drop for MockBuffer {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if state.allocations.remove(&self.id).is_some() {
                state.destroyed += 1;
            }
        }
    }
}

// ============================================================================
// Mock Graphics Device
// ============================================================================

/// CPU-memory implementation of [`GraphicsDevice`]
#[derive(Clone, Default)]
pub struct MockGraphicsDevice {
    state: Arc<Mutex<MockDeviceState>>,
}

impl MockGraphicsDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create_buffer` call fail with `Error::ResourceExhausted`
    pub fn fail_next_create(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_create = true;
        }
    }

    /// Make the next `map_for_write` call fail with `Error::ResourceExhausted`
    pub fn fail_next_map(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_map = true;
        }
    }

    /// Make the next `update_discard` call fail with `Error::BackendError`
    pub fn fail_next_update(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.fail_next_update = true;
        }
    }

    /// Number of native buffers currently alive
    pub fn live_count(&self) -> usize {
        self.read(|state| state.allocations.len())
    }

    /// Total number of native buffers created
    pub fn created_count(&self) -> u32 {
        self.read(|state| state.created)
    }

    /// Total number of native buffers destroyed
    pub fn destroyed_count(&self) -> u32 {
        self.read(|state| state.destroyed)
    }

    /// Total number of successful or attempted maps
    pub fn map_count(&self) -> u32 {
        self.read(|state| state.maps)
    }

    /// Total number of unmap calls
    pub fn unmap_count(&self) -> u32 {
        self.read(|state| state.unmaps)
    }

    /// Total number of discard updates
    pub fn discard_update_count(&self) -> u32 {
        self.read(|state| state.discard_updates)
    }

    /// Native id of the most recently created buffer
    pub fn last_created_id(&self) -> Option<u64> {
        self.read(|state| state.last_created)
    }

    /// Whether a native buffer is still alive
    pub fn is_alive(&self, id: u64) -> bool {
        self.read(|state| state.allocations.contains_key(&id))
    }

    /// Whether a native buffer is currently mapped
    pub fn is_mapped(&self, id: u64) -> bool {
        self.read(|state| state.allocations.get(&id).map_or(false, |a| a.mapped))
    }

    /// Bind target a native buffer was created with
    pub fn bind_flags(&self, id: u64) -> Option<BufferBindFlags> {
        self.read(|state| state.allocations.get(&id).map(|a| a.bind))
    }

    /// Allocation size of a native buffer
    pub fn allocation_size(&self, id: u64) -> Option<u64> {
        self.read(|state| state.allocations.get(&id).map(|a| a.size))
    }

    /// Copy of the full content of a native buffer
    pub fn contents(&self, id: u64) -> Option<Vec<u8>> {
        self.read(|state| state.allocations.get(&id).map(|a| a.bytes().to_vec()))
    }

    fn read<R: Default>(&self, f: impl FnOnce(&MockDeviceState) -> R) -> R {
        self.state.lock().map(|state| f(&state)).unwrap_or_default()
    }
}

impl GraphicsDevice for MockGraphicsDevice {
    fn create_buffer(
        &mut self,
        desc: BufferDesc,
        initial_data: Option<&[u8]>,
    ) -> Result<Box<dyn NativeBuffer>> {
        let mut state = lock_state(&self.state)?;
        if state.fail_next_create {
            state.fail_next_create = false;
            return Err(Error::ResourceExhausted(format!(
                "mock device refused a {} byte buffer", desc.size
            )));
        }
        if desc.size == 0 {
            engine_bail!("galaxy3d::mock", "Cannot create a zero-sized buffer");
        }
        if let Some(data) = initial_data {
            if data.len() as u64 > desc.size {
                engine_bail!("galaxy3d::mock",
                    "Initial data ({} bytes) larger than buffer ({} bytes)", data.len(), desc.size);
            }
        }

        let mut allocation = MockAllocation {
            memory: vec![0u128; ((desc.size + 15) / 16) as usize],
            size: desc.size,
            bind: desc.bind,
            mapped: false,
        };
        if let Some(data) = initial_data {
            allocation.bytes_mut()[..data.len()].copy_from_slice(data);
        }

        state.next_id += 1;
        let id = state.next_id;
        state.allocations.insert(id, allocation);
        state.last_created = Some(id);
        state.created += 1;

        Ok(Box::new(MockBuffer {
            id,
            size: desc.size,
            state: Arc::clone(&self.state),
        }))
    }
}

#[cfg(test)]
#[path = "mock_graphics_device_tests.rs"]
mod tests;
