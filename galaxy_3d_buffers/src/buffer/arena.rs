/// Backing arena - owner of every native buffer.
///
/// Views never hold a native buffer directly. An owning view holds the
/// `BackingKey` it got from `create`, non-owning views hold a copy of the
/// same key. Keys are generational: once the owner destroys its backing,
/// every alias still holding the key gets `Error::InvalidResource` instead
/// of touching freed memory.

use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use slotmap::{new_key_type, SlotMap};

use crate::error::{Error, Result};
use crate::graphics_device::{BufferBindFlags, BufferDesc, GraphicsDevice, NativeBuffer};
use crate::{engine_error, engine_trace, engine_warn};

new_key_type! {
    /// Stable key identifying a backing allocation in a `BufferArena`
    pub struct BackingKey;
}

/// Arena shared by every view allocated from it
pub type SharedBufferArena = Arc<Mutex<BufferArena>>;

// ===== CONFIG =====

/// Buffer arena configuration
#[derive(Debug, Clone)]
pub struct BufferArenaConfig {
    /// Log source used by the arena
    pub name: String,
    /// Log every allocate/free event of the views using this arena
    pub show_buffers: bool,
}

impl Default for BufferArenaConfig {
    fn default() -> Self {
        Self {
            name: "galaxy3d::BufferArena".to_string(),
            show_buffers: false,
        }
    }
}

// ===== BACKING =====

struct BackingAllocation {
    native: Box<dyn NativeBuffer>,
    kind: &'static str,
    alloc_size: u64,
    mapped: bool,
}

// ===== ARENA =====

/// Owner of all backing allocations created through one device
pub struct BufferArena {
    device: Box<dyn GraphicsDevice>,
    backings: SlotMap<BackingKey, BackingAllocation>,
    config: BufferArenaConfig,
}

impl BufferArena {
    /// Create an arena over a graphics device
    pub fn new<D: GraphicsDevice + 'static>(device: D, config: BufferArenaConfig) -> Self {
        Self::from_boxed(Box::new(device), config)
    }

    /// Create an arena over an already boxed device
    pub fn from_boxed(device: Box<dyn GraphicsDevice>, config: BufferArenaConfig) -> Self {
        Self {
            device,
            backings: SlotMap::with_key(),
            config,
        }
    }

    /// Create an arena ready to be shared between views
    pub fn shared<D: GraphicsDevice + 'static>(device: D, config: BufferArenaConfig) -> SharedBufferArena {
        Arc::new(Mutex::new(Self::new(device, config)))
    }

    /// Arena configuration
    pub fn config(&self) -> &BufferArenaConfig {
        &self.config
    }

    /// Enable or disable allocate/free diagnostics
    pub fn set_show_buffers(&mut self, show: bool) {
        self.config.show_buffers = show;
    }

    /// Number of live backing allocations
    pub fn len(&self) -> usize {
        self.backings.len()
    }

    /// Whether no backing allocation is alive
    pub fn is_empty(&self) -> bool {
        self.backings.is_empty()
    }

    /// Whether `key` still names a live backing
    pub fn contains(&self, key: BackingKey) -> bool {
        self.backings.contains_key(key)
    }

    /// Allocation size in bytes of a live backing
    pub fn alloc_size(&self, key: BackingKey) -> Option<u64> {
        self.backings.get(key).map(|b| b.alloc_size)
    }

    /// Backend identifier of a live backing
    pub fn native_id(&self, key: BackingKey) -> Option<u64> {
        self.backings.get(key).map(|b| b.native.native_id())
    }

    /// Whether a live backing currently has an outstanding map
    pub fn is_mapped(&self, key: BackingKey) -> bool {
        self.backings.get(key).map_or(false, |b| b.mapped)
    }

    /// Create a new backing allocation
    ///
    /// # Arguments
    ///
    /// * `kind` - Buffer kind name, used in diagnostics ("vertex", "joint"...)
    /// * `bind` - Native bind target
    /// * `alloc_size` - Allocation size in bytes
    /// * `initial_data` - Optional content seeded at creation time
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceExhausted` if the device refuses the allocation.
    pub fn create(
        &mut self,
        kind: &'static str,
        bind: BufferBindFlags,
        alloc_size: u64,
        initial_data: Option<&[u8]>,
    ) -> Result<BackingKey> {
        let native = self
            .device
            .create_buffer(BufferDesc { size: alloc_size, bind }, initial_data)
            .map_err(|error| {
                engine_error!(&self.config.name,
                    "{} buffer allocation of {} bytes failed: {}", kind, alloc_size, error);
                match error {
                    Error::ResourceExhausted(_) => error,
                    other => Error::ResourceExhausted(other.to_string()),
                }
            })?;

        let key = self.backings.insert(BackingAllocation {
            native,
            kind,
            alloc_size,
            mapped: false,
        });
        engine_trace!(&self.config.name, "Created {} backing {:?} ({} bytes)", kind, key, alloc_size);
        Ok(key)
    }

    /// Destroy a backing allocation
    ///
    /// A backing that is still mapped is unmapped first. Returns false if
    /// `key` does not name a live backing.
    pub fn destroy(&mut self, key: BackingKey) -> bool {
        let Some(mut backing) = self.backings.remove(key) else {
            return false;
        };
        if backing.mapped {
            if let Err(error) = backing.native.unmap() {
                engine_warn!(&self.config.name,
                    "Unmapping {} backing {:?} before destruction failed: {}", backing.kind, key, error);
            }
        }
        engine_trace!(&self.config.name, "Destroyed {} backing {:?}", backing.kind, key);
        true
    }

    /// Map `byte_size` bytes at `byte_offset` of a backing for CPU writes
    ///
    /// At most one map may be outstanding per backing.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` if the backing was already destroyed
    /// - `Error::ResourceExhausted` if the device cannot provide a pointer
    pub fn map(&mut self, key: BackingKey, byte_offset: u64, byte_size: u64) -> Result<NonNull<u8>> {
        let name = &self.config.name;
        let Some(backing) = self.backings.get_mut(key) else {
            engine_error!(name, "Map of backing {:?} which no longer exists", key);
            return Err(Error::InvalidResource(format!("backing {:?} was destroyed", key)));
        };
        assert!(!backing.mapped,
            "{}: {} backing {:?} is already mapped by another view", name, backing.kind, key);
        assert!(byte_offset + byte_size <= backing.alloc_size,
            "{}: map range {}..{} exceeds {} byte allocation",
            name, byte_offset, byte_offset + byte_size, backing.alloc_size);

        let ptr = backing.native.map_for_write(byte_offset, byte_size).map_err(|error| {
            engine_error!(name, "Mapping {} backing {:?} failed: {}", backing.kind, key, error);
            match error {
                Error::ResourceExhausted(_) => error,
                other => Error::ResourceExhausted(other.to_string()),
            }
        })?;
        backing.mapped = true;
        Ok(ptr)
    }

    /// Commit and release the outstanding map of a backing
    ///
    /// Unmapping a backing that was destroyed in the meantime only logs a warning.
    pub fn unmap(&mut self, key: BackingKey) -> Result<()> {
        let name = &self.config.name;
        let Some(backing) = self.backings.get_mut(key) else {
            engine_warn!(name, "Unmap of backing {:?} which no longer exists", key);
            return Ok(());
        };
        if !backing.mapped {
            return Err(Error::InvalidResource(format!("backing {:?} is not mapped", key)));
        }
        backing.mapped = false;
        backing.native.unmap()
    }

    /// Discard-and-rewrite `data` at `byte_offset` of a backing
    ///
    /// # Errors
    ///
    /// - `Error::InvalidResource` if the backing was already destroyed
    /// - the device error if the upload fails
    pub fn update_discard(&mut self, key: BackingKey, byte_offset: u64, data: &[u8]) -> Result<()> {
        let name = &self.config.name;
        let Some(backing) = self.backings.get_mut(key) else {
            engine_error!(name, "Update of backing {:?} which no longer exists", key);
            return Err(Error::InvalidResource(format!("backing {:?} was destroyed", key)));
        };
        assert!(!backing.mapped, "{}: update of {} backing {:?} while mapped", name, backing.kind, key);
        assert!(byte_offset + data.len() as u64 <= backing.alloc_size,
            "{}: update of {} bytes at {} overruns {} byte allocation",
            name, data.len(), byte_offset, backing.alloc_size);

        backing.native.update_discard(byte_offset, data).map_err(|error| {
            engine_error!(name, "Discard update of {} backing {:?} failed: {}", backing.kind, key, error);
            error
        })
    }
}

impl Drop for BufferArena {
    fn drop(&mut self) {
        if !self.backings.is_empty() {
            engine_warn!(&self.config.name,
                "{} backing allocations still alive at arena destruction", self.backings.len());
        }
        let keys: Vec<BackingKey> = self.backings.keys().collect();
        for key in keys {
            self.destroy(key);
        }
    }
}

#[cfg(test)]
#[path = "arena_tests.rs"]
mod tests;
