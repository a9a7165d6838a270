/// Galaxy3D Engine - Singleton manager for the buffer subsystem
///
/// Holds the process-wide buffer arena and the global logger. Both live in
/// thread-safe static storage guarded by RwLock.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::buffer::{BufferArena, BufferArenaConfig, SharedBufferArena};
use crate::graphics_device::GraphicsDevice;
use crate::error::{Result, Error};
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Internal state structure holding all engine singletons
struct EngineState {
    /// Buffer arena singleton
    buffer_arena: RwLock<Option<SharedBufferArena>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            buffer_arena: RwLock::new(None),
        }
    }
}

// ===== PUBLIC API =====

/// Main engine singleton manager
///
/// # Example
///
/// ```no_run
/// use galaxy_3d_buffers::galaxy3d::Engine;
/// use galaxy_3d_buffers::galaxy3d::buffer::{BufferArenaConfig, VertexBuffer};
/// use galaxy_3d_buffers::galaxy3d::device::MockGraphicsDevice;
///
/// Engine::initialize()?;
/// let arena = Engine::create_buffer_arena(MockGraphicsDevice::new(), BufferArenaConfig::default())?;
///
/// let mut vertices = VertexBuffer::new(&arena);
/// vertices.allocate(None, 1024)?;
///
/// drop(vertices);
/// Engine::shutdown();
/// # Ok::<(), galaxy_3d_buffers::galaxy3d::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log errors before returning them (internal use)
    fn log_and_return_error(error: Error) -> Error {
        match &error {
            Error::InitializationFailed(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Initialization failed: {}", msg);
            }
            Error::BackendError(msg) => {
                crate::engine_error!("galaxy3d::Engine", "Backend error: {}", msg);
            }
            _ => {
                crate::engine_error!("galaxy3d::Engine", "Engine error: {}", error);
            }
        }
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("Engine not initialized. Call Engine::initialize() first.".to_string())
            ))
    }

    /// Initialize the engine
    ///
    /// Must be called once before creating the buffer arena. Idempotent.
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shutdown the engine and drop the buffer arena singleton
    ///
    /// Views still holding the arena keep it alive until they are dropped.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut arena) = state.buffer_arena.write() {
                *arena = None;
            }
        }
    }

    // ===== BUFFER ARENA API =====

    /// Create and register the buffer arena singleton over a graphics device
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine is not initialized
    /// - A buffer arena already exists
    /// - The arena lock is poisoned
    pub fn create_buffer_arena<D: GraphicsDevice + 'static>(
        device: D,
        config: BufferArenaConfig,
    ) -> Result<SharedBufferArena> {
        let state = Self::state()?;

        let mut lock = state.buffer_arena.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("BufferArena lock poisoned".to_string())
            ))?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(
                Error::InitializationFailed("BufferArena already exists. Call Engine::destroy_buffer_arena() first.".to_string())
            ));
        }

        let arena = BufferArena::shared(device, config);
        *lock = Some(arena.clone());

        crate::engine_info!("galaxy3d::Engine", "BufferArena singleton created successfully");

        Ok(arena)
    }

    /// Get the buffer arena singleton
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized or the arena has not been created.
    pub fn buffer_arena() -> Result<SharedBufferArena> {
        let state = Self::state()?;

        let lock = state.buffer_arena.read()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("BufferArena lock poisoned".to_string())
            ))?;

        lock.clone()
            .ok_or_else(|| Self::log_and_return_error(
                Error::InitializationFailed("BufferArena not created. Call Engine::create_buffer_arena() first.".to_string())
            ))
    }

    /// Destroy the buffer arena singleton
    ///
    /// The arena itself is destroyed once the last view referencing it is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the engine is not initialized
    pub fn destroy_buffer_arena() -> Result<()> {
        let state = Self::state()?;

        let mut lock = state.buffer_arena.write()
            .map_err(|_| Self::log_and_return_error(
                Error::BackendError("BufferArena lock poisoned".to_string())
            ))?;

        *lock = None;

        crate::engine_info!("galaxy3d::Engine", "BufferArena singleton destroyed");

        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut arena) = state.buffer_arena.write() {
                *arena = None;
            }
        }
    }

    // ===== LOGGING API =====

    /// Replace the default logger with a custom implementation
    ///
    /// # Example
    ///
    /// ```no_run
    /// use galaxy_3d_buffers::galaxy3d::{Engine, log::{Logger, LogEntry}};
    ///
    /// struct FileLogger;
    /// impl Logger for FileLogger {
    ///     fn log(&self, entry: &LogEntry) {
    ///         // Write to file...
    ///     }
    /// }
    ///
    /// Engine::set_logger(FileLogger);
    /// ```
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to default (DefaultLogger)
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Internal logging method (for simple logs without file:line)
    ///
    /// Used by engine_trace!, engine_info!, engine_warn!...
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        });
    }

    /// Internal logging method with file:line information
    ///
    /// Used by engine_error! and engine_err!.
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: Some(file),
            line: Some(line),
        });
    }

    fn dispatch(entry: LogEntry) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&entry);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
