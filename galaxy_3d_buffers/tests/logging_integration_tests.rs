//! Integration tests for buffer event logging
//!
//! These tests verify that arena and view events reach the engine logger.
//! No GPU required.
//!
//! Run with: cargo test --test logging_integration_tests

use galaxy_3d_buffers::galaxy3d::Engine;
use galaxy_3d_buffers::galaxy3d::buffer::{BufferArena, BufferArenaConfig, JointBuffer, JointMat, VertexBuffer};
use galaxy_3d_buffers::galaxy3d::device::MockGraphicsDevice;
use galaxy_3d_buffers::galaxy3d::log::{LogEntry, LogSeverity, Logger};
use std::sync::{Arc, Mutex};
use serial_test::serial;

// ============================================================================
// TEST LOGGER IMPLEMENTATION
// ============================================================================

/// Test logger that captures log entries for verification
struct TestLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl TestLogger {
    fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (Self { entries: entries.clone() }, entries)
    }
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}

fn messages(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<String> {
    entries
        .lock()
        .unwrap()
        .iter()
        .filter(|e| e.source == source)
        .map(|e| e.message.clone())
        .collect()
}

// ============================================================================
// SHOW BUFFERS
// ============================================================================

#[test]
#[serial]
fn test_integration_show_buffers_logs_alloc_and_free() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let config = BufferArenaConfig { show_buffers: true, ..Default::default() };
    let arena = BufferArena::shared(MockGraphicsDevice::new(), config);
    let mut view = VertexBuffer::new(&arena);
    view.allocate(None, 100).unwrap();
    view.release();

    let logged = messages(&entries, "galaxy3d::VertexBuffer");
    assert_eq!(logged.len(), 2);
    assert!(logged[0].starts_with("vertex buffer alloc"));
    assert!(logged[0].ends_with("(100 bytes)"));
    assert!(logged[0].contains("api 0x"));
    assert!(logged[1].starts_with("vertex buffer free"));

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_show_buffers_counts_joints() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let config = BufferArenaConfig { show_buffers: true, ..Default::default() };
    let arena = BufferArena::shared(MockGraphicsDevice::new(), config);
    let mut view = JointBuffer::new(&arena);
    view.allocate(None, 12).unwrap();

    let logged = messages(&entries, "galaxy3d::JointBuffer");
    assert_eq!(logged.len(), 1);
    assert!(logged[0].ends_with("(12 joints)"));

    drop(view);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_aliases_are_not_logged() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let config = BufferArenaConfig { show_buffers: true, ..Default::default() };
    let arena = BufferArena::shared(MockGraphicsDevice::new(), config);
    let mut owner = VertexBuffer::new(&arena);
    owner.allocate(None, 64).unwrap();
    {
        let mut alias = VertexBuffer::new(&arena);
        alias.reference_range(&owner, 0, 32);
    }

    assert_eq!(messages(&entries, "galaxy3d::VertexBuffer").len(), 1);

    drop(owner);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_show_buffers_off_is_silent() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let arena = BufferArena::shared(MockGraphicsDevice::new(), BufferArenaConfig::default());
    let mut view = VertexBuffer::new(&arena);
    view.allocate(None, 64).unwrap();
    view.release();

    assert!(messages(&entries, "galaxy3d::VertexBuffer").is_empty());

    Engine::reset_logger();
}

// ============================================================================
// FAILURES
// ============================================================================

#[test]
#[serial]
fn test_integration_allocation_failure_is_logged_as_error() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let device = MockGraphicsDevice::new();
    let arena = BufferArena::shared(device.clone(), BufferArenaConfig::default());
    device.fail_next_create();
    let mut view = VertexBuffer::new(&arena);
    assert!(view.allocate(None, 64).is_err());

    let captured = entries.lock().unwrap();
    let failure = captured
        .iter()
        .find(|e| e.source == "galaxy3d::BufferArena" && e.severity == LogSeverity::Error)
        .expect("allocation failure should be logged");
    assert!(failure.message.contains("vertex buffer allocation of 64 bytes failed"));
    assert!(failure.file.is_some());
    assert!(failure.line.is_some());
    drop(captured);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_joint_upload_failure_is_logged_as_error() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let device = MockGraphicsDevice::new();
    let arena = BufferArena::shared(device.clone(), BufferArenaConfig::default());
    let palette = [JointMat::IDENTITY; 2];
    device.fail_next_update();
    let mut view = JointBuffer::new(&arena);
    assert!(view.allocate(Some(&palette[..]), 2).is_err());
    assert!(!view.is_allocated());

    let logged = entries
        .lock()
        .unwrap()
        .iter()
        .any(|e| e.source == "galaxy3d::BufferArena"
            && e.severity == LogSeverity::Error
            && e.message.contains("Discard update of joint backing"));
    assert!(logged);

    Engine::reset_logger();
}

#[test]
#[serial]
fn test_integration_leaked_backing_warns_on_arena_drop() {
    let (logger, entries) = TestLogger::new();
    Engine::set_logger(logger);

    let mut arena = BufferArena::new(MockGraphicsDevice::new(), BufferArenaConfig::default());
    arena
        .create("index", galaxy_3d_buffers::galaxy3d::device::BufferBindFlags::INDEX, 16, None)
        .unwrap();
    drop(arena);

    let warned = entries
        .lock()
        .unwrap()
        .iter()
        .any(|e| e.severity == LogSeverity::Warn && e.message.contains("still alive at arena destruction"));
    assert!(warned);

    Engine::reset_logger();
}
