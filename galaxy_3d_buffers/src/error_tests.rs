//! Unit tests for error.rs
//!
//! Tests all Error variants and their implementations (Display, Debug, Clone, std::error::Error).

use crate::error::{Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("vkCreateBuffer returned -2".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("vkCreateBuffer returned -2"));
}

#[test]
fn test_resource_exhausted_display() {
    let err = Error::ResourceExhausted("vertex buffer of 4096 bytes".to_string());
    assert_eq!(format!("{}", err), "Resource exhausted: vertex buffer of 4096 bytes");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("stale backing".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid resource"));
    assert!(display.contains("stale backing"));
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("No Vulkan-capable GPU found".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Initialization failed"));
    assert!(display.contains("No Vulkan-capable GPU found"));
}

// ============================================================================
// ERROR TRAIT IMPLEMENTATIONS
// ============================================================================

#[test]
fn test_error_is_std_error() {
    let err = Error::ResourceExhausted("joint buffer".to_string());
    let _: &dyn std::error::Error = &err;
}

#[test]
fn test_error_debug() {
    assert!(format!("{:?}", Error::BackendError("a".to_string())).contains("BackendError"));
    assert!(format!("{:?}", Error::ResourceExhausted("b".to_string())).contains("ResourceExhausted"));
    assert!(format!("{:?}", Error::InvalidResource("c".to_string())).contains("InvalidResource"));
    assert!(format!("{:?}", Error::InitializationFailed("d".to_string())).contains("InitializationFailed"));
}

#[test]
fn test_error_clone() {
    let err1 = Error::ResourceExhausted("index buffer".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}

// ============================================================================
// RESULT TYPE / MACRO TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<i32> {
        Err(Error::ResourceExhausted("map".to_string()))
    }

    fn outer() -> Result<i32> {
        inner()?;
        Ok(42)
    }

    assert!(matches!(outer(), Err(Error::ResourceExhausted(_))));
}

#[test]
fn test_engine_err_builds_backend_error() {
    let err = crate::engine_err!("galaxy3d::test", "backing {} missing", 7);
    match err {
        Error::BackendError(msg) => assert_eq!(msg, "backing 7 missing"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_engine_bail_returns_early() {
    fn bails(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("galaxy3d::test", "bailing with {}", "reason");
        }
        Ok(1)
    }

    assert!(bails(false).is_ok());
    assert!(matches!(bails(true), Err(Error::BackendError(_))));
}
