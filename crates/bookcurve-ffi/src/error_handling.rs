//! Standardized error handling utilities for FFI functions.
//!
//! This module provides helper functions to reduce boilerplate in FFI error
//! handling patterns.

use crate::types::{BookcurveError, ErrorCode};
use bookcurve_core::AnalyticsError;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Initialize error output to success state.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn init_error(out_error: *mut BookcurveError) {
    if !out_error.is_null() {
        *out_error = BookcurveError::success();
    }
}

/// Set an error on the output error pointer.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn set_error(out_error: *mut BookcurveError, code: ErrorCode, message: &str) {
    if !out_error.is_null() {
        (*out_error).set_error(code, message);
    }
}

/// Check if any of the given pointers are null, and set an error if so.
///
/// # Safety
/// The error pointer must be valid if non-null.
#[inline]
pub unsafe fn check_null_pointers(
    out_error: *mut BookcurveError,
    ptrs: &[*const core::ffi::c_void],
) -> bool {
    for ptr in ptrs {
        if ptr.is_null() {
            set_error(out_error, ErrorCode::NullPointer, "Null pointer argument");
            return true;
        }
    }
    false
}

/// Execute an FFI function body with standardized error handling.
///
/// This function handles:
/// - Initializing the error output to success
/// - Catching panics
/// - Converting pipeline errors to their FFI error codes
///
/// # Safety
/// The error pointer must be valid if non-null.
///
/// # Returns
/// `Some(value)` on success, `None` on error
pub unsafe fn ffi_try<F, T>(out_error: *mut BookcurveError, f: F) -> Option<T>
where
    F: FnOnce() -> Result<T, AnalyticsError>,
{
    init_error(out_error);

    let result = catch_unwind(AssertUnwindSafe(f));

    match result {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            set_error(out_error, ErrorCode::from(&e), &e.to_string());
            None
        }
        Err(_) => {
            set_error(out_error, ErrorCode::PanicCaught, "Panic in Rust code");
            None
        }
    }
}
