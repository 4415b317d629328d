//! Memory allocation utilities for FFI functions.
//!
//! This module provides helper functions for allocating and copying
//! arrays between Rust and C.

use crate::types::{BookcurveError, ErrorCode};
use core::ffi::c_double;
use std::ptr;

// Memory allocation - use libc on native, std::alloc on WASM
#[cfg(not(target_family = "wasm"))]
use libc::{free, malloc};

#[cfg(target_family = "wasm")]
use sized_alloc::{free, malloc};

/// Size-prefixed allocator for targets without libc.
///
/// Every block carries its total size in an 8-byte header so that `free`
/// can rebuild the exact `Layout` used by `malloc`.
#[cfg(any(target_family = "wasm", test))]
mod sized_alloc {
    use core::ffi::c_void;
    use std::alloc::{alloc, dealloc, Layout};
    use std::ptr;

    const HEADER: usize = 8;
    const ALIGN: usize = 8;

    pub unsafe fn malloc(size: usize) -> *mut c_void {
        let Some(total) = size.checked_add(HEADER) else {
            return ptr::null_mut();
        };
        let Ok(layout) = Layout::from_size_align(total, ALIGN) else {
            return ptr::null_mut();
        };
        let base = alloc(layout);
        if base.is_null() {
            return ptr::null_mut();
        }
        (base as *mut usize).write(total);
        base.add(HEADER) as *mut c_void
    }

    pub unsafe fn free(p: *mut c_void) {
        if p.is_null() {
            return;
        }
        let base = (p as *mut u8).sub(HEADER);
        let total = (base as *const usize).read();
        // Same size and alignment as in `malloc`, so this cannot fail
        if let Ok(layout) = Layout::from_size_align(total, ALIGN) {
            dealloc(base, layout);
        }
    }

    #[cfg(test)]
    pub unsafe fn block_size(p: *mut c_void) -> usize {
        ((p as *mut u8).sub(HEADER) as *const usize).read()
    }
}

/// Allocate a C array of doubles.
///
/// # Safety
/// Returns null on allocation failure or if n is 0.
#[inline]
pub unsafe fn alloc_double_array(n: usize) -> *mut c_double {
    if n == 0 {
        return ptr::null_mut();
    }
    malloc(n * std::mem::size_of::<c_double>()) as *mut c_double
}

/// Allocate a validity bitmask for n elements.
///
/// # Safety
/// Returns null on allocation failure or if n is 0.
#[inline]
pub unsafe fn alloc_validity(n: usize) -> *mut u64 {
    if n == 0 {
        return ptr::null_mut();
    }
    let n_words = n.div_ceil(64);
    malloc(n_words * std::mem::size_of::<u64>()) as *mut u64
}

/// Allocate and copy an array, setting error on failure.
///
/// # Safety
/// out_ptr and out_error must be valid pointers.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_and_copy_array<T: Copy>(
    items: &[T],
    out_ptr: *mut *mut T,
    out_error: *mut BookcurveError,
) -> bool {
    if items.is_empty() {
        *out_ptr = ptr::null_mut();
        return true;
    }

    let ptr = malloc(std::mem::size_of_val(items)) as *mut T;
    if ptr.is_null() {
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    ptr::copy_nonoverlapping(items.as_ptr(), ptr, items.len());
    *out_ptr = ptr;
    true
}

/// Allocate values and validity arrays for `data` and fill them.
///
/// Undefined entries become NaN with their validity bit cleared.
///
/// # Safety
/// out_values, out_validity and out_error must be valid pointers.
/// Returns true on success, false on allocation failure.
pub unsafe fn alloc_optional_values(
    data: &[Option<f64>],
    out_values: *mut *mut c_double,
    out_validity: *mut *mut u64,
    out_error: *mut BookcurveError,
) -> bool {
    *out_values = ptr::null_mut();
    *out_validity = ptr::null_mut();
    if data.is_empty() {
        return true;
    }

    let values = alloc_double_array(data.len());
    let validity = alloc_validity(data.len());
    if values.is_null() || validity.is_null() {
        free_ptr(values as *mut core::ffi::c_void);
        free_ptr(validity as *mut core::ffi::c_void);
        if !out_error.is_null() {
            (*out_error).set_error(ErrorCode::AllocationError, "Memory allocation failed");
        }
        return false;
    }

    fill_optional_values(values, validity, data);
    *out_values = values;
    *out_validity = validity;
    true
}

/// Free a C pointer using platform-appropriate free function.
///
/// # Safety
/// ptr must be either null or a valid pointer allocated by malloc.
#[inline]
pub unsafe fn free_ptr(ptr: *mut core::ffi::c_void) {
    if !ptr.is_null() {
        free(ptr);
    }
}

/// Macro to free multiple struct fields.
///
/// Usage:
/// ```ignore
/// free_fields!(result, field1, field2, field3);
/// ```
#[macro_export]
macro_rules! free_fields {
    ($result:expr, $($field:ident),+ $(,)?) => {{
        $(
            if !$result.$field.is_null() {
                $crate::allocation::free_ptr($result.$field as *mut core::ffi::c_void);
                $result.$field = std::ptr::null_mut();
            }
        )+
    }};
}

/// Set a validity bit in a bitmask.
///
/// # Safety
/// The validity pointer must be valid and point to an array with sufficient
/// capacity for the given index (at least `index / 64 + 1` u64 words).
#[inline]
pub unsafe fn set_validity_bit(validity: *mut u64, index: usize, is_valid: bool) {
    if validity.is_null() {
        return;
    }
    let word_idx = index / 64;
    let bit_idx = index % 64;
    if is_valid {
        *validity.add(word_idx) |= 1u64 << bit_idx;
    } else {
        *validity.add(word_idx) &= !(1u64 << bit_idx);
    }
}

/// Fill values and validity arrays from `Option<f64>` data.
///
/// # Safety
/// result_values and result_validity must point to arrays of sufficient size.
pub unsafe fn fill_optional_values(
    result_values: *mut c_double,
    result_validity: *mut u64,
    data: &[Option<f64>],
) {
    // Initialize validity to all valid
    if !result_validity.is_null() {
        let n_words = data.len().div_ceil(64);
        for i in 0..n_words {
            *result_validity.add(i) = u64::MAX;
        }
    }

    for (i, v) in data.iter().enumerate() {
        match v {
            Some(val) => {
                *result_values.add(i) = *val;
                set_validity_bit(result_validity, i, true);
            }
            None => {
                *result_values.add(i) = f64::NAN;
                set_validity_bit(result_validity, i, false);
            }
        }
    }
}
