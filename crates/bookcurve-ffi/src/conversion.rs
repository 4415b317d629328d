//! Parameter conversion utilities for FFI functions.
//!
//! This module provides helper functions for converting C types to Rust types
//! with common patterns like "0 or negative means None".

use bookcurve_core::{AnalyticsError, Reconciliation, Result};
use chrono::{Duration, NaiveDate};
use core::ffi::{c_char, c_int};
use std::ffi::CStr;

const UNIX_EPOCH_DATE: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(date) => date,
    None => panic!("invalid epoch date"),
};

/// Convert a `c_int` to `Option<usize>`, where values <= 0 become None.
#[inline]
pub fn to_option_usize(value: c_int) -> Option<usize> {
    if value > 0 {
        Some(value as usize)
    } else {
        None
    }
}

/// Convert a non-negative `c_int` parameter to `u32`.
pub fn to_u32_param(param: &str, value: c_int) -> Result<u32> {
    u32::try_from(value).map_err(|_| AnalyticsError::InvalidRange {
        param: param.to_string(),
        reason: format!("{} is negative", value),
    })
}

/// Convert days since 1970-01-01 to a date.
pub fn days_to_date(days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|d| UNIX_EPOCH_DATE.checked_add_signed(d))
        .ok_or_else(|| AnalyticsError::InvalidInput(format!("date out of range: {} days", days)))
}

/// Convert a date to days since 1970-01-01.
pub fn date_to_days(date: NaiveDate) -> i32 {
    (date - UNIX_EPOCH_DATE).num_days() as i32
}

/// Map the `append_last_sample` option flag to a reconciliation policy.
#[inline]
pub fn to_reconciliation(append_last_sample: bool) -> Reconciliation {
    if append_last_sample {
        Reconciliation::AppendLastSample
    } else {
        Reconciliation::ExactLength
    }
}

/// Convert a C string pointer to an owned Rust string.
///
/// # Safety
/// The pointer must be null or point to a valid null-terminated string.
pub unsafe fn c_str_to_string(param: &str, ptr: *const c_char) -> Result<String> {
    if ptr.is_null() {
        return Err(AnalyticsError::InvalidInput(format!("{} is null", param)));
    }
    CStr::from_ptr(ptr)
        .to_str()
        .map(str::to_string)
        .map_err(|_| AnalyticsError::InvalidInput(format!("{} is not valid UTF-8", param)))
}
