//! C-compatible type definitions for FFI boundary.
//!
//! These types are designed to be used across the Rust/C boundary by the
//! host application that owns data access and rendering.

use crate::conversion::date_to_days;
use bookcurve_core::{
    AnalyticsError, DEFAULT_DTD_HORIZON, DEFAULT_SEASON_PERIOD, DEFAULT_WINDOW_END,
    DEFAULT_WINDOW_START,
};
use libc::{c_char, c_double, c_int, size_t};

/// Error codes for FFI boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    NullPointer = 1,
    InvalidInput = 2,
    InsufficientData = 3,
    InvalidCutoff = 4,
    InvalidRange = 5,
    AllocationError = 6,
    PanicCaught = 7,
}

impl From<&AnalyticsError> for ErrorCode {
    fn from(err: &AnalyticsError) -> Self {
        match err {
            AnalyticsError::InsufficientData { .. } => ErrorCode::InsufficientData,
            AnalyticsError::InvalidCutoff { .. } => ErrorCode::InvalidCutoff,
            AnalyticsError::InvalidRange { .. } => ErrorCode::InvalidRange,
            AnalyticsError::InvalidInput(_) => ErrorCode::InvalidInput,
        }
    }
}

/// Error structure with message buffer for FFI.
#[repr(C)]
pub struct BookcurveError {
    pub code: ErrorCode,
    pub message: [c_char; 256],
}

impl BookcurveError {
    /// Create a success error (no error).
    pub fn success() -> Self {
        Self {
            code: ErrorCode::Success,
            message: [0; 256],
        }
    }

    /// Set an error with code and message.
    pub fn set_error(&mut self, code: ErrorCode, msg: &str) {
        self.code = code;
        let bytes = msg.as_bytes();
        let len = bytes.len().min(255);
        for (i, &b) in bytes[..len].iter().enumerate() {
            self.message[i] = b as c_char;
        }
        self.message[len] = 0; // Null terminator
    }
}

impl Default for BookcurveError {
    fn default() -> Self {
        Self::success()
    }
}

/// Booking records in columnar layout.
///
/// Every column holds `length` elements. Dates are days since 1970-01-01 and
/// class codes are null-terminated UTF-8 strings.
#[repr(C)]
pub struct BookingColumns {
    pub scheduled_dates: *const i32,
    pub fare_class_codes: *const *const c_char,
    pub flight_numbers: *const u32,
    pub days_to_departure: *const i32,
    pub departure_days: *const u32,
    pub departure_months: *const u32,
    pub departure_years: *const i32,
    pub booking_counts: *const i64,
    pub length: size_t,
}

/// Seasonal profile options.
#[repr(C)]
pub struct SeasonsOptions {
    pub day_start: c_int,
    pub month_start: c_int,
    pub day_end: c_int,
    pub month_end: c_int,
    /// Cycle length in samples (1-365)
    pub period: c_int,
    /// Number of retained Fourier coefficients (0 or negative = no smoothing)
    pub fourier_cutoff: c_int,
    /// Historical window start, days since epoch
    pub window_start: i32,
    /// Historical window end, days since epoch
    pub window_end: i32,
    /// Legacy length handling: invert over an even length and append the last sample
    pub append_last_sample: bool,
}

impl Default for SeasonsOptions {
    fn default() -> Self {
        Self {
            day_start: 1,
            month_start: 1,
            day_end: 31,
            month_end: 12,
            period: DEFAULT_SEASON_PERIOD as c_int,
            fourier_cutoff: 0,
            window_start: date_to_days(DEFAULT_WINDOW_START),
            window_end: date_to_days(DEFAULT_WINDOW_END),
            append_last_sample: false,
        }
    }
}

/// Booking curve options.
#[repr(C)]
pub struct DynamicOptions {
    pub departure_day: c_int,
    pub departure_month: c_int,
    pub departure_year: c_int,
    /// Use `period_start..=period_end` instead of the DTD horizon
    pub has_period: bool,
    /// Period start, days since epoch
    pub period_start: i32,
    /// Period end, days since epoch
    pub period_end: i32,
    /// Keep rows with DTD below this value when no period is given
    pub dtd_horizon: c_int,
    /// Number of retained Fourier coefficients (0 or negative = no smoothing)
    pub fourier_cutoff: c_int,
    /// Legacy length handling: invert over an even length and append the last sample
    pub append_last_sample: bool,
}

impl Default for DynamicOptions {
    fn default() -> Self {
        Self {
            departure_day: 1,
            departure_month: 1,
            departure_year: 2019,
            has_period: false,
            period_start: 0,
            period_end: 0,
            dtd_horizon: DEFAULT_DTD_HORIZON,
            fourier_cutoff: 0,
            append_last_sample: false,
        }
    }
}

/// Primary curve with its optional smoothed counterpart.
#[repr(C)]
pub struct CurveResult {
    /// Curve index: days since epoch for seasonal profiles, DTD for booking curves
    pub index: *mut i64,
    /// Curve values
    pub values: *mut c_double,
    /// Smoothed values aligned with `values` (null when smoothing was not requested)
    pub smoothed: *mut c_double,
    /// Number of points
    pub length: size_t,
}

impl Default for CurveResult {
    fn default() -> Self {
        Self {
            index: std::ptr::null_mut(),
            values: std::ptr::null_mut(),
            smoothed: std::ptr::null_mut(),
            length: 0,
        }
    }
}

/// Additive decomposition result.
#[repr(C)]
pub struct DecomposeResult {
    pub observed: *mut c_double,
    /// Trend component (NaN where undefined)
    pub trend: *mut c_double,
    /// Validity bitmask for trend (bit i indicates if trend[i] is defined)
    pub trend_validity: *mut u64,
    pub seasonal: *mut c_double,
    /// Residual component (NaN where undefined)
    pub residual: *mut c_double,
    /// Validity bitmask for residual
    pub residual_validity: *mut u64,
    /// Number of observations
    pub length: size_t,
    /// Cycle length used
    pub period: size_t,
}

impl Default for DecomposeResult {
    fn default() -> Self {
        Self {
            observed: std::ptr::null_mut(),
            trend: std::ptr::null_mut(),
            trend_validity: std::ptr::null_mut(),
            seasonal: std::ptr::null_mut(),
            residual: std::ptr::null_mut(),
            residual_validity: std::ptr::null_mut(),
            length: 0,
            period: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CStr;

    #[test]
    fn test_error_code_mapping() {
        assert_eq!(
            ErrorCode::from(&AnalyticsError::InsufficientData { needed: 2, got: 0 }),
            ErrorCode::InsufficientData
        );
        assert_eq!(
            ErrorCode::from(&AnalyticsError::InvalidCutoff { cutoff: 0, max: 3 }),
            ErrorCode::InvalidCutoff
        );
        assert_eq!(
            ErrorCode::from(&AnalyticsError::InvalidRange {
                param: "day".into(),
                reason: "bad".into()
            }),
            ErrorCode::InvalidRange
        );
        assert_eq!(
            ErrorCode::from(&AnalyticsError::InvalidInput("bad".into())),
            ErrorCode::InvalidInput
        );
    }

    #[test]
    fn test_set_error_truncates_message() {
        let mut error = BookcurveError::default();
        let long = "x".repeat(400);
        error.set_error(ErrorCode::InvalidInput, &long);

        assert_eq!(error.code, ErrorCode::InvalidInput);
        let msg = unsafe { CStr::from_ptr(error.message.as_ptr()) };
        assert_eq!(msg.to_bytes().len(), 255);
    }

    #[test]
    fn test_default_seasons_window() {
        let opts = SeasonsOptions::default();
        // 2018-01-01 and 2019-12-31
        assert_eq!(opts.window_start, 17532);
        assert_eq!(opts.window_end, 18261);
        assert_eq!(opts.period, 365);
    }
}
