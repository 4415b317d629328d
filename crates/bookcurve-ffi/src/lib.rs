//! FFI boundary layer for the bookcurve booking analytics pipeline.
//!
//! This crate provides C-compatible functions that can be called from the
//! host application that fetches booking rows and renders the results.

pub mod allocation;
pub mod conversion;
pub mod error_handling;
pub mod types;

use allocation::{alloc_and_copy_array, alloc_optional_values, free_ptr};
use bookcurve_core::{
    AnalyticsError, BookingRecord, DateNoYear, DtdWindow, DynamicQuery, HistoricalWindow,
    SeasonsQuery, Smoothing,
};
use chrono::NaiveDate;
use conversion::{
    c_str_to_string, date_to_days, days_to_date, to_option_usize, to_reconciliation,
    to_u32_param,
};
use error_handling::{check_null_pointers, ffi_try, init_error};
use libc::{c_char, c_double, c_int, size_t};
use std::ffi::c_void;
use std::ptr;

pub use types::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Build owned booking records from columnar C buffers.
unsafe fn build_records(columns: &BookingColumns) -> Result<Vec<BookingRecord>, AnalyticsError> {
    let n = columns.length;
    if n == 0 {
        return Ok(Vec::new());
    }

    let column_ptrs: [*const c_void; 8] = [
        columns.scheduled_dates as *const c_void,
        columns.fare_class_codes as *const c_void,
        columns.flight_numbers as *const c_void,
        columns.days_to_departure as *const c_void,
        columns.departure_days as *const c_void,
        columns.departure_months as *const c_void,
        columns.departure_years as *const c_void,
        columns.booking_counts as *const c_void,
    ];
    if column_ptrs.iter().any(|p| p.is_null()) {
        return Err(AnalyticsError::InvalidInput(
            "booking column pointer is null".to_string(),
        ));
    }

    let dates = std::slice::from_raw_parts(columns.scheduled_dates, n);
    let codes = std::slice::from_raw_parts(columns.fare_class_codes, n);
    let flights = std::slice::from_raw_parts(columns.flight_numbers, n);
    let dtds = std::slice::from_raw_parts(columns.days_to_departure, n);
    let dep_days = std::slice::from_raw_parts(columns.departure_days, n);
    let dep_months = std::slice::from_raw_parts(columns.departure_months, n);
    let dep_years = std::slice::from_raw_parts(columns.departure_years, n);
    let counts = std::slice::from_raw_parts(columns.booking_counts, n);

    (0..n)
        .map(|i| {
            Ok(BookingRecord {
                scheduled_date: days_to_date(i64::from(dates[i]))?,
                fare_class_code: c_str_to_string("fare_class_code", codes[i])?,
                flight_number: flights[i],
                days_to_departure: dtds[i],
                departure_day: dep_days[i],
                departure_month: dep_months[i],
                departure_year: dep_years[i],
                booking_count: counts[i],
            })
        })
        .collect()
}

fn seasons_query(
    fare_class_code: String,
    flight_number: u32,
    options: &SeasonsOptions,
) -> Result<SeasonsQuery, AnalyticsError> {
    let period = usize::try_from(options.period).map_err(|_| AnalyticsError::InvalidRange {
        param: "period".to_string(),
        reason: format!("{} is negative", options.period),
    })?;

    Ok(SeasonsQuery {
        fare_class_code,
        flight_number,
        date_start: DateNoYear::new(
            to_u32_param("day_start", options.day_start)?,
            to_u32_param("month_start", options.month_start)?,
        )?,
        date_finish: DateNoYear::new(
            to_u32_param("day_end", options.day_end)?,
            to_u32_param("month_end", options.month_end)?,
        )?,
        period,
        smoothing: Smoothing::from_cutoff(to_option_usize(options.fourier_cutoff)),
        reconciliation: to_reconciliation(options.append_last_sample),
        window: HistoricalWindow::new(
            days_to_date(i64::from(options.window_start))?,
            days_to_date(i64::from(options.window_end))?,
        )?,
    })
}

fn dynamic_query(
    fare_class_code: String,
    flight_number: u32,
    options: &DynamicOptions,
) -> Result<DynamicQuery, AnalyticsError> {
    let day = to_u32_param("departure_day", options.departure_day)?;
    let month = to_u32_param("departure_month", options.departure_month)?;
    let departure = NaiveDate::from_ymd_opt(options.departure_year, month, day).ok_or_else(|| {
        AnalyticsError::InvalidRange {
            param: "departure".to_string(),
            reason: format!(
                "{}-{:02}-{:02} is not a calendar date",
                options.departure_year, month, day
            ),
        }
    })?;

    let window = if options.has_period {
        DtdWindow::Period {
            start: days_to_date(i64::from(options.period_start))?,
            end: days_to_date(i64::from(options.period_end))?,
        }
    } else {
        DtdWindow::LastDays(options.dtd_horizon)
    };

    Ok(DynamicQuery {
        fare_class_code,
        flight_number,
        departure,
        window,
        smoothing: Smoothing::from_cutoff(to_option_usize(options.fourier_cutoff)),
        reconciliation: to_reconciliation(options.append_last_sample),
    })
}

/// Copy a curve into a malloc'd result, releasing partial allocations on failure.
unsafe fn write_curve(
    out_result: *mut CurveResult,
    index: &[i64],
    values: &[f64],
    smoothed: Option<&[f64]>,
    out_error: *mut BookcurveError,
) -> bool {
    let r = &mut *out_result;
    *r = CurveResult::default();

    let ok = alloc_and_copy_array(index, &mut r.index, out_error)
        && alloc_and_copy_array(values, &mut r.values, out_error)
        && smoothed.map_or(true, |s| alloc_and_copy_array(s, &mut r.smoothed, out_error));

    if !ok {
        bookcurve_free_curve_result(out_result);
        return false;
    }

    r.length = values.len();
    true
}

// ============================================================================
// Report Functions
// ============================================================================

/// Compute the seasonal profile of one class and flight.
///
/// The result index holds the profile dates as days since 1970-01-01.
///
/// # Safety
/// All pointer arguments must be valid and non-null. Record columns must
/// hold `records.length` elements.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_seasonal_profile(
    records: *const BookingColumns,
    fare_class_code: *const c_char,
    flight_number: u32,
    options: *const SeasonsOptions,
    out_result: *mut CurveResult,
    out_error: *mut BookcurveError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[
            records as *const c_void,
            fare_class_code as *const c_void,
            options as *const c_void,
            out_result as *const c_void,
        ],
    ) {
        return false;
    }

    let report = ffi_try(out_error, || {
        let rows = build_records(&*records)?;
        let query = seasons_query(
            c_str_to_string("fare_class_code", fare_class_code)?,
            flight_number,
            &*options,
        )?;
        bookcurve_core::report_seasons(&rows, &query)
    });

    let Some(report) = report else {
        *out_result = CurveResult::default();
        return false;
    };

    let index: Vec<i64> = report
        .profile
        .iter()
        .map(|(date, _)| i64::from(date_to_days(*date)))
        .collect();
    let values = report.profile_values();

    write_curve(
        out_result,
        &index,
        &values,
        report.smoothed.as_deref(),
        out_error,
    )
}

/// Compute the booking curve of one flight instance.
///
/// The result index holds DTD values in ascending order.
///
/// # Safety
/// All pointer arguments must be valid and non-null. Record columns must
/// hold `records.length` elements.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_booking_curve(
    records: *const BookingColumns,
    fare_class_code: *const c_char,
    flight_number: u32,
    options: *const DynamicOptions,
    out_result: *mut CurveResult,
    out_error: *mut BookcurveError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[
            records as *const c_void,
            fare_class_code as *const c_void,
            options as *const c_void,
            out_result as *const c_void,
        ],
    ) {
        return false;
    }

    let report = ffi_try(out_error, || {
        let rows = build_records(&*records)?;
        let query = dynamic_query(
            c_str_to_string("fare_class_code", fare_class_code)?,
            flight_number,
            &*options,
        )?;
        bookcurve_core::report_dynamic(&rows, &query)
    });

    let Some(report) = report else {
        *out_result = CurveResult::default();
        return false;
    };

    let index: Vec<i64> = report.curve.index().iter().map(|&dtd| i64::from(dtd)).collect();

    write_curve(
        out_result,
        &index,
        report.curve.values(),
        report.smoothed.as_deref(),
        out_error,
    )
}

// ============================================================================
// Pipeline Stage Functions
// ============================================================================

/// Additive seasonal decomposition of a regularly spaced series.
///
/// # Safety
/// All pointer arguments must be valid and non-null. `values` must hold
/// `length` elements.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_seasonal_decompose(
    values: *const c_double,
    length: size_t,
    period: size_t,
    out_result: *mut DecomposeResult,
    out_error: *mut BookcurveError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[values as *const c_void, out_result as *const c_void],
    ) {
        return false;
    }

    *out_result = DecomposeResult::default();

    let decomposition = ffi_try(out_error, || {
        let values_vec = std::slice::from_raw_parts(values, length);
        bookcurve_core::seasonal_decompose(values_vec, period)
    });

    let Some(decomposition) = decomposition else {
        return false;
    };

    let r = &mut *out_result;
    let ok = alloc_and_copy_array(&decomposition.observed, &mut r.observed, out_error)
        && alloc_and_copy_array(&decomposition.seasonal, &mut r.seasonal, out_error)
        && alloc_optional_values(
            &decomposition.trend,
            &mut r.trend,
            &mut r.trend_validity,
            out_error,
        )
        && alloc_optional_values(
            &decomposition.residual,
            &mut r.residual,
            &mut r.residual_validity,
            out_error,
        );

    if !ok {
        bookcurve_free_decompose_result(out_result);
        return false;
    }

    r.length = decomposition.len();
    r.period = decomposition.period;
    true
}

/// Low-pass filter a signal, keeping the `cutoff` lowest frequencies.
///
/// On success `*out_values` points to `length` malloc'd doubles that must be
/// released with `bookcurve_free_double_array`.
///
/// # Safety
/// All pointer arguments must be valid and non-null. `values` must hold
/// `length` elements.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_fourier_smooth(
    values: *const c_double,
    length: size_t,
    cutoff: c_int,
    append_last_sample: bool,
    out_values: *mut *mut c_double,
    out_error: *mut BookcurveError,
) -> bool {
    init_error(out_error);

    if check_null_pointers(
        out_error,
        &[values as *const c_void, out_values as *const c_void],
    ) {
        return false;
    }

    *out_values = ptr::null_mut();

    let smoothed = ffi_try(out_error, || {
        let signal = std::slice::from_raw_parts(values, length);
        // Negative cutoffs are rejected like zero
        let cutoff = usize::try_from(cutoff).unwrap_or(0);
        bookcurve_core::fourier_smooth_with(signal, cutoff, to_reconciliation(append_last_sample))
    });

    match smoothed {
        Some(smoothed) => alloc_and_copy_array(&smoothed, out_values, out_error),
        None => false,
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a curve result.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_free_curve_result(result: *mut CurveResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(r, index, values, smoothed);
    r.length = 0;
}

/// Free a decomposition result.
///
/// # Safety
/// The result pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_free_decompose_result(result: *mut DecomposeResult) {
    if result.is_null() {
        return;
    }
    let r = &mut *result;
    free_fields!(
        r,
        observed,
        trend,
        trend_validity,
        seasonal,
        residual,
        residual_validity
    );
    r.length = 0;
}

/// Free a double array.
///
/// # Safety
/// The pointer must be valid or null.
#[no_mangle]
pub unsafe extern "C" fn bookcurve_free_double_array(ptr: *mut c_double) {
    free_ptr(ptr as *mut c_void);
}

// ============================================================================
// Version
// ============================================================================

#[no_mangle]
pub extern "C" fn bookcurve_version() -> *const c_char {
    static VERSION: &[u8] = b"0.1.0\0";
    VERSION.as_ptr() as *const c_char
}
