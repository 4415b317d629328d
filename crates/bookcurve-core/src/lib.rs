//! Core analytics library for airline booking records.
//!
//! This crate turns raw booking records into seasonal profiles and
//! days-to-departure booking curves, with optional Fourier low-pass
//! smoothing. Every operation is a pure function over caller-owned data.

pub mod decomposition;
pub mod error;
pub mod record;
pub mod report;
pub mod select;
pub mod series;
pub mod smoothing;

// Re-exports for convenience
pub use decomposition::{decompose_series, seasonal_decompose, DecompositionResult};
pub use error::{AnalyticsError, Result};
pub use record::BookingRecord;
pub use report::{
    report_dynamic, report_seasons, DateNoYear, DynamicQuery, DynamicReport, SeasonalReport,
    SeasonsQuery, DEFAULT_SEASON_PERIOD, MAX_SEASON_PERIOD,
};
pub use select::{
    select_dynamic, select_seasonal, CalendarSlice, DtdWindow, DynamicSelection,
    HistoricalWindow, SeasonalSelection, DEFAULT_DTD_HORIZON, DEFAULT_WINDOW_END,
    DEFAULT_WINDOW_START,
};
pub use series::TimeSeries;
pub use smoothing::{
    fourier_smooth, fourier_smooth_with, max_cutoff, Reconciliation, Smoothing,
};
