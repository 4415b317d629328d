//! Selection of booking records into ordered series.
//!
//! Two modes are supported:
//! - Seasonal: daily totals for one class and flight across a historical
//!   window, restricted to a calendar slice (days of month and months).
//! - Dynamic: the booking curve of one flight instance indexed by DTD.
//!
//! Selection only validates its range parameters. An empty result is a valid
//! outcome; downstream stages decide whether it is enough data.

use crate::error::{AnalyticsError, Result};
use crate::record::BookingRecord;
use crate::series::TimeSeries;
use chrono::{Datelike, NaiveDate};
use tracing::debug;

/// First day of the default historical window.
pub const DEFAULT_WINDOW_START: NaiveDate = match NaiveDate::from_ymd_opt(2018, 1, 1) {
    Some(date) => date,
    None => panic!("invalid default window start"),
};

/// Last day of the default historical window.
pub const DEFAULT_WINDOW_END: NaiveDate = match NaiveDate::from_ymd_opt(2019, 12, 31) {
    Some(date) => date,
    None => panic!("invalid default window end"),
};

/// Default DTD horizon for booking curves without an explicit period.
pub const DEFAULT_DTD_HORIZON: i32 = 30;

/// Inclusive range of scheduled dates considered for seasonal profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Default for HistoricalWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_WINDOW_START,
            end: DEFAULT_WINDOW_END,
        }
    }
}

impl HistoricalWindow {
    /// Create a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(AnalyticsError::invalid_range(
                "window",
                format!("start {} is after end {}", self.start, self.end),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Days of month and months retained in a seasonal selection.
///
/// Both ranges are inclusive and independent of the year, so a slice of
/// January to March picks those months from every year in the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarSlice {
    pub day_start: u32,
    pub day_end: u32,
    pub month_start: u32,
    pub month_end: u32,
}

impl Default for CalendarSlice {
    fn default() -> Self {
        Self {
            day_start: 1,
            day_end: 31,
            month_start: 1,
            month_end: 12,
        }
    }
}

impl CalendarSlice {
    pub fn validate(&self) -> Result<()> {
        check_bounds("day_start", self.day_start, 1, 31)?;
        check_bounds("day_end", self.day_end, 1, 31)?;
        check_bounds("month_start", self.month_start, 1, 12)?;
        check_bounds("month_end", self.month_end, 1, 12)?;

        if self.day_start > self.day_end {
            return Err(AnalyticsError::invalid_range(
                "day",
                format!("day_start {} > day_end {}", self.day_start, self.day_end),
            ));
        }
        if self.month_start > self.month_end {
            return Err(AnalyticsError::invalid_range(
                "month",
                format!(
                    "month_start {} > month_end {}",
                    self.month_start, self.month_end
                ),
            ));
        }
        Ok(())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        (self.day_start..=self.day_end).contains(&date.day())
            && (self.month_start..=self.month_end).contains(&date.month())
    }
}

fn check_bounds(param: &str, value: u32, min: u32, max: u32) -> Result<()> {
    if value < min || value > max {
        return Err(AnalyticsError::invalid_range(
            param,
            format!("{} is outside {}..={}", value, min, max),
        ));
    }
    Ok(())
}

/// Parameters of a seasonal-mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonalSelection {
    pub fare_class_code: String,
    pub flight_number: u32,
    pub slice: CalendarSlice,
    pub window: HistoricalWindow,
}

impl SeasonalSelection {
    /// Selection over the default window and the full calendar.
    pub fn new(fare_class_code: impl Into<String>, flight_number: u32) -> Self {
        Self {
            fare_class_code: fare_class_code.into(),
            flight_number,
            slice: CalendarSlice::default(),
            window: HistoricalWindow::default(),
        }
    }
}

/// How the rows of one flight instance are narrowed down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DtdWindow {
    /// Keep rows whose scheduled date lies in `start..=end`.
    Period { start: NaiveDate, end: NaiveDate },
    /// Keep rows with DTD strictly below the horizon.
    LastDays(i32),
}

impl Default for DtdWindow {
    fn default() -> Self {
        Self::LastDays(DEFAULT_DTD_HORIZON)
    }
}

impl DtdWindow {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Period { start, end } if start > end => Err(AnalyticsError::invalid_range(
                "period",
                format!("period_start {} is after period_end {}", start, end),
            )),
            _ => Ok(()),
        }
    }

    fn keeps(&self, record: &BookingRecord) -> bool {
        match *self {
            Self::Period { start, end } => {
                start <= record.scheduled_date && record.scheduled_date <= end
            }
            Self::LastDays(horizon) => record.days_to_departure < horizon,
        }
    }
}

/// Parameters of a dynamic-mode selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicSelection {
    pub fare_class_code: String,
    pub flight_number: u32,
    /// Departure date identifying the flight instance
    pub departure: NaiveDate,
    pub window: DtdWindow,
}

impl DynamicSelection {
    /// Selection of the last [`DEFAULT_DTD_HORIZON`] days before departure.
    pub fn new(fare_class_code: impl Into<String>, flight_number: u32, departure: NaiveDate) -> Self {
        Self {
            fare_class_code: fare_class_code.into(),
            flight_number,
            departure,
            window: DtdWindow::default(),
        }
    }
}

/// Daily booking totals for one class and flight, ascending by date.
pub fn select_seasonal(
    records: &[BookingRecord],
    selection: &SeasonalSelection,
) -> Result<TimeSeries<NaiveDate>> {
    selection.window.validate()?;
    selection.slice.validate()?;

    let series = TimeSeries::from_grouped_sum(
        records
            .iter()
            .filter(|r| r.is_segment(&selection.fare_class_code, selection.flight_number))
            .filter(|r| selection.window.contains(r.scheduled_date))
            .filter(|r| selection.slice.contains(r.scheduled_date))
            .map(|r| (r.scheduled_date, r.booking_count as f64)),
    );

    debug!(
        mode = "seasonal",
        input_count = records.len(),
        output_count = series.len(),
        "selection complete"
    );

    Ok(series)
}

/// Booking curve of one flight instance, ascending by DTD.
///
/// Rows sharing a DTD are summed into a single point.
pub fn select_dynamic(
    records: &[BookingRecord],
    selection: &DynamicSelection,
) -> Result<TimeSeries<i32>> {
    selection.window.validate()?;

    let series = TimeSeries::from_grouped_sum(
        records
            .iter()
            .filter(|r| r.is_segment(&selection.fare_class_code, selection.flight_number))
            .filter(|r| r.departs_on(selection.departure))
            .filter(|r| selection.window.keeps(r))
            .map(|r| (r.days_to_departure, r.booking_count as f64)),
    );

    debug!(
        mode = "dynamic",
        input_count = records.len(),
        output_count = series.len(),
        "selection complete"
    );

    Ok(series)
}
