//! End-to-end seasonal profile and booking curve reports.
//!
//! Each report runs Select -> (Decompose) -> optional Smooth over records
//! already fetched by the caller and returns the primary curve together with
//! the smoothed curve, if one was requested.

use crate::decomposition::{decompose_series, DecompositionResult};
use crate::error::{AnalyticsError, Result};
use crate::record::BookingRecord;
use crate::select::{
    select_dynamic, select_seasonal, CalendarSlice, DtdWindow, DynamicSelection,
    HistoricalWindow, SeasonalSelection,
};
use crate::series::TimeSeries;
use crate::smoothing::{Reconciliation, Smoothing};
use chrono::NaiveDate;
use tracing::debug;

/// Longest cycle accepted for seasonal profiles (one year of daily data).
pub const MAX_SEASON_PERIOD: usize = 365;

/// Default cycle length for seasonal profiles.
pub const DEFAULT_SEASON_PERIOD: usize = 365;

/// Day and month without a year, bounding a seasonal slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateNoYear {
    pub day: u32,
    pub month: u32,
}

impl DateNoYear {
    pub fn new(day: u32, month: u32) -> Result<Self> {
        let date = Self { day, month };
        date.validate()?;
        Ok(date)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=31).contains(&self.day) {
            return Err(AnalyticsError::invalid_range(
                "day",
                format!("{} is outside 1..=31", self.day),
            ));
        }
        if !(1..=12).contains(&self.month) {
            return Err(AnalyticsError::invalid_range(
                "month",
                format!("{} is outside 1..=12", self.month),
            ));
        }
        Ok(())
    }
}

/// Request for a seasonal profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonsQuery {
    pub fare_class_code: String,
    pub flight_number: u32,
    pub date_start: DateNoYear,
    pub date_finish: DateNoYear,
    /// Cycle length in samples
    pub period: usize,
    pub smoothing: Smoothing,
    pub reconciliation: Reconciliation,
    pub window: HistoricalWindow,
}

impl SeasonsQuery {
    /// Yearly profile over the full calendar and the default window.
    pub fn new(fare_class_code: impl Into<String>, flight_number: u32) -> Self {
        Self {
            fare_class_code: fare_class_code.into(),
            flight_number,
            date_start: DateNoYear { day: 1, month: 1 },
            date_finish: DateNoYear { day: 31, month: 12 },
            period: DEFAULT_SEASON_PERIOD,
            smoothing: Smoothing::None,
            reconciliation: Reconciliation::default(),
            window: HistoricalWindow::default(),
        }
    }

    fn selection(&self) -> Result<SeasonalSelection> {
        self.date_start.validate()?;
        self.date_finish.validate()?;

        Ok(SeasonalSelection {
            fare_class_code: self.fare_class_code.clone(),
            flight_number: self.flight_number,
            slice: CalendarSlice {
                day_start: self.date_start.day,
                day_end: self.date_finish.day,
                month_start: self.date_start.month,
                month_end: self.date_finish.month,
            },
            window: self.window,
        })
    }
}

/// Seasonal profile of one class and flight.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalReport {
    /// One cycle of the seasonal component, keyed by the dates it was taken from
    pub profile: Vec<(NaiveDate, f64)>,
    /// Low-pass version of the profile values
    pub smoothed: Option<Vec<f64>>,
    /// Full decomposition the profile was cut from
    pub decomposition: DecompositionResult,
}

impl SeasonalReport {
    pub fn profile_values(&self) -> Vec<f64> {
        self.profile.iter().map(|(_, v)| *v).collect()
    }
}

/// Build the seasonal profile for `query` from unordered records.
///
/// # Errors
/// * `InvalidRange` for malformed calendar bounds, window or period
/// * `InsufficientData` if the selection holds fewer than two cycles
/// * `InvalidCutoff` if the requested smoothing cutoff does not fit the cycle
pub fn report_seasons(records: &[BookingRecord], query: &SeasonsQuery) -> Result<SeasonalReport> {
    if !(1..=MAX_SEASON_PERIOD).contains(&query.period) {
        return Err(AnalyticsError::invalid_range(
            "period",
            format!("{} is outside 1..={}", query.period, MAX_SEASON_PERIOD),
        ));
    }

    let series = select_seasonal(records, &query.selection()?)?;
    let decomposition = decompose_series(&series, query.period)?;

    let cycle = decomposition.seasonal_cycle();
    let profile: Vec<(NaiveDate, f64)> = series
        .index()
        .iter()
        .copied()
        .zip(cycle.iter().copied())
        .collect();
    let smoothed = query.smoothing.apply(cycle, query.reconciliation)?;

    debug!(
        fare_class_code = %query.fare_class_code,
        flight_number = query.flight_number,
        period = query.period,
        smoothed = smoothed.is_some(),
        "seasonal report complete"
    );

    Ok(SeasonalReport {
        profile,
        smoothed,
        decomposition,
    })
}

/// Request for the booking curve of one flight instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicQuery {
    pub fare_class_code: String,
    pub flight_number: u32,
    pub departure: NaiveDate,
    pub window: DtdWindow,
    pub smoothing: Smoothing,
    pub reconciliation: Reconciliation,
}

impl DynamicQuery {
    pub fn new(fare_class_code: impl Into<String>, flight_number: u32, departure: NaiveDate) -> Self {
        Self {
            fare_class_code: fare_class_code.into(),
            flight_number,
            departure,
            window: DtdWindow::default(),
            smoothing: Smoothing::None,
            reconciliation: Reconciliation::default(),
        }
    }
}

/// Booking curve indexed by DTD.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicReport {
    pub curve: TimeSeries<i32>,
    /// Low-pass version of the curve values, aligned with `curve`
    pub smoothed: Option<Vec<f64>>,
}

/// Build the booking curve for `query` from unordered records.
///
/// # Errors
/// * `InvalidRange` for a period whose start is after its end
/// * `InsufficientData` if no record matches
/// * `InvalidCutoff` if the requested smoothing cutoff does not fit the curve
pub fn report_dynamic(records: &[BookingRecord], query: &DynamicQuery) -> Result<DynamicReport> {
    let selection = DynamicSelection {
        fare_class_code: query.fare_class_code.clone(),
        flight_number: query.flight_number,
        departure: query.departure,
        window: query.window,
    };

    let curve = select_dynamic(records, &selection)?;
    if curve.is_empty() {
        return Err(AnalyticsError::InsufficientData { needed: 1, got: 0 });
    }

    let smoothed = query.smoothing.apply(curve.values(), query.reconciliation)?;

    debug!(
        fare_class_code = %query.fare_class_code,
        flight_number = query.flight_number,
        departure = %query.departure,
        points = curve.len(),
        smoothed = smoothed.is_some(),
        "dynamic report complete"
    );

    Ok(DynamicReport { curve, smoothed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::{Datelike, Duration};

    const WEEKDAY_EFFECT: [i64; 7] = [12, 15, 14, 13, 20, 30, 6];

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn daily_records() -> Vec<BookingRecord> {
        let mut records = Vec::new();
        let mut d = date(2017, 12, 1);
        while d <= date(2020, 1, 31) {
            let effect = WEEKDAY_EFFECT[d.weekday().num_days_from_monday() as usize];
            records.push(BookingRecord {
                scheduled_date: d,
                fare_class_code: "Y".to_string(),
                flight_number: 1120,
                days_to_departure: 0,
                departure_day: d.day(),
                departure_month: d.month(),
                departure_year: d.year(),
                booking_count: effect,
            });
            d = d.succ_opt().unwrap();
        }
        records
    }

    fn curve_records(departure: NaiveDate) -> Vec<BookingRecord> {
        (0..45)
            .map(|dtd| BookingRecord {
                scheduled_date: departure - Duration::days(dtd),
                fare_class_code: "Y".to_string(),
                flight_number: 1120,
                days_to_departure: dtd as i32,
                departure_day: departure.day(),
                departure_month: departure.month(),
                departure_year: departure.year(),
                booking_count: 100 - 2 * dtd + (dtd % 3),
            })
            .collect()
    }

    #[test]
    fn test_weekly_profile() {
        let records = daily_records();
        let mut query = SeasonsQuery::new("Y", 1120);
        query.period = 7;
        query.smoothing = Smoothing::LowPass { cutoff: 2 };

        let report = report_seasons(&records, &query).unwrap();
        assert_eq!(report.profile.len(), 7);
        // 2018-01-01 is a Monday
        assert_eq!(report.profile[0].0, date(2018, 1, 1));

        let mean = WEEKDAY_EFFECT.iter().sum::<i64>() as f64 / 7.0;
        for (i, (_, v)) in report.profile.iter().enumerate() {
            assert_abs_diff_eq!(*v, WEEKDAY_EFFECT[i] as f64 - mean, epsilon = 1e-9);
        }

        let smoothed = report.smoothed.unwrap();
        assert_eq!(smoothed.len(), 7);
        // Low-pass keeps the DC term, and the profile is zero-mean
        assert_abs_diff_eq!(smoothed.iter().sum::<f64>(), 0.0, epsilon = 1e-9);

        query.reconciliation = Reconciliation::AppendLastSample;
        let legacy = report_seasons(&records, &query).unwrap().smoothed.unwrap();
        assert_eq!(legacy.len(), 7);
        assert_eq!(legacy[6], report.profile[6].1);
    }

    #[test]
    fn test_default_yearly_profile() {
        let records = daily_records();
        let query = SeasonsQuery::new("Y", 1120);
        let report = report_seasons(&records, &query).unwrap();

        assert_eq!(report.profile.len(), 365);
        assert_eq!(report.decomposition.len(), 730);
        assert!(report.smoothed.is_none());
        assert_abs_diff_eq!(
            report.profile_values().iter().sum::<f64>(),
            0.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_yearly_profile_dc_smoothing_is_flat() {
        let records = daily_records();
        let mut query = SeasonsQuery::new("Y", 1120);
        query.smoothing = Smoothing::LowPass { cutoff: 1 };
        let report = report_seasons(&records, &query).unwrap();

        let profile = report.profile_values();
        let mean = profile.iter().sum::<f64>() / profile.len() as f64;
        let smoothed = report.smoothed.unwrap();
        assert_eq!(smoothed.len(), 365);
        for v in &smoothed {
            assert_abs_diff_eq!(*v, mean, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_seasons_insufficient_data() {
        let records = daily_records();
        let mut query = SeasonsQuery::new("Y", 1120);
        query.date_start = DateNoYear::new(1, 1).unwrap();
        query.date_finish = DateNoYear::new(10, 1).unwrap();
        // 20 days selected, 2 x 30 needed
        query.period = 30;
        assert_eq!(
            report_seasons(&records, &query),
            Err(AnalyticsError::InsufficientData { needed: 60, got: 20 })
        );

        let empty = SeasonsQuery::new("Z", 1120);
        assert!(matches!(
            report_seasons(&records, &empty),
            Err(AnalyticsError::InsufficientData { got: 0, .. })
        ));
    }

    #[test]
    fn test_seasons_invalid_parameters() {
        let records = daily_records();
        let mut query = SeasonsQuery::new("Y", 1120);

        query.period = 0;
        assert!(matches!(
            report_seasons(&records, &query),
            Err(AnalyticsError::InvalidRange { .. })
        ));

        query.period = 400;
        assert!(matches!(
            report_seasons(&records, &query),
            Err(AnalyticsError::InvalidRange { .. })
        ));

        query.period = 7;
        query.date_start = DateNoYear { day: 1, month: 6 };
        query.date_finish = DateNoYear { day: 31, month: 3 };
        assert!(matches!(
            report_seasons(&records, &query),
            Err(AnalyticsError::InvalidRange { .. })
        ));

        query.date_finish = DateNoYear { day: 31, month: 12 };
        query.smoothing = Smoothing::LowPass { cutoff: 7 };
        assert_eq!(
            report_seasons(&records, &query),
            Err(AnalyticsError::InvalidCutoff { cutoff: 7, max: 4 })
        );

        assert!(DateNoYear::new(32, 1).is_err());
        assert!(DateNoYear::new(1, 0).is_err());
    }

    #[test]
    fn test_dynamic_curve() {
        let departure = date(2019, 8, 15);
        let records = curve_records(departure);
        let mut query = DynamicQuery::new("Y", 1120, departure);
        query.smoothing = Smoothing::LowPass { cutoff: 3 };

        let report = report_dynamic(&records, &query).unwrap();
        assert_eq!(report.curve.len(), 30);
        assert_eq!(report.curve.index().first(), Some(&0));
        assert_eq!(report.curve.index().last(), Some(&29));
        assert_eq!(report.curve.values()[0], 100.0);

        let smoothed = report.smoothed.unwrap();
        assert_eq!(smoothed.len(), report.curve.len());
    }

    #[test]
    fn test_dynamic_period_window() {
        let departure = date(2019, 8, 15);
        let records = curve_records(departure);
        let mut query = DynamicQuery::new("Y", 1120, departure);
        query.window = DtdWindow::Period {
            start: date(2019, 8, 1),
            end: date(2019, 8, 10),
        };

        let report = report_dynamic(&records, &query).unwrap();
        assert_eq!(report.curve.index(), &[5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
        assert!(report.smoothed.is_none());
    }

    #[test]
    fn test_dynamic_empty_is_insufficient() {
        let departure = date(2019, 8, 15);
        let records = curve_records(departure);
        let query = DynamicQuery::new("Y", 1120, date(2019, 8, 16));
        assert_eq!(
            report_dynamic(&records, &query),
            Err(AnalyticsError::InsufficientData { needed: 1, got: 0 })
        );
    }
}
