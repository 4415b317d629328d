//! Raw booking observations as delivered by the data source.

use chrono::{Datelike, NaiveDate};

/// One booking snapshot row.
///
/// Rows arrive unordered from the upstream fetch and are never mutated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRecord {
    /// Date the snapshot was taken
    pub scheduled_date: NaiveDate,
    /// Booking class segment code (e.g. "Y", "J")
    pub fare_class_code: String,
    /// Flight number
    pub flight_number: u32,
    /// Days remaining before departure at snapshot time
    pub days_to_departure: i32,
    /// Departure day of month
    pub departure_day: u32,
    /// Departure month
    pub departure_month: u32,
    /// Departure year
    pub departure_year: i32,
    /// Passenger bookings observed
    pub booking_count: i64,
}

impl BookingRecord {
    /// True if the record belongs to the given class and flight.
    pub fn is_segment(&self, fare_class_code: &str, flight_number: u32) -> bool {
        self.flight_number == flight_number && self.fare_class_code == fare_class_code
    }

    /// True if the record describes the flight departing on `departure`.
    pub fn departs_on(&self, departure: NaiveDate) -> bool {
        self.departure_day == departure.day()
            && self.departure_month == departure.month()
            && self.departure_year == departure.year()
    }

    /// Departure date, if the stored day/month/year form a valid calendar date.
    pub fn departure_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(
            self.departure_year,
            self.departure_month,
            self.departure_day,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> BookingRecord {
        BookingRecord {
            scheduled_date: NaiveDate::from_ymd_opt(2019, 6, 1).unwrap(),
            fare_class_code: "Y".to_string(),
            flight_number: 1120,
            days_to_departure: 14,
            departure_day: 15,
            departure_month: 6,
            departure_year: 2019,
            booking_count: 7,
        }
    }

    #[test]
    fn test_is_segment() {
        let r = record();
        assert!(r.is_segment("Y", 1120));
        assert!(!r.is_segment("J", 1120));
        assert!(!r.is_segment("Y", 1121));
    }

    #[test]
    fn test_departs_on() {
        let r = record();
        assert!(r.departs_on(NaiveDate::from_ymd_opt(2019, 6, 15).unwrap()));
        assert!(!r.departs_on(NaiveDate::from_ymd_opt(2018, 6, 15).unwrap()));
        assert_eq!(
            r.departure_date(),
            Some(NaiveDate::from_ymd_opt(2019, 6, 15).unwrap())
        );
    }

    #[test]
    fn test_invalid_departure_date() {
        let mut r = record();
        r.departure_month = 2;
        r.departure_day = 30;
        assert_eq!(r.departure_date(), None);
    }
}
