//! Request validation: turning a request payload into a ledger quantity and
//! checking it against the remaining balance. Only employee-created
//! requests are balance-checked; admin/HR allotments bypass this module.

use crate::ledger::quantity::{Quantity, format_days, format_duration};
use crate::model::leave::HalfDayType;
use crate::model::leave_type::LeaveUnit;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;

/// How the requested amount is expressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RequestShape {
    /// Whole-day range; quantity is the inclusive day count.
    FullDays,
    /// Fixed half a day, first or second half.
    HalfDay(HalfDayType),
    /// Explicit time-of-day window on a single date.
    ShortDay { from: NaiveTime, to: NaiveTime },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsufficientBalance {
    pub remaining: Quantity,
    pub requested: Quantity,
}

impl fmt::Display for InsufficientBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.remaining, self.requested) {
            (Quantity::Minutes(r), Quantity::Minutes(q)) => write!(
                f,
                "Insufficient leave balance. You have {} remaining, but requested {}.",
                format_duration(r),
                format_duration(q)
            ),
            (r, q) => {
                let days_of = |v: Quantity| match v {
                    Quantity::Days(d) => d,
                    Quantity::Minutes(_) => 0.0,
                };
                write!(
                    f,
                    "Insufficient leave balance. You have {} days remaining, but requested {} days.",
                    format_days(days_of(r)),
                    format_days(days_of(q))
                )
            }
        }
    }
}

impl std::error::Error for InsufficientBalance {}

pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// The quantity a request consumes from its allotment.
///
/// - half-day is a fixed 0.5 days;
/// - a short-day window against a time-unit type is its wall-clock length
///   in minutes; against a day-unit type (legacy requests) it collapses to
///   a day fraction, defaulting to a quarter day when the window is empty;
/// - everything else is the inclusive day count of the date range.
pub fn requested_quantity(
    shape: RequestShape,
    unit: LeaveUnit,
    start: NaiveDate,
    end: NaiveDate,
) -> Quantity {
    match shape {
        RequestShape::HalfDay(_) => Quantity::Days(0.5),
        RequestShape::ShortDay { from, to } => {
            let total_minutes = (to - from).num_minutes();
            match unit {
                LeaveUnit::Time => Quantity::Minutes(total_minutes.max(0)),
                LeaveUnit::Days => {
                    if total_minutes > 0 {
                        Quantity::Days(total_minutes as f64 / 60.0 / 24.0)
                    } else {
                        Quantity::Days(0.25)
                    }
                }
            }
        }
        RequestShape::FullDays => Quantity::Days(((end - start).num_days() + 1) as f64),
    }
}

/// Accepts iff the remaining balance covers the requested amount; a request
/// for exactly the remaining balance passes.
pub fn ensure_covered(
    remaining: Quantity,
    requested: Quantity,
) -> Result<(), InsufficientBalance> {
    if remaining.covers(requested) {
        Ok(())
    } else {
        Err(InsufficientBalance {
            remaining,
            requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn full_days_is_the_inclusive_count() {
        let q = requested_quantity(
            RequestShape::FullDays,
            LeaveUnit::Days,
            d(2026, 3, 2),
            d(2026, 3, 5),
        );
        assert_eq!(q, Quantity::Days(4.0));
        // Same-day request is one day.
        let q = requested_quantity(
            RequestShape::FullDays,
            LeaveUnit::Days,
            d(2026, 3, 2),
            d(2026, 3, 2),
        );
        assert_eq!(q, Quantity::Days(1.0));
    }

    #[test]
    fn half_day_is_fixed() {
        let q = requested_quantity(
            RequestShape::HalfDay(HalfDayType::FirstHalf),
            LeaveUnit::Days,
            d(2026, 3, 2),
            d(2026, 3, 2),
        );
        assert_eq!(q, Quantity::Days(0.5));
    }

    #[test]
    fn short_day_against_time_unit_is_wall_clock_minutes() {
        let q = requested_quantity(
            RequestShape::ShortDay {
                from: t(9, 0),
                to: t(9, 45),
            },
            LeaveUnit::Time,
            d(2026, 3, 2),
            d(2026, 3, 2),
        );
        assert_eq!(q, Quantity::Minutes(45));
    }

    #[test]
    fn short_day_against_day_unit_collapses_to_a_fraction() {
        let q = requested_quantity(
            RequestShape::ShortDay {
                from: t(9, 0),
                to: t(15, 0),
            },
            LeaveUnit::Days,
            d(2026, 3, 2),
            d(2026, 3, 2),
        );
        assert_eq!(q, Quantity::Days(6.0 / 24.0));
    }

    #[test]
    fn empty_short_day_window_defaults_to_quarter_day() {
        let q = requested_quantity(
            RequestShape::ShortDay {
                from: t(9, 0),
                to: t(9, 0),
            },
            LeaveUnit::Days,
            d(2026, 3, 2),
            d(2026, 3, 2),
        );
        assert_eq!(q, Quantity::Days(0.25));
    }

    #[test]
    fn exact_balance_is_accepted_one_over_rejected() {
        assert!(ensure_covered(Quantity::Days(6.0), Quantity::Days(6.0)).is_ok());
        let err = ensure_covered(Quantity::Days(6.0), Quantity::Days(7.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 6 days remaining, but requested 7 days."
        );
        assert!(ensure_covered(Quantity::Minutes(45), Quantity::Minutes(45)).is_ok());
        assert!(ensure_covered(Quantity::Minutes(45), Quantity::Minutes(46)).is_err());
    }

    #[test]
    fn insufficient_message_formats_fractions_and_durations() {
        let err = ensure_covered(Quantity::Days(2.5), Quantity::Days(3.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 2.50 days remaining, but requested 3 days."
        );
        let err = ensure_covered(Quantity::Minutes(75), Quantity::Minutes(120)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 1h 15m remaining, but requested 2h."
        );
    }

    #[test]
    fn time_of_day_parsing() {
        assert_eq!(parse_time_of_day("09:30"), Some(t(9, 30)));
        assert_eq!(parse_time_of_day(" 17:05 "), Some(t(17, 5)));
        assert_eq!(parse_time_of_day("9am"), None);
        assert_eq!(parse_time_of_day(""), None);
    }
}
