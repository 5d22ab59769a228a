use crate::model::leave_type::LeaveUnit;
use std::fmt;

/// A leave amount in the unit of its leave type: fractional days for
/// day-unit types, total minutes for time-unit ("short day") types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Quantity {
    Days(f64),
    Minutes(i64),
}

impl Quantity {
    /// Builds a quantity from raw row columns. Missing columns land here as
    /// zero already; negative garbage is treated the same way.
    pub fn from_parts(unit: LeaveUnit, days: f64, hours: i64, minutes: i64) -> Self {
        match unit {
            LeaveUnit::Days => Quantity::Days(days.max(0.0)),
            LeaveUnit::Time => Quantity::Minutes((hours * 60 + minutes).max(0)),
        }
    }

    /// Subtraction without clamping. An approval deduction may drive the
    /// cached remaining negative when two approvals race; the bulk
    /// recalculation pass is the repair mechanism.
    pub fn minus(self, rhs: Quantity) -> Quantity {
        match (self, rhs) {
            (Quantity::Days(a), Quantity::Days(b)) => Quantity::Days(a - b),
            (Quantity::Minutes(a), Quantity::Minutes(b)) => Quantity::Minutes(a - b),
            (lhs, _) => lhs,
        }
    }

    /// Whether this (remaining) quantity covers a requested one. A request
    /// for exactly the remaining balance is covered.
    pub fn covers(self, requested: Quantity) -> bool {
        match (self, requested) {
            (Quantity::Days(r), Quantity::Days(q)) => q <= r,
            (Quantity::Minutes(r), Quantity::Minutes(q)) => q <= r,
            _ => false,
        }
    }

    pub fn is_negative(self) -> bool {
        match self {
            Quantity::Days(d) => d < 0.0,
            Quantity::Minutes(m) => m < 0,
        }
    }

    /// Hour part of a minute quantity; 0 for day quantities.
    pub fn hours_part(self) -> i64 {
        match self {
            Quantity::Minutes(m) => m.div_euclid(60),
            Quantity::Days(_) => 0,
        }
    }

    /// Minute remainder of a minute quantity; 0 for day quantities.
    pub fn minutes_part(self) -> i64 {
        match self {
            Quantity::Minutes(m) => m.rem_euclid(60),
            Quantity::Days(_) => 0,
        }
    }
}

/// Day counts render as integers when whole, 2 decimals otherwise.
pub fn format_days(days: f64) -> String {
    if days.fract() == 0.0 {
        format!("{}", days as i64)
    } else {
        format!("{days:.2}")
    }
}

/// Duration label in the "2h", "0h 15m", "1h 30m" shape used in balance
/// messages: minutes shown only when non-zero.
pub fn format_duration(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if minutes > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{hours}h")
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Days(d) => write!(f, "{} days", format_days(*d)),
            Quantity::Minutes(m) => write!(f, "{}", format_duration(*m)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_picks_the_unit_column() {
        assert_eq!(
            Quantity::from_parts(LeaveUnit::Days, 4.5, 7, 30),
            Quantity::Days(4.5)
        );
        assert_eq!(
            Quantity::from_parts(LeaveUnit::Time, 4.5, 2, 30),
            Quantity::Minutes(150)
        );
    }

    #[test]
    fn from_parts_defaults_garbage_to_zero() {
        assert_eq!(
            Quantity::from_parts(LeaveUnit::Days, -3.0, 0, 0),
            Quantity::Days(0.0)
        );
        assert_eq!(
            Quantity::from_parts(LeaveUnit::Time, 0.0, -1, -30),
            Quantity::Minutes(0)
        );
    }

    #[test]
    fn minus_is_unclamped() {
        let q = Quantity::Days(2.0).minus(Quantity::Days(5.0));
        assert_eq!(q, Quantity::Days(-3.0));
        assert!(q.is_negative());
    }

    #[test]
    fn exact_balance_is_covered_one_unit_over_is_not() {
        assert!(Quantity::Days(6.0).covers(Quantity::Days(6.0)));
        assert!(!Quantity::Days(6.0).covers(Quantity::Days(7.0)));
        assert!(Quantity::Minutes(45).covers(Quantity::Minutes(45)));
        assert!(!Quantity::Minutes(45).covers(Quantity::Minutes(46)));
    }

    #[test]
    fn day_formatting() {
        assert_eq!(format_days(6.0), "6");
        assert_eq!(format_days(2.5), "2.50");
        assert_eq!(format_days(0.25), "0.25");
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(120), "2h");
        assert_eq!(format_duration(15), "0h 15m");
        assert_eq!(format_duration(75), "1h 15m");
    }
}
