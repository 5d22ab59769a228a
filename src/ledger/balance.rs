//! The Balance Calculator: one pure function computing the remaining
//! balance of an allotment from its approved usage history. Every endpoint
//! that needs a balance goes through here instead of re-deriving the sum
//! with its own filters.

use crate::ledger::quantity::Quantity;

/// An approved, non-synthetic usage row (`kind = 'request'`,
/// `status = 'approved'`) reduced to its quantity columns. Callers are
/// responsible for the kind/status filtering; NULL columns arrive as zero.
#[derive(Debug, Clone, Copy)]
pub struct UsageRecord {
    pub id: u64,
    pub days: f64,
    pub hours: i64,
    pub minutes: i64,
}

impl UsageRecord {
    pub fn total_minutes(&self) -> i64 {
        self.hours * 60 + self.minutes
    }
}

/// Remaining balance of an allotment: total minus the sum of usage, clamped
/// at zero. `exclude` drops one in-flight record from the sum, used when a
/// record is being re-evaluated during a status transition so it never
/// counts against itself.
///
/// Day totals sum day columns; minute totals sum `hours*60 + minutes`.
/// Never negative, never errors.
pub fn remaining(total: Quantity, usage: &[UsageRecord], exclude: Option<u64>) -> Quantity {
    let included = usage.iter().filter(|u| Some(u.id) != exclude);
    match total {
        Quantity::Days(total_days) => {
            let used: f64 = included.map(|u| u.days).sum();
            Quantity::Days((total_days - used).max(0.0))
        }
        Quantity::Minutes(total_minutes) => {
            let used: i64 = included.map(|u| u.total_minutes()).sum();
            Quantity::Minutes((total_minutes - used).max(0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day_use(id: u64, days: f64) -> UsageRecord {
        UsageRecord {
            id,
            days,
            hours: 0,
            minutes: 0,
        }
    }

    fn time_use(id: u64, hours: i64, minutes: i64) -> UsageRecord {
        UsageRecord {
            id,
            days: 0.0,
            hours,
            minutes,
        }
    }

    #[test]
    fn remaining_is_total_minus_usage() {
        let usage = [day_use(1, 4.0), day_use(2, 2.5)];
        assert_eq!(
            remaining(Quantity::Days(10.0), &usage, None),
            Quantity::Days(3.5)
        );
    }

    #[test]
    fn remaining_is_never_negative() {
        let usage = [day_use(1, 8.0), day_use(2, 7.0)];
        assert_eq!(
            remaining(Quantity::Days(10.0), &usage, None),
            Quantity::Days(0.0)
        );
        let usage = [time_use(1, 5, 0)];
        assert_eq!(
            remaining(Quantity::Minutes(60), &usage, None),
            Quantity::Minutes(0)
        );
    }

    #[test]
    fn empty_usage_leaves_the_full_total() {
        assert_eq!(
            remaining(Quantity::Days(10.0), &[], None),
            Quantity::Days(10.0)
        );
    }

    #[test]
    fn short_day_balance_stays_in_minutes() {
        // 2h30m allotted, 1h15m used: 1h15m left, no lossy day conversion.
        let usage = [time_use(1, 1, 15)];
        let left = remaining(Quantity::Minutes(2 * 60 + 30), &usage, None);
        assert_eq!(left, Quantity::Minutes(75));
        assert_eq!(left.hours_part(), 1);
        assert_eq!(left.minutes_part(), 15);
    }

    #[test]
    fn excluded_record_does_not_count_against_itself() {
        let usage = [day_use(7, 4.0), day_use(8, 3.0)];
        assert_eq!(
            remaining(Quantity::Days(10.0), &usage, Some(7)),
            Quantity::Days(7.0)
        );
        // Excluding an id not present changes nothing.
        assert_eq!(
            remaining(Quantity::Days(10.0), &usage, Some(99)),
            Quantity::Days(3.0)
        );
    }

    #[test]
    fn minute_overflow_carries_into_hours() {
        // 90 stored minutes is the same 1h30m as hours=1, minutes=30.
        let usage = [time_use(1, 0, 90)];
        assert_eq!(
            remaining(Quantity::Minutes(180), &usage, None),
            Quantity::Minutes(90)
        );
    }
}
