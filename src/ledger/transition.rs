//! The approval state machine. Given a status change on a request and the
//! freshly computed remaining balance (excluding the request itself), this
//! decides what happens to the allotment's cached balance. The caller
//! persists the effect and writes the deduction audit entry.

use crate::ledger::quantity::{Quantity, format_days};
use crate::model::leave::LeaveStatus;

/// Side effect of a status transition on the allotment's cached remaining
/// balance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceEffect {
    /// Entering `approved`: deduct the requested amount. Unclamped on
    /// purpose; concurrent approvals may overdraw the cache and the bulk
    /// recalculation pass repairs it.
    Deduct { new_remaining: Quantity },
    /// Leaving `approved` for `rejected`: the request no longer counts, so
    /// the cache reverts to the recomputed (clamped) remaining.
    Restore { new_remaining: Quantity },
    /// No balance movement (pending → rejected, or a no-op re-approval).
    None,
}

/// `remaining_excluding_self` must come from the Balance Calculator with
/// the transitioning request's id excluded, so a record never counts
/// against itself. Re-approving an already-approved request therefore
/// yields `None`: its deduction is already reflected.
pub fn balance_effect(
    previous: LeaveStatus,
    next: LeaveStatus,
    requested: Quantity,
    remaining_excluding_self: Quantity,
) -> BalanceEffect {
    match (previous, next) {
        (prev, LeaveStatus::Approved) if prev != LeaveStatus::Approved => BalanceEffect::Deduct {
            new_remaining: remaining_excluding_self.minus(requested),
        },
        (LeaveStatus::Approved, LeaveStatus::Rejected) => BalanceEffect::Restore {
            new_remaining: remaining_excluding_self,
        },
        _ => BalanceEffect::None,
    }
}

/// Audit reason written on the synthetic deduction entry.
pub fn deduction_reason(deducted: Quantity, leave_type_name: &str) -> String {
    match deducted {
        Quantity::Days(d) => format!(
            "Leave deduction: {} day(s) deducted from allotted {} balance",
            format_days(d),
            leave_type_name
        ),
        Quantity::Minutes(_) => format!(
            "Leave deduction: {}h {}m deducted from allotted {} balance",
            deducted.hours_part(),
            deducted.minutes_part(),
            leave_type_name
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::balance::{UsageRecord, remaining};

    fn day_use(id: u64, days: f64) -> UsageRecord {
        UsageRecord {
            id,
            days,
            hours: 0,
            minutes: 0,
        }
    }

    #[test]
    fn approving_a_pending_request_deducts() {
        // 10 days allotted, nothing used yet, 4 requested.
        let left = remaining(Quantity::Days(10.0), &[], None);
        let effect = balance_effect(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Quantity::Days(4.0),
            left,
        );
        assert_eq!(
            effect,
            BalanceEffect::Deduct {
                new_remaining: Quantity::Days(6.0)
            }
        );
    }

    #[test]
    fn re_approving_an_approved_request_does_not_double_deduct() {
        let effect = balance_effect(
            LeaveStatus::Approved,
            LeaveStatus::Approved,
            Quantity::Days(4.0),
            Quantity::Days(6.0),
        );
        assert_eq!(effect, BalanceEffect::None);
    }

    #[test]
    fn rejecting_an_approved_request_restores() {
        // The 4-day request being rejected is excluded from the usage sum,
        // so the cache reverts to the full 10.
        let usage = [day_use(42, 4.0)];
        let left = remaining(Quantity::Days(10.0), &usage, Some(42));
        let effect = balance_effect(
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
            Quantity::Days(4.0),
            left,
        );
        assert_eq!(
            effect,
            BalanceEffect::Restore {
                new_remaining: Quantity::Days(10.0)
            }
        );
    }

    #[test]
    fn rejecting_a_pending_request_moves_nothing() {
        let effect = balance_effect(
            LeaveStatus::Pending,
            LeaveStatus::Rejected,
            Quantity::Days(4.0),
            Quantity::Days(10.0),
        );
        assert_eq!(effect, BalanceEffect::None);
    }

    #[test]
    fn approving_a_previously_rejected_request_deducts() {
        let effect = balance_effect(
            LeaveStatus::Rejected,
            LeaveStatus::Approved,
            Quantity::Days(3.0),
            Quantity::Days(5.0),
        );
        assert_eq!(
            effect,
            BalanceEffect::Deduct {
                new_remaining: Quantity::Days(2.0)
            }
        );
    }

    #[test]
    fn deduction_may_overdraw_the_cache() {
        // Racing approvals both read remaining = 3; the second write lands
        // at -1 rather than silently clamping the loss away.
        let effect = balance_effect(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Quantity::Days(4.0),
            Quantity::Days(3.0),
        );
        assert_eq!(
            effect,
            BalanceEffect::Deduct {
                new_remaining: Quantity::Days(-1.0)
            }
        );
    }

    #[test]
    fn annual_leave_scenario() {
        // Allot 10 days. Approve a 4-day request: remaining 6. A further
        // 7-day request must then fail the balance check with both values
        // in the message.
        let after_first = balance_effect(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Quantity::Days(4.0),
            remaining(Quantity::Days(10.0), &[], None),
        );
        let BalanceEffect::Deduct { new_remaining } = after_first else {
            panic!("expected a deduction");
        };
        assert_eq!(new_remaining, Quantity::Days(6.0));

        let usage = [day_use(1, 4.0)];
        let left = remaining(Quantity::Days(10.0), &usage, None);
        let err = crate::ledger::validate::ensure_covered(left, Quantity::Days(7.0)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient leave balance. You have 6 days remaining, but requested 7 days."
        );
    }

    #[test]
    fn short_day_scenario() {
        // Allot 1h. Approve a 09:00-09:45 request: 15 minutes remain.
        let left = remaining(Quantity::Minutes(60), &[], None);
        let effect = balance_effect(
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            Quantity::Minutes(45),
            left,
        );
        let BalanceEffect::Deduct { new_remaining } = effect else {
            panic!("expected a deduction");
        };
        assert_eq!(new_remaining, Quantity::Minutes(15));
        assert_eq!(new_remaining.hours_part(), 0);
        assert_eq!(new_remaining.minutes_part(), 15);
    }

    #[test]
    fn deduction_reasons() {
        assert_eq!(
            deduction_reason(Quantity::Days(4.0), "Annual Leave"),
            "Leave deduction: 4 day(s) deducted from allotted Annual Leave balance"
        );
        assert_eq!(
            deduction_reason(Quantity::Minutes(75), "ShortDay"),
            "Leave deduction: 1h 15m deducted from allotted ShortDay balance"
        );
    }
}
