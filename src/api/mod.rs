pub mod allotment;
pub mod employee;
pub mod leave;
pub mod leave_type;

use crate::ledger::{Quantity, UsageRecord};
use crate::model::leave::LeaveRow;
use sqlx::MySqlPool;

/// Approved, non-synthetic usage rows for one (user, leave type) pair —
/// exactly the set the Balance Calculator sums over. Deduction and penalty
/// rows are excluded by kind.
pub(crate) async fn fetch_usage(
    pool: &MySqlPool,
    user_id: u64,
    leave_type_id: u64,
) -> Result<Vec<UsageRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, (u64, f64, i64, i64)>(
        r#"
        SELECT id, days, hours, minutes
        FROM leaves
        WHERE user_id = ?
          AND leave_type_id = ?
          AND kind = 'request'
          AND status = 'approved'
        "#,
    )
    .bind(user_id)
    .bind(leave_type_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, days, hours, minutes)| UsageRecord {
            id,
            days,
            hours,
            minutes,
        })
        .collect())
}

/// The balance head for one (user, leave type) pair, if any.
pub(crate) async fn fetch_allotment(
    pool: &MySqlPool,
    user_id: u64,
    leave_type_id: u64,
) -> Result<Option<LeaveRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRow>(
        r#"
        SELECT *
        FROM leaves
        WHERE user_id = ? AND leave_type_id = ? AND kind = 'allotment'
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(leave_type_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn fetch_leave(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<LeaveRow>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRow>("SELECT * FROM leaves WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Writes a freshly computed remaining balance onto an allotment's cached
/// columns, in whichever columns its unit uses.
pub(crate) async fn persist_remaining(
    pool: &MySqlPool,
    allotment_id: u64,
    remaining: Quantity,
) -> Result<(), sqlx::Error> {
    match remaining {
        Quantity::Days(d) => {
            sqlx::query("UPDATE leaves SET remaining_days = ? WHERE id = ?")
                .bind(d)
                .bind(allotment_id)
                .execute(pool)
                .await?;
        }
        Quantity::Minutes(_) => {
            sqlx::query("UPDATE leaves SET remaining_hours = ?, remaining_minutes = ? WHERE id = ?")
                .bind(remaining.hours_part())
                .bind(remaining.minutes_part())
                .bind(allotment_id)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}
