use crate::api::{fetch_allotment, fetch_leave, persist_remaining};
use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::ledger::balance::{self, UsageRecord};
use crate::ledger::quantity::Quantity;
use crate::model::leave_type::LeaveUnit;
use actix_web::{HttpResponse, web};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::MySqlPool;
use std::collections::HashMap;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AllotLeave {
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    /// Required for day-unit leave types
    #[schema(example = 10.0)]
    pub days: Option<f64>,
    /// Required (with minutes) for time-unit leave types
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    pub carry_forward: Option<bool>,
    pub reason: Option<String>,
}

/* =========================
Allot leave to an employee (HR/Admin)
========================= */
/// Swagger doc for allot_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave/allot",
    request_body = AllotLeave,
    responses(
        (status = 201, description = "Leave allotted successfully", body = Object, example = json!({
            "message": "Leave allotted successfully"
        })),
        (status = 400, description = "Invalid quantity or already allotted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Allotment"
)]
pub async fn allot_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AllotLeave>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let leave_type = crate::utils::leave_type_cache::get(pool.get_ref(), payload.leave_type_id)
        .await?
        .filter(|lt| lt.is_active)
        .ok_or_else(|| ApiError::InvalidInput("Invalid leave type".into()))?;

    let user_exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ? LIMIT 1)",
    )
    .bind(payload.user_id)
    .fetch_one(pool.get_ref())
    .await?;

    if !user_exists {
        return Err(ApiError::NotFound("User"));
    }

    // Unit-appropriate quantity, normalized so minutes never exceed 59.
    let total = match leave_type.unit {
        LeaveUnit::Time => {
            let hours = payload.hours.unwrap_or(0);
            let minutes = payload.minutes.unwrap_or(0);
            if hours < 0 || minutes < 0 || (hours == 0 && minutes == 0) {
                return Err(ApiError::InvalidInput(
                    "Hours and minutes are required for a time-unit leave type".into(),
                ));
            }
            Quantity::Minutes(hours * 60 + minutes)
        }
        LeaveUnit::Days => {
            let days = payload.days.unwrap_or(0.0);
            if !(days > 0.0) {
                return Err(ApiError::InvalidInput("Invalid days value".into()));
            }
            Quantity::Days(days)
        }
    };

    // At most one allotment per (user, leave type)
    if fetch_allotment(pool.get_ref(), payload.user_id, payload.leave_type_id)
        .await?
        .is_some()
    {
        return Err(ApiError::DuplicateAllotment(leave_type.name));
    }

    let start_date: NaiveDate = Utc::now().date_naive();
    let end_date: NaiveDate = match total {
        Quantity::Days(d) => start_date
            .checked_add_days(Days::new((d.ceil() as u64).saturating_sub(1)))
            .unwrap_or(start_date),
        Quantity::Minutes(_) => start_date,
    };

    let (days, hours, minutes) = match total {
        Quantity::Days(d) => (d, 0i64, 0i64),
        Quantity::Minutes(_) => (0.0, total.hours_part(), total.minutes_part()),
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (user_id, leave_type_id, kind, status, days, hours, minutes,
             remaining_days, remaining_hours, remaining_minutes,
             carry_forward, start_date, end_date, reason,
             allotted_by, allotted_at, approved_by, approved_at)
        VALUES (?, ?, 'allotment', 'approved', ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NOW(), ?, NOW())
        "#,
    )
    .bind(payload.user_id)
    .bind(payload.leave_type_id)
    .bind(days)
    .bind(hours)
    .bind(minutes)
    .bind(match total {
        Quantity::Days(d) => Some(d),
        Quantity::Minutes(_) => None,
    })
    .bind(match total {
        Quantity::Minutes(_) => Some(total.hours_part()),
        Quantity::Days(_) => None,
    })
    .bind(match total {
        Quantity::Minutes(_) => Some(total.minutes_part()),
        Quantity::Days(_) => None,
    })
    .bind(payload.carry_forward.unwrap_or(false))
    .bind(start_date)
    .bind(end_date)
    .bind(payload.reason.as_deref().unwrap_or("Allotted by admin/HR"))
    .bind(auth.user_id)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await?;

    let allotment = fetch_leave(pool.get_ref(), result.last_insert_id())
        .await?
        .ok_or(ApiError::Server)?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave allotted successfully",
        "leave": allotment
    })))
}

/* =========================
Edit an allotment (HR/Admin)
========================= */
#[derive(Deserialize, ToSchema)]
pub struct UpdateAllotment {
    /// Reassign the allotment to another leave type of the same unit
    pub leave_type_id: Option<u64>,
    #[schema(example = 12.0)]
    pub days: Option<f64>,
    pub hours: Option<i64>,
    pub minutes: Option<i64>,
    #[schema(example = "2026-01-01", format = "date", value_type = Option<String>)]
    pub start_date: Option<NaiveDate>,
    #[schema(example = "2026-12-31", format = "date", value_type = Option<String>)]
    pub end_date: Option<NaiveDate>,
    pub reason: Option<String>,
    pub carry_forward: Option<bool>,
}

// Helper enum for typed SQLx binding
enum SqlValue {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    Str(String),
}

/// Swagger doc for edit_allotment endpoint
#[utoipa::path(
    patch,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the allotment to edit")
    ),
    request_body = UpdateAllotment,
    responses(
        (status = 200, description = "Allotment updated successfully", body = Object, example = json!({
            "message": "Leave updated successfully"
        })),
        (status = 400, description = "Not an allotment or invalid fields"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Allotment"
)]
pub async fn edit_allotment(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAllotment>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    let leave = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave"))?;

    if !leave.is_allotment() {
        return Err(ApiError::InvalidInput("Cannot edit non-allotted leave".into()));
    }

    let current_type = crate::utils::leave_type_cache::get(pool.get_ref(), leave.leave_type_id)
        .await?
        .ok_or_else(|| ApiError::InvalidInput("Invalid leave type".into()))?;

    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();

    if let Some(new_type_id) = payload.leave_type_id {
        if new_type_id != leave.leave_type_id {
            let new_type = crate::utils::leave_type_cache::get(pool.get_ref(), new_type_id)
                .await?
                .ok_or_else(|| ApiError::InvalidInput("Invalid leave type".into()))?;

            if new_type.unit != current_type.unit {
                return Err(ApiError::InvalidInput(
                    "Cannot move an allotment to a leave type with a different unit".into(),
                ));
            }

            if fetch_allotment(pool.get_ref(), leave.user_id, new_type_id)
                .await?
                .is_some()
            {
                return Err(ApiError::DuplicateAllotment(new_type.name));
            }

            sets.push("leave_type_id = ?");
            values.push(SqlValue::U64(new_type_id));
        }
    }

    // Editing the quantity resets the cached remaining to the new total.
    match current_type.unit {
        LeaveUnit::Days => {
            if let Some(days) = payload.days {
                if !(days > 0.0) {
                    return Err(ApiError::InvalidInput("Invalid days value".into()));
                }
                sets.push("days = ?");
                values.push(SqlValue::F64(days));
                sets.push("remaining_days = ?");
                values.push(SqlValue::F64(days));
            }
        }
        LeaveUnit::Time => {
            if payload.hours.is_some() || payload.minutes.is_some() {
                let hours = payload.hours.unwrap_or(0);
                let minutes = payload.minutes.unwrap_or(0);
                if hours < 0 || minutes < 0 || (hours == 0 && minutes == 0) {
                    return Err(ApiError::InvalidInput("Invalid hours/minutes value".into()));
                }
                let total = Quantity::Minutes(hours * 60 + minutes);
                sets.push("hours = ?");
                values.push(SqlValue::I64(total.hours_part()));
                sets.push("minutes = ?");
                values.push(SqlValue::I64(total.minutes_part()));
                sets.push("remaining_hours = ?");
                values.push(SqlValue::I64(total.hours_part()));
                sets.push("remaining_minutes = ?");
                values.push(SqlValue::I64(total.minutes_part()));
            }
        }
    }

    if let Some(start_date) = payload.start_date {
        sets.push("start_date = ?");
        values.push(SqlValue::Date(start_date));
    }

    if let Some(end_date) = payload.end_date {
        sets.push("end_date = ?");
        values.push(SqlValue::Date(end_date));
    }

    if let Some(reason) = &payload.reason {
        sets.push("reason = ?");
        values.push(SqlValue::Str(reason.clone()));
    }

    if let Some(carry_forward) = payload.carry_forward {
        sets.push("carry_forward = ?");
        values.push(SqlValue::Bool(carry_forward));
    }

    if sets.is_empty() {
        return Err(ApiError::InvalidInput("No fields provided for update".into()));
    }

    let sql = format!("UPDATE leaves SET {} WHERE id = ?", sets.join(", "));

    let mut query = sqlx::query(&sql);
    for value in values {
        query = match value {
            SqlValue::U64(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::Str(v) => query.bind(v),
        };
    }
    query.bind(leave_id).execute(pool.get_ref()).await?;

    let updated = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave"))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave updated successfully",
        "leave": updated
    })))
}

/* =========================
Bulk balance reconciliation (HR/Admin)
========================= */
/// Swagger doc for recalculate_balances endpoint
#[utoipa::path(
    post,
    path = "/api/leave/recalculate-balances",
    responses(
        (status = 200, description = "Balances recalculated", body = Object, example = json!({
            "message": "Recalculated balances for 12 allotted leaves",
            "updated": 12
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Allotment"
)]
pub async fn recalculate_balances(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let allotments = sqlx::query_as::<_, (u64, u64, u64, f64, i64, i64, String)>(
        r#"
        SELECT l.id, l.user_id, l.leave_type_id, l.days, l.hours, l.minutes, lt.unit
        FROM leaves l
        JOIN leave_types lt ON lt.id = l.leave_type_id
        WHERE l.kind = 'allotment'
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    if allotments.is_empty() {
        return Ok(HttpResponse::Ok().json(serde_json::json!({
            "message": "Recalculated balances for 0 allotted leaves",
            "updated": 0
        })));
    }

    // One aggregate pass over every approved request, grouped per pair.
    let sums = sqlx::query_as::<_, (u64, u64, f64, i64)>(
        r#"
        SELECT user_id, leave_type_id,
               COALESCE(SUM(days), 0) AS used_days,
               CAST(COALESCE(SUM(hours * 60 + minutes), 0) AS SIGNED) AS used_minutes
        FROM leaves
        WHERE kind = 'request' AND status = 'approved'
        GROUP BY user_id, leave_type_id
        "#,
    )
    .fetch_all(pool.get_ref())
    .await?;

    let used_map: HashMap<(u64, u64), (f64, i64)> = sums
        .into_iter()
        .map(|(user_id, leave_type_id, used_days, used_minutes)| {
            ((user_id, leave_type_id), (used_days, used_minutes))
        })
        .collect();

    let mut updated = 0u64;
    for (id, user_id, leave_type_id, days, hours, minutes, unit) in allotments {
        let unit: LeaveUnit = unit.parse().unwrap_or(LeaveUnit::Days);
        let total = Quantity::from_parts(unit, days, hours, minutes);

        let (used_days, used_minutes) = used_map
            .get(&(user_id, leave_type_id))
            .copied()
            .unwrap_or((0.0, 0));
        let usage = [UsageRecord {
            id: 0,
            days: used_days,
            hours: 0,
            minutes: used_minutes,
        }];

        let remaining = balance::remaining(total, &usage, None);
        persist_remaining(pool.get_ref(), id, remaining).await?;
        updated += 1;
    }

    tracing::info!(updated, "Leave balance reconciliation pass finished");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Recalculated balances for {} allotted leaves", updated),
        "updated": updated
    })))
}
