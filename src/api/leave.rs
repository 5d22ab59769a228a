use crate::api::{fetch_allotment, fetch_leave, fetch_usage, persist_remaining};
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::ApiError;
use crate::ledger::balance;
use crate::ledger::quantity::Quantity;
use crate::ledger::transition::{self, BalanceEffect};
use crate::ledger::validate::{self, RequestShape};
use crate::model::leave::{HalfDayType, LeaveKind, LeaveStatus};
use crate::model::leave_type::LeaveUnit;
use crate::model::role::Role;
use crate::notify;
use actix_web::{HttpResponse, web};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{MySqlPool, prelude::FromRow};
use utoipa::{IntoParams, ToSchema};

/// A leave row joined with its user and leave-type names, the shape every
/// leave endpoint responds with.
#[derive(Serialize, Deserialize, FromRow, ToSchema)]
pub struct LeaveEntry {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = "John Doe")]
    pub user_name: String,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "Annual Leave")]
    pub leave_type_name: String,
    #[schema(example = "days")]
    pub leave_type_unit: String,
    #[schema(example = "request")]
    pub kind: String,
    #[schema(example = "pending")]
    pub status: String,
    #[schema(example = 4.0)]
    pub days: f64,
    pub hours: i64,
    pub minutes: i64,
    pub remaining_days: Option<f64>,
    pub remaining_hours: Option<i64>,
    pub remaining_minutes: Option<i64>,
    pub carry_forward: bool,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: String,
    pub half_day_type: Option<String>,
    pub short_day_time: Option<String>,
    pub approved_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub approved_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub allotted_by: Option<u64>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub allotted_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}

const LEAVE_ENTRY_SELECT: &str = r#"
    SELECT l.id, l.user_id, u.name AS user_name, l.leave_type_id,
           lt.name AS leave_type_name, lt.unit AS leave_type_unit,
           l.kind, l.status, l.days, l.hours, l.minutes,
           l.remaining_days, l.remaining_hours, l.remaining_minutes,
           l.carry_forward, l.start_date, l.end_date, l.reason,
           l.half_day_type, l.short_day_time, l.approved_by, l.approved_at,
           l.rejection_reason, l.allotted_by, l.allotted_at, l.created_at
    FROM leaves l
    JOIN users u ON u.id = l.user_id
    JOIN leave_types lt ON lt.id = l.leave_type_id
"#;

async fn fetch_entry(pool: &MySqlPool, id: u64) -> Result<Option<LeaveEntry>, sqlx::Error> {
    let sql = format!("{LEAVE_ENTRY_SELECT} WHERE l.id = ?");
    sqlx::query_as::<_, LeaveEntry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// HR only: list every user's leaves instead of their own
    #[schema(example = true)]
    pub all: Option<bool>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1000)]
    /// Filter by user ID (HR/Admin)
    pub user_id: Option<u64>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveEntry>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/* =========================
List leave records
========================= */
/// Swagger doc for leave_list endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, ApiError> {
    // -------------------------
    // Pagination
    // -------------------------
    let per_page = query.per_page.unwrap_or(10).min(100);
    let page = query.page.unwrap_or(1).max(1);
    let offset = (page - 1) * per_page;

    // Employees always see their own records; HR sees their own unless the
    // allotment page asks for everything; admin sees everything.
    let all = query.all.unwrap_or(false);
    let scope_user: Option<u64> = match auth.role {
        Role::Employee => Some(auth.user_id),
        Role::Hr if !all => Some(auth.user_id),
        _ => query.user_id,
    };

    // -------------------------
    // WHERE clause
    // -------------------------
    // Deduction-history and penalty rows never show up in listings.
    let mut where_sql = String::from(" WHERE l.kind NOT IN ('deduction', 'penalty')");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = scope_user {
        where_sql.push_str(" AND l.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND l.status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leaves l{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await?;

    // -------------------------
    // DATA query
    // -------------------------
    let data_sql = format!(
        r#"
        {LEAVE_ENTRY_SELECT}
        {}
        ORDER BY l.created_at DESC
        LIMIT ? OFFSET ?
        "#,
        where_sql
    );

    let mut data_q = sqlx::query_as::<_, LeaveEntry>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    let mut leaves = data_q
        .bind(per_page)
        .bind(offset)
        .fetch_all(pool.get_ref())
        .await?;

    // -------------------------
    // Fresh balances on allotment rows
    // -------------------------
    // The cached remaining can be stale (deleted approved requests, lost
    // concurrent writes), so every listed allotment is recomputed from its
    // usage history and the result written back.
    for entry in leaves.iter_mut().filter(|l| l.kind == "allotment") {
        let unit: LeaveUnit = entry.leave_type_unit.parse().unwrap_or(LeaveUnit::Days);
        let total_quantity = Quantity::from_parts(unit, entry.days, entry.hours, entry.minutes);
        let usage = fetch_usage(pool.get_ref(), entry.user_id, entry.leave_type_id).await?;
        let remaining = balance::remaining(total_quantity, &usage, None);

        persist_remaining(pool.get_ref(), entry.id, remaining).await?;

        match remaining {
            Quantity::Days(d) => entry.remaining_days = Some(d),
            Quantity::Minutes(_) => {
                entry.remaining_hours = Some(remaining.hours_part());
                entry.remaining_minutes = Some(remaining.minutes_part());
            }
        }
    }

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page as u32,
        per_page: per_page as u32,
        total,
    }))
}

/// for getting a leave record details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to fetch")
    ),
    responses(
        (status = 200, description = "Leave record found", body = LeaveEntry),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    match fetch_entry(pool.get_ref(), leave_id).await? {
        Some(entry) => Ok(HttpResponse::Ok().json(entry)),
        None => Err(ApiError::NotFound("Leave")),
    }
}

/* =========================
Create leave request
========================= */
#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "2026-03-02", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-03-05", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family vacation")]
    pub reason: String,
    /// Fixed half a day when set; overrides short-day times
    pub half_day_type: Option<HalfDayType>,
    #[schema(example = "09:00")]
    pub short_day_from: Option<String>,
    #[schema(example = "09:45")]
    pub short_day_to: Option<String>,
}

/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted successfully", body = Object,
         example = json!({
            "message": "Leave request submitted successfully"
         })
        ),
        (status = 400, description = "Bad request"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    payload: web::Json<CreateLeave>,
) -> Result<HttpResponse, ApiError> {
    // 1. validate dates and reason
    if payload.start_date > payload.end_date {
        return Err(ApiError::InvalidInput(
            "start_date cannot be after end_date".into(),
        ));
    }

    if payload.reason.trim().is_empty() {
        return Err(ApiError::InvalidInput("All fields are required".into()));
    }

    // 2. validate leave type
    let leave_type = crate::utils::leave_type_cache::get(pool.get_ref(), payload.leave_type_id)
        .await?
        .filter(|lt| lt.is_active)
        .ok_or_else(|| ApiError::InvalidInput("Invalid leave type".into()))?;

    // 3. work out the request shape and quantity
    let shape = if let Some(half) = payload.half_day_type {
        RequestShape::HalfDay(half)
    } else if let (Some(from_raw), Some(to_raw)) =
        (payload.short_day_from.as_deref(), payload.short_day_to.as_deref())
    {
        let from = validate::parse_time_of_day(from_raw)
            .ok_or_else(|| ApiError::InvalidInput("Invalid time format. Expected HH:MM".into()))?;
        let to = validate::parse_time_of_day(to_raw)
            .ok_or_else(|| ApiError::InvalidInput("Invalid time format. Expected HH:MM".into()))?;
        if to < from {
            return Err(ApiError::InvalidInput(
                "short_day_to must not be before short_day_from".into(),
            ));
        }
        RequestShape::ShortDay { from, to }
    } else {
        RequestShape::FullDays
    };

    let requested = validate::requested_quantity(
        shape,
        leave_type.unit,
        payload.start_date,
        payload.end_date,
    );

    // 4. employees must hold an allotment that covers the request;
    //    admin/HR-created requests skip the balance check
    if auth.is_employee() {
        let allotment = fetch_allotment(pool.get_ref(), auth.user_id, payload.leave_type_id)
            .await?
            .ok_or(ApiError::NoAllotment)?;

        let total = Quantity::from_parts(
            leave_type.unit,
            allotment.days,
            allotment.hours,
            allotment.minutes,
        );
        let usage = fetch_usage(pool.get_ref(), auth.user_id, payload.leave_type_id).await?;
        let remaining = balance::remaining(total, &usage, None);

        validate::ensure_covered(remaining, requested)?;
    }

    // 5. persist as pending; nothing is deducted until approval
    let (days, hours, minutes) = match requested {
        Quantity::Days(d) => (d, 0i64, 0i64),
        Quantity::Minutes(_) => (0.0, requested.hours_part(), requested.minutes_part()),
    };

    let short_day_time = match shape {
        RequestShape::ShortDay { .. } => Some(format!(
            "{}-{}",
            payload.short_day_from.as_deref().unwrap_or("").trim(),
            payload.short_day_to.as_deref().unwrap_or("").trim()
        )),
        _ => None,
    };

    let result = sqlx::query(
        r#"
        INSERT INTO leaves
            (user_id, leave_type_id, kind, status, days, hours, minutes,
             start_date, end_date, reason, half_day_type, short_day_time)
        VALUES (?, ?, 'request', 'pending', ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type_id)
    .bind(days)
    .bind(hours)
    .bind(minutes)
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.trim())
    .bind(payload.half_day_type.map(|h| h.to_string()))
    .bind(short_day_time.clone())
    .execute(pool.get_ref())
    .await?;

    let leave_id = result.last_insert_id();

    let entry = fetch_entry(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::Server)?;

    // Best-effort heads-up to the approvers when an employee applies
    if auth.is_employee() {
        notify::spawn_notify(
            config.notify_webhook_url.clone(),
            "leave.requested",
            notify::LeaveRequestedEvent {
                employee_name: entry.user_name.clone(),
                employee_email: fetch_user_email(pool.get_ref(), auth.user_id)
                    .await?
                    .unwrap_or_default(),
                leave_type: leave_type.name.clone(),
                reason: entry.reason.clone(),
                days: entry.days,
                start_date: notify::format_notify_date(entry.start_date),
                end_date: notify::format_notify_date(entry.end_date),
                half_day_type: entry.half_day_type.clone(),
                short_day_time: entry.short_day_time.clone(),
                hours: (leave_type.unit == LeaveUnit::Time).then_some(entry.hours),
                minutes: (leave_type.unit == LeaveUnit::Time).then_some(entry.minutes),
            },
        );
    }

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave request submitted successfully",
        "leave": entry
    })))
}

async fn fetch_user_email(pool: &MySqlPool, user_id: u64) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT email FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/* =========================
Approve / reject leave (HR/Admin)
========================= */
#[derive(Deserialize, ToSchema)]
pub struct UpdateLeaveStatus {
    #[schema(example = "approved")]
    pub status: String,
    pub rejection_reason: Option<String>,
}

/// Swagger doc for update_leave_status endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/status",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to transition")
    ),
    request_body = UpdateLeaveStatus,
    responses(
        (status = 200, description = "Leave transitioned successfully", body = Object, example = json!({
            "message": "Leave approved successfully"
        })),
        (status = 400, description = "Invalid status or not a request"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    payload: web::Json<UpdateLeaveStatus>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let leave_id = path.into_inner();

    // Only approved/rejected are reachable; nothing transitions back to pending.
    let next: LeaveStatus = payload
        .status
        .parse()
        .ok()
        .filter(|s| matches!(s, LeaveStatus::Approved | LeaveStatus::Rejected))
        .ok_or_else(|| ApiError::InvalidInput("Invalid status".into()))?;

    let leave = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave"))?;

    if leave.kind() != Some(LeaveKind::Request) {
        return Err(ApiError::InvalidInput(
            "Status can only be changed on leave requests".into(),
        ));
    }

    if auth.role == Role::Hr && leave.user_id == auth.user_id {
        return Err(ApiError::SelfApprovalForbidden);
    }

    let previous = leave.status().unwrap_or(LeaveStatus::Pending);

    let leave_type = crate::utils::leave_type_cache::get(pool.get_ref(), leave.leave_type_id).await?;
    let (type_name, unit) = match &leave_type {
        Some(lt) => (lt.name.clone(), lt.unit),
        None => ("leave".to_string(), LeaveUnit::Days),
    };

    // Reconcile the allotment's cached balance, when the pair has one.
    if let Some(allotment) = fetch_allotment(pool.get_ref(), leave.user_id, leave.leave_type_id).await? {
        let total = Quantity::from_parts(unit, allotment.days, allotment.hours, allotment.minutes);
        let usage = fetch_usage(pool.get_ref(), leave.user_id, leave.leave_type_id).await?;
        // The transitioning request never counts against itself.
        let remaining = balance::remaining(total, &usage, Some(leave.id));
        let requested = Quantity::from_parts(unit, leave.days, leave.hours, leave.minutes);

        match transition::balance_effect(previous, next, requested, remaining) {
            BalanceEffect::Deduct { new_remaining } => {
                if new_remaining.is_negative() {
                    tracing::warn!(
                        allotment_id = allotment.id,
                        "Allotment balance went negative; run the recalculation pass"
                    );
                }
                persist_remaining(pool.get_ref(), allotment.id, new_remaining).await?;

                // Deduction history entry: audit only, excluded from
                // listings and balance sums by kind.
                sqlx::query(
                    r#"
                    INSERT INTO leaves
                        (user_id, leave_type_id, kind, status, days, hours, minutes,
                         start_date, end_date, reason,
                         allotted_by, allotted_at, approved_by, approved_at)
                    VALUES (?, ?, 'deduction', 'approved', ?, ?, ?, ?, ?, ?, ?, NOW(), ?, NOW())
                    "#,
                )
                .bind(leave.user_id)
                .bind(leave.leave_type_id)
                .bind(leave.days)
                .bind(leave.hours)
                .bind(leave.minutes)
                .bind(leave.start_date)
                .bind(leave.end_date)
                .bind(transition::deduction_reason(requested, &type_name))
                .bind(auth.user_id)
                .bind(auth.user_id)
                .execute(pool.get_ref())
                .await?;
            }
            BalanceEffect::Restore { new_remaining } => {
                persist_remaining(pool.get_ref(), allotment.id, new_remaining).await?;
            }
            BalanceEffect::None => {}
        }
    }

    // Apply the transition to the request itself. A rejection without a
    // reason keeps any previously stored one.
    match (next, payload.rejection_reason.as_deref()) {
        (LeaveStatus::Approved, _) => {
            sqlx::query(
                "UPDATE leaves SET status = ?, approved_by = ?, approved_at = NOW(), rejection_reason = NULL WHERE id = ?",
            )
            .bind(next.to_string())
            .bind(auth.user_id)
            .bind(leave_id)
            .execute(pool.get_ref())
            .await?;
        }
        (_, Some(reason)) => {
            sqlx::query(
                "UPDATE leaves SET status = ?, approved_by = ?, approved_at = NOW(), rejection_reason = ? WHERE id = ?",
            )
            .bind(next.to_string())
            .bind(auth.user_id)
            .bind(reason)
            .bind(leave_id)
            .execute(pool.get_ref())
            .await?;
        }
        (_, None) => {
            sqlx::query(
                "UPDATE leaves SET status = ?, approved_by = ?, approved_at = NOW() WHERE id = ?",
            )
            .bind(next.to_string())
            .bind(auth.user_id)
            .bind(leave_id)
            .execute(pool.get_ref())
            .await?;
        }
    }

    let entry = fetch_entry(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave"))?;

    notify::spawn_notify(
        config.notify_webhook_url.clone(),
        "leave.status_changed",
        notify::LeaveStatusEvent {
            employee_name: entry.user_name.clone(),
            employee_email: fetch_user_email(pool.get_ref(), entry.user_id)
                .await?
                .unwrap_or_default(),
            leave_type: type_name,
            days: entry.days,
            start_date: notify::format_notify_date(entry.start_date),
            end_date: notify::format_notify_date(entry.end_date),
            status: next.to_string(),
            rejection_reason: entry.rejection_reason.clone(),
            approved_by: Some(auth.username.clone()),
            hours: (unit == LeaveUnit::Time).then_some(entry.hours),
            minutes: (unit == LeaveUnit::Time).then_some(entry.minutes),
        },
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": format!("Leave {} successfully", next),
        "leave": entry
    })))
}

/* =========================
Delete leave
========================= */
/// Swagger doc for delete_leave endpoint
#[utoipa::path(
    delete,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave record to delete")
    ),
    responses(
        (status = 200, description = "Leave deleted successfully", body = Object, example = json!({
            "message": "Leave deleted successfully"
        })),
        (status = 400, description = "Request is not deletable"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave record not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<HttpResponse, ApiError> {
    let leave_id = path.into_inner();

    let leave = fetch_leave(pool.get_ref(), leave_id)
        .await?
        .ok_or(ApiError::NotFound("Leave"))?;

    if auth.is_employee() {
        if leave.user_id != auth.user_id {
            return Err(ApiError::Forbidden(
                "You can only delete your own leave requests",
            ));
        }
        if leave.status() != Some(LeaveStatus::Pending) {
            return Err(ApiError::InvalidInput(
                "You can only delete pending leave requests".into(),
            ));
        }
    }

    // Deleting an approved request does NOT restore the cached balance;
    // the recalculation pass is the repair path.
    sqlx::query("DELETE FROM leaves WHERE id = ?")
        .bind(leave_id)
        .execute(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave deleted successfully"
    })))
}
