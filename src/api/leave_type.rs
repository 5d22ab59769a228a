use crate::auth::auth::AuthUser;
use crate::error::ApiError;
use crate::model::leave_type::{LeaveTypeRow, LeaveUnit};
use crate::utils::leave_type_cache::{self, CachedLeaveType};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateLeaveType {
    #[schema(example = "Annual Leave")]
    pub name: String,
    pub description: Option<String>,
    /// "days" (default) or "time" for short-day leave
    #[schema(example = "days")]
    pub unit: Option<String>,
    #[schema(example = 30.0)]
    pub max_days: Option<f64>,
}

/// Swagger doc for list_leave_types endpoint
#[utoipa::path(
    get,
    path = "/api/leave-types",
    responses(
        (status = 200, description = "Leave type list", body = [LeaveTypeRow]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "LeaveType"
)]
pub async fn list_leave_types(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> Result<HttpResponse, ApiError> {
    let types = sqlx::query_as::<_, LeaveTypeRow>(
        "SELECT * FROM leave_types WHERE is_active = TRUE ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "data": types })))
}

/// Swagger doc for create_leave_type endpoint
#[utoipa::path(
    post,
    path = "/api/leave-types",
    request_body = CreateLeaveType,
    responses(
        (status = 201, description = "Leave type created", body = LeaveTypeRow),
        (status = 400, description = "Invalid or duplicate leave type"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "LeaveType"
)]
pub async fn create_leave_type(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeaveType>,
) -> Result<HttpResponse, ApiError> {
    auth.require_hr_or_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::InvalidInput("Leave type name is required".into()));
    }

    let unit: LeaveUnit = match payload.unit.as_deref() {
        None => LeaveUnit::Days,
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::InvalidInput("Invalid unit. Expected 'days' or 'time'".into()))?,
    };

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM leave_types WHERE name = ? LIMIT 1)",
    )
    .bind(name)
    .fetch_one(pool.get_ref())
    .await?;

    if exists {
        return Err(ApiError::InvalidInput("Leave type already exists".into()));
    }

    let result = sqlx::query(
        "INSERT INTO leave_types (name, description, unit, max_days) VALUES (?, ?, ?, ?)",
    )
    .bind(name)
    .bind(payload.description.as_deref())
    .bind(unit.to_string())
    .bind(payload.max_days)
    .execute(pool.get_ref())
    .await?;

    let created = sqlx::query_as::<_, LeaveTypeRow>("SELECT * FROM leave_types WHERE id = ?")
        .bind(result.last_insert_id())
        .fetch_one(pool.get_ref())
        .await?;

    leave_type_cache::store(CachedLeaveType {
        id: created.id,
        name: created.name.clone(),
        unit,
        is_active: created.is_active,
    })
    .await;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Leave type created successfully",
        "leave_type": created
    })))
}
