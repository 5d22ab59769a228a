use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Discriminator for every row in the `leaves` table. Set once at creation,
/// never inferred from free text.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveKind {
    /// An employee leave request.
    Request,
    /// A balance head granted by admin/HR; at most one per (user, leave type).
    Allotment,
    /// System-generated audit entry written when a request is approved.
    Deduction,
    /// Written by external attendance tooling; excluded from listings and sums.
    Penalty,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum HalfDayType {
    FirstHalf,
    SecondHalf,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRow {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub user_id: u64,
    #[schema(example = 2)]
    pub leave_type_id: u64,
    #[schema(example = "request", value_type = String)]
    pub kind: String,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    #[schema(example = 4.0)]
    pub days: f64,
    pub hours: i64,
    pub minutes: i64,
    pub remaining_days: Option<f64>,
    pub remaining_hours: Option<i64>,
    pub remaining_minutes: Option<i64>,
    pub carry_forward: bool,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-04", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family vacation")]
    pub reason: String,
    #[schema(example = "first-half", value_type = Option<String>)]
    pub half_day_type: Option<String>,
    #[schema(example = "09:00-09:45", value_type = Option<String>)]
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

impl LeaveRow {
    pub fn kind(&self) -> Option<LeaveKind> {
        self.kind.parse().ok()
    }

    pub fn status(&self) -> Option<LeaveStatus> {
        self.status.parse().ok()
    }

    pub fn is_allotment(&self) -> bool {
        self.kind() == Some(LeaveKind::Allotment)
    }
}
