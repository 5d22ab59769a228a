use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A user doubles as the employee record; `role_id` maps via `Role::from_id`.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1000,
        "username": "jdoe",
        "role_id": 3,
        "name": "John Doe",
        "email": "john.doe@company.com",
        "is_active": true
    })
)]
pub struct User {
    #[schema(example = 1000)]
    pub id: u64,

    #[schema(example = "jdoe")]
    pub username: String,

    #[schema(example = 3)]
    pub role_id: u8,

    #[schema(example = "John Doe")]
    pub name: String,

    #[schema(example = "john.doe@company.com", format = "email")]
    pub email: String,

    pub is_active: bool,

    #[schema(format = "date-time", value_type = Option<String>)]
    pub last_login_at: Option<DateTime<Utc>>,

    #[schema(format = "date-time", value_type = Option<String>)]
    pub created_at: Option<DateTime<Utc>>,
}
