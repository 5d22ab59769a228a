use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Every failure an endpoint can surface, mapped onto a status code and a
/// JSON `{"error": ...}` body. Validation errors are raised before any
/// mutation happens.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "Unauthorized")]
    Unauthenticated,

    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),

    #[display(
        fmt = "HR cannot approve their own leave requests. Please contact admin for approval."
    )]
    SelfApprovalForbidden,

    #[display(fmt = "This leave type has not been allotted to you")]
    NoAllotment,

    #[display(fmt = "{}", _0)]
    InsufficientBalance(String),

    #[display(fmt = "{}", _0)]
    InvalidInput(String),

    #[display(fmt = "Already allotted {}", _0)]
    DuplicateAllotment(String),

    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),

    #[display(fmt = "Internal Server Error")]
    Server,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) | ApiError::SelfApprovalForbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Server => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "Database error");
        ApiError::Server
    }
}

impl From<crate::ledger::validate::InsufficientBalance> for ApiError {
    fn from(e: crate::ledger::validate::InsufficientBalance) -> Self {
        ApiError::InsufficientBalance(e.to_string())
    }
}
