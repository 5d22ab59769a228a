//! Best-effort notification delivery. Events are posted as JSON to the
//! configured webhook; the mail/push fan-out lives behind that endpoint.
//! Delivery failures are logged and swallowed — a leave approval must
//! succeed even when notification delivery does not.

use once_cell::sync::Lazy;
use serde::Serialize;

static HTTP: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

#[derive(Debug, Serialize)]
pub struct LeaveRequestedEvent {
    pub employee_name: String,
    pub employee_email: String,
    pub leave_type: String,
    pub reason: String,
    pub days: f64,
    pub start_date: String,
    pub end_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half_day_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_day_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LeaveStatusEvent {
    pub employee_name: String,
    pub employee_email: String,
    pub leave_type: String,
    pub days: f64,
    pub start_date: String,
    pub end_date: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
}

/// Fire-and-forget: spawns the POST and returns immediately. A missing
/// webhook URL disables notifications entirely.
pub fn spawn_notify<T: Serialize + Send + 'static>(
    webhook_url: Option<String>,
    event: &'static str,
    payload: T,
) {
    let Some(url) = webhook_url else {
        return;
    };

    actix_web::rt::spawn(async move {
        let body = serde_json::json!({ "event": event, "data": payload });

        match HTTP.post(&url).json(&body).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = %resp.status(), event, "Notification endpoint returned an error");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, event, "Failed to deliver notification");
            }
        }
    });
}

/// "Mar 02, 2026" — the date shape used in notification payloads.
pub fn format_notify_date(date: chrono::NaiveDate) -> String {
    date.format("%b %d, %Y").to_string()
}
