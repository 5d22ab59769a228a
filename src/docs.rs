use crate::api::allotment::{AllotLeave, UpdateAllotment};
use crate::api::employee::{EmployeeListResponse, EmployeeQuery};
use crate::api::leave::{CreateLeave, LeaveEntry, LeaveFilter, LeaveListResponse, UpdateLeaveStatus};
use crate::api::leave_type::CreateLeaveType;
use crate::model::leave::{HalfDayType, LeaveKind, LeaveStatus};
use crate::model::leave_type::{LeaveTypeRow, LeaveUnit};
use crate::model::user::User;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leavedesk API",
        version = "1.0.0",
        description = r#"
## Leave Management Service

This API powers the leave-management side of an HR system: leave types,
per-employee allotments, leave requests and the approval workflow that keeps
every allotment's remaining balance reconciled with its usage history.

### 🔹 Key Features
- **Leave Requests**
  - Apply for full-day, half-day and short-day (hour/minute) leave
  - Balance-checked at request time, deducted at approval time
- **Allotments**
  - Grant a leave-type balance to an employee, day- or time-based
  - Edit quantities, carry-forward flags and leave-type assignment
- **Reconciliation**
  - Deduction history entries on every approval
  - Bulk recalculation pass to repair balance drift

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Approvals and allotments are restricted to **Admin** and **HR** roles.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave::leave_list,
        crate::api::leave::get_leave,
        crate::api::leave::create_leave,
        crate::api::leave::update_leave_status,
        crate::api::leave::delete_leave,

        crate::api::allotment::allot_leave,
        crate::api::allotment::edit_allotment,
        crate::api::allotment::recalculate_balances,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,

        crate::api::employee::list_employees,
        crate::api::employee::get_employee
    ),
    components(
        schemas(
            LeaveFilter,
            LeaveEntry,
            LeaveListResponse,
            CreateLeave,
            UpdateLeaveStatus,
            AllotLeave,
            UpdateAllotment,
            CreateLeaveType,
            LeaveTypeRow,
            HalfDayType,
            LeaveKind,
            LeaveStatus,
            LeaveUnit,
            User,
            EmployeeQuery,
            EmployeeListResponse
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Allotment", description = "Leave allotment and reconciliation APIs"),
        (name = "LeaveType", description = "Leave type APIs"),
        (name = "Employee", description = "Employee lookup APIs"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
