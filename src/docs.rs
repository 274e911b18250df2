use crate::api::attendance::{
    AttendanceListResponse, AttendanceQuery, EntryRequest, ExitRequest, PresenceResponse,
};
use crate::api::dashboard::RevenueQuery;
use crate::api::membership::{ExpiryQuery, PlanEndQuery, PlanEndResponse};
use crate::model::attendance::{AttendanceView, SessionState};
use crate::model::membership::{Alert, ExpiryView, MembershipPlan, MembershipView};
use crate::model::payment::PaymentView;
use crate::utils::report::{
    DashboardSummary, MembershipBreakdown, PlanCount, RevenuePoint, RevenueReport,
};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Boxing Club Dashboard API",
        version = "1.0.0",
        description = r#"
## Boxing Club Dashboard

Backend for the administrative dashboard of a boxing club. It reads athletes,
memberships, payments and attendance from the club's REST API and returns
rows that are ready to display.

### 🔹 Key Features
- **Attendance**
  - Daily attendance list with normalized dates and durations
  - Athletes currently inside the facility with live elapsed time
  - Entry and exit registration with validation
- **Memberships**
  - Expiring memberships with days remaining and alerts
  - Membership table with normalized dates and prices
  - Plan end date calculation
- **Payments**
  - Payment table with normalized dates and amounts
- **Dashboard**
  - Summary cards, daily income report and memberships per plan

### 🔐 Security
Every endpoint requires the **Bearer token** issued by the club API; it is
forwarded unchanged.

---
Built with **Rust**, **Actix Web**, **reqwest**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::list_attendance,
        crate::api::attendance::present_athletes,
        crate::api::attendance::register_entry,
        crate::api::attendance::register_exit,

        crate::api::membership::list_memberships,
        crate::api::membership::expiring_memberships,
        crate::api::membership::membership_alerts,
        crate::api::membership::plan_end,

        crate::api::dashboard::summary,
        crate::api::dashboard::revenue,
        crate::api::dashboard::memberships_by_type,

        crate::api::payment::list_payments
    ),
    components(
        schemas(
            AttendanceQuery,
            AttendanceView,
            AttendanceListResponse,
            PresenceResponse,
            SessionState,
            EntryRequest,
            ExitRequest,
            ExpiryQuery,
            ExpiryView,
            MembershipView,
            Alert,
            PlanEndQuery,
            PlanEndResponse,
            MembershipPlan,
            RevenueQuery,
            DashboardSummary,
            RevenuePoint,
            RevenueReport,
            PlanCount,
            MembershipBreakdown,
            PaymentView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance check-in/check-out APIs"),
        (name = "Membership", description = "Membership expiry and plan APIs"),
        (name = "Payments", description = "Payment listing APIs"),
        (name = "Dashboard", description = "Summary and report APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}
