use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::Deserialize;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::auth::bearer::BearerToken;
use crate::config::Config;
use crate::error::DashboardError;
use crate::model::attendance::sessions_from_records;
use crate::upstream::UpstreamClient;
use crate::utils::report::{
    DashboardSummary, MembershipBreakdown, RevenueReport, build_membership_breakdown,
    build_revenue_at, build_summary_at,
};

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RevenueQuery {
    /// Days to look back (defaults to the configured period)
    #[schema(example = 30)]
    pub period: Option<u32>,
}

/// Summary cards of the home page
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    responses(
        (status = 200, description = "Counts and today's income", body = DashboardSummary),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
#[instrument(skip(token, upstream))]
pub async fn summary(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
) -> Result<impl Responder, DashboardError> {
    let now = Local::now();

    let (athletes, memberships, attendance, payments) = futures::try_join!(
        upstream.active_athletes_count(&token),
        upstream.memberships(&token),
        upstream.attendance_by_date(&token, now.date_naive()),
        upstream.payments(&token),
    )?;

    let sessions = sessions_from_records(attendance);
    let summary: DashboardSummary = build_summary_at(&now, athletes, &memberships, &sessions, &payments);
    Ok(HttpResponse::Ok().json(summary))
}

/// Income per day over a recent period
#[utoipa::path(
    get,
    path = "/api/dashboard/revenue",
    params(RevenueQuery),
    responses(
        (status = 200, description = "Daily income in calendar order", body = RevenueReport),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
#[instrument(skip(token, upstream, config))]
pub async fn revenue(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
    query: web::Query<RevenueQuery>,
) -> Result<impl Responder, DashboardError> {
    let period = query.period.unwrap_or(config.revenue_period_days);
    let payments = upstream.payments(&token).await?;
    let report: RevenueReport = build_revenue_at(&Local::now(), &payments, period);
    Ok(HttpResponse::Ok().json(report))
}

/// Membership count per plan
#[utoipa::path(
    get,
    path = "/api/dashboard/memberships-by-type",
    responses(
        (status = 200, description = "Memberships grouped by plan name", body = MembershipBreakdown),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Dashboard"
)]
#[instrument(skip(token, upstream))]
pub async fn memberships_by_type(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
) -> Result<impl Responder, DashboardError> {
    let memberships = upstream.memberships(&token).await?;
    let breakdown: MembershipBreakdown = build_membership_breakdown(&memberships);
    Ok(HttpResponse::Ok().json(breakdown))
}

#[cfg(test)]
mod tests {
    use crate::api::fake_upstream::{Canned, FakeUpstream};
    use crate::routes;
    use actix_web::{App, test, web};
    use serde_json::json;

    #[actix_web::test]
    async fn memberships_grouped_by_plan() {
        let fake = FakeUpstream::start(Canned {
            memberships: json!([
                { "idMembresia": 1, "nombreTipo": "Mensual" },
                { "idMembresia": 2, "nombreTipo": "Semanal" },
                { "idMembresia": 3, "nombreTipo": "Mensual" }
            ]),
            ..Canned::default()
        });
        let app = test::init_service(
            App::new()
                .app_data(fake.client())
                .app_data(web::Data::new(fake.config.clone()))
                .configure(routes::protected_for_tests),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/dashboard/memberships-by-type")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 3);
        assert_eq!(body["byPlan"][0], json!({ "plan": "Mensual", "count": 2 }));
        assert_eq!(body["byPlan"][1], json!({ "plan": "Semanal", "count": 1 }));

        fake.stop().await;
    }

    #[actix_web::test]
    async fn revenue_on_no_payments_is_zero() {
        let fake = FakeUpstream::start(Canned::default());
        let app = test::init_service(
            App::new()
                .app_data(fake.client())
                .app_data(web::Data::new(fake.config.clone()))
                .configure(routes::protected_for_tests),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/dashboard/revenue?period=7")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["periodDays"], 7);
        assert_eq!(body["totalDisplay"], "$0.00");

        fake.stop().await;
    }
}
