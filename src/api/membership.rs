use actix_web::{HttpResponse, Responder, web};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::api::attendance::parse_day;
use crate::auth::bearer::BearerToken;
use crate::config::Config;
use crate::error::DashboardError;
use crate::model::membership::{
    Alert, ExpiryView, MembershipPlan, MembershipView, expiry_alerts, expiry_views_at,
};
use crate::upstream::UpstreamClient;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ExpiryQuery {
    /// Look-ahead window in days (defaults to the configured window)
    #[schema(example = 7)]
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PlanEndQuery {
    #[schema(example = 3)]
    pub plan_id: u8,
    /// Start date (YYYY-MM-DD), today when omitted
    #[schema(example = "2025-01-31")]
    pub start: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanEndResponse {
    #[schema(example = 3)]
    pub plan_id: u8,
    pub plan: MembershipPlan,
    #[schema(example = "Mensual")]
    pub label: String,
    #[schema(example = "2025-01-31")]
    pub start: String,
    #[schema(example = "2025-02-28")]
    pub end: String,
    #[schema(example = "28/02/2025")]
    pub end_display: String,
}

async fn load_expiry_views(
    token: &BearerToken,
    upstream: &UpstreamClient,
    days: u32,
) -> Result<Vec<ExpiryView>, DashboardError> {
    let memberships = upstream.expiring_memberships(token, days).await?;
    Ok(expiry_views_at(&memberships, &Local::now()))
}

/// All memberships, ready for the memberships table
#[utoipa::path(
    get,
    path = "/api/membership",
    responses(
        (status = 200, description = "Memberships with normalized dates and price", body = [MembershipView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Membership"
)]
#[instrument(skip(token, upstream))]
pub async fn list_memberships(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
) -> Result<impl Responder, DashboardError> {
    let memberships = upstream.memberships(&token).await?;
    let views: Vec<MembershipView> = memberships.iter().map(|m| m.view()).collect();
    Ok(HttpResponse::Ok().json(views))
}

/// Memberships close to expiring
#[utoipa::path(
    get,
    path = "/api/membership/expiring",
    params(ExpiryQuery),
    responses(
        (status = 200, description = "Expiring memberships with days remaining", body = [ExpiryView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Membership"
)]
#[instrument(skip(token, upstream, config))]
pub async fn expiring_memberships(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
    query: web::Query<ExpiryQuery>,
) -> Result<impl Responder, DashboardError> {
    let days = query.days.unwrap_or(config.expiry_window_days);
    let views = load_expiry_views(&token, &upstream, days).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Dashboard alerts for expiring memberships
#[utoipa::path(
    get,
    path = "/api/membership/alerts",
    params(ExpiryQuery),
    responses(
        (status = 200, description = "One alert per expiring membership", body = [Alert]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Membership"
)]
#[instrument(skip(token, upstream, config))]
pub async fn membership_alerts(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
    query: web::Query<ExpiryQuery>,
) -> Result<impl Responder, DashboardError> {
    let days = query.days.unwrap_or(config.expiry_window_days);
    let views = load_expiry_views(&token, &upstream, days).await?;
    let alerts: Vec<Alert> = expiry_alerts(&views);
    Ok(HttpResponse::Ok().json(alerts))
}

/// End date of a plan starting on a given day
#[utoipa::path(
    get,
    path = "/api/membership/plan-end",
    params(PlanEndQuery),
    responses(
        (status = 200, description = "Computed end date", body = PlanEndResponse),
        (status = 400, description = "Unknown plan or malformed date")
    ),
    security(("bearer_auth" = [])),
    tag = "Membership"
)]
#[instrument]
pub async fn plan_end(query: web::Query<PlanEndQuery>) -> Result<impl Responder, DashboardError> {
    let plan = MembershipPlan::from_id(query.plan_id).ok_or(DashboardError::UnknownPlan(query.plan_id))?;
    let start = parse_day(query.start.as_deref())?;
    let end = plan
        .end_date(start)
        .ok_or_else(|| DashboardError::MalformedDateShape(start.to_string()))?;

    Ok(HttpResponse::Ok().json(PlanEndResponse {
        plan_id: plan.id(),
        plan,
        label: plan.label().to_string(),
        start: start.format("%Y-%m-%d").to_string(),
        end: end.format("%Y-%m-%d").to_string(),
        end_display: end.format("%d/%m/%Y").to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::fake_upstream::{Canned, FakeUpstream};
    use crate::config::Config;
    use crate::routes;
    use crate::upstream::UpstreamClient;
    use actix_web::{App, http::StatusCode, test, web};
    use serde_json::json;

    #[actix_web::test]
    async fn plan_end_for_month_end_start() {
        let config = Config::default();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(UpstreamClient::new(&config).unwrap()))
                .app_data(web::Data::new(config))
                .configure(routes::protected_for_tests),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/membership/plan-end?plan_id=3&start=2025-01-31")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["plan"], "MONTHLY");
        assert_eq!(body["label"], "Mensual");
        assert_eq!(body["end"], "2025-02-28");
        assert_eq!(body["endDisplay"], "28/02/2025");

        let req = test::TestRequest::get()
            .uri("/api/membership/plan-end?plan_id=9&start=2025-01-31")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn membership_table_rows() {
        let fake = FakeUpstream::start(Canned {
            memberships: json!([
                {
                    "idMembresia": 12,
                    "nombreAtleta": "Ana Torres",
                    "nombreTipo": "Mensual",
                    "nombreEstado": "ACTIVA",
                    "fechaInicio": "2025-10-20",
                    "fechaVencimiento": [2025, 11, 20],
                    "precioPagado": 350
                },
                { "idMembresia": 13, "fechaVencimiento": "someday" }
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
            .uri("/api/membership")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["startDisplay"], "20/10/2025");
        assert_eq!(body[0]["expirationDisplay"], "20/11/2025");
        assert_eq!(body[0]["priceDisplay"], "$350.00");
        assert_eq!(body[0]["active"], true);
        assert_eq!(body[1]["athleteName"], "Desconocido");
        assert_eq!(body[1]["expirationDisplay"], "someday");

        fake.stop().await;
    }
}
