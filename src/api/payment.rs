use actix_web::{HttpResponse, Responder, web};
use tracing::instrument;

use crate::auth::bearer::BearerToken;
use crate::error::DashboardError;
use crate::model::payment::PaymentView;
use crate::upstream::UpstreamClient;

/// All payments, ready for the payments table
#[utoipa::path(
    get,
    path = "/api/payments",
    responses(
        (status = 200, description = "Payments with normalized date and amount", body = [PaymentView]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Payments"
)]
#[instrument(skip(token, upstream))]
pub async fn list_payments(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
) -> Result<impl Responder, DashboardError> {
    let payments = upstream.payments(&token).await?;
    let views: Vec<PaymentView> = payments.iter().map(|p| p.view()).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[cfg(test)]
mod tests {
    use crate::api::fake_upstream::{Canned, FakeUpstream};
    use crate::routes;
    use actix_web::{App, test, web};
    use serde_json::json;

    #[actix_web::test]
    async fn payment_table_rows() {
        let fake = FakeUpstream::start(Canned {
            payments: json!([
                {
                    "idPago": 8,
                    "nombreAtleta": "Ana Torres",
                    "concepto": "Mensualidad",
                    "monto": "350.5",
                    "nombreMetodo": "EFECTIVO",
                    "fechaPago": "2025-11-20T10:30:00"
                },
                { "idPago": 9, "monto": 20 }
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
            .uri("/api/payments")
            .insert_header(("Authorization", "Bearer token"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["amountDisplay"], "$350.50");
        assert_eq!(body[0]["method"], "EFECTIVO");
        assert_eq!(body[0]["paidOnDisplay"], "20/11/2025");
        assert_eq!(body[1]["concept"], "Pago");
        assert_eq!(body[1]["paidOnDisplay"], "N/A");

        fake.stop().await;
    }
}
