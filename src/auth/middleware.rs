use crate::auth::bearer::BearerToken;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use serde_json::json;

/// Rejects protected requests that carry no usable bearer token and stores
/// the token for handlers to forward upstream.
pub async fn require_bearer(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let header_value = match req.headers().get("Authorization").map(|h| h.to_str()) {
        Some(Ok(h)) => h,
        Some(Err(_)) => return Ok(unauthorized(req, "Invalid Authorization header encoding")),
        None => return Ok(unauthorized(req, "Missing Authorization header")),
    };

    let Some(token) = BearerToken::from_header(header_value) else {
        return Ok(unauthorized(req, "Authorization header must start with Bearer"));
    };

    req.extensions_mut().insert(token);

    next.call(req).await
}

fn unauthorized(req: ServiceRequest, message: &str) -> ServiceResponse<BoxBody> {
    let resp = HttpResponse::Unauthorized().json(json!({ "message": message }));
    req.into_response(resp.map_into_boxed_body())
}
