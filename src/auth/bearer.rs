use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Session token of the dashboard user, forwarded as-is to the remote API.
/// The remote API owns authentication; this service never inspects it.
#[derive(Debug, Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn from_header(value: &str) -> Option<Self> {
        value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| BearerToken(t.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for BearerToken {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by the middleware on protected routes
        if let Some(token) = req.extensions().get::<BearerToken>() {
            return ready(Ok(token.clone()));
        }

        let token = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(BearerToken::from_header);

        match token {
            Some(t) => ready(Ok(t)),
            None => ready(Err(ErrorUnauthorized("Missing token"))),
        }
    }
}
