use crate::{
    api::{attendance, dashboard, membership, payment},
    auth::middleware::require_bearer,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with the same burst.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        60_000 / requests_per_min as u64
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {requests_per_min} per minute"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: Arc<Limiter>) {
    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(require_bearer)) // bearer token forwarded upstream
            .wrap(limiter) // rate limiting
            .configure(api_routes),
    );
}

pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            // /attendance
            .service(web::resource("").route(web::get().to(attendance::list_attendance)))
            // /attendance/present
            .service(web::resource("/present").route(web::get().to(attendance::present_athletes)))
            // /attendance/entry
            .service(web::resource("/entry").route(web::post().to(attendance::register_entry)))
            // /attendance/{id}/exit
            .service(web::resource("/{id}/exit").route(web::put().to(attendance::register_exit))),
    )
    .service(
        web::scope("/membership")
            .service(web::resource("").route(web::get().to(membership::list_memberships)))
            .service(
                web::resource("/expiring").route(web::get().to(membership::expiring_memberships)),
            )
            .service(web::resource("/alerts").route(web::get().to(membership::membership_alerts)))
            .service(web::resource("/plan-end").route(web::get().to(membership::plan_end))),
    )
    .service(
        web::scope("/dashboard")
            .service(web::resource("/summary").route(web::get().to(dashboard::summary)))
            .service(web::resource("/revenue").route(web::get().to(dashboard::revenue)))
            .service(
                web::resource("/memberships-by-type")
                    .route(web::get().to(dashboard::memberships_by_type)),
            ),
    )
    .service(
        web::scope("/payments")
            .service(web::resource("").route(web::get().to(payment::list_payments))),
    );
}

/// Protected routes without the per-IP limiter; test requests carry no peer address.
#[cfg(test)]
pub fn protected_for_tests(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_bearer))
            .configure(api_routes),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_builds_for_edge_rates() {
        assert!(build_limiter(1000).is_ok());
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
