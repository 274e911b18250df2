use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod docs;
mod error;
mod model;
mod routes;
mod upstream;
mod utils;

use config::Config;
use upstream::UpstreamClient;

use tracing::info;
use tracing_appender::rolling;
use utoipa_swagger_ui::SwaggerUi;
use crate::docs::ApiDoc;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()

#[get("/")]
async fn index() -> impl Responder {
    "Boxing club dashboard is up"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(upstream = %config.upstream_base_url, "Server starting...");

    let upstream = UpstreamClient::new(&config)?;
    let limiter = Arc::new(routes::build_limiter(config.rate_protected_per_min)?);
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(upstream.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config, limiter.clone()))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
