//! Typed access to the club's remote REST API.
//!
//! Every call forwards the dashboard user's bearer token. The client-wide
//! timeout is the only resilience policy; nothing is retried or cached.

use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDate;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned, de::IgnoredAny};
use serde_json::Value;
use tracing::{debug, error};

use crate::auth::bearer::BearerToken;
use crate::config::Config;
use crate::error::DashboardError;
use crate::model::attendance::{AttendanceExit, AttendanceRecord, NewAttendance};
use crate::model::membership::Membership;
use crate::model::payment::Payment;

#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.upstream_timeout_ms))
            .build()
            .context("Failed to create upstream HTTP client")?;

        Ok(Self {
            http,
            base_url: config.upstream_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        token: &BearerToken,
        endpoint: &str,
    ) -> Result<T, DashboardError> {
        debug!(endpoint, "GET upstream");
        let response = self
            .http
            .get(self.url(endpoint))
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| log_transport(endpoint, e))?;
        handle_response(endpoint, response).await
    }

    async fn send_json<B: Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        token: &BearerToken,
        endpoint: &str,
        body: &B,
    ) -> Result<T, DashboardError> {
        debug!(%method, endpoint, "upstream request");
        let response = self
            .http
            .request(method, self.url(endpoint))
            .bearer_auth(token.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| log_transport(endpoint, e))?;
        handle_response(endpoint, response).await
    }

    // ==========================================
    // ATTENDANCE
    // ==========================================

    pub async fn attendance_by_date(
        &self,
        token: &BearerToken,
        date: NaiveDate,
    ) -> Result<Vec<AttendanceRecord>, DashboardError> {
        self.get(token, &format!("/api/asistencias/fecha/{}", date.format("%Y-%m-%d")))
            .await
    }

    pub async fn attendance_by_id(
        &self,
        token: &BearerToken,
        id: u64,
    ) -> Result<AttendanceRecord, DashboardError> {
        self.get(token, &format!("/api/asistencias/{id}")).await
    }

    pub async fn register_entry(
        &self,
        token: &BearerToken,
        entry: &NewAttendance,
    ) -> Result<Value, DashboardError> {
        self.send_json(Method::POST, token, "/api/asistencias/entrada", entry)
            .await
    }

    pub async fn register_exit(
        &self,
        token: &BearerToken,
        id: u64,
        exit: &AttendanceExit,
    ) -> Result<Value, DashboardError> {
        self.send_json(Method::PUT, token, &format!("/api/asistencias/{id}/salida"), exit)
            .await
    }

    // ==========================================
    // MEMBERSHIPS
    // ==========================================

    pub async fn memberships(&self, token: &BearerToken) -> Result<Vec<Membership>, DashboardError> {
        self.get(token, "/api/membresias").await
    }

    pub async fn memberships_by_athlete(
        &self,
        token: &BearerToken,
        athlete_id: u64,
    ) -> Result<Vec<Membership>, DashboardError> {
        self.get(token, &format!("/api/membresias/atleta/{athlete_id}"))
            .await
    }

    pub async fn expiring_memberships(
        &self,
        token: &BearerToken,
        days: u32,
    ) -> Result<Vec<Membership>, DashboardError> {
        self.get(token, &format!("/api/membresias/vencimientos/{days}"))
            .await
    }

    // ==========================================
    // ATHLETES & PAYMENTS
    // ==========================================

    pub async fn active_athletes_count(&self, token: &BearerToken) -> Result<usize, DashboardError> {
        let athletes: Vec<IgnoredAny> = self.get(token, "/api/atletas/activos").await?;
        Ok(athletes.len())
    }

    pub async fn payments(&self, token: &BearerToken) -> Result<Vec<Payment>, DashboardError> {
        self.get(token, "/api/pagos").await
    }
}

fn log_transport(endpoint: &str, err: reqwest::Error) -> DashboardError {
    error!(endpoint, error = %err, "Upstream request failed");
    DashboardError::from(err)
}

async fn handle_response<T: DeserializeOwned>(
    endpoint: &str,
    response: Response,
) -> Result<T, DashboardError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            error!(endpoint, error = %e, "Unexpected upstream payload");
            DashboardError::from(e)
        });
    }

    let text = response.text().await.unwrap_or_default();
    let body: Option<Value> = serde_json::from_str(&text).ok();
    let detail = body
        .as_ref()
        .and_then(|b| b.get("error").or_else(|| b.get("message")))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()));

    error!(endpoint, status = status.as_u16(), detail = ?detail, "Upstream error response");
    Err(error_for_status(status, detail))
}

/// Maps an upstream failure to the message the dashboard shows.
pub fn error_for_status(status: StatusCode, detail: Option<String>) -> DashboardError {
    let message = match status {
        StatusCode::UNAUTHORIZED => {
            "Sesión expirada. Por favor, inicia sesión nuevamente.".to_string()
        }
        StatusCode::FORBIDDEN => "No tienes permisos para realizar esta acción".to_string(),
        StatusCode::NOT_FOUND => "Recurso no encontrado".to_string(),
        StatusCode::BAD_REQUEST => detail.unwrap_or_else(|| "Datos inválidos".to_string()),
        StatusCode::INTERNAL_SERVER_ERROR => {
            detail.unwrap_or_else(|| "Error interno del servidor".to_string())
        }
        _ => detail.unwrap_or_else(|| "Error en la petición".to_string()),
    };
    DashboardError::upstream(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_messages_for_auth_and_missing() {
        let err = error_for_status(StatusCode::UNAUTHORIZED, Some("jwt expired".into()));
        assert_eq!(
            err.to_string(),
            "Sesión expirada. Por favor, inicia sesión nuevamente."
        );
        assert_eq!(
            error_for_status(StatusCode::NOT_FOUND, None).to_string(),
            "Recurso no encontrado"
        );
    }

    #[test]
    fn server_detail_is_kept() {
        let err = error_for_status(StatusCode::BAD_REQUEST, Some("Atleta inactivo".into()));
        assert!(matches!(
            err,
            DashboardError::Upstream { status: 400, ref message } if message == "Atleta inactivo"
        ));
        assert_eq!(
            error_for_status(StatusCode::BAD_GATEWAY, None).to_string(),
            "Error en la petición"
        );
    }

    #[test]
    fn base_url_is_trimmed() {
        let config = Config {
            upstream_base_url: "http://club.local:7000/".into(),
            ..Config::default()
        };
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(
            client.url("/api/pagos"),
            "http://club.local:7000/api/pagos"
        );
    }
}
