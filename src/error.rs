use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::NaiveTime;
use derive_more::Display;
use serde_json::json;

/// Every failure a dashboard operation can report. All of them are
/// recoverable and end up as a JSON `{"message": ...}` for the page to show.
#[derive(Debug, Display)]
pub enum DashboardError {
    #[display(fmt = "Fecha inválida: {}", _0)]
    MalformedDateShape(String),

    #[display(fmt = "Hora inválida: {}", _0)]
    MalformedTime(String),

    #[display(fmt = "Tipo de membresía desconocido: {}", _0)]
    UnknownPlan(u8),

    #[display(fmt = "El atleta no tiene membresías activas")]
    MissingMembership,

    #[display(fmt = "{}", _0)]
    InvalidStateTransition(String),

    #[display(fmt = "La hora de salida {} es anterior a la entrada {}", exit, entry)]
    NegativeDuration { entry: NaiveTime, exit: NaiveTime },

    #[display(fmt = "{}", message)]
    Upstream { status: u16, message: String },

    #[display(fmt = "Request timeout")]
    Timeout,
}

impl DashboardError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        DashboardError::Upstream {
            status,
            message: message.into(),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<reqwest::Error> for DashboardError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DashboardError::Timeout
        } else if err.is_decode() {
            DashboardError::upstream(502, "Respuesta inválida del servidor")
        } else {
            DashboardError::upstream(502, format!("Error de conexión con el servidor: {err}"))
        }
    }
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::MalformedDateShape(_)
            | DashboardError::MalformedTime(_)
            | DashboardError::UnknownPlan(_) => StatusCode::BAD_REQUEST,
            DashboardError::MissingMembership | DashboardError::NegativeDuration { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            DashboardError::InvalidStateTransition(_) => StatusCode::CONFLICT,
            DashboardError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            DashboardError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
