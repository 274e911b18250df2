use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::auth::bearer::BearerToken;
use crate::config::Config;
use crate::error::DashboardError;
use crate::model::attendance::{
    AttendanceExit, AttendanceSession, AttendanceView, NewAttendance, currently_present,
    require_athlete, sessions_from_records,
};
use crate::upstream::UpstreamClient;
use crate::utils::duration::parse_time_of_day;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Day to list (YYYY-MM-DD), today when omitted
    #[schema(example = "2025-11-21")]
    pub date: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceListResponse {
    #[schema(example = "2025-11-21")]
    pub date: String,
    pub data: Vec<AttendanceView>,
    /// Suggested refresh interval for live durations
    #[schema(example = 60)]
    pub refresh_after_secs: u64,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    #[schema(example = 3)]
    pub count: usize,
    pub data: Vec<AttendanceView>,
    #[schema(example = 60)]
    pub refresh_after_secs: u64,
}

#[derive(Deserialize, ToSchema)]
pub struct EntryRequest {
    #[schema(example = 4)]
    pub athlete_id: Option<u64>,
    /// Defaults to today
    #[schema(example = "2025-11-21")]
    pub date: Option<String>,
    /// HH:MM or HH:MM:SS, defaults to now
    #[schema(example = "14:00")]
    pub entry_time: Option<String>,
    /// User registering the entry
    #[schema(example = 2)]
    pub registered_by: Option<u64>,
    #[schema(example = "Clase de la tarde")]
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ExitRequest {
    /// HH:MM or HH:MM:SS, defaults to now
    #[schema(example = "15:05")]
    pub exit_time: Option<String>,
}

pub(crate) fn parse_day(text: Option<&str>) -> Result<NaiveDate, DashboardError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => NaiveDate::parse_from_str(t, "%Y-%m-%d")
            .map_err(|_| DashboardError::MalformedDateShape(t.to_string())),
        None => Ok(Local::now().date_naive()),
    }
}

/// List attendance for a day
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance rows ready for display", body = AttendanceListResponse),
        (status = 400, description = "Malformed date"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(token, upstream, config))]
pub async fn list_attendance(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
    query: web::Query<AttendanceQuery>,
) -> Result<impl Responder, DashboardError> {
    let date = parse_day(query.date.as_deref())?;
    let records = upstream.attendance_by_date(&token, date).await?;

    let now = Local::now().time();
    let data = sessions_from_records(records)
        .iter()
        .map(|s| s.view_at(now))
        .collect();

    Ok(HttpResponse::Ok().json(AttendanceListResponse {
        date: date.format("%Y-%m-%d").to_string(),
        data,
        refresh_after_secs: config.live_refresh_secs,
    }))
}

/// Athletes currently inside the facility
#[utoipa::path(
    get,
    path = "/api/attendance/present",
    responses(
        (status = 200, description = "Open visits with live elapsed time", body = PresenceResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(token, upstream, config))]
pub async fn present_athletes(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    config: web::Data<Config>,
) -> Result<impl Responder, DashboardError> {
    let today = Local::now();
    let records = upstream.attendance_by_date(&token, today.date_naive()).await?;
    let sessions = sessions_from_records(records);

    let now = Local::now().time();
    let data: Vec<AttendanceView> = currently_present(&sessions).map(|s| s.view_at(now)).collect();

    Ok(HttpResponse::Ok().json(PresenceResponse {
        count: data.len(),
        data,
        refresh_after_secs: config.live_refresh_secs,
    }))
}

/// Register an athlete's entry
#[utoipa::path(
    post,
    path = "/api/attendance/entry",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "Entry registered", body = Object, example = json!({
            "message": "Entrada registrada exitosamente"
        })),
        (status = 400, description = "Malformed date or time"),
        (status = 409, description = "No athlete selected"),
        (status = 422, description = "Athlete has no membership"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(token, upstream, payload))]
pub async fn register_entry(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    payload: web::Json<EntryRequest>,
) -> Result<impl Responder, DashboardError> {
    let payload = payload.into_inner();

    let athlete_id = require_athlete(payload.athlete_id)?;
    let date = parse_day(payload.date.as_deref())?;
    let entry_time = match payload.entry_time.as_deref() {
        Some(t) => parse_time_of_day(t)?,
        None => Local::now().time(),
    };

    let memberships = upstream.memberships_by_athlete(&token, athlete_id).await?;
    let entry = NewAttendance::prepare(
        Some(athlete_id),
        &memberships,
        date,
        entry_time,
        payload.registered_by,
        payload.notes,
    )?;

    let created = upstream.register_entry(&token, &entry).await?;
    info!(athlete_id, membership_id = entry.membership_id, "Entry registered");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Entrada registrada exitosamente",
        "attendance": created
    })))
}

/// Register an athlete's exit
#[utoipa::path(
    put,
    path = "/api/attendance/{attendance_id}/exit",
    request_body = ExitRequest,
    params(
        ("attendance_id", description = "Attendance ID")
    ),
    responses(
        (status = 200, description = "Exit registered", body = AttendanceView),
        (status = 400, description = "Malformed time"),
        (status = 404, description = "Attendance not found"),
        (status = 409, description = "Exit already registered"),
        (status = 422, description = "Exit earlier than entry"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
#[instrument(skip(token, upstream, body))]
pub async fn register_exit(
    token: BearerToken,
    upstream: web::Data<UpstreamClient>,
    path: web::Path<u64>,
    body: web::Json<ExitRequest>,
) -> Result<impl Responder, DashboardError> {
    let attendance_id = path.into_inner();
    let exit_time = match body.exit_time.as_deref() {
        Some(t) => parse_time_of_day(t)?,
        None => Local::now().time(),
    };

    let record = upstream.attendance_by_id(&token, attendance_id).await?;
    let mut session = AttendanceSession::from_record(record)?;
    session.register_exit(exit_time)?;

    if let Some(exit) = AttendanceExit::from_session(&session) {
        upstream.register_exit(&token, attendance_id, &exit).await?;
    }
    info!(attendance_id = session.id(), state = %session.state(), "Exit registered");

    Ok(HttpResponse::Ok().json(session.view_at(exit_time)))
}
