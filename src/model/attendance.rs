use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use utoipa::ToSchema;

use crate::error::DashboardError;
use crate::model::membership::{Membership, select_membership};
use crate::utils::dates::{DateLike, normalize};
use crate::utils::duration::{Elapsed, elapsed_minutes, parse_time_of_day, short_time};

/// One gym visit as the remote API returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "idAsistencia", alias = "id")]
    pub id: u64,

    #[serde(rename = "idAtleta", alias = "id_atleta", default)]
    pub athlete_id: Option<u64>,

    #[serde(rename = "nombreAtleta", alias = "nombre_atleta", default)]
    pub athlete_name: Option<String>,

    #[serde(rename = "fechaAsistencia", alias = "fecha_asistencia", default)]
    pub visit_date: Option<DateLike>,

    #[serde(rename = "horaEntrada", alias = "hora_entrada", default)]
    pub entry_time: Option<String>,

    #[serde(rename = "horaSalida", alias = "hora_salida", default)]
    pub exit_time: Option<String>,

    #[serde(rename = "duracionMinutos", alias = "duracion_minutos", default)]
    pub duration_minutes: Option<i64>,

    #[serde(rename = "observaciones", default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    InProgress,
    Completed,
}

/// What the attendance tables render for one record.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceView {
    #[schema(example = 31)]
    pub id: u64,
    #[schema(example = 4, nullable = true)]
    pub athlete_id: Option<u64>,
    #[schema(example = "Ana Torres")]
    pub athlete_name: String,
    #[schema(example = "21/11/2025")]
    pub display_date: String,
    #[schema(example = "14:00")]
    pub display_entry: String,
    #[schema(example = "15:05")]
    pub display_exit: String,
    #[schema(example = "1h 5m")]
    pub display_duration: String,
    pub state: SessionState,
    /// Set when the recorded or live span is negative.
    pub duration_anomaly: bool,
    #[schema(nullable = true)]
    pub notes: Option<String>,
}

/// Entry/exit state of a single visit.
///
/// Built from a fetched record for the span of one request. The only
/// transition is [`AttendanceSession::register_exit`].
#[derive(Debug, Clone)]
pub struct AttendanceSession {
    record: AttendanceRecord,
    entry: NaiveTime,
    exit: Option<NaiveTime>,
}

impl AttendanceSession {
    pub fn from_record(record: AttendanceRecord) -> Result<Self, DashboardError> {
        let entry = record
            .entry_time
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| DashboardError::MalformedTime("sin hora de entrada".to_string()))
            .and_then(parse_time_of_day)?;
        let exit = record
            .exit_time
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(parse_time_of_day)
            .transpose()?;

        Ok(Self {
            record,
            entry,
            exit,
        })
    }

    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn exit(&self) -> Option<NaiveTime> {
        self.exit
    }

    pub fn state(&self) -> SessionState {
        match self.exit {
            Some(_) => SessionState::Completed,
            None => SessionState::InProgress,
        }
    }

    /// Completes the visit. Fails without touching the session when it is
    /// already completed or when `exit` is earlier than the entry.
    pub fn register_exit(&mut self, exit: NaiveTime) -> Result<(), DashboardError> {
        if self.state() == SessionState::Completed {
            return Err(DashboardError::InvalidStateTransition(format!(
                "La asistencia {} ya tiene salida registrada",
                self.record.id
            )));
        }
        if exit < self.entry {
            return Err(DashboardError::NegativeDuration {
                entry: self.entry,
                exit,
            });
        }

        self.exit = Some(exit);
        self.record.exit_time = Some(exit.format("%H:%M:%S").to_string());
        self.record.duration_minutes = None;
        Ok(())
    }

    /// Minutes spent inside. A completed visit uses the precomputed duration
    /// when the API sent one; a visit in progress counts up to `now`.
    pub fn minutes_at(&self, now: NaiveTime) -> i64 {
        match self.exit {
            Some(exit) => self
                .record
                .duration_minutes
                .unwrap_or_else(|| elapsed_minutes(self.entry, exit)),
            None => elapsed_minutes(self.entry, now),
        }
    }

    pub fn view_at(&self, now: NaiveTime) -> AttendanceView {
        let minutes = self.minutes_at(now);
        let duration_anomaly = minutes < 0;
        if duration_anomaly {
            tracing::warn!(
                attendance_id = self.record.id,
                minutes,
                "Negative attendance duration"
            );
        }

        let visit_date = normalize(self.record.visit_date.as_ref());
        if !visit_date.is_recognized() {
            tracing::warn!(
                attendance_id = self.record.id,
                value = visit_date.display(),
                "Unrecognized attendance date"
            );
        }

        AttendanceView {
            id: self.id(),
            athlete_id: self.record.athlete_id,
            athlete_name: self
                .record
                .athlete_name
                .clone()
                .unwrap_or_else(|| "Desconocido".to_string()),
            display_date: visit_date.display().to_string(),
            display_entry: short_time(self.entry),
            display_exit: self.exit.map(short_time).unwrap_or_else(|| "-".to_string()),
            display_duration: if duration_anomaly {
                "-".to_string()
            } else {
                Elapsed::from_minutes(minutes).to_string()
            },
            state: self.state(),
            duration_anomaly,
            notes: self.record.notes.clone(),
        }
    }
}

/// Builds sessions for a listing. A record whose times cannot be parsed is
/// left out and logged rather than failing the whole page.
pub fn sessions_from_records(records: Vec<AttendanceRecord>) -> Vec<AttendanceSession> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id;
            match AttendanceSession::from_record(record) {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::warn!(attendance_id = id, error = %e, "Skipping attendance record");
                    None
                }
            }
        })
        .collect()
}

/// Athletes currently inside: every session still in progress.
pub fn currently_present(
    sessions: &[AttendanceSession],
) -> impl Iterator<Item = &AttendanceSession> {
    sessions
        .iter()
        .filter(|s| s.state() == SessionState::InProgress)
}

/// Body the remote API expects for a new entry.
#[derive(Debug, Serialize)]
pub struct NewAttendance {
    #[serde(rename = "idAtleta")]
    pub athlete_id: u64,
    #[serde(rename = "idMembresia")]
    pub membership_id: u64,
    #[serde(rename = "fechaAsistencia")]
    pub date: String,
    #[serde(rename = "horaEntrada")]
    pub entry_time: String,
    #[serde(rename = "idUsuarioRegistroEntrada", skip_serializing_if = "Option::is_none")]
    pub registered_by: Option<u64>,
    #[serde(rename = "observaciones")]
    pub notes: Option<String>,
}

impl NewAttendance {
    /// Validates an entry registration against the athlete's memberships.
    pub fn prepare(
        athlete_id: Option<u64>,
        memberships: &[Membership],
        date: NaiveDate,
        entry_time: NaiveTime,
        registered_by: Option<u64>,
        notes: Option<String>,
    ) -> Result<Self, DashboardError> {
        let athlete_id = require_athlete(athlete_id)?;
        let membership = select_membership(memberships).ok_or(DashboardError::MissingMembership)?;

        Ok(Self {
            athlete_id,
            membership_id: membership.id,
            date: date.format("%Y-%m-%d").to_string(),
            entry_time: entry_time.format("%H:%M:%S").to_string(),
            registered_by,
            notes: notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

pub fn require_athlete(athlete_id: Option<u64>) -> Result<u64, DashboardError> {
    athlete_id.ok_or_else(|| {
        DashboardError::InvalidStateTransition("Debe seleccionar un atleta".to_string())
    })
}

/// Body the remote API expects when closing a visit.
#[derive(Debug, Serialize)]
pub struct AttendanceExit {
    #[serde(rename = "horaSalida")]
    pub exit_time: String,
}

impl AttendanceExit {
    pub fn from_session(session: &AttendanceSession) -> Option<Self> {
        session.exit().map(|exit| Self {
            exit_time: exit.format("%H:%M:%S").to_string(),
        })
    }
}
