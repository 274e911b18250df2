use chrono::{DateTime, Days, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use utoipa::ToSchema;

use crate::model::payment::{Amount, amount_or_zero};
use crate::utils::dates::{DateLike, NormalizedDate, normalize, normalize_in};
use crate::utils::report::money;

/// Status id the remote API uses for an active membership.
pub const ACTIVE_STATUS_ID: u8 = 1;

/// Memberships expiring within this many days are flagged as urgent.
pub const URGENT_DAYS: i64 = 3;

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Membership {
    #[serde(rename = "idMembresia", alias = "id")]
    pub id: u64,

    #[serde(rename = "nombreAtleta", alias = "nombre_atleta", default)]
    pub athlete_name: Option<String>,

    #[serde(rename = "nombreTipo", alias = "tipoMembresia", default)]
    pub plan_name: Option<String>,

    #[serde(rename = "idEstadoMembresia", default)]
    pub status_id: Option<u8>,

    #[serde(rename = "nombreEstado", default)]
    pub status_name: Option<String>,

    #[serde(rename = "fechaInicio", alias = "fecha_inicio", default)]
    pub start_date: Option<DateLike>,

    #[serde(rename = "precioPagado", alias = "precio_pagado", default)]
    pub price_paid: Option<Amount>,

    #[serde(rename = "fechaVencimiento", alias = "fecha_vencimiento", default)]
    pub expiration_date: Option<DateLike>,
}

impl Membership {
    /// The API reports status both as an id and as a name ("Activa", "ACTIVA").
    pub fn is_active(&self) -> bool {
        self.status_id == Some(ACTIVE_STATUS_ID)
            || self
                .status_name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case("activa"))
    }

    pub fn athlete_name_or_default(&self) -> &str {
        self.athlete_name.as_deref().unwrap_or("Atleta")
    }

    pub fn view(&self) -> MembershipView {
        let price = amount_or_zero(self.price_paid.as_ref(), self.id);
        MembershipView {
            id: self.id,
            athlete_name: self.athlete_name.clone().unwrap_or_else(|| "Desconocido".to_string()),
            plan_name: self.plan_name.clone().unwrap_or_else(|| "N/A".to_string()),
            start_display: normalize(self.start_date.as_ref()).display().to_string(),
            expiration_display: normalize(self.expiration_date.as_ref()).display().to_string(),
            price_display: money(price),
            status: self.status_name.clone().unwrap_or_else(|| "N/A".to_string()),
            active: self.is_active(),
        }
    }
}

/// One row of the memberships table.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipView {
    #[schema(example = 12)]
    pub id: u64,
    #[schema(example = "Ana Torres")]
    pub athlete_name: String,
    #[schema(example = "Mensual")]
    pub plan_name: String,
    #[schema(example = "20/10/2025")]
    pub start_display: String,
    #[schema(example = "20/11/2025")]
    pub expiration_display: String,
    #[schema(example = "$350.00")]
    pub price_display: String,
    #[schema(example = "ACTIVA")]
    pub status: String,
    pub active: bool,
}

/// Membership used to register an attendance: the first active one, else the
/// first one returned.
///
/// The fallback to an inactive membership mirrors what the front desk has
/// always done and is pending confirmation from the club.
pub fn select_membership(memberships: &[Membership]) -> Option<&Membership> {
    memberships
        .iter()
        .find(|m| m.is_active())
        .or_else(|| memberships.first())
}

/// Plans sold by the club, with the ids the remote API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipPlan {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Semiannual,
    Annual,
}

impl MembershipPlan {
    pub fn id(self) -> u8 {
        match self {
            MembershipPlan::Daily => 1,
            MembershipPlan::Weekly => 2,
            MembershipPlan::Monthly => 3,
            MembershipPlan::Quarterly => 4,
            MembershipPlan::Semiannual => 5,
            MembershipPlan::Annual => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        MembershipPlan::iter().find(|plan| plan.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            MembershipPlan::Daily => "Diaria",
            MembershipPlan::Weekly => "Semanal",
            MembershipPlan::Monthly => "Mensual",
            MembershipPlan::Quarterly => "Trimestral",
            MembershipPlan::Semiannual => "Semestral",
            MembershipPlan::Annual => "Anual",
        }
    }

    /// Last day covered by a plan starting on `start`. Month arithmetic clamps
    /// to the end of the month (Jan 31 + 1 month = Feb 28/29).
    pub fn end_date(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            MembershipPlan::Daily => start.checked_add_days(Days::new(1)),
            MembershipPlan::Weekly => start.checked_add_days(Days::new(7)),
            MembershipPlan::Monthly => start.checked_add_months(Months::new(1)),
            MembershipPlan::Quarterly => start.checked_add_months(Months::new(3)),
            MembershipPlan::Semiannual => start.checked_add_months(Months::new(6)),
            MembershipPlan::Annual => start.checked_add_months(Months::new(12)),
        }
    }
}

/// Whole days from `now` until local midnight of the expiration date, rounded
/// up. Zero on the expiration day itself, negative once it has passed.
pub fn days_remaining<Tz: TimeZone>(expiration: &NormalizedDate, now: &DateTime<Tz>) -> Option<i64> {
    let midnight = expiration.date()?.and_hms_opt(0, 0, 0)?;
    let end = now.timezone().from_local_datetime(&midnight).earliest()?;
    let millis = (end - now.clone()).num_milliseconds();
    Some(-(-millis).div_euclid(MILLIS_PER_DAY))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryView {
    #[schema(example = 12)]
    pub membership_id: u64,
    #[schema(example = "Ana Torres")]
    pub athlete_name: String,
    #[schema(example = "Mensual", nullable = true)]
    pub plan_name: Option<String>,
    #[schema(example = "20/11/2025")]
    pub expiration_display: String,
    #[schema(example = 2, nullable = true)]
    pub days_remaining: Option<i64>,
    pub urgent: bool,
    #[serde(skip)]
    sort_key: Option<String>,
}

impl ExpiryView {
    pub fn at<Tz: TimeZone>(membership: &Membership, now: &DateTime<Tz>) -> Self {
        let expiration = normalize_in(membership.expiration_date.as_ref(), &now.timezone());
        if !expiration.is_recognized() {
            tracing::warn!(
                membership_id = membership.id,
                value = expiration.display(),
                "Unrecognized expiration date"
            );
        }
        let days_remaining = days_remaining(&expiration, now);

        Self {
            membership_id: membership.id,
            athlete_name: membership.athlete_name_or_default().to_string(),
            plan_name: membership.plan_name.clone(),
            expiration_display: expiration.display().to_string(),
            days_remaining,
            urgent: days_remaining.is_some_and(|days| days <= URGENT_DAYS),
            sort_key: expiration.sort_key().map(str::to_string),
        }
    }
}

/// Expiry views ordered by expiration date; unknown dates go last.
pub fn expiry_views_at<Tz: TimeZone>(memberships: &[Membership], now: &DateTime<Tz>) -> Vec<ExpiryView> {
    let mut views: Vec<ExpiryView> = memberships.iter().map(|m| ExpiryView::at(m, now)).collect();
    views.sort_by(|a, b| match (&a.sort_key, &b.sort_key) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    views
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Alert {
    #[schema(example = "warning")]
    pub kind: String,
    #[schema(example = "Membresía de Ana Torres vence el 20/11/2025")]
    pub message: String,
}

pub fn expiry_alerts(views: &[ExpiryView]) -> Vec<Alert> {
    views
        .iter()
        .map(|view| Alert {
            kind: "warning".to_string(),
            message: format!(
                "Membresía de {} vence el {}",
                view.athlete_name, view.expiration_display
            ),
        })
        .collect()
}
