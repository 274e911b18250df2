use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, TimeZone};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceSession, currently_present};
use crate::model::membership::Membership;
use crate::model::payment::Payment;
use crate::utils::dates::normalize_in;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    #[schema(example = 42)]
    pub active_athletes: usize,
    #[schema(example = 37)]
    pub active_memberships: usize,
    #[schema(example = 18)]
    pub attendance_today: usize,
    #[schema(example = 5)]
    pub present_now: usize,
    #[schema(example = 700.0)]
    pub income_today: f64,
    #[schema(example = "$700.00")]
    pub income_today_display: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    #[schema(example = "2025-11-20")]
    pub date: String,
    #[schema(example = "20/11")]
    pub label: String,
    #[schema(example = 350.0)]
    pub amount: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    #[schema(example = 30)]
    pub period_days: u32,
    pub points: Vec<RevenuePoint>,
    #[schema(example = 1050.0)]
    pub total: f64,
    #[schema(example = "$1050.00")]
    pub total_display: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlanCount {
    #[schema(example = "Mensual")]
    pub plan: String,
    #[schema(example = 12)]
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MembershipBreakdown {
    #[schema(example = 20)]
    pub total: usize,
    pub by_plan: Vec<PlanCount>,
}

pub fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

fn payment_date<Tz: TimeZone>(payment: &Payment, tz: &Tz) -> Option<NaiveDate> {
    let date = normalize_in(payment.paid_on.as_ref(), tz);
    if !date.is_recognized() {
        tracing::warn!(payment_id = payment.id, value = date.display(), "Unrecognized payment date");
    }
    date.date()
}

/// Summary cards. `attendance_today` is every session fetched for today,
/// `present_now` the ones without an exit.
pub fn build_summary_at<Tz: TimeZone>(
    now: &DateTime<Tz>,
    active_athletes: usize,
    memberships: &[Membership],
    attendance_today: &[AttendanceSession],
    payments: &[Payment],
) -> DashboardSummary {
    let today = now.date_naive();
    let tz = now.timezone();

    let income_today: f64 = payments
        .iter()
        .filter(|p| payment_date(p, &tz) == Some(today))
        .map(Payment::amount)
        .fold(0.0, |acc, amount| acc + amount);

    DashboardSummary {
        active_athletes,
        active_memberships: memberships.iter().filter(|m| m.is_active()).count(),
        attendance_today: attendance_today.len(),
        present_now: currently_present(attendance_today).count(),
        income_today,
        income_today_display: money(income_today),
    }
}

/// Income per day over the last `period_days` days (today included), in
/// calendar order.
pub fn build_revenue_at<Tz: TimeZone>(
    now: &DateTime<Tz>,
    payments: &[Payment],
    period_days: u32,
) -> RevenueReport {
    let today = now.date_naive();
    let tz = now.timezone();
    let since = today
        .checked_sub_days(Days::new(u64::from(period_days)))
        .unwrap_or(NaiveDate::MIN);

    let mut per_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for payment in payments {
        let Some(date) = payment_date(payment, &tz) else {
            continue;
        };
        if date >= since && date <= today {
            *per_day.entry(date).or_insert(0.0) += payment.amount();
        }
    }

    let total = per_day.values().fold(0.0, |acc, amount| acc + amount);
    let points = per_day
        .into_iter()
        .map(|(date, amount)| RevenuePoint {
            date: date.format("%Y-%m-%d").to_string(),
            label: date.format("%d/%m").to_string(),
            amount,
        })
        .collect();

    RevenueReport {
        period_days,
        points,
        total,
        total_display: money(total),
    }
}

/// Memberships counted per plan name, in order of first appearance. Rows
/// without a plan name fall under "Otro".
pub fn build_membership_breakdown(memberships: &[Membership]) -> MembershipBreakdown {
    let mut by_plan: Vec<PlanCount> = Vec::new();
    for membership in memberships {
        let plan = membership.plan_name.as_deref().unwrap_or("Otro");
        match by_plan.iter_mut().find(|row| row.plan == plan) {
            Some(row) => row.count += 1,
            None => by_plan.push(PlanCount {
                plan: plan.to_string(),
                count: 1,
            }),
        }
    }

    MembershipBreakdown {
        total: memberships.len(),
        by_plan,
    }
}
