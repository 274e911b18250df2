use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::dates::{DateLike, normalize};
use crate::utils::report::money;

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    #[serde(rename = "idPago", alias = "id")]
    pub id: u64,

    #[serde(rename = "nombreAtleta", alias = "nombre_atleta", default)]
    pub athlete_name: Option<String>,

    #[serde(rename = "concepto", default)]
    pub concept: Option<String>,

    #[serde(rename = "monto", default)]
    pub amount: Option<Amount>,

    #[serde(rename = "nombreMetodo", alias = "metodoPago", default)]
    pub method_name: Option<String>,

    #[serde(rename = "fechaPago", alias = "fecha", default)]
    pub paid_on: Option<DateLike>,
}

/// Amounts come as JSON numbers or as decimal text ("350.00").
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn value(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(text) => text.trim().parse().ok(),
        }
    }
}

/// Unparseable or missing amounts count as zero.
pub(crate) fn amount_or_zero(amount: Option<&Amount>, owner_id: u64) -> f64 {
    match amount {
        Some(a) => a.value().unwrap_or_else(|| {
            tracing::warn!(id = owner_id, amount = ?a, "Unparseable amount");
            0.0
        }),
        None => 0.0,
    }
}

/// One row of the payments table.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    #[schema(example = 8)]
    pub id: u64,
    #[schema(example = "Ana Torres")]
    pub athlete_name: String,
    #[schema(example = "Mensualidad")]
    pub concept: String,
    #[schema(example = 350.0)]
    pub amount: f64,
    #[schema(example = "$350.00")]
    pub amount_display: String,
    #[schema(example = "EFECTIVO")]
    pub method: String,
    #[schema(example = "20/11/2025")]
    pub paid_on_display: String,
}

impl Payment {
    pub fn amount(&self) -> f64 {
        amount_or_zero(self.amount.as_ref(), self.id)
    }

    pub fn view(&self) -> PaymentView {
        let amount = self.amount();
        PaymentView {
            id: self.id,
            athlete_name: self.athlete_name.clone().unwrap_or_else(|| "Desconocido".to_string()),
            concept: self.concept.clone().unwrap_or_else(|| "Pago".to_string()),
            amount,
            amount_display: money(amount),
            method: self.method_name.clone().unwrap_or_else(|| "N/A".to_string()),
            paid_on_display: normalize(self.paid_on.as_ref()).display().to_string(),
        }
    }
}
