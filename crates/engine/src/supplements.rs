//! The module contains `Supplement` struct and its implementation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Member, Money, PaymentStatus, ResultEngine, reconcile::Keyed, util::ensure_non_negative,
};

/// A supplement sale to a member.
///
/// `member_id` is a soft reference: nothing in the store enforces it, and
/// `member_name` is a snapshot taken when the sale was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplement {
    /// Human readable id (`SUP0001`), taken from the store key.
    pub id: String,
    pub member_id: String,
    pub member_name: String,
    pub purchase_date: NaiveDate,
    pub supplement_amount: Money,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    pub due_amount: Money,
    #[serde(default)]
    pub expected_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: String,
    pub created_date: DateTime<Utc>,
}

/// Sale payload: a supplement without id, created stamp, due amount and
/// member name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplementNew {
    pub member_id: String,
    pub purchase_date: NaiveDate,
    pub supplement_amount: Money,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Money,
    #[serde(default)]
    pub expected_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: String,
}

impl Supplement {
    pub(crate) fn record(
        payload: SupplementNew,
        member: &Member,
        id: String,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        ensure_non_negative(payload.supplement_amount, "supplement amount")?;
        ensure_non_negative(payload.amount_paid, "amount paid")?;

        Ok(Self {
            id,
            member_id: member.id.clone(),
            member_name: member.full_name.clone(),
            purchase_date: payload.purchase_date,
            supplement_amount: payload.supplement_amount,
            payment_status: payload.payment_status.unwrap_or_else(|| {
                PaymentStatus::from_amounts(payload.supplement_amount, payload.amount_paid)
            }),
            amount_paid: payload.amount_paid,
            due_amount: payload.supplement_amount - payload.amount_paid,
            expected_payment_date: payload.expected_payment_date,
            remarks: payload.remarks.trim().to_string(),
            created_date: created_at,
        })
    }
}

impl Keyed for Supplement {
    fn key(&self) -> &str {
        &self.id
    }
}
