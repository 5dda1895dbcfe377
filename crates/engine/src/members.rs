//! The module contains `Member` struct and its implementation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    MembershipPlan, Money, PaymentStatus, ResultEngine,
    reconcile::Keyed,
    util::{ensure_non_negative, normalize_optional_text, normalize_required_name, validate_photo},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// A registered gym member.
///
/// Members are stored wholesale under their id in the members collection;
/// the shape below is exactly the flat node written to the shared graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Human readable id (`KV0001`), taken from the store key.
    pub id: String,
    pub full_name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    pub membership_plan: MembershipPlan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub gym_fees: Money,
    pub payment_status: PaymentStatus,
    pub amount_paid: Money,
    /// `gym_fees - amount_paid` at registration. Later edits do not
    /// recompute it.
    pub due_amount: Money,
    #[serde(default)]
    pub expected_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: String,
    pub registration_date: DateTime<Utc>,
    /// Opaque encoded image (data URL or base64).
    #[serde(default)]
    pub photo: Option<String>,
}

/// Registration payload: a member without id, registration stamp and due
/// amount.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberNew {
    pub full_name: String,
    pub age: u32,
    pub gender: Gender,
    #[serde(default)]
    pub contact_number: Option<String>,
    pub membership_plan: MembershipPlan,
    pub start_date: NaiveDate,
    /// Derived from the plan when missing.
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub gym_fees: Money,
    /// Derived from the amounts when missing.
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    pub amount_paid: Money,
    #[serde(default)]
    pub expected_payment_date: Option<NaiveDate>,
    #[serde(default)]
    pub remarks: String,
    #[serde(default)]
    pub photo: Option<String>,
}

impl Member {
    /// Build the record written on registration.
    pub(crate) fn register(
        payload: MemberNew,
        id: String,
        registered_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        let full_name = normalize_required_name(&payload.full_name, "member")?;
        ensure_non_negative(payload.gym_fees, "gym fees")?;
        ensure_non_negative(payload.amount_paid, "amount paid")?;
        let end_date = match payload.end_date {
            Some(end) => end,
            None => payload.membership_plan.end_date(payload.start_date)?,
        };
        let photo = payload.photo.as_deref().map(validate_photo).transpose()?;

        Ok(Self {
            id,
            full_name,
            age: payload.age,
            gender: payload.gender,
            contact_number: normalize_optional_text(payload.contact_number.as_deref()),
            membership_plan: payload.membership_plan,
            start_date: payload.start_date,
            end_date,
            gym_fees: payload.gym_fees,
            payment_status: payload.payment_status.unwrap_or_else(|| {
                PaymentStatus::from_amounts(payload.gym_fees, payload.amount_paid)
            }),
            amount_paid: payload.amount_paid,
            due_amount: payload.gym_fees - payload.amount_paid,
            expected_payment_date: payload.expected_payment_date,
            remarks: payload.remarks.trim().to_string(),
            registration_date: registered_at,
            photo,
        })
    }

    /// Validate an edited record before it replaces the stored one.
    pub(crate) fn validated(mut self) -> ResultEngine<Self> {
        self.full_name = normalize_required_name(&self.full_name, "member")?;
        ensure_non_negative(self.gym_fees, "gym fees")?;
        ensure_non_negative(self.amount_paid, "amount paid")?;
        self.contact_number = normalize_optional_text(self.contact_number.as_deref());
        self.photo = self.photo.as_deref().map(validate_photo).transpose()?;
        Ok(self)
    }

    /// Whether the membership covers `today` (both bounds inclusive).
    #[must_use]
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.start_date <= today && today <= self.end_date
    }

    #[must_use]
    pub fn is_expired_on(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }
}

impl Keyed for Member {
    fn key(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> MemberNew {
        MemberNew {
            full_name: " Asha ".to_string(),
            age: 29,
            gender: Gender::Female,
            contact_number: Some(" ".to_string()),
            membership_plan: MembershipPlan::ThreeMonths,
            start_date: "2024-01-10".parse().unwrap(),
            end_date: None,
            gym_fees: Money::from_major(500),
            payment_status: None,
            amount_paid: Money::from_major(200),
            expected_payment_date: None,
            remarks: String::new(),
            photo: None,
        }
    }

    #[test]
    fn register_fills_derived_fields() {
        let member = Member::register(payload(), "KV0001".to_string(), Utc::now()).unwrap();
        assert_eq!(member.full_name, "Asha");
        assert_eq!(member.due_amount, Money::from_major(300));
        assert_eq!(member.end_date, "2024-04-10".parse::<NaiveDate>().unwrap());
        assert_eq!(member.payment_status, PaymentStatus::Partial);
        assert_eq!(member.contact_number, None);
    }

    #[test]
    fn register_keeps_explicit_end_date_and_status() {
        let mut new = payload();
        new.end_date = Some("2024-02-01".parse().unwrap());
        new.payment_status = Some(PaymentStatus::NotPaid);
        let member = Member::register(new, "KV0002".to_string(), Utc::now()).unwrap();
        assert_eq!(member.end_date, "2024-02-01".parse::<NaiveDate>().unwrap());
        assert_eq!(member.payment_status, PaymentStatus::NotPaid);
    }

    #[test]
    fn register_rejects_negative_amounts() {
        let mut new = payload();
        new.amount_paid = Money::new(-1);
        assert!(Member::register(new, "KV0003".to_string(), Utc::now()).is_err());
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let member = Member::register(payload(), "KV0001".to_string(), Utc::now()).unwrap();
        let value = serde_json::to_value(&member).unwrap();
        assert_eq!(value["fullName"], "Asha");
        assert_eq!(value["gymFees"], 50000);
        assert_eq!(value["membershipPlan"], "3 Months");
        assert_eq!(value["startDate"], "2024-01-10");
        assert!(value.get("contactNumber").is_none());
    }

    #[test]
    fn activity_window_is_inclusive() {
        let member = Member::register(payload(), "KV0001".to_string(), Utc::now()).unwrap();
        assert!(member.is_active_on("2024-01-10".parse().unwrap()));
        assert!(member.is_active_on("2024-04-10".parse().unwrap()));
        assert!(!member.is_active_on("2024-04-11".parse().unwrap()));
        assert!(member.is_expired_on("2024-04-11".parse().unwrap()));
    }
}
