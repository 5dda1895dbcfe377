//! Membership plans and payment states.

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, Money, ResultEngine};

/// Duration of a gym membership.
///
/// The serialized spelling is what the operator sees on forms and what is
/// stored in the shared graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MembershipPlan {
    #[serde(rename = "15 Days")]
    FifteenDays,
    #[serde(rename = "1 Month")]
    OneMonth,
    #[serde(rename = "2 Months")]
    TwoMonths,
    #[serde(rename = "3 Months")]
    ThreeMonths,
    #[serde(rename = "6 Months")]
    SixMonths,
    #[serde(rename = "1 Year")]
    OneYear,
}

impl MembershipPlan {
    pub const ALL: [MembershipPlan; 6] = [
        Self::FifteenDays,
        Self::OneMonth,
        Self::TwoMonths,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FifteenDays => "15 Days",
            Self::OneMonth => "1 Month",
            Self::TwoMonths => "2 Months",
            Self::ThreeMonths => "3 Months",
            Self::SixMonths => "6 Months",
            Self::OneYear => "1 Year",
        }
    }

    /// Last day covered by the plan when it starts on `start`.
    ///
    /// Month based plans land on the same day of month, clamped to the end of
    /// shorter months (Jan 31 + 1 month = Feb 28/29).
    pub fn end_date(self, start: NaiveDate) -> ResultEngine<NaiveDate> {
        let end = match self {
            Self::FifteenDays => start.checked_add_days(Days::new(15)),
            Self::OneMonth => start.checked_add_months(Months::new(1)),
            Self::TwoMonths => start.checked_add_months(Months::new(2)),
            Self::ThreeMonths => start.checked_add_months(Months::new(3)),
            Self::SixMonths => start.checked_add_months(Months::new(6)),
            Self::OneYear => start.checked_add_months(Months::new(12)),
        };
        end.ok_or_else(|| {
            EngineError::InvalidDate(format!("{} from {start} is out of range", self.label()))
        })
    }
}

impl TryFrom<&str> for MembershipPlan {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|plan| plan.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| EngineError::InvalidRecord(format!("unknown membership plan: {value}")))
    }
}

/// Settlement state of a member fee or supplement purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Paid,
    Partial,
    #[serde(rename = "Not Paid")]
    NotPaid,
}

impl PaymentStatus {
    /// Derives the status from the amount owed and the amount received.
    #[must_use]
    pub fn from_amounts(total: Money, paid: Money) -> Self {
        if paid >= total {
            Self::Paid
        } else if paid.is_zero() {
            Self::NotPaid
        } else {
            Self::Partial
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Paid => "Paid",
            Self::Partial => "Partial",
            Self::NotPaid => "Not Paid",
        }
    }
}

impl TryFrom<&str> for PaymentStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "paid" => Ok(Self::Paid),
            "partial" => Ok(Self::Partial),
            "not paid" | "not_paid" | "notpaid" => Ok(Self::NotPaid),
            other => Err(EngineError::InvalidRecord(format!(
                "unknown payment status: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn fifteen_days_adds_days() {
        let end = MembershipPlan::FifteenDays.end_date(date("2024-01-20")).unwrap();
        assert_eq!(end, date("2024-02-04"));
    }

    #[test]
    fn monthly_plans_clamp_to_month_end() {
        let end = MembershipPlan::OneMonth.end_date(date("2024-01-31")).unwrap();
        assert_eq!(end, date("2024-02-29"));
        let end = MembershipPlan::OneYear.end_date(date("2024-02-29")).unwrap();
        assert_eq!(end, date("2025-02-28"));
        let end = MembershipPlan::SixMonths.end_date(date("2024-03-15")).unwrap();
        assert_eq!(end, date("2024-09-15"));
    }

    #[test]
    fn wire_spellings_match_labels() {
        for plan in MembershipPlan::ALL {
            let json = serde_json::to_string(&plan).unwrap();
            assert_eq!(json, format!("\"{}\"", plan.label()));
            assert_eq!(MembershipPlan::try_from(plan.label()).unwrap(), plan);
        }
        assert_eq!(
            serde_json::to_string(&PaymentStatus::NotPaid).unwrap(),
            "\"Not Paid\""
        );
    }

    #[test]
    fn status_from_amounts() {
        let fee = Money::from_major(500);
        assert_eq!(PaymentStatus::from_amounts(fee, fee), PaymentStatus::Paid);
        assert_eq!(
            PaymentStatus::from_amounts(fee, Money::from_major(200)),
            PaymentStatus::Partial
        );
        assert_eq!(
            PaymentStatus::from_amounts(fee, Money::ZERO),
            PaymentStatus::NotPaid
        );
    }
}
