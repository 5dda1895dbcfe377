//! Business summary computed from the local collections.
//!
//! Nothing here is persisted; callers recompute whenever members or
//! supplements change.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Member, Money, Supplement};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    /// Members registered during the calendar month of `today` (UTC).
    pub new_members: usize,
    pub active_members: usize,
    pub expired_members: usize,
    pub gym_collected: Money,
    pub gym_due: Money,
    pub supplement_sales: Money,
    pub supplement_due: Money,
    pub supplements_sold: usize,
}

/// Aggregate `members` and `supplements` as seen on `today`.
pub fn aggregate(members: &[Member], supplements: &[Supplement], today: NaiveDate) -> ReportStats {
    let same_month = |member: &&Member| {
        let registered = member.registration_date.date_naive();
        registered.year() == today.year() && registered.month() == today.month()
    };

    ReportStats {
        new_members: members.iter().filter(same_month).count(),
        active_members: members.iter().filter(|m| m.is_active_on(today)).count(),
        expired_members: members.iter().filter(|m| m.is_expired_on(today)).count(),
        gym_collected: members.iter().map(|m| m.amount_paid).sum(),
        gym_due: members.iter().map(|m| m.due_amount).sum(),
        supplement_sales: supplements.iter().map(|s| s.amount_paid).sum(),
        supplement_due: supplements.iter().map(|s| s.due_amount).sum(),
        supplements_sold: supplements.len(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::{Gender, MembershipPlan, PaymentStatus};

    fn member(id: &str, start: &str, end: &str, registered: &str, paid: i64, due: i64) -> Member {
        Member {
            id: id.to_string(),
            full_name: format!("Member {id}"),
            age: 30,
            gender: Gender::Other,
            contact_number: None,
            membership_plan: MembershipPlan::OneMonth,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            gym_fees: Money::new(paid + due),
            payment_status: PaymentStatus::Partial,
            amount_paid: Money::new(paid),
            due_amount: Money::new(due),
            expected_payment_date: None,
            remarks: String::new(),
            registration_date: registered.parse::<DateTime<Utc>>().unwrap(),
            photo: None,
        }
    }

    fn supplement(id: &str, paid: i64, due: i64) -> Supplement {
        Supplement {
            id: id.to_string(),
            member_id: "KV0001".to_string(),
            member_name: "Member KV0001".to_string(),
            purchase_date: "2024-03-01".parse().unwrap(),
            supplement_amount: Money::new(paid + due),
            payment_status: PaymentStatus::Partial,
            amount_paid: Money::new(paid),
            due_amount: Money::new(due),
            expected_payment_date: None,
            remarks: String::new(),
            created_date: "2024-03-01T10:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn long_membership_is_active_not_expired() {
        let members = [member(
            "KV0001",
            "2024-01-01",
            "2099-01-01",
            "2024-01-01T08:00:00Z",
            0,
            0,
        )];
        let stats = aggregate(&members, &[], "2024-06-15".parse().unwrap());
        assert_eq!(stats.active_members, 1);
        assert_eq!(stats.expired_members, 0);
    }

    #[test]
    fn counts_and_sums() {
        let members = [
            member("KV0001", "2024-01-01", "2024-02-01", "2024-01-01T08:00:00Z", 500, 0),
            member("KV0002", "2024-03-01", "2024-04-01", "2024-03-02T08:00:00Z", 200, 300),
            member("KV0003", "2024-03-20", "2024-06-20", "2024-03-31T23:59:59Z", 100, 100),
            member("KV0004", "2024-04-01", "2024-05-01", "2023-03-10T08:00:00Z", 0, 0),
        ];
        let supplements = [supplement("SUP0001", 50, 25), supplement("SUP0002", 10, 0)];

        let stats = aggregate(&members, &supplements, "2024-03-15".parse().unwrap());
        assert_eq!(
            stats,
            ReportStats {
                new_members: 2,
                active_members: 1,
                expired_members: 1,
                gym_collected: Money::new(800),
                gym_due: Money::new(400),
                supplement_sales: Money::new(60),
                supplement_due: Money::new(25),
                supplements_sold: 2,
            }
        );
    }

    #[test]
    fn huge_amounts_saturate_instead_of_overflowing() {
        let members = [
            member("KV0001", "2024-01-01", "2024-02-01", "2024-01-01T08:00:00Z", i64::MAX, 0),
            member("KV0002", "2024-01-01", "2024-02-01", "2024-01-01T08:00:00Z", i64::MAX, 0),
        ];
        let supplements = [
            supplement("SUP0001", 0, i64::MAX),
            supplement("SUP0002", 0, i64::MAX),
        ];

        let stats = aggregate(&members, &supplements, "2024-01-15".parse().unwrap());
        assert_eq!(stats.gym_collected, Money::new(i64::MAX));
        assert_eq!(stats.supplement_due, Money::new(i64::MAX));
        assert_eq!(stats.active_members, 2);
    }

    #[test]
    fn end_date_is_inclusive() {
        let members = [member(
            "KV0001",
            "2024-01-01",
            "2024-01-31",
            "2024-01-01T08:00:00Z",
            0,
            0,
        )];
        let on_last_day = aggregate(&members, &[], "2024-01-31".parse().unwrap());
        assert_eq!((on_last_day.active_members, on_last_day.expired_members), (1, 0));
        let day_after = aggregate(&members, &[], "2024-02-01".parse().unwrap());
        assert_eq!((day_after.active_members, day_after.expired_members), (0, 1));
    }

    #[test]
    fn empty_inputs_give_zeroes() {
        assert_eq!(
            aggregate(&[], &[], "2024-01-01".parse().unwrap()),
            ReportStats::default()
        );
    }
}
