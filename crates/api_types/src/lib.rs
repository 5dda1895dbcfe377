//! Wire types of the console HTTP API that are not domain records.
//!
//! Member and supplement records travel in the same camelCase shape they have
//! in the shared graph; this crate only holds the envelopes around them.

use serde::{Deserialize, Serialize};

pub mod notification {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Severity {
        Success,
        Error,
    }

    /// Transient operator message attached to write responses.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct NotificationView {
        pub message: String,
        pub severity: Severity,
    }

    /// Body of every write endpoint: the written value plus the message to
    /// show.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct Written<T> {
        pub data: T,
        pub notification: NotificationView,
    }
}

pub mod member {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ListResponse<T> {
        pub items: Vec<T>,
    }

    /// Photo capture result, an opaque encoded image.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PhotoUpload {
        pub photo: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MemberDeleted {
        pub id: String,
        /// Supplements deleted along with the member.
        pub supplement_ids: Vec<String>,
    }
}

pub mod stats {
    use chrono::NaiveDate;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct StatsQuery {
        /// Reference day, defaults to the current UTC date.
        pub today: Option<NaiveDate>,
    }

    /// Dashboard figures. Amounts are integer minor units.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Statistic {
        pub today: NaiveDate,
        pub new_members: usize,
        pub active_members: usize,
        pub expired_members: usize,
        pub gym_collected: i64,
        pub gym_due: i64,
        pub supplement_sales: i64,
        pub supplement_due: i64,
        pub supplements_sold: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_is_lowercase_on_the_wire() {
        let view = notification::NotificationView {
            message: "ok".to_string(),
            severity: notification::Severity::Success,
        };
        assert_eq!(
            serde_json::to_string(&view).unwrap(),
            r#"{"message":"ok","severity":"success"}"#
        );
    }

    #[test]
    fn deleted_member_is_camel_case() {
        let body = member::MemberDeleted {
            id: "KV0001".to_string(),
            supplement_ids: vec!["SUP0001".to_string()],
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"id":"KV0001","supplementIds":["SUP0001"]}"#
        );
    }
}
