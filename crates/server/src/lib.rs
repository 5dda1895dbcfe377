use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, Notification};

use serde::Serialize;
pub use server::{Credentials, router, run_with_listener, spawn_with_listener};

mod members;
mod server;
mod statistics;
mod supplements;

pub mod types {
    pub mod member {
        pub use api_types::member::{ListResponse, MemberDeleted, PhotoUpload};
        pub use engine::{Member, MemberNew};
    }

    pub mod supplement {
        pub use engine::{Supplement, SupplementNew};
    }

    pub mod notification {
        pub use api_types::notification::{NotificationView, Severity, Written};
    }

    pub mod stats {
        pub use api_types::stats::{Statistic, StatsQuery};
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::MemberNotFound(_) | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::Store(_) | EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::InvalidAmount(_)
        | EngineError::InvalidDate(_)
        | EngineError::InvalidName(_)
        | EngineError::InvalidPhoto(_)
        | EngineError::InvalidRecord(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::Store(store_err) => {
            tracing::error!("store error: {store_err}");
            "internal server error".to_string()
        }
        other => Notification::from(&other).message,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), message_for_engine_error(err)),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

fn notification_view(notification: Notification) -> types::notification::NotificationView {
    use types::notification::{NotificationView, Severity};

    NotificationView {
        message: notification.message,
        severity: match notification.severity {
            engine::Severity::Success => Severity::Success,
            engine::Severity::Error => Severity::Error,
        },
    }
}

fn written<T>(outcome: engine::Outcome<T>) -> types::notification::Written<T> {
    types::notification::Written {
        data: outcome.value,
        notification: notification_view(outcome.notification),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_not_found_maps_to_404() {
        let res =
            ServerError::from(EngineError::MemberNotFound("KV0001".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn key_not_found_maps_to_404() {
        let res = ServerError::from(EngineError::KeyNotFound("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_422() {
        let res = ServerError::from(EngineError::InvalidAmount("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let res = ServerError::from(EngineError::InvalidPhoto("x".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn store_failure_maps_to_500() {
        let res = ServerError::from(EngineError::Store("down".to_string())).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generic_maps_to_400() {
        let res = ServerError::Generic("bad".to_string()).into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
