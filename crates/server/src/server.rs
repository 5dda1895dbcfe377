use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};

use std::sync::Arc;

use crate::{members, statistics, supplements};
use engine::Console;

/// Operator credentials for HTTP basic auth.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone)]
pub struct ServerState {
    pub console: Arc<Console>,
    pub credentials: Option<Arc<Credentials>>,
}

async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.credentials.as_deref() else {
        return Ok(next.run(request).await);
    };
    let Some(TypedHeader(Authorization(basic))) = auth_header else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    if basic.username().is_empty()
        || basic.username() != expected.username
        || basic.password() != expected.password
    {
        tracing::debug!(username = basic.username(), "rejected credentials");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

pub fn router(console: Arc<Console>, credentials: Option<Credentials>) -> Router {
    let state = ServerState {
        console,
        credentials: credentials.map(Arc::new),
    };

    Router::new()
        .route("/members", get(members::list).post(members::register))
        .route(
            "/members/{id}",
            get(members::get)
                .put(members::update)
                .delete(members::delete),
        )
        .route("/members/{id}/photo", post(members::photo))
        .route("/members/{id}/supplements", get(members::supplements))
        .route("/supplements", get(supplements::list).post(supplements::add))
        .route("/stats", get(statistics::get_stats))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    console: Arc<Console>,
    credentials: Option<Credentials>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(console, credentials)).await
}

pub fn spawn_with_listener(
    console: Arc<Console>,
    credentials: Option<Credentials>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(console, credentials, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
