use axum::{Json, extract::State, http::StatusCode};

use crate::{
    ServerError,
    server::ServerState,
    types::{
        member::ListResponse,
        notification::Written,
        supplement::{Supplement, SupplementNew},
    },
    written,
};

pub async fn list(State(state): State<ServerState>) -> Json<ListResponse<Supplement>> {
    Json(ListResponse {
        items: state.console.supplements().await,
    })
}

/// Records a sale. Unknown members get a 404 and nothing is written.
pub async fn add(
    State(state): State<ServerState>,
    Json(payload): Json<SupplementNew>,
) -> Result<(StatusCode, Json<Written<Supplement>>), ServerError> {
    let outcome = state.console.add_supplement(payload).await?;
    Ok((StatusCode::CREATED, Json(written(outcome))))
}
