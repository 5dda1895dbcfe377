//! Members API endpoints.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    server::ServerState,
    types::{
        member::{ListResponse, Member, MemberDeleted, MemberNew, PhotoUpload},
        notification::Written,
        supplement::Supplement,
    },
    written,
};

pub async fn list(State(state): State<ServerState>) -> Json<ListResponse<Member>> {
    Json(ListResponse {
        items: state.console.members().await,
    })
}

pub async fn get(
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
) -> Result<Json<Member>, ServerError> {
    Ok(Json(state.console.member(&member_id).await?))
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<MemberNew>,
) -> Result<(StatusCode, Json<Written<Member>>), ServerError> {
    let outcome = state.console.register_member(payload).await?;
    Ok((StatusCode::CREATED, Json(written(outcome))))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
    Json(payload): Json<Member>,
) -> Result<Json<Written<Member>>, ServerError> {
    if payload.id != member_id {
        return Err(ServerError::Generic(format!(
            "member id mismatch: path {member_id}, body {}",
            payload.id
        )));
    }

    let outcome = state.console.update_member(payload).await?;
    Ok(Json(written(outcome)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
) -> Result<Json<Written<MemberDeleted>>, ServerError> {
    let outcome = state.console.delete_member(&member_id).await?;
    let written = written(outcome);

    Ok(Json(Written {
        data: MemberDeleted {
            id: member_id,
            supplement_ids: written.data,
        },
        notification: written.notification,
    }))
}

pub async fn photo(
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
    Json(payload): Json<PhotoUpload>,
) -> Result<Json<Written<Member>>, ServerError> {
    let outcome = state
        .console
        .attach_photo(&member_id, &payload.photo)
        .await?;
    Ok(Json(written(outcome)))
}

pub async fn supplements(
    State(state): State<ServerState>,
    Path(member_id): Path<String>,
) -> Json<ListResponse<Supplement>> {
    Json(ListResponse {
        items: state.console.supplements_for(&member_id).await,
    })
}
