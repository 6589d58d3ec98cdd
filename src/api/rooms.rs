use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::SearchParams;
use crate::api::schemas::chat::DeletedResponse;
use crate::api::schemas::rooms::{
    CreateRoomRequest, PostRoomMessageRequest, RoomDetailResponse, RoomMessageResponse, RoomOverviewResponse,
};
use crate::domain::event::ServerEvent;
use crate::error::Result;
use crate::services::broadcast;
use crate::services::room_service::CreateRoom;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

pub async fn list_rooms(
    AuthUser(identity): AuthUser,
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoomOverviewResponse>>> {
    let rooms = state.room_service.list_rooms(identity.user_id, params.search.as_deref()).await?;

    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

pub async fn create_room(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDetailResponse>)> {
    let detail = state
        .room_service
        .create_room(
            identity.user_id,
            CreateRoom {
                name: request.name,
                participant_ids: request.participant_ids,
                description: request.description,
                avatar: request.avatar,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}

pub async fn get_room(
    AuthUser(identity): AuthUser,
    Path(room_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<RoomDetailResponse>> {
    let detail = state.room_service.get_room(identity.user_id, room_id).await?;

    Ok(Json(detail.into()))
}

/// Persists a room message and fans it out to the room's live connections,
/// same persist-then-broadcast order as the socket path.
pub async fn post_room_message(
    AuthUser(identity): AuthUser,
    Path(room_id): Path<i64>,
    State(state): State<AppState>,
    Json(request): Json<PostRoomMessageRequest>,
) -> Result<(StatusCode, Json<RoomMessageResponse>)> {
    let message = state.room_service.post_message(room_id, identity.user_id, &request.body).await?;

    let group = broadcast::room_group_key(room_id);
    state.broadcast_router.broadcast(&group, &ServerEvent::chat(identity.user_id, request.body));

    Ok((StatusCode::CREATED, Json(message.into())))
}

pub async fn delete_room(
    AuthUser(identity): AuthUser,
    Path(room_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.room_service.delete_room(room_id, identity.user_id).await?;

    Ok(Json(DeletedResponse { deleted }))
}

pub async fn delete_room_message(
    AuthUser(identity): AuthUser,
    Path((room_id, message_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
) -> Result<StatusCode> {
    state.room_service.delete_message(room_id, message_id, identity.user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
