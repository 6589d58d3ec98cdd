use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::chat::{DeletedResponse, SendMessageRequest, SendMessageResponse};
use crate::domain::event::ServerEvent;
use crate::error::Result;
use crate::services::broadcast;
use axum::{
    Json,
    extract::{Path, State},
};

/// Persists a direct message (both owner copies) and then fans it out to any
/// connections currently joined to the pair's group. Durability always comes
/// first; a failed write means nobody hears the message.
pub async fn send_message(
    AuthUser(identity): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>> {
    let (recipient, sender_copy, _) =
        state.chat_service.send_to_username(identity.user_id, &request.to_user, &request.body).await?;

    let group = broadcast::direct_group_key(identity.user_id, recipient.id);
    state.broadcast_router.broadcast(&group, &ServerEvent::chat(identity.user_id, request.body));

    Ok(Json(SendMessageResponse {
        message: format!("Message sent to {}", recipient.username),
        id: sender_copy.id,
    }))
}

pub async fn delete_message(
    AuthUser(identity): AuthUser,
    Path(message_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.chat_service.delete_message(identity.user_id, message_id).await?;

    Ok(Json(DeletedResponse { deleted }))
}
