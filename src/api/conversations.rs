use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::SearchParams;
use crate::api::schemas::chat::{ConversationResponse, ConversationSummary, DeletedResponse};
use crate::error::Result;
use axum::{
    Json,
    extract::{Path, Query, State},
};

pub async fn list_conversations(
    AuthUser(identity): AuthUser,
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<ConversationSummary>>> {
    let conversations = state.chat_service.list_conversations(identity.user_id, params.search.as_deref()).await?;

    Ok(Json(conversations.into_iter().map(Into::into).collect()))
}

/// Fetching a conversation doubles as the read receipt for everything the
/// partner has sent so far.
pub async fn get_conversation(
    AuthUser(identity): AuthUser,
    Path(partner_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<ConversationResponse>> {
    let detail = state.chat_service.get_conversation(identity.user_id, partner_id).await?;

    Ok(Json(detail.into()))
}

pub async fn delete_conversation(
    AuthUser(identity): AuthUser,
    Path(partner_id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<DeletedResponse>> {
    let deleted = state.chat_service.delete_conversation(identity.user_id, partner_id).await?;

    Ok(Json(DeletedResponse { deleted }))
}
