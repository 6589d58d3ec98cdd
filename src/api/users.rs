use crate::api::AppState;
use crate::api::middleware::AuthUser;
use crate::api::schemas::SearchParams;
use crate::api::schemas::users::UserSummary;
use crate::error::Result;
use axum::{
    Json,
    extract::{Query, State},
};

pub async fn search_users(
    AuthUser(identity): AuthUser,
    Query(params): Query<SearchParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserSummary>>> {
    let users = state.user_service.search(identity.user_id, params.search.as_deref()).await?;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}
