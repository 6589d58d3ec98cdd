use crate::api::AppState;
use axum::{
    extract::{Path, Query, State, ws::WebSocketUpgrade},
    http::{Extensions, StatusCode},
    response::IntoResponse,
};
use serde::Deserialize;
use tower_http::request_id::RequestId;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: String,
}

fn request_id(extensions: &Extensions) -> String {
    extensions
        .get::<RequestId>()
        .map(|id| id.header_value().to_str().unwrap_or_default().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Upgrade handler for the direct-chat path. The token identifies the peer;
/// the path names the partner, and together they pin the broadcast group.
pub async fn direct_socket(
    ws: WebSocketUpgrade,
    Path(to_user): Path<i64>,
    Query(params): Query<WsParams>,
    extensions: Extensions,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let request_id = request_id(&extensions);

    match state.identity_service.verify(&params.token) {
        Ok(identity) => {
            let gateway = state.gateway_service.clone();
            let shutdown_rx = state.shutdown_rx.clone();
            ws.on_upgrade(move |socket| async move {
                gateway.handle_direct(socket, identity, to_user, request_id, shutdown_rx).await;
            })
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket handshake failed: invalid token");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}

/// Upgrade handler for the room path. Membership is validated inside the
/// gateway before the connection joins the room group.
pub async fn room_socket(
    ws: WebSocketUpgrade,
    Path(room_id): Path<i64>,
    Query(params): Query<WsParams>,
    extensions: Extensions,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let request_id = request_id(&extensions);

    match state.identity_service.verify(&params.token) {
        Ok(identity) => {
            let gateway = state.gateway_service.clone();
            let shutdown_rx = state.shutdown_rx.clone();
            ws.on_upgrade(move |socket| async move {
                gateway.handle_room(socket, identity, room_id, request_id, shutdown_rx).await;
            })
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "WebSocket handshake failed: invalid token");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
