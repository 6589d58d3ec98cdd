use crate::config::Config;
use crate::services::broadcast::BroadcastRouter;
use crate::services::chat_service::ChatService;
use crate::services::gateway::GatewayService;
use crate::services::health_service::HealthService;
use crate::services::identity_service::IdentityService;
use crate::services::registry::SessionRegistry;
use crate::services::room_service::RoomService;
use crate::services::user_service::UserService;
use crate::storage::DbPool;
use crate::storage::message_repo::MessageRepository;
use crate::storage::room_repo::RoomRepository;
use crate::storage::user_repo::UserRepository;
use axum::body::Body;
use axum::http::Request;
use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

pub mod conversations;
pub mod gateway;
pub mod health;
pub mod messages;
pub mod middleware;
pub mod rooms;
pub mod schemas;
pub mod users;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub identity_service: IdentityService,
    pub user_service: UserService,
    pub chat_service: ChatService,
    pub room_service: RoomService,
    pub gateway_service: GatewayService,
    pub broadcast_router: BroadcastRouter,
    pub shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Clone, Debug)]
pub struct ServiceContainer {
    pub identity_service: IdentityService,
    pub user_service: UserService,
    pub chat_service: ChatService,
    pub room_service: RoomService,
    pub gateway_service: GatewayService,
    pub broadcast_router: BroadcastRouter,
    pub health_service: HealthService,
}

impl ServiceContainer {
    /// Wires every service over one pool and one in-process session
    /// registry. Pure construction, no side effects.
    #[must_use]
    pub fn build(config: &Config, pool: DbPool) -> Self {
        let user_repo = UserRepository::new(pool.clone());
        let message_repo = MessageRepository::new(pool.clone());
        let room_repo = RoomRepository::new(pool.clone());

        let registry = Arc::new(SessionRegistry::new());
        let broadcast_router = BroadcastRouter::new(Arc::clone(&registry));

        let identity_service = IdentityService::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
        let user_service = UserService::new(user_repo.clone());
        let chat_service = ChatService::new(message_repo, user_repo);
        let room_service = RoomService::new(room_repo);
        let health_service = HealthService::new(pool);

        let gateway_service = GatewayService::new(
            chat_service.clone(),
            room_service.clone(),
            user_service.clone(),
            registry,
            broadcast_router.clone(),
            config.websocket.clone(),
        );

        Self {
            identity_service,
            user_service,
            chat_service,
            room_service,
            gateway_service,
            broadcast_router,
            health_service,
        }
    }
}

/// Configures and returns the primary application router.
///
/// # Panics
/// Panics if the rate limiter configuration cannot be constructed.
#[must_use]
pub fn app_router(config: Config, services: ServiceContainer, shutdown_rx: tokio::sync::watch::Receiver<bool>) -> Router {
    let interval_ns = 1_000_000_000 / config.rate_limit.per_second.max(1);
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_nanosecond(u64::from(interval_ns))
            .burst_size(config.rate_limit.burst)
            .finish()
            .expect("Failed to build rate limiter config"),
    );

    let state = AppState {
        config,
        identity_service: services.identity_service,
        user_service: services.user_service,
        chat_service: services.chat_service,
        room_service: services.room_service,
        gateway_service: services.gateway_service,
        broadcast_router: services.broadcast_router,
        shutdown_rx,
    };

    let api_routes = Router::new()
        .route("/conversations", get(conversations::list_conversations))
        .route(
            "/conversations/{partnerId}",
            get(conversations::get_conversation).delete(conversations::delete_conversation),
        )
        .route("/messages", post(messages::send_message))
        .route("/messages/{id}", delete(messages::delete_message))
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route("/rooms/{id}", get(rooms::get_room).delete(rooms::delete_room))
        .route("/rooms/{id}/messages", post(rooms::post_room_message))
        .route("/rooms/{id}/messages/{messageId}", delete(rooms::delete_room_message))
        .route("/users", get(users::search_users))
        .layer(GovernorLayer::new(governor_conf));

    let ws_routes = Router::new()
        .route("/socket-server/{toUserId}", get(gateway::direct_socket))
        .route("/room-server/{roomId}", get(gateway::room_socket));

    Router::new()
        .nest("/v1", api_routes)
        .nest("/ws", ws_routes)
        .layer(PropagateRequestIdLayer::new(axum::http::HeaderName::from_static("x-request-id")))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .map(|id| id.header_value().to_str().unwrap_or_default())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                        "user_id" = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, _span: &tracing::Span| {
                        let status = response.status();
                        tracing::Span::current().record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            axum::http::HeaderName::from_static("x-request-id"),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

#[must_use]
pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
