pub(crate) mod session;

use crate::config::WsConfig;
use crate::domain::user::Identity;
use crate::services::broadcast::{self, BroadcastRouter};
use crate::services::chat_service::ChatService;
use crate::services::gateway::session::{ChatTarget, Session};
use crate::services::registry::SessionRegistry;
use crate::services::room_service::RoomService;
use crate::services::user_service::UserService;
use axum::extract::ws::WebSocket;
use futures::SinkExt;
use opentelemetry::{
    global,
    metrics::{Counter, UpDownCounter},
};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) active_connections: UpDownCounter<i64>,
    pub(crate) inbound_events_total: Counter<u64>,
}

impl Metrics {
    #[must_use]
    pub(crate) fn new() -> Self {
        let meter = global::meter("parley-server");
        Self {
            active_connections: meter
                .i64_up_down_counter("parley_websocket_active_connections")
                .with_description("Number of active WebSocket connections")
                .build(),
            inbound_events_total: meter
                .u64_counter("parley_websocket_inbound_events_total")
                .with_description("Inbound envelopes processed, by type")
                .build(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Protocol-facing component: validates a freshly-upgraded connection and
/// hands it to a per-connection session task.
#[derive(Clone, Debug)]
pub struct GatewayService {
    chat_service: ChatService,
    room_service: RoomService,
    user_service: UserService,
    registry: Arc<SessionRegistry>,
    router: BroadcastRouter,
    config: WsConfig,
    metrics: Metrics,
}

impl GatewayService {
    #[must_use]
    pub fn new(
        chat_service: ChatService,
        room_service: RoomService,
        user_service: UserService,
        registry: Arc<SessionRegistry>,
        router: BroadcastRouter,
        config: WsConfig,
    ) -> Self {
        Self { chat_service, room_service, user_service, registry, router, config, metrics: Metrics::new() }
    }

    /// Runs a direct-chat connection until it closes. The peer identity and
    /// the partner from the connection path determine the broadcast group.
    pub async fn handle_direct(
        &self,
        mut socket: WebSocket,
        identity: Identity,
        partner_id: i64,
        request_id: String,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        // The directory row backs conversation listings for whoever chats
        // with this identity, so refresh it before any message can flow.
        if let Err(e) = self.user_service.ensure_known(&identity).await {
            tracing::error!(error = %e, "Failed to record connected identity");
            let _ = socket.close().await;
            return;
        }

        let group = broadcast::direct_group_key(identity.user_id, partner_id);
        self.run_session(socket, identity, ChatTarget::Direct { partner_id }, group, request_id, shutdown_rx).await;
    }

    /// Runs a room connection until it closes. Membership is checked before
    /// the connection may join the room's broadcast group.
    pub async fn handle_room(
        &self,
        mut socket: WebSocket,
        identity: Identity,
        room_id: i64,
        request_id: String,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        if let Err(e) = self.user_service.ensure_known(&identity).await {
            tracing::error!(error = %e, "Failed to record connected identity");
            let _ = socket.close().await;
            return;
        }

        match self.room_service.is_participant(room_id, identity.user_id).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(%room_id, user_id = %identity.user_id, "Rejecting socket from non-participant");
                let _ = socket.close().await;
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check room membership");
                let _ = socket.close().await;
                return;
            }
        }

        let group = broadcast::room_group_key(room_id);
        self.run_session(socket, identity, ChatTarget::Room { room_id }, group, request_id, shutdown_rx).await;
    }

    async fn run_session(
        &self,
        socket: WebSocket,
        identity: Identity,
        target: ChatTarget,
        group: String,
        request_id: String,
        shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) {
        let session = Session {
            connection_id: Uuid::new_v4(),
            identity,
            target,
            group,
            request_id,
            socket,
            chat_service: self.chat_service.clone(),
            room_service: self.room_service.clone(),
            registry: Arc::clone(&self.registry),
            router: self.router.clone(),
            metrics: self.metrics.clone(),
            config: self.config.clone(),
            shutdown_rx,
        };

        session.run().await;
    }
}
