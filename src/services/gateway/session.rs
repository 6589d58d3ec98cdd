use crate::config::WsConfig;
use crate::domain::event::{ClientEvent, ServerEvent};
use crate::domain::user::Identity;
use crate::services::broadcast::BroadcastRouter;
use crate::services::chat_service::ChatService;
use crate::services::gateway::Metrics;
use crate::services::registry::{ConnectionHandle, ConnectionId, SessionRegistry};
use crate::services::room_service::RoomService;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use opentelemetry::KeyValue;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy)]
pub(crate) enum ChatTarget {
    Direct { partner_id: i64 },
    Room { room_id: i64 },
}

pub(crate) struct Session {
    pub connection_id: ConnectionId,
    pub identity: Identity,
    pub target: ChatTarget,
    pub group: String,
    pub request_id: String,
    pub socket: WebSocket,
    pub chat_service: ChatService,
    pub room_service: RoomService,
    pub registry: Arc<SessionRegistry>,
    pub router: BroadcastRouter,
    pub metrics: Metrics,
    pub config: WsConfig,
    pub shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl Session {
    #[tracing::instrument(
        name = "websocket_session",
        skip(self),
        fields(
            user_id = %self.identity.user_id,
            request_id = %self.request_id,
            group = %self.group,
            connection_id = %self.connection_id,
        )
    )]
    pub(crate) async fn run(self) {
        let Self {
            connection_id,
            identity,
            target,
            group,
            socket,
            chat_service,
            room_service,
            registry,
            router,
            metrics,
            config,
            mut shutdown_rx,
            ..
        } = self;

        metrics.active_connections.add(1, &[]);
        tracing::info!("WebSocket connected");

        let (outbound_tx, mut outbound_rx) = mpsc::channel(config.outbound_buffer_size);

        // Join before the ack so a client that has seen the ack is
        // guaranteed to be reachable by subsequent broadcasts.
        registry.join(&group, connection_id, ConnectionHandle { user_id: identity.user_id, tx: outbound_tx });

        let (mut ws_sink, mut ws_stream) = socket.split();

        if send_event(&mut ws_sink, &ServerEvent::connection_established()).await.is_err() {
            registry.leave(&group, connection_id);
            metrics.active_connections.add(-1, &[]);
            tracing::info!("WebSocket closed before acknowledgment");
            return;
        }

        loop {
            if *shutdown_rx.borrow() {
                tracing::info!("Shutdown signal received, closing WebSocket");
                let _ = ws_sink
                    .send(WsMessage::Close(Some(axum::extract::ws::CloseFrame {
                        code: axum::extract::ws::close_code::AWAY,
                        reason: "Server shutting down".into(),
                    })))
                    .await;
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => {}

                msg = ws_stream.next() => {
                    let continue_loop = match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            handle_envelope(
                                text.as_str(),
                                &identity,
                                target,
                                &group,
                                &chat_service,
                                &room_service,
                                &router,
                                &metrics,
                            )
                            .await;
                            true
                        }
                        Some(Ok(WsMessage::Binary(_))) => {
                            tracing::warn!("Ignoring unexpected binary frame");
                            true
                        }
                        Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {
                            tracing::debug!("Heartbeat frame");
                            true
                        }
                        Some(Ok(WsMessage::Close(_)) | Err(_)) | None => false,
                    };

                    if !continue_loop { break; }
                }

                event = outbound_rx.recv() => {
                    match event {
                        Some(event) => {
                            if send_event(&mut ws_sink, &event).await.is_err() { break; }
                        }
                        None => break,
                    }
                }
            }
        }

        // Leaving promptly keeps later broadcasts from wasting work on a
        // dead handle.
        registry.leave(&group, connection_id);
        let _ = ws_sink.close().await;

        metrics.active_connections.add(-1, &[]);
        tracing::info!("WebSocket disconnected");
    }
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, WsMessage>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => sink.send(WsMessage::Text(json.into())).await,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize outbound event");
            Ok(())
        }
    }
}

/// Dispatches one inbound envelope. Realtime errors are deliberately
/// swallowed: the envelope is logged and dropped, no error goes back to the
/// client, and the connection stays open.
#[allow(clippy::too_many_arguments)]
async fn handle_envelope(
    text: &str,
    identity: &Identity,
    target: ChatTarget,
    group: &str,
    chat_service: &ChatService,
    room_service: &RoomService,
    router: &BroadcastRouter,
    metrics: &Metrics,
) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed envelope");
            return;
        }
    };

    match event {
        ClientEvent::Chat { message } => {
            metrics.inbound_events_total.add(1, &[KeyValue::new("type", "chat")]);

            // Durability first: the message is stored before anyone hears
            // about it, on both the direct and the room path.
            let persisted = match target {
                ChatTarget::Direct { partner_id } => {
                    chat_service.send_direct(identity.user_id, partner_id, &message).await.map(|_| ())
                }
                ChatTarget::Room { room_id } => {
                    room_service.post_message(room_id, identity.user_id, &message).await.map(|_| ())
                }
            };

            match persisted {
                Ok(()) => {
                    router.broadcast(group, &ServerEvent::chat(identity.user_id, message));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping chat envelope that could not be persisted");
                }
            }
        }
        ClientEvent::Typing { is_typing } => {
            metrics.inbound_events_total.add(1, &[KeyValue::new("type", "typing")]);
            router.broadcast(group, &ServerEvent::typing(identity.user_id, is_typing));
        }
        ClientEvent::Unknown => {
            metrics.inbound_events_total.add(1, &[KeyValue::new("type", "unknown")]);
            tracing::debug!("Ignoring envelope with unrecognized type");
        }
    }
}
