#![allow(
    clippy::unwrap_used,
    clippy::panic,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    missing_debug_implementations,
    clippy::clone_on_ref_ptr,
    unreachable_pub,
    dead_code
)]

use futures::{SinkExt, StreamExt};
use parley_server::api::{MgmtState, ServiceContainer};
use parley_server::config::{AuthConfig, Config, LogFormat, RateLimitConfig, ServerConfig, TelemetryConfig, WsConfig};
use parley_server::storage::{self, DbPool};
use std::net::SocketAddr;
use std::sync::Once;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("parley_server=debug".parse().unwrap())
            .add_directive("sqlx=warn".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("tungstenite=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    Config {
        database_url: String::new(),
        server: ServerConfig { host: "127.0.0.1".to_string(), port: 0, mgmt_port: 0 },
        auth: AuthConfig { jwt_secret: "test_secret".to_string(), token_ttl_secs: 3600 },
        rate_limit: RateLimitConfig { per_second: 10_000, burst: 10_000 },
        websocket: WsConfig { outbound_buffer_size: 32 },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

pub struct TestUser {
    pub id: i64,
    pub username: String,
    pub token: String,
}

pub struct TestApp {
    pub server_url: String,
    pub ws_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub pool: DbPool,
    pub services: ServiceContainer,
    _shutdown_tx: watch::Sender<bool>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(mut config: Config) -> Self {
        setup_tracing();

        let db_path = std::env::temp_dir().join(format!("parley-test-{}.db", Uuid::new_v4()));
        config.database_url = format!("sqlite://{}", db_path.display());

        let pool = storage::init_pool(&config.database_url).await.expect("Failed to open test database");
        storage::run_migrations(&pool).await.expect("Failed to run migrations");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let services = ServiceContainer::build(&config, pool.clone());

        let mgmt_app =
            parley_server::api::mgmt_router(MgmtState { health_service: services.health_service.clone() });
        let app = parley_server::api::app_router(config, services.clone(), shutdown_rx);

        let api_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let api_addr = api_listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(api_listener, app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{api_addr}"),
            ws_url: format!("ws://{api_addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
            pool,
            services,
            _shutdown_tx: shutdown_tx,
        }
    }

    /// Seeds the user directory and mints a token, standing in for the
    /// external identity provider.
    pub async fn seed_user(&self, id: i64, username: &str) -> TestUser {
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES (?1, ?2, 0) ON CONFLICT (id) DO NOTHING")
            .bind(id)
            .bind(username)
            .execute(&self.pool)
            .await
            .expect("Failed to seed user");

        let token = self.services.identity_service.issue(id, username).expect("Failed to mint token");

        TestUser { id, username: username.to_string(), token }
    }

    pub async fn get(&self, path: &str, user: &TestUser) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.server_url))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post_json(&self, path: &str, user: &TestUser, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.server_url))
            .bearer_auth(&user.token)
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn delete(&self, path: &str, user: &TestUser) -> reqwest::Response {
        self.client
            .delete(format!("{}{path}", self.server_url))
            .bearer_auth(&user.token)
            .send()
            .await
            .expect("DELETE failed")
    }

    pub async fn send_direct(&self, from: &TestUser, to: &TestUser, body: &str) {
        let resp = self
            .post_json("/v1/messages", from, &serde_json::json!({"to_user": to.username, "body": body}))
            .await;
        assert_eq!(resp.status(), 200, "send_direct failed: {}", resp.text().await.unwrap_or_default());
    }

    /// Opens a direct-chat socket and consumes the connection ack, so the
    /// caller is guaranteed to be a group member once this returns.
    pub async fn connect_direct(&self, user: &TestUser, to_user_id: i64) -> WsClient {
        let url = format!("{}/ws/socket-server/{to_user_id}?token={}", self.ws_url, user.token);
        let (stream, _) = tokio_tungstenite::connect_async(url).await.expect("WebSocket connect failed");

        let mut client = WsClient { stream };
        let ack = client.recv_json().await;
        assert_eq!(ack, serde_json::json!({"type": "chat", "message": "Connection Established"}));
        client
    }

    pub async fn connect_room(&self, user: &TestUser, room_id: i64) -> WsClient {
        let url = format!("{}/ws/room-server/{room_id}?token={}", self.ws_url, user.token);
        let (stream, _) = tokio_tungstenite::connect_async(url).await.expect("WebSocket connect failed");

        let mut client = WsClient { stream };
        let ack = client.recv_json().await;
        assert_eq!(ack, serde_json::json!({"type": "chat", "message": "Connection Established"}));
        client
    }

    pub async fn direct_message_rows(&self) -> Vec<(i64, i64, i64, String, bool)> {
        sqlx::query_as::<_, (i64, i64, i64, String, bool)>(
            "SELECT owner_id, sender_id, recipient_id, body, is_read FROM messages ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .expect("Failed to query messages")
    }
}

pub struct WsClient {
    pub stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn send_json(&mut self, value: &serde_json::Value) {
        self.stream.send(Message::Text(value.to_string().into())).await.expect("WebSocket send failed");
    }

    pub async fn recv_json(&mut self) -> serde_json::Value {
        self.recv_json_timeout(Duration::from_secs(5)).await.expect("Timed out waiting for WebSocket event")
    }

    /// Next JSON text frame within the deadline, or None. Control frames are
    /// skipped.
    pub async fn recv_json_timeout(&mut self, deadline: Duration) -> Option<serde_json::Value> {
        let result = tokio::time::timeout(deadline, async {
            while let Some(msg) = self.stream.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        return serde_json::from_str(text.as_str()).ok();
                    }
                    Ok(Message::Close(_)) | Err(_) => return None,
                    Ok(_) => {}
                }
            }
            None
        })
        .await;

        result.ok().flatten()
    }

    /// Drives the stream until it closes; panics if it stays open past the
    /// deadline.
    pub async fn expect_closed(&mut self, deadline: Duration) {
        let result = tokio::time::timeout(deadline, async {
            while let Some(msg) = self.stream.next().await {
                if matches!(msg, Ok(Message::Close(_)) | Err(_)) {
                    return;
                }
            }
        })
        .await;

        assert!(result.is_ok(), "Connection was not closed");
    }
}
