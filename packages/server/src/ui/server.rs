//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::domain::GatewayStats;
use crate::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, RouteMessageUseCase, UpdatePolicyUseCase,
};

use super::{
    handler::{
        http::{get_message_type_roles, get_stats, health_check, put_message_type_roles},
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Real-time connection gateway server
///
/// This struct encapsulates the wired usecases and provides methods to build
/// the router and run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(
///     connect_client_usecase,
///     disconnect_client_usecase,
///     route_message_usecase,
///     update_policy_usecase,
///     stats,
/// );
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    /// ConnectClientUseCase（クライアント接続のユースケース）
    connect_client_usecase: Arc<ConnectClientUseCase>,
    /// DisconnectClientUseCase（クライアント切断のユースケース）
    disconnect_client_usecase: Arc<DisconnectClientUseCase>,
    /// RouteMessageUseCase（メッセージルーティングのユースケース）
    route_message_usecase: Arc<RouteMessageUseCase>,
    /// UpdatePolicyUseCase（ポリシー管理のユースケース）
    update_policy_usecase: Arc<UpdatePolicyUseCase>,
    /// 統計カウンタ
    stats: Arc<GatewayStats>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(
        connect_client_usecase: Arc<ConnectClientUseCase>,
        disconnect_client_usecase: Arc<DisconnectClientUseCase>,
        route_message_usecase: Arc<RouteMessageUseCase>,
        update_policy_usecase: Arc<UpdatePolicyUseCase>,
        stats: Arc<GatewayStats>,
    ) -> Self {
        Self {
            connect_client_usecase,
            disconnect_client_usecase,
            route_message_usecase,
            update_policy_usecase,
            stats,
        }
    }

    /// Build the axum router with all gateway routes.
    ///
    /// Exposed separately from [`Server::run`] so integration tests can bind
    /// an ephemeral port.
    pub fn router(self) -> Router {
        let app_state = Arc::new(AppState {
            connect_client_usecase: self.connect_client_usecase,
            disconnect_client_usecase: self.disconnect_client_usecase,
            route_message_usecase: self.route_message_usecase,
            update_policy_usecase: self.update_policy_usecase,
            stats: self.stats,
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .route(
                "/api/policy/message-types",
                get(get_message_type_roles).put(put_message_type_roles),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Run the gateway server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!("Gateway server listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
