//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{Connection, Role, UserId},
    infrastructure::dto::websocket::{ConnectedMessage, OutboundType},
    ui::state::AppState,
    usecase::ConnectError,
};

/// Query parameters for WebSocket connection.
///
/// Both values are established by the external authentication step before a
/// connection reaches this subsystem; the gateway consumes them as-is.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    pub role: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // Convert String -> Domain Models
    let user_id = match UserId::try_from(query.user_id.clone()) {
        Ok(user_id) => user_id,
        Err(_) => {
            tracing::warn!("Invalid user_id format: '{}'", query.user_id);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let role = match Role::try_from(query.role.clone()) {
        Ok(role) => role,
        Err(_) => {
            tracing::warn!("Invalid role format: '{}'", query.role);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    // Create a channel for this client to receive messages
    let (tx, rx) = mpsc::unbounded_channel();

    // Admission happens before the upgrade; capacity rejection is terminal
    // for this attempt and the caller may reconnect later.
    match state.connect_client_usecase.execute(user_id, role, tx).await {
        Ok(connection) => {
            tracing::info!(
                "Connection '{}' admitted for user '{}' (role: {})",
                connection.id,
                connection.user_id,
                connection.role
            );
            Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection, rx)))
        }
        Err(ConnectError::CapacityExceeded) => {
            tracing::warn!(
                "Connection capacity reached, rejecting user '{}'",
                query.user_id
            );
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them
/// to the WebSocket sender.
///
/// This function handles the outbound message flow: frames routed to this
/// connection (via rx channel) are written to its WebSocket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            // Send the message to this client
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection: Connection,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = connection.id;

    // Tell the client its assigned connection id
    {
        let connected_msg = ConnectedMessage {
            r#type: OutboundType::Connected,
            connection_id: connection_id.to_string(),
            user_id: connection.user_id.to_string(),
            role: connection.role.to_string(),
        };
        let connected_json = serde_json::to_string(&connected_msg).unwrap();
        if let Err(e) = sender.send(Message::Text(connected_json.into())).await {
            tracing::error!(
                "Failed to send connected frame to '{}': {}",
                connection_id,
                e
            );
            state.disconnect_client_usecase.execute(&connection_id).await;
            return;
        }
    }

    let state_clone = state.clone();

    // Spawn a task to receive frames from this client
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // Every outcome is either a write to one or more
                    // connections or a structured error reply; nothing
                    // propagates back to the transport layer.
                    let outcome = state_clone
                        .route_message_usecase
                        .execute(&connection_id, &text)
                        .await;
                    tracing::debug!("Routed frame from '{}': {:?}", connection_id, outcome);
                }
                Message::Ping(_) => {
                    tracing::debug!("Received transport ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Spawn a task to receive messages from other connections and send to this client
    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Remove the connection from the registry and from every channel
    state.disconnect_client_usecase.execute(&connection_id).await;
}
