//! Live notification listener endpoints.
//!
//! A listener authenticates with the token in the path, is registered with
//! the connection registry under its audience, and then receives
//! [`ServerEnvelope`] JSON text frames until either side goes away. Frames
//! sent by the listener are ignored.

use axum::{
    Router,
    extract::{
        Path, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use gigmart_core::notify::connection_channel;
use gigmart_sdk::objects::{AudienceRole, ServerEnvelope, WsCloseCode};

use crate::state::AppState;

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/{token}", get(listen_as_principal))
        .route("/audience/{audience}/{token}", get(listen_as_audience))
}

/// `GET /ws/auth/{token}`: audience derived from the principal's role.
async fn listen_as_principal(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_listener(socket, state, None, token))
}

/// `GET /ws/audience/{audience}/{token}`: audience named explicitly; it
/// must match the principal's role.
async fn listen_as_audience(
    State(state): State<AppState>,
    Path((audience, token)): Path<(String, String)>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_listener(socket, state, Some(audience), token))
}

/// Background task that drives a single listener connection.
async fn handle_listener(
    mut socket: WebSocket,
    state: AppState,
    requested: Option<String>,
    token: String,
) {
    let requested = match requested.map(|tag| tag.parse::<AudienceRole>()).transpose() {
        Ok(requested) => requested,
        Err(e) => {
            close(&mut socket, WsCloseCode::INVALID_AUDIENCE, &e.to_string()).await;
            return;
        }
    };

    let principal = match state.authenticator.authenticate(&token).await {
        Ok(principal) => principal,
        Err(e) => {
            tracing::debug!(error = %e, "WS: authentication failed");
            close(
                &mut socket,
                WsCloseCode::AUTHENTICATION_FAILED,
                "authentication failed",
            )
            .await;
            return;
        }
    };

    let audience = principal.role.audience();
    if requested.is_some_and(|requested| requested != audience) {
        close(
            &mut socket,
            WsCloseCode::AUDIENCE_MISMATCH,
            &format!("role {} cannot listen as this audience", principal.role),
        )
        .await;
        return;
    }

    let (tx, mut rx) = connection_channel();
    let connection_id = state
        .registry
        .register_audience(audience, Some(principal.identity), tx);

    loop {
        tokio::select! {
            envelope = rx.recv() => {
                match envelope {
                    Some(envelope) => {
                        if send_json(&mut socket, envelope.as_ref()).await.is_err() {
                            break;
                        }
                    }
                    None => {
                        // Pruned by the registry after falling behind.
                        close(&mut socket, WsCloseCode::INTERNAL_ERROR, "listener fell behind").await;
                        break;
                    }
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.registry.unregister(connection_id);
}

async fn close(socket: &mut WebSocket, code: u16, reason: &str) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await;
}

/// Serialize `value` as JSON and send it as a text WebSocket frame.
///
/// Returns `Err(())` if the send fails (listener disconnected).
async fn send_json(socket: &mut WebSocket, value: &ServerEnvelope) -> Result<(), ()> {
    let json = serde_json::to_string(value).map_err(|_| ())?;
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}
