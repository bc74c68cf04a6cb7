use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
    routing::get,
};
use serde::Deserialize;
use tokio::sync::broadcast::{Receiver, error::RecvError};

use crate::{
    error::{AppError, AppResult},
    middleware::{
        auth::{AuthUser, decode_token},
        extract::QueryParams,
    },
    notify::{Notification, Room},
    state::AppState,
};

/// Browsers cannot set headers on a websocket handshake, so the token rides in the query.
#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub token: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/ws", get(live_updates))
}

pub async fn live_updates(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<LiveQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let token = query
        .token
        .ok_or_else(|| AppError::Unauthorized("Missing token".into()))?;
    let user = decode_token(&token, &state.config.jwt_secret)?;
    let rx = state.live.subscribe();
    tracing::debug!(user_id = %user.user_id, "live subscriber connected");
    Ok(ws.on_upgrade(move |socket| forward(socket, user, rx)))
}

/// Everyone hears their own room; admins also hear the admin room.
pub fn is_member(user: &AuthUser, room: Room) -> bool {
    match room {
        Room::Admin => user.is_admin(),
        Room::User(id) => id == user.user_id,
    }
}

async fn forward(mut socket: WebSocket, user: AuthUser, mut rx: Receiver<Notification>) {
    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(notification) => {
                    if !is_member(&user, notification.room) {
                        continue;
                    }
                    let text = match serde_json::to_string(&notification) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!(error = %err, "live message not serializable");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %user.user_id, skipped, "live subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    tracing::debug!(user_id = %user.user_id, "live subscriber disconnected");
}
