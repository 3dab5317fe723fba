//! Real-time channel
//!
//! GET /api/ws?token=<JWT>
//! Auth: token in the query string (browser WebSockets cannot set headers)
//!
//! Frames are `{"event": <name>, "data": <payload>}`:
//! - Client → Server: `join-restaurant`, `order-status-update`
//! - Server → Client: `joined`, `error`, `order-*`, `bulk-orders-updated`

use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::AppError;
use shared::live::{ClientEvent, ServerEvent};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::CurrentUser;
use crate::auth::extractor::verify;
use crate::live::RoomMessage;
use crate::security_log;
use crate::state::AppState;

const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Connection ids, used to keep relays from echoing back to their sender
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ws", get(handle_ws))
}

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: Option<String>,
}

/// GET /api/ws?token=<JWT>
pub async fn handle_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let Some(token) = query.token.filter(|t| !t.is_empty()) else {
        security_log!("WARN", "ws_auth_missing", uri = "/api/ws");
        return Err(AppError::unauthorized());
    };
    let user = verify(&token, "/api/ws", &state.jwt)?;
    let conn_id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
    Ok(ws.on_upgrade(move |socket| ws_session(socket, state, user, conn_id)))
}

/// Receive from the joined room, or wait forever when not joined yet
async fn next_room_message(
    rx: &mut Option<broadcast::Receiver<RoomMessage>>,
) -> Result<RoomMessage, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn ws_session(socket: WebSocket, state: AppState, user: CurrentUser, conn_id: u64) {
    let (mut sink, mut stream) = socket.split();
    tracing::info!(user_id = %user.id, conn_id, "WS connected");

    let mut room: Option<String> = None;
    let mut room_rx: Option<broadcast::Receiver<RoomMessage>> = None;

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            msg = next_room_message(&mut room_rx) => {
                match msg {
                    Ok(RoomMessage { origin: Some(origin), .. }) if origin == conn_id => {}
                    Ok(RoomMessage { event, .. }) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(conn_id, lagged = n, "WS subscriber lagged, events skipped");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        room_rx = None;
                    }
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientEvent>(&text) {
                            Ok(ClientEvent::JoinRestaurant(restaurant_id)) => {
                                if restaurant_id == user.restaurant_id {
                                    room_rx = Some(state.hub.subscribe(&restaurant_id));
                                    room = Some(restaurant_id.clone());
                                    tracing::debug!(conn_id, restaurant_id = %restaurant_id, "WS joined room");
                                    Some(ServerEvent::Joined { restaurant_id })
                                } else {
                                    security_log!(
                                        "WARN",
                                        "ws_join_denied",
                                        user_id = user.id.as_str(),
                                        restaurant_id = restaurant_id.as_str()
                                    );
                                    Some(ServerEvent::Error {
                                        message: "Cannot join another restaurant's room.".into(),
                                    })
                                }
                            }
                            Ok(ClientEvent::OrderStatusUpdate(data)) => match &room {
                                Some(restaurant_id) => {
                                    state.hub.relay(restaurant_id, conn_id, ServerEvent::OrderUpdated(data));
                                    None
                                }
                                None => Some(ServerEvent::Error {
                                    message: "Join a restaurant room first.".into(),
                                }),
                            },
                            Err(e) => {
                                tracing::debug!(conn_id, error = %e, "Unrecognized WS frame");
                                Some(ServerEvent::Error {
                                    message: "Unrecognized event.".into(),
                                })
                            }
                        };
                        if let Some(event) = reply
                            && send_event(&mut sink, &event).await.is_err()
                        {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user_id = %user.id, conn_id, "WS disconnected");
}

async fn send_event(
    sink: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => sink.send(Message::Text(json.into())).await,
        Err(e) => {
            tracing::error!(event = event.name(), error = %e, "Failed to serialize WS event");
            Ok(())
        }
    }
}
