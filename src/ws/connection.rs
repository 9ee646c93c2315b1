use crate::ws::{BATCH_INTERVAL, BATCH_MAX_SIZE, RATE_LIMITER_MILLIS, TIMEOUT_DURATION_SECONDS};
use crate::{
    core::AppState,
    dtos::{ClientEvent, Outbound, ServerEvent},
    entities::User,
    ws::{announce_room, event_handlers::process_event, usermap::InternalSignal},
};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, error, info, instrument, warn};

#[instrument(skip(ws, state, user), fields(user_id = user.user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user: User) {
    info!("WebSocket connection established");

    let (ws_tx, ws_rx) = ws.split();
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    state.users_online.register_online(user.user_id, int_tx.clone());

    tokio::spawn(listen_ws(user.clone(), ws_rx, int_tx, state.clone()));
    tokio::spawn(write_ws(user.user_id, ws_tx, int_rx, state));
}

#[instrument(skip(websocket_tx, internal_rx, state))]
pub async fn write_ws(
    user_id: i64,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    state: Arc<AppState>,
) {
    debug!("Write task started");

    let mut stream_map: StreamMap<String, BroadcastStream<Arc<Outbound>>> = StreamMap::new();
    let mut batch: Vec<Arc<Outbound>> = Vec::new();
    let mut interval = interval(Duration::from_millis(BATCH_INTERVAL));
    interval.tick().await; // first tick fires immediately

    'external: loop {
        tokio::select! {
            Some((room, result)) = tokio_stream::StreamExt::next(&mut stream_map) => {
                match result {
                    Ok(outbound) if outbound.is_for(user_id) => {
                        batch.push(outbound);
                        if batch.len() >= BATCH_MAX_SIZE {
                            if send_batch(&mut websocket_tx, &batch).await.is_err() {
                                warn!("Failed to send batch, closing connection");
                                break 'external;
                            }
                            batch.clear();
                        }
                    }
                    Ok(_) => {}
                    Err(lagged) => warn!(room = %room, "Room receiver lagged: {:?}", lagged),
                }
            }

            _ = interval.tick() => {
                if !batch.is_empty() {
                    if send_batch(&mut websocket_tx, &batch).await.is_err() {
                        warn!("Failed to send batch on interval, closing connection");
                        break 'external;
                    }
                    batch.clear();
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Shutdown) | None => {
                        info!("Writer shutting down");
                        break 'external;
                    }
                    Some(InternalSignal::JoinRoom(room, rx)) => {
                        info!(room = %room, "Joining room");
                        if stream_map.insert(room.clone(), BroadcastStream::new(rx)).is_some() {
                            // re-join: the previous subscription was just dropped
                            state.rooms.leave(&room, user_id);
                        }
                    }
                    Some(InternalSignal::LeaveRoom(room)) => {
                        if stream_map.remove(&room).is_some() {
                            info!(room = %room, "Leaving room");
                            state.rooms.leave(&room, user_id);
                            announce_room(&state, &room);
                        }
                    }
                    Some(InternalSignal::Event(outbound)) => {
                        batch.push(outbound);
                        if batch.len() >= BATCH_MAX_SIZE {
                            if send_batch(&mut websocket_tx, &batch).await.is_err() {
                                warn!("Failed to send batch, closing connection");
                                break 'external;
                            }
                            batch.clear();
                        }
                    }
                }
            }
        }
    }

    if !batch.is_empty() {
        let _ = send_batch(&mut websocket_tx, &batch).await;
    }

    let rooms: Vec<String> = stream_map.keys().cloned().collect();
    drop(stream_map);
    for room in rooms {
        state.rooms.leave(&room, user_id);
        announce_room(&state, &room);
    }

    info!("Write task terminated");
}

/// Sends the batch as one JSON array frame
async fn send_batch(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    batch: &[Arc<Outbound>],
) -> Result<(), axum::Error> {
    let events: Vec<&ServerEvent> = batch.iter().map(|outbound| &outbound.event).collect();
    let json = serde_json::to_string(&events).map_err(|e| {
        error!("Failed to serialize batch: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx
        .send(Message::Text(Utf8Bytes::from(json)))
        .await
        .map_err(|e| {
            error!("Failed to send batch through WebSocket: {:?}", e);
            e
        })
}

#[instrument(skip(user, websocket_rx, internal_tx, state), fields(user_id = user.user_id))]
pub async fn listen_ws(
    user: User,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    debug!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(TIMEOUT_DURATION_SECONDS);

    loop {
        match timeout(timeout_duration, StreamExt::next(&mut websocket_rx)).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => process_event(&state, &user, &internal_tx, event).await,
                        Err(e) => {
                            warn!("Failed to deserialize client event: {}", e);
                            let _ = internal_tx.send(InternalSignal::event(ServerEvent::Error {
                                code: 400,
                                message: "Malformed event".to_string(),
                            }));
                        }
                    },
                    Message::Close(_) => {
                        info!("Close message received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = TIMEOUT_DURATION_SECONDS, "Connection timeout");
                break;
            }
        }
    }

    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.users_online.remove_from_online(user.user_id, &internal_tx);
    info!("Listen task terminated");
}
