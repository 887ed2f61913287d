//! WebSocket feed.
//!
//! Each socket gets its own unbounded queue fed by a store subscription, so a
//! slow peer never blocks a mutation and never misses a change. The full
//! state is sent as soon as the socket opens.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use streamgrid_core::{DocumentStore, ListenerClosed, Notification, StoreError};
use tokio::sync::mpsc::{self, UnboundedSender};
use tracing::{debug, info, warn};

use crate::server::AppState;
use crate::server::protocol::{self, ClientMessage, ServerMessage};

pub async fn handle_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let client = state.register_client();
    let store = state.store().clone();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let listener_tx = tx.clone();
    let (subscription, snapshot) = store.subscribe_with_snapshot(move |n: &Notification| {
        for message in protocol::messages_for(n) {
            listener_tx.send(message).map_err(|_| ListenerClosed)?;
        }
        Ok(())
    });
    info!(client, clients = state.client_count(), "websocket client connected");

    let (mut sender, mut receiver) = socket.split();

    // Task to forward queued frames to the socket, starting with the snapshot
    let mut send_task = tokio::spawn(async move {
        let greeting = ServerMessage::State { data: snapshot };
        if send_frame(&mut sender, &greeting).await.is_err() {
            return;
        }
        while let Some(message) = rx.recv().await {
            if send_frame(&mut sender, &message).await.is_err() {
                break;
            }
        }
    });

    // Task to apply inbound frames to the store, one at a time
    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(frame)) = receiver.next().await {
            match frame {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(text.as_str()) {
                    Ok(message) => {
                        let reply = tx.clone();
                        let outcome = recv_state
                            .run_blocking(move |store| handle_client_message(store, message, &reply))
                            .await;
                        match outcome {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => warn!(client, error = %e, "websocket request failed"),
                            Err(e) => warn!(client, error = %e, "websocket request task failed"),
                        }
                    }
                    Err(e) => warn!(client, error = %e, "ignoring malformed websocket message"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
        _ = state.shutdown_signal() => {
            send_task.abort();
            recv_task.abort();
        }
    };

    store.unsubscribe(subscription);
    state.unregister_client();
    info!(client, clients = state.client_count(), "websocket client disconnected");
}

async fn send_frame<S>(sender: &mut S, message: &ServerMessage) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let text = serde_json::to_string(message).map_err(|e| {
        warn!(error = %e, "failed to encode websocket frame");
    })?;
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

/// Apply one inbound frame. Direct replies (`pong`, `state`) go to `reply`;
/// mutations answer through the broadcast like every other client sees.
///
/// Replies are dropped silently if the socket is already closing.
pub fn handle_client_message(
    store: &DocumentStore,
    message: ClientMessage,
    reply: &UnboundedSender<ServerMessage>,
) -> Result<(), StoreError> {
    match message {
        ClientMessage::Ping => {
            let _ = reply.send(ServerMessage::Pong);
        }
        ClientMessage::GetState => {
            // Queue under the store lock so no newer broadcast can overtake it
            store.with_document(|document| {
                let _ = reply.send(ServerMessage::State {
                    data: document.clone(),
                });
            });
        }
        ClientMessage::Add { url } => {
            store.add_url(&url)?;
        }
        ClientMessage::Remove { id } => {
            if !store.remove_source(&id)? {
                debug!(source_id = %id, "remove for unknown source ignored");
            }
        }
        ClientMessage::Layout { data } => {
            store.update_layout(data)?;
        }
        ClientMessage::Audio { id, data } => {
            store.update_audio(&id, data)?;
        }
        ClientMessage::Window { id, data } => {
            store.update_window(&id, data)?;
        }
        ClientMessage::Reorder { order } => {
            store.reorder(&order)?;
        }
        ClientMessage::TextOverlay { data } => {
            store.update_text_overlay(data)?;
        }
        ClientMessage::ShowIds { data } => {
            store.update_show_ids(data)?;
        }
        ClientMessage::YoutubeNoCookie { data } => {
            store.update_youtube_no_cookie(data)?;
        }
        ClientMessage::HideCursor { data } => {
            store.update_hide_cursor(data)?;
        }
    }
    Ok(())
}
