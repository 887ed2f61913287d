//! WebSocket wire format.
//!
//! Every frame is a JSON object tagged by `type`. Inbound frames map one to
//! one onto store mutations; outbound frames are the fan-out of every change
//! (a narrow tag carrying only the changed slice, then the full `state`).
//!
//! Clients adopt the most recent `state` they receive, may patch locally from
//! narrow tags, and must be idempotent to receiving the same change over REST
//! and over the socket.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use streamgrid_core::{
    AudioPatch, AudioSettings, Change, Document, Layout, LayoutPatch, Notification, StreamSource,
    TextOverlay, TextOverlayPatch, WindowPatch, WindowRect,
};

/// Fixed delay before a client retries a dropped socket. No growth.
pub const RECONNECT_DELAY: Duration = Duration::from_millis(1500);

/// Inbound frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Add { url: String },
    Remove { id: String },
    Layout { data: LayoutPatch },
    Audio { id: String, data: AudioPatch },
    Window { id: String, data: WindowPatch },
    Reorder { order: Vec<String> },
    TextOverlay { data: TextOverlayPatch },
    ShowIds { data: bool },
    YoutubeNoCookie { data: bool },
    HideCursor { data: bool },
    GetState,
    Ping,
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    State { data: Document },
    Added { data: StreamSource },
    Removed { id: String },
    Layout { data: Layout },
    Audio { id: String, data: AudioSettings },
    Window { id: String, data: WindowRect },
    TextOverlay { data: TextOverlay },
    ShowIds { data: bool },
    YoutubeNoCookie { data: bool },
    HideCursor { data: bool },
    /// Discard local state and rebuild the presentation from scratch
    Reload,
    Pong,
}

/// Frames sent to every socket for one change, in send order.
pub fn messages_for(notification: &Notification) -> Vec<ServerMessage> {
    let narrow = match &notification.change {
        Change::Added { source } => Some(ServerMessage::Added {
            data: source.clone(),
        }),
        Change::Removed { id } => Some(ServerMessage::Removed { id: id.clone() }),
        Change::Layout { layout } => Some(ServerMessage::Layout { data: *layout }),
        Change::Audio { id, settings } => Some(ServerMessage::Audio {
            id: id.clone(),
            data: *settings,
        }),
        Change::Window { id, rect } => Some(ServerMessage::Window {
            id: id.clone(),
            data: *rect,
        }),
        Change::TextOverlay { overlay } => Some(ServerMessage::TextOverlay {
            data: overlay.clone(),
        }),
        Change::ShowIds { value } => Some(ServerMessage::ShowIds { data: *value }),
        Change::YoutubeNoCookie { value } => Some(ServerMessage::YoutubeNoCookie { data: *value }),
        Change::HideCursor { value } => Some(ServerMessage::HideCursor { data: *value }),
        // Order and external reloads only travel as full state
        Change::Reordered { .. } | Change::Reloaded => None,
    };

    let mut messages = Vec::with_capacity(3);
    messages.extend(narrow);
    messages.push(ServerMessage::State {
        data: notification.snapshot.clone(),
    });
    if notification.change.requires_reload() {
        messages.push(ServerMessage::Reload);
    }
    messages
}
