//! REST handlers, one per mutation plus the read endpoints.
//!
//! Each mutation responds with the slice of state it changed. The same change
//! is also broadcast to every WebSocket, including the caller's own.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use streamgrid_core::{
    AudioPatch, AudioSettings, Document, Layout, LayoutPatch, StreamSource, TextOverlay,
    TextOverlayPatch, WindowPatch, WindowRect,
};

use crate::error::ApiError;
use crate::server::AppState;

type ApiResult<T> = Result<Json<T>, ApiError>;
type Body<T> = Result<Json<T>, JsonRejection>;

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveRequest {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AudioRequest {
    pub id: String,
    #[serde(flatten)]
    pub patch: AudioPatch,
}

#[derive(Debug, Deserialize)]
pub struct WindowRequest {
    pub id: String,
    #[serde(flatten)]
    pub patch: WindowPatch,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub order: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowIdsRequest {
    pub show_ids: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YoutubeNoCookieRequest {
    pub youtube_no_cookie: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideCursorRequest {
    pub hide_cursor: bool,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "clients": state.client_count(),
    }))
}

pub async fn get_state(State(state): State<AppState>) -> Json<Document> {
    Json(state.store().snapshot())
}

pub async fn get_sources(State(state): State<AppState>) -> Json<Vec<StreamSource>> {
    Json(state.store().sources())
}

pub async fn add(State(state): State<AppState>, body: Body<AddRequest>) -> ApiResult<StreamSource> {
    let Json(AddRequest { url }) = body?;
    let source = state.run_blocking(move |store| store.add_url(&url)).await??;
    Ok(Json(source))
}

/// Succeeds whether or not the id existed.
pub async fn remove(State(state): State<AppState>, body: Body<RemoveRequest>) -> ApiResult<Value> {
    let Json(RemoveRequest { id }) = body?;
    state.run_blocking(move |store| store.remove_source(&id)).await??;
    Ok(Json(json!({ "ok": true })))
}

pub async fn layout(State(state): State<AppState>, body: Body<LayoutPatch>) -> ApiResult<Layout> {
    let Json(patch) = body?;
    let layout = state.run_blocking(move |store| store.update_layout(patch)).await??;
    Ok(Json(layout))
}

pub async fn audio(
    State(state): State<AppState>,
    body: Body<AudioRequest>,
) -> ApiResult<AudioSettings> {
    let Json(AudioRequest { id, patch }) = body?;
    let settings = state
        .run_blocking(move |store| store.update_audio(&id, patch))
        .await??;
    Ok(Json(settings))
}

pub async fn window(
    State(state): State<AppState>,
    body: Body<WindowRequest>,
) -> ApiResult<WindowRect> {
    let Json(WindowRequest { id, patch }) = body?;
    let rect = state
        .run_blocking(move |store| store.update_window(&id, patch))
        .await??;
    Ok(Json(rect))
}

pub async fn reorder(State(state): State<AppState>, body: Body<ReorderRequest>) -> ApiResult<Value> {
    let Json(ReorderRequest { order }) = body?;
    state.run_blocking(move |store| store.reorder(&order)).await??;
    Ok(Json(json!({ "ok": true })))
}

pub async fn text_overlay(
    State(state): State<AppState>,
    body: Body<TextOverlayPatch>,
) -> ApiResult<TextOverlay> {
    let Json(patch) = body?;
    let overlay = state
        .run_blocking(move |store| store.update_text_overlay(patch))
        .await??;
    Ok(Json(overlay))
}

pub async fn show_ids(State(state): State<AppState>, body: Body<ShowIdsRequest>) -> ApiResult<Value> {
    let Json(ShowIdsRequest { show_ids }) = body?;
    let value = state
        .run_blocking(move |store| store.update_show_ids(show_ids))
        .await??;
    Ok(Json(json!({ "showIds": value })))
}

pub async fn youtube_no_cookie(
    State(state): State<AppState>,
    body: Body<YoutubeNoCookieRequest>,
) -> ApiResult<Value> {
    let Json(YoutubeNoCookieRequest { youtube_no_cookie }) = body?;
    let value = state
        .run_blocking(move |store| store.update_youtube_no_cookie(youtube_no_cookie))
        .await??;
    Ok(Json(json!({ "youtubeNoCookie": value })))
}

pub async fn hide_cursor(
    State(state): State<AppState>,
    body: Body<HideCursorRequest>,
) -> ApiResult<Value> {
    let Json(HideCursorRequest { hide_cursor }) = body?;
    let value = state
        .run_blocking(move |store| store.update_hide_cursor(hide_cursor))
        .await??;
    Ok(Json(json!({ "hideCursor": value })))
}
