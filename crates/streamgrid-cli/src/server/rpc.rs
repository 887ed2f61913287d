//! JSON-RPC style endpoint (`POST /mcp`) for automation clients.
//!
//! One call per request. Call failures, including unknown methods, come back
//! as HTTP 200 with an `error` member; only a body that is not a request
//! object at all is rejected with 400.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use streamgrid_core::{AudioPatch, DocumentStore, LayoutPatch, StoreError, WindowPatch};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::AppState;

pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const STORE_FAILURE: i32 = -32000;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct RpcResponse {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl From<StoreError> for RpcError {
    fn from(err: StoreError) -> Self {
        let code = if err.is_client_error() {
            INVALID_PARAMS
        } else {
            STORE_FAILURE
        };
        Self::new(code, err.to_string())
    }
}

#[derive(Deserialize)]
struct UrlParams {
    url: String,
}

#[derive(Deserialize)]
struct IdParams {
    id: String,
}

#[derive(Deserialize)]
struct AudioParams {
    id: String,
    #[serde(flatten)]
    patch: AudioPatch,
}

#[derive(Deserialize)]
struct WindowParams {
    id: String,
    #[serde(flatten)]
    patch: WindowPatch,
}

#[derive(Deserialize)]
struct OrderParams {
    order: Vec<String>,
}

pub async fn handle_rpc(
    State(state): State<AppState>,
    body: Result<Json<RpcRequest>, JsonRejection>,
) -> Result<Json<RpcResponse>, ApiError> {
    let Json(request) = body?;
    let response = state
        .run_blocking(move |store| dispatch(store, request))
        .await?;
    Ok(Json(response))
}

/// Run one call against the store.
pub fn dispatch(store: &DocumentStore, request: RpcRequest) -> RpcResponse {
    let RpcRequest { id, method, params } = request;
    debug!(%method, "rpc call");

    match call(store, &method, params) {
        Ok(result) => RpcResponse {
            id,
            result: Some(result),
            error: None,
        },
        Err(error) => {
            warn!(%method, code = error.code, "rpc call failed: {}", error.message);
            RpcResponse {
                id,
                result: None,
                error: Some(error),
            }
        }
    }
}

fn call(store: &DocumentStore, method: &str, params: Value) -> Result<Value, RpcError> {
    match method {
        "listSources" => to_value(store.sources()),
        "getState" => to_value(store.snapshot()),
        "addSource" => {
            let UrlParams { url } = parse_params(params)?;
            to_value(store.add_url(&url)?)
        }
        "removeSource" => {
            let IdParams { id } = parse_params(params)?;
            let removed = store.remove_source(&id)?;
            Ok(json!({ "ok": true, "removed": removed }))
        }
        "updateLayout" => {
            let patch: LayoutPatch = parse_params(params)?;
            to_value(store.update_layout(patch)?)
        }
        "updateAudio" => {
            let AudioParams { id, patch } = parse_params(params)?;
            to_value(store.update_audio(&id, patch)?)
        }
        "updateWindow" => {
            let WindowParams { id, patch } = parse_params(params)?;
            to_value(store.update_window(&id, patch)?)
        }
        "reorder" => {
            let OrderParams { order } = parse_params(params)?;
            to_value(store.reorder(&order)?)
        }
        other => Err(RpcError::new(
            METHOD_NOT_FOUND,
            format!("Unknown method: {other}"),
        )),
    }
}

fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T, RpcError> {
    // Omitted params behave like an empty object
    let params = if params.is_null() {
        Value::Object(Map::new())
    } else {
        params
    };
    serde_json::from_value(params)
        .map_err(|e| RpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))
}

fn to_value<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value).map_err(|e| RpcError::new(STORE_FAILURE, e.to_string()))
}
