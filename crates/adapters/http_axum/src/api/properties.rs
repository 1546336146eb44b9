//! Property reads and writes.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Serialize;
use serde_json::Value;

use pharos_app::ports::EventPublisher;
use pharos_domain::value::{Input, PropertyValue};

use super::{parse_tier, text_body};
use crate::error::ApiError;
use crate::state::AppState;
use crate::wire;

/// Body returned by a successful write.
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub status: &'static str,
    pub message: String,
}

/// `GET /v1/{tier}`
pub async fn batch<P>(
    State(state): State<AppState<P>>,
    Path(tier): Path<String>,
) -> Result<Json<BTreeMap<&'static str, PropertyValue>>, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let tier = parse_tier(&tier)?;
    Ok(Json(state.dispatcher.batch_get(tier)))
}

/// `GET /v1/{tier}/{name}`
pub async fn get<P>(
    State(state): State<AppState<P>>,
    Path((tier, name)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let tier = parse_tier(&tier)?;
    let value = state.dispatcher.get(tier, &name)?;
    Ok(Json(wire::single(&value)))
}

/// `PUT /v1/{tier}/{name}` with the raw value as body, e.g. `75.5` or `"3"`.
pub async fn put<P>(
    State(state): State<AppState<P>>,
    Path((tier, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<WriteResponse>, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let tier = parse_tier(&tier)?;
    let body = text_body(&body)?;
    let changes = state.dispatcher.set(tier, &name, &Input::Text(body))?;
    let written = changes
        .first()
        .map(|change| wire::text(&change.value))
        .unwrap_or_default();
    Ok(Json(WriteResponse {
        status: "success",
        message: format!("{name} set to {written}"),
    }))
}
