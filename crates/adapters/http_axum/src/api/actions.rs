//! Action invocation, including raw wrapper functions.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use pharos_app::ports::EventPublisher;
use pharos_app::services::ActionOutcome;
use pharos_domain::time::{Timestamp, now};

use super::{parse_tier, text_body};
use super::properties::WriteResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Notice attached to every wrapper result.
const SIMULATION_WARNING: &str = "This is a simulated execution for development purposes";

/// Body returned by `ExecuteWrapperFunction`.
#[derive(Debug, Serialize)]
pub struct WrapperResponse {
    pub status: &'static str,
    pub function: String,
    pub result: Value,
    pub timestamp: Timestamp,
    pub warning: &'static str,
}

/// Possible responses from the invoke endpoint.
pub enum InvokeResponse {
    Done(Json<WriteResponse>),
    Executed(Json<WrapperResponse>),
}

impl IntoResponse for InvokeResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Done(json) => json.into_response(),
            Self::Executed(json) => json.into_response(),
        }
    }
}

impl From<ActionOutcome> for InvokeResponse {
    fn from(outcome: ActionOutcome) -> Self {
        match outcome {
            ActionOutcome::Wrapper { function, result } => {
                Self::Executed(Json(WrapperResponse {
                    status: "executed",
                    function,
                    result,
                    timestamp: now(),
                    warning: SIMULATION_WARNING,
                }))
            }
            other => Self::Done(Json(WriteResponse {
                status: "success",
                message: other.message(),
            })),
        }
    }
}

/// `POST /v1/{tier}/{action}`; the body is only read by
/// `ExecuteWrapperFunction`.
pub async fn invoke<P>(
    State(state): State<AppState<P>>,
    Path((tier, name)): Path<(String, String)>,
    body: Bytes,
) -> Result<InvokeResponse, ApiError>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let tier = parse_tier(&tier)?;
    let body = text_body(&body)?;
    let outcome = state.dispatcher.invoke(tier, &name, &body)?;
    Ok(outcome.into())
}
