//! Tiered JSON API handler modules, served under `/v1`.

#[allow(clippy::missing_errors_doc)]
pub mod actions;
#[allow(clippy::missing_errors_doc)]
pub mod properties;

use std::str::FromStr;

use axum::Router;
use axum::routing::get;

use pharos_app::ports::EventPublisher;
use pharos_domain::error::{ParameterError, PharosError};
use pharos_domain::tier::Tier;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the `/v1` sub-router.
///
/// `GET /{tier}/{name}` and `PUT` address properties; `POST` addresses
/// actions. A name that is a property in one method and an action in another
/// resolves to `404` in the wrong method.
pub fn routes<P>() -> Router<AppState<P>>
where
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/{tier}", get(properties::batch::<P>))
        .route(
            "/{tier}/{name}",
            get(properties::get::<P>)
                .put(properties::put::<P>)
                .post(actions::invoke::<P>),
        )
}

/// Parse the `{tier}` path segment; an unknown tier is a `404`.
fn parse_tier(segment: &str) -> Result<Tier, ApiError> {
    Tier::from_str(segment).map_err(|err| ApiError::from(PharosError::from(err)))
}

/// Decode a raw request body; invalid UTF-8 is a `400` in the usual error shape.
fn text_body(body: &[u8]) -> Result<String, ApiError> {
    std::str::from_utf8(body).map(str::to_owned).map_err(|err| {
        ApiError::from(PharosError::from(ParameterError::Malformed {
            reason: err.to_string(),
        }))
    })
}
