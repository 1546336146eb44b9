//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pharos_domain::error::PharosError;
use pharos_domain::time::{Timestamp, now};

#[derive(Serialize)]
struct ErrorDetail {
    code: u16,
    message: String,
    timestamp: Timestamp,
}

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

/// Maps [`PharosError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(PharosError);

impl From<PharosError> for ApiError {
    fn from(err: PharosError) -> Self {
        Self(err)
    }
}

impl ApiError {
    /// Status code for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            PharosError::NotFound(_) => StatusCode::NOT_FOUND,
            PharosError::BadParameter(_) | PharosError::InvalidPreset(_) => {
                StatusCode::BAD_REQUEST
            }
            PharosError::StateForbidden(_) | PharosError::InvalidTransition(_) => {
                StatusCode::FORBIDDEN
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        let body = ErrorBody {
            error: ErrorDetail {
                code: status.as_u16(),
                message: self.0.to_string(),
                timestamp: now(),
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharos_domain::error::{
        InvalidPresetError, InvalidTransitionError, NotFoundError, ParameterError, TargetKind,
    };
    use pharos_domain::state::{LaserState, StateSet};

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        let cases: [(PharosError, StatusCode); 4] = [
            (
                NotFoundError {
                    kind: TargetKind::Property,
                    name: "Nope".to_string(),
                    tier: None,
                }
                .into(),
                StatusCode::NOT_FOUND,
            ),
            (
                ParameterError::Malformed {
                    reason: "eof".to_string(),
                }
                .into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                InvalidTransitionError {
                    action: "EnableOutput",
                    state: LaserState::Off,
                    valid_from: StateSet::of(&[LaserState::Operational]),
                }
                .into(),
                StatusCode::FORBIDDEN,
            ),
            (
                InvalidPresetError::NoneSelected.into(),
                StatusCode::BAD_REQUEST,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
