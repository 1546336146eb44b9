//! Axum router assembly.

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use serde::Serialize;
use tower_http::trace::TraceLayer;

use pharos_app::ports::EventPublisher;
use pharos_domain::time::{Timestamp, now};

use crate::state::AppState;

/// Build the top-level axum [`Router`].
///
/// Nests the tiered API under `/v1` and serves the operator endpoints at the
/// root. Includes a [`TraceLayer`] that logs each HTTP request/response at
/// the `DEBUG` level using the `tracing` ecosystem.
pub fn build<P>(state: AppState<P>) -> Router
where
    P: EventPublisher + Send + Sync + 'static,
{
    Router::new()
        .route("/", get(info::<P>))
        .route("/info", get(info::<P>))
        .route("/health", get(health_check::<P>))
        .nest("/v1", crate::api::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: Timestamp,
    uptime_seconds: i64,
}

async fn health_check<P>(State(state): State<AppState<P>>) -> Json<Health>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let timestamp = now();
    Json(Health {
        status: "healthy",
        timestamp,
        uptime_seconds: (timestamp - state.started_at).num_seconds(),
    })
}

#[derive(Serialize)]
struct Info {
    message: &'static str,
    version: &'static str,
    api_base: &'static str,
    health_check: &'static str,
    status: &'static str,
    laser_state: &'static str,
    output_enabled: bool,
}

async fn info<P>(State(state): State<AppState<P>>) -> Json<Info>
where
    P: EventPublisher + Send + Sync + 'static,
{
    let status = state.dispatcher.status();
    Json(Info {
        message: "PHAROS Laser Virtual Clone",
        version: env!("CARGO_PKG_VERSION"),
        api_base: "/v1",
        health_check: "/health",
        status: "operational",
        laser_state: status.state.name(),
        output_enabled: status.output_enabled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use http_body_util::BodyExt;
    use pharos_app::services::CommandDispatcher;
    use pharos_domain::event::DeviceEvent;
    use pharos_domain::preset::PresetCatalog;
    use pharos_domain::state::LaserState;
    use serde_json::Value;
    use tower::ServiceExt;

    struct StubPublisher;

    impl EventPublisher for StubPublisher {
        fn publish(&self, _event: DeviceEvent) {}
    }

    fn app_in(state: LaserState) -> Router {
        let dispatcher = CommandDispatcher::new(PresetCatalog::default(), StubPublisher);
        dispatcher.boot(state).unwrap();
        build(AppState::new(dispatcher))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn should_return_healthy_when_health_check_called() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(&app, Method::GET, "/health", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert!(body["uptime_seconds"].is_i64());
    }

    #[tokio::test]
    async fn should_report_state_in_info() {
        let app = app_in(LaserState::Operational);
        for uri in ["/", "/info"] {
            let (status, body) = send(&app, Method::GET, uri, "").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["api_base"], "/v1");
            assert_eq!(body["laser_state"], "StateOperational");
            assert_eq!(body["output_enabled"], false);
        }
    }

    #[tokio::test]
    async fn should_serve_single_numbers_as_strings() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(&app, Method::GET, "/v1/Basic/ActualRaFrequency", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("100".to_string()));

        let (_, body) = send(&app, Method::GET, "/v1/Basic/IsOutputEnabled", "").await;
        assert_eq!(body, Value::Bool(false));
    }

    #[tokio::test]
    async fn should_serve_batch_as_plain_json() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(&app, Method::GET, "/v1/Basic", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ActualRaFrequency"], 100.0);
        assert_eq!(body["GeneralStatus"], "Operational");
        assert_eq!(body.as_object().unwrap().len(), 17);
    }

    #[tokio::test]
    async fn should_write_and_confirm_value() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/Basic/TargetAttenuatorPercentage",
            "75.5",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["message"], "TargetAttenuatorPercentage set to 75.5");

        let (_, body) = send(&app, Method::GET, "/v1/Basic/ActualAttenuatorPercentage", "").await;
        assert_eq!(body, Value::String("75.5".to_string()));
    }

    #[tokio::test]
    async fn should_return_bad_request_for_out_of_range_write() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(
            &app,
            Method::PUT,
            "/v1/Basic/TargetAttenuatorPercentage",
            "150",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 400);
        assert!(body["error"]["timestamp"].is_string());
    }

    #[tokio::test]
    async fn should_reject_non_utf8_body_with_error_envelope() {
        let app = app_in(LaserState::Operational);
        for (method, uri) in [
            (Method::PUT, "/v1/Basic/TargetAttenuatorPercentage"),
            (Method::POST, "/v1/Raw/ExecuteWrapperFunction"),
        ] {
            let response = app
                .clone()
                .oneshot(
                    Request::builder()
                        .method(method)
                        .uri(uri)
                        .body(Body::from(vec![0xff_u8, 0xfe]))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body["error"]["code"], 400);
            assert!(
                body["error"]["message"]
                    .as_str()
                    .unwrap()
                    .starts_with("malformed request body")
            );
        }

        let (_, target) = send(&app, Method::GET, "/v1/Basic/TargetAttenuatorPercentage", "").await;
        assert_eq!(target, Value::String("50".to_string()));
    }

    #[tokio::test]
    async fn should_return_forbidden_for_write_in_wrong_state() {
        let app = app_in(LaserState::EmissionOn);
        let (status, _) = send(&app, Method::PUT, "/v1/Basic/TargetPpDivider", "2").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_tier_and_property() {
        let app = app_in(LaserState::Operational);
        let (status, _) = send(&app, Method::GET, "/v1/Expert", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::GET, "/v1/Basic/Nope", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, Method::POST, "/v1/Advanced/TurnOn", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn should_invoke_action_and_report_success() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(&app, Method::POST, "/v1/Basic/EnableOutput", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");

        let (status, _) = send(&app, Method::POST, "/v1/Basic/EnableOutput", "").await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn should_return_bad_request_for_empty_preset_slot() {
        let app = app_in(LaserState::Operational);
        send(&app, Method::PUT, "/v1/Basic/SelectedPresetIndex", "12").await;
        let (status, _) = send(&app, Method::POST, "/v1/Basic/ApplySelectedPreset", "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn should_execute_wrapper_function() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/Raw/ExecuteWrapperFunction",
            r#"{"function_name":"Ping","args":[]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "executed");
        assert_eq!(body["function"], "Ping");
        assert_eq!(body["result"], "pong");
        assert_eq!(
            body["warning"],
            "This is a simulated execution for development purposes"
        );
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_wrapper_function() {
        let app = app_in(LaserState::Operational);
        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/Raw/ExecuteWrapperFunction",
            r#"{"function_name":"Overclock"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
    }
}
