//! # pharos-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the tiered JSON API under `/v1`
//!   (`/v1/{Basic|Advanced|Raw}` and `/v1/{tier}/{name}`)
//! - Serve `/health`, `/info` and `/` for operators
//! - Map HTTP requests into [`CommandDispatcher`](pharos_app::services::CommandDispatcher)
//!   calls (driving adapter)
//! - Map dispatcher results and domain errors into HTTP responses
//!
//! ## Dependency rule
//! Depends on `pharos-app` (for the dispatcher and port traits) and
//! `pharos-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
pub mod wire;
