//! # pharos-app
//!
//! Application layer: the command dispatcher and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement:
//!   - `EventPublisher`: fan-out of device events
//! - Provide the **driving port** used by every adapter:
//!   - `CommandDispatcher`: resolves `(tier, name)` to a property read or
//!     write, a state transition, a preset application, or a raw wrapper call
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Serialize access to the one simulated device
//!
//! ## Dependency rule
//! Depends on `pharos-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod event_bus;
pub mod ports;
pub mod services;
