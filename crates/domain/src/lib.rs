//! # pharos-domain
//!
//! Pure domain model for the PHAROS virtual laser.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define the **device lifecycle** (`LaserState`) and the **state machine**
//!   that enforces legal transitions between states
//! - Define the **property table**: every simulated attribute with its type,
//!   range, and the states in which it may be read or written
//! - Define the **property store** holding current values, including coupled
//!   and derived read-outs
//! - Define **actions**, **presets**, and raw-tier **wrapper functions**
//! - Provide the **validation engine** that classifies every request into an
//!   accepted value or a typed error
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.

pub mod error;
pub mod id;
pub mod time;

pub mod action;
pub mod event;
pub mod preset;
pub mod property;
pub mod state;
pub mod state_machine;
pub mod store;
pub mod tier;
pub mod validation;
pub mod value;
pub mod wrapper;
