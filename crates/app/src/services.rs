//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod command_dispatcher;

pub use command_dispatcher::{ActionOutcome, CommandDispatcher, DeviceStatus};
