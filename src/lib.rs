//! Tunet action engine: queues portal actions, runs them one conversation at
//! a time, and tells observers what changed.

pub mod auth;
pub mod core;
pub mod error;
pub mod runtime;
pub mod strfmt;

#[cfg(test)]
pub mod test_support;

pub use auth::{AuthError, AuthProvider, ConnectionMode, NetFlux, OnlineInfo};
pub use core::notify::{Channel, Notification, Subscription, SubscriptionId};
pub use core::{Action, Engine, EngineSettings, Snapshot};
pub use error::EngineError;
pub use runtime::{start, start_configured, start_from_file, start_with_config};
pub use strfmt::{format_balance, format_duration, format_flux};
