pub mod provider;
pub mod types;

pub use provider::{AuthError, AuthProvider};
pub use types::{ConnectionMode, NetFlux, OnlineInfo, ParseModeError};
