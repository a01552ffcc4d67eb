use async_trait::async_trait;

use super::types::{ConnectionMode, NetFlux, OnlineInfo};

/// Errors a portal conversation can end with.
/// Variants carry enough info to decide whether replaying the action may help.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AuthError {
    /// Timeout, connection refused, DNS failure. Retryable by a later action.
    #[error("network error: {0}")]
    TransientNetwork(String),
    /// The portal declined the credentials or the mode. Shown verbatim.
    #[error("{0}")]
    AuthRejected(String),
    /// The portal answered with something we could not parse.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl AuthError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::TransientNetwork(_))
    }
}

/// The remote portal.
///
/// Every call is awaited by exactly one worker, and the dispatcher never runs
/// two calls at once. Implementations must tolerate being called again after
/// any failure.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns the name of the provider.
    fn name(&self) -> &str;

    /// Authenticates over `mode`. The returned text is the portal's message,
    /// empty when it has none.
    async fn login(&self, mode: ConnectionMode) -> Result<String, AuthError>;

    async fn logout(&self) -> Result<String, AuthError>;

    /// Full usage report of the current session.
    async fn query_flux(&self) -> Result<NetFlux, AuthError>;

    /// Cheap query returning only online time and balance.
    async fn query_online(&self) -> Result<OnlineInfo, AuthError>;
}
