//! Spotify Web API access.
//!
//! Split the same way as any external API integration here:
//! - [`dto`]: serde types matching the wire format exactly
//! - [`client`]: the HTTP client, throttling and pagination
//! - [`auth`]: OAuth authorization-code flow and the token cache
//! - [`traits`]: the [`RemoteSource`] seam the sync engine consumes
//!
//! Raw DTOs never leave this module and the normalizer.

pub mod auth;
pub mod client;
pub mod dto;
pub mod traits;

pub use client::SpotifyClient;
pub use traits::RemoteSource;

/// Errors from the remote API.
///
/// There is no retry layer: the throttle paces requests to stay under the
/// (undocumented) rate limit, and anything that still fails aborts the
/// current pull.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    /// Network failure
    #[error("network error: {0}")]
    Network(String),

    /// Response body didn't match the expected shape
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Error payload returned by the API
    #[error("API error: {0}")]
    Api(String),

    /// HTTP 429
    #[error("rate limited by the remote API")]
    RateLimited,

    /// HTTP 401: the access token was rejected
    #[error("access token rejected; re-authenticate with `spinlog auth`")]
    Unauthorized,
}
