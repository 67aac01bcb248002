//! OAuth authorization-code flow and the cached user session.
//!
//! `spinlog auth` walks the user through the flow once: it prints the
//! authorize URL, the user approves in a browser and pastes the redirect
//! back, and the exchanged tokens are cached as JSON in the data directory.
//! Pulls then load the cached session and refresh it when stale.
//!
//! Without a cached session a pull is skipped with a message, never an error.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Redirect target registered with the Spotify app.
pub const REDIRECT_URI: &str = "http://localhost:9090";

/// Scopes required by the two pulls.
pub const SCOPES: &[&str] = &["playlist-read-private", "user-read-recently-played"];

const ACCOUNTS_BASE_URL: &str = "https://accounts.spotify.com";
const TOKENS_FILE: &str = "oauth_tokens.json";

/// Seconds shaved off the advertised token lifetime so a token is refreshed
/// before it actually lapses mid-pull.
const EXPIRY_MARGIN_SECS: i64 = 30;

/// A cached user session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Absent if the authorization response carried none
    pub refresh_token: Option<String>,
    /// Unix timestamp after which `access_token` is considered stale
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.expires_at
    }
}

/// Auth-flow errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed token cache: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("token endpoint rejected the request: {0}")]
    Rejected(String),
}

/// Path of the token cache inside the data directory.
pub fn tokens_path(data_dir: &Path) -> PathBuf {
    data_dir.join(TOKENS_FILE)
}

/// Load the cached session, `None` if the user never authenticated.
pub fn load_session(path: &Path) -> Result<Option<Session>, AuthError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&contents)?))
}

/// Persist the session, creating the data directory if needed.
pub fn save_session(path: &Path, session: &Session) -> Result<(), AuthError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

/// The URL the user opens to approve access.
pub fn authorize_url(client_id: &str, state: &str) -> String {
    format!(
        "{}/authorize?client_id={}&response_type=code&redirect_uri={}&scope={}&state={}",
        ACCOUNTS_BASE_URL,
        urlencoding::encode(client_id),
        urlencoding::encode(REDIRECT_URI),
        urlencoding::encode(&SCOPES.join(" ")),
        urlencoding::encode(state),
    )
}

/// Random state string tying the authorize redirect to this invocation.
pub fn random_state() -> String {
    use rand::Rng;
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

/// Accept either the full pasted redirect URL or a bare authorization code.
pub fn code_from_redirect(input: &str) -> String {
    let input = input.trim();
    match input.split_once("code=") {
        Some((_, rest)) => rest
            .split(['&', '#'])
            .next()
            .unwrap_or(rest)
            .to_string(),
        None => input.to_string(),
    }
}

/// Exchange an authorization code for a session.
pub async fn exchange_code(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    code: &str,
) -> Result<Session, AuthError> {
    request_token(
        http,
        client_id,
        client_secret,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", REDIRECT_URI),
        ],
        None,
    )
    .await
}

/// Obtain a fresh session from a stale one's refresh token.
pub async fn refresh_session(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    session: &Session,
) -> Result<Session, AuthError> {
    let Some(refresh_token) = &session.refresh_token else {
        return Err(AuthError::Rejected(
            "no refresh token on record; re-run `spinlog auth`".to_string(),
        ));
    };
    request_token(
        http,
        client_id,
        client_secret,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
        // Spotify omits the refresh token from refresh responses; keep ours
        Some(refresh_token.clone()),
    )
    .await
}

/// Token endpoint response shape.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

async fn request_token(
    http: &reqwest::Client,
    client_id: &str,
    client_secret: &str,
    params: &[(&str, &str)],
    fallback_refresh: Option<String>,
) -> Result<Session, AuthError> {
    let response = http
        .post(format!("{ACCOUNTS_BASE_URL}/api/token"))
        .basic_auth(client_id, Some(client_secret))
        .form(params)
        .send()
        .await
        .map_err(|e| AuthError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AuthError::Rejected(format!("HTTP {status}: {body}")));
    }

    let tokens: TokenResponse = response
        .json()
        .await
        .map_err(|e| AuthError::Network(e.to_string()))?;

    Ok(Session {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token.or(fallback_refresh),
        expires_at: Utc::now().timestamp() + tokens.expires_in - EXPIRY_MARGIN_SECS,
    })
}
