//! Spotify Web API HTTP client.
//!
//! All three feeds the sync engine needs are exposed as lazy streams that
//! fetch one page per poll: the user's playlists and a playlist's tracks
//! (offset-paginated), and the recently-played feed (cursor-paginated
//! backward via `before`). Dropping a stream early stops fetching - the
//! listening sync relies on this to cut the walk at the watermark.
//!
//! Spotify's rate limit is not documented. The proper way to deal with it is
//! the `Retry-After` header; here a fixed minimum delay between calls keeps
//! us under it instead.

use std::time::Duration;

use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use serde::de::DeserializeOwned;
use tokio::time::Instant;

use super::{RemoteError, dto};

/// User agent string sent with every request
const USER_AGENT: &str = concat!("spinlog/", env!("CARGO_PKG_VERSION"));

// Page sizes are the maximum each endpoint allows.
const PLAYLISTS_PAGE_SIZE: u32 = 50;
const PLAYLIST_TRACKS_PAGE_SIZE: u32 = 100;
const RECENTLY_PLAYED_PAGE_SIZE: u32 = 50;

/// Spotify Web API client.
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    throttle: Throttle,
}

impl SpotifyClient {
    /// Create a client around a (valid) access token.
    pub fn new(access_token: impl Into<String>, throttle_interval: Duration) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            base_url: "https://api.spotify.com/v1".to_string(),
            access_token: access_token.into(),
            throttle: Throttle::new(throttle_interval),
        }
    }

    /// Create a client for testing with a custom base URL
    #[cfg(test)]
    pub fn with_base_url(access_token: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut client = Self::new(access_token, Duration::ZERO);
        client.base_url = base_url.into();
        client
    }

    /// The current user's playlists, newest page first as the API returns
    /// them (order carries no meaning).
    pub fn playlists(&self) -> BoxStream<'_, Result<dto::PlaylistResource, RemoteError>> {
        self.offset_stream(format!("{}/me/playlists", self.base_url), PLAYLISTS_PAGE_SIZE)
    }

    /// The full current track listing of one playlist, in playlist order.
    pub fn playlist_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> BoxStream<'a, Result<dto::PlaylistTrackResource, RemoteError>> {
        self.offset_stream(
            format!(
                "{}/playlists/{}/tracks",
                self.base_url,
                urlencoding::encode(playlist_id)
            ),
            PLAYLIST_TRACKS_PAGE_SIZE,
        )
    }

    /// The recently-played feed, newest first, paginated backward until the
    /// cursor stops advancing.
    pub fn recently_played(&self) -> BoxStream<'_, Result<dto::PlayHistoryItem, RemoteError>> {
        self.cursor_stream(
            format!("{}/me/player/recently-played", self.base_url),
            RECENTLY_PLAYED_PAGE_SIZE,
        )
    }

    /// Lazy walk of an offset-paginated endpoint: one GET per page boundary,
    /// stopping at the reported total or on an empty page.
    fn offset_stream<T>(
        &self,
        endpoint: String,
        page_size: u32,
    ) -> BoxStream<'_, Result<T, RemoteError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        stream::try_unfold((0u32, None::<u32>), move |(offset, total)| {
            let endpoint = endpoint.clone();
            async move {
                if total.is_some_and(|total| offset >= total) {
                    return Ok(None);
                }
                let url = format!("{endpoint}?limit={page_size}&offset={offset}");
                let page: dto::Page<T> = self.get_json(&url).await?;
                // An empty page means no further progress, whatever `total`
                // claims
                if page.items.is_empty() {
                    return Ok(None);
                }
                let next_offset = offset + page.items.len() as u32;
                Ok(Some((page.items, (next_offset, Some(page.total)))))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, RemoteError>)))
        .try_flatten()
        .boxed()
    }

    /// Lazy backward walk of a cursor-paginated endpoint. Over when the
    /// response carries no `before` cursor or the cursor stops advancing.
    fn cursor_stream<T>(
        &self,
        endpoint: String,
        page_size: u32,
    ) -> BoxStream<'_, Result<T, RemoteError>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        stream::try_unfold((None::<String>, false), move |(cursor, over)| {
            let endpoint = endpoint.clone();
            async move {
                if over {
                    return Ok(None);
                }
                let mut url = format!("{endpoint}?limit={page_size}");
                if let Some(before) = &cursor {
                    url.push_str("&before=");
                    url.push_str(before);
                }
                let page: dto::CursorPage<T> = self.get_json(&url).await?;
                let next_cursor = page.cursors.and_then(|cursors| cursors.before);
                let over = match &next_cursor {
                    None => true,
                    Some(next) => Some(next) == cursor.as_ref(),
                };
                Ok(Some((page.items, (next_cursor.or(cursor), over))))
            }
        })
        .map_ok(|items| stream::iter(items.into_iter().map(Ok::<T, RemoteError>)))
        .try_flatten()
        .boxed()
    }

    /// Throttled GET returning a parsed JSON body.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        self.throttle.wait().await;

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| RemoteError::Network(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(RemoteError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RemoteError::RateLimited);
        }

        if !status.is_success() {
            if let Ok(error) = response.json::<dto::ApiError>().await {
                return Err(RemoteError::Api(error.error.message));
            }
            return Err(RemoteError::Network(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

/// Cooperative pacing between remote calls: every call waits until at least
/// the configured interval has passed since the previous one.
struct Throttle {
    interval: Duration,
    last_call: tokio::sync::Mutex<Option<Instant>>,
}

impl Throttle {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_call: tokio::sync::Mutex::new(None),
        }
    }

    async fn wait(&self) {
        let mut last_call = self.last_call.lock().await;
        if let Some(last) = *last_call {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                tokio::time::sleep(self.interval - elapsed).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}
