//! Trait seam between the sync engine and the remote API.
//!
//! Production code uses [`SpotifyClient`]; tests substitute the mock below
//! and drive the engine against in-memory feeds.
//!
//! Each feed is a lazy stream: a page is only fetched when the consumer polls
//! past the previous one, and dropping the stream stops fetching. A stream is
//! restartable only from scratch - call the method again for a fresh walk.

use futures::stream::BoxStream;

use super::client::SpotifyClient;
use super::{RemoteError, dto};

/// The three paginated feeds the sync engine consumes.
pub trait RemoteSource: Send + Sync {
    /// The current user's playlists.
    fn playlists(&self) -> BoxStream<'_, Result<dto::PlaylistResource, RemoteError>>;

    /// The current track listing of one playlist, in playlist order.
    fn playlist_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> BoxStream<'a, Result<dto::PlaylistTrackResource, RemoteError>>;

    /// The recently-played feed, newest first.
    fn recently_played(&self) -> BoxStream<'_, Result<dto::PlayHistoryItem, RemoteError>>;
}

impl RemoteSource for SpotifyClient {
    fn playlists(&self) -> BoxStream<'_, Result<dto::PlaylistResource, RemoteError>> {
        self.playlists()
    }

    fn playlist_tracks<'a>(
        &'a self,
        playlist_id: &'a str,
    ) -> BoxStream<'a, Result<dto::PlaylistTrackResource, RemoteError>> {
        self.playlist_tracks(playlist_id)
    }

    fn recently_played(&self) -> BoxStream<'_, Result<dto::PlayHistoryItem, RemoteError>> {
        self.recently_played()
    }
}
